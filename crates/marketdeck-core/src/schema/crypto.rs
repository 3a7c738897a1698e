use crate::api::{fetch_configured, Endpoint, Transport};
use crate::config::Config;
use crate::record::{desc, Record};
use crate::schema::{Loaded, MarketSort, Source};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::cmp::Ordering;
use tracing::{debug, trace};

pub type CryptoSort = MarketSort;

/// One coin, quoted in USD.
#[derive(Clone, Debug, PartialEq)]
pub struct Crypto {
    pub id: String,
    /// Lowercase ticker, e.g. `btc`.
    pub symbol: String,
    pub name: String,
    pub price: f64,
    pub market_cap: f64,
    pub volume: f64,
    pub change_24h: Option<f64>,
}

/// The crypto page has no categorical filters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CryptoDimension {}

impl Record for Crypto {
    type Sort = CryptoSort;
    type Dimension = CryptoDimension;

    const NOUN: &'static str = "cryptocurrencies";

    fn id(&self) -> &str {
        &self.id
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![&self.name, &self.symbol]
    }

    fn category(&self, dimension: CryptoDimension) -> &str {
        match dimension {}
    }

    fn compare(&self, other: &Self, sort: CryptoSort) -> Ordering {
        match sort {
            MarketSort::MarketCap => desc(self.market_cap, other.market_cap),
            MarketSort::Price => desc(self.price, other.price),
            MarketSort::Volume => desc(self.volume, other.volume),
            MarketSort::Change => desc(
                self.change_24h.unwrap_or(0.0),
                other.change_24h.unwrap_or(0.0),
            ),
        }
    }

    fn drift(&mut self, factor: f64) {
        self.price *= factor;
        self.market_cap *= factor;
    }
}

#[async_trait]
impl Source for Crypto {
    async fn load(transport: &dyn Transport, config: &Config) -> Loaded<Self> {
        let (records, mode) = fetch_configured(transport, &endpoints(), config)
            .await
            .or_demo(demo_coins);
        debug!("{} coins loaded | {mode}", records.len());
        Loaded { records, mode }
    }
}

/// CoinGecko first, CoinCap second.
pub fn endpoints() -> Vec<Endpoint<Vec<Crypto>>> {
    vec![
        Endpoint::new(
            "CoinGecko",
            "https://api.coingecko.com/api/v3/coins/markets?vs_currency=usd&order=market_cap_desc&per_page=250&page=1&sparkline=false&price_change_percentage=24h",
            coingecko,
        ),
        Endpoint::new("CoinCap", "https://api.coincap.io/v2/assets?limit=250", coincap),
    ]
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Aggregate figures shown above the crypto cards.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CryptoOverview {
    pub total_market_cap: f64,
    pub total_volume: f64,
    /// Bitcoin's share of the total market cap, in percent; 0 when absent.
    pub btc_dominance: f64,
}

pub fn overview(coins: &[Crypto]) -> CryptoOverview {
    let total_market_cap: f64 = coins.iter().map(|c| c.market_cap).sum();
    let total_volume: f64 = coins.iter().map(|c| c.volume).sum();
    let btc_dominance = coins
        .iter()
        .find(|c| c.symbol.eq_ignore_ascii_case("btc"))
        .filter(|_| total_market_cap > 0.0)
        .map(|btc| btc.market_cap / total_market_cap * 100.0)
        .unwrap_or(0.0);

    CryptoOverview {
        total_market_cap,
        total_volume,
        btc_dominance,
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Static coins served when both providers are unavailable.
pub fn demo_coins() -> Vec<Crypto> {
    [
        ("bitcoin", "btc", "Bitcoin", 43250.75, 845e9, 28.4e9, 1.85),
        ("ethereum", "eth", "Ethereum", 2580.42, 310e9, 14.2e9, -0.65),
        ("tether", "usdt", "Tether", 1.0, 95e9, 41.7e9, 0.01),
        ("binancecoin", "bnb", "BNB", 312.18, 48e9, 1.1e9, 0.92),
        ("solana", "sol", "Solana", 98.65, 42e9, 2.6e9, 4.21),
        ("ripple", "xrp", "XRP", 0.62, 33e9, 1.4e9, -1.12),
        ("usd-coin", "usdc", "USDC", 1.0, 28e9, 5.3e9, 0.0),
        ("cardano", "ada", "Cardano", 0.58, 20e9, 0.54e9, -2.03),
        ("dogecoin", "doge", "Dogecoin", 0.087, 12e9, 0.61e9, 3.4),
        ("polkadot", "dot", "Polkadot", 7.35, 9.4e9, 0.21e9, -0.48),
    ]
    .into_iter()
    .map(|(id, symbol, name, price, market_cap, volume, change)| Crypto {
        id: id.to_string(),
        symbol: symbol.to_string(),
        name: name.to_string(),
        price,
        market_cap,
        volume,
        change_24h: Some(change),
    })
    .collect()
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////

// >> Input: CoinGecko `coins/markets`
// ==========================================================================
#[derive(Deserialize, Debug)]
struct GeckoCoin {
    id: String,
    symbol: String,
    name: String,
    current_price: Option<f64>,
    market_cap: Option<f64>,
    total_volume: Option<f64>,
    price_change_percentage_24h: Option<f64>,
}

fn coingecko(value: Value) -> Option<Vec<Crypto>> {
    let coins: Vec<GeckoCoin> = serde_json::from_value(value).ok()?;
    Some(
        coins
            .into_iter()
            .filter_map(|coin| {
                let Some(price) = coin.current_price else {
                    trace!("dropping {} without a price", coin.id);
                    return None;
                };
                Some(Crypto {
                    id: coin.id,
                    symbol: coin.symbol.to_lowercase(),
                    name: coin.name,
                    price,
                    market_cap: coin.market_cap.unwrap_or(0.0),
                    volume: coin.total_volume.unwrap_or(0.0),
                    change_24h: coin.price_change_percentage_24h,
                })
            })
            .collect(),
    )
}

// >> Input: CoinCap `v2/assets`; every figure arrives as a decimal string
// ==========================================================================
#[derive(Deserialize, Debug)]
struct CapAssets {
    data: Vec<CapAsset>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct CapAsset {
    id: String,
    symbol: String,
    name: String,
    price_usd: Option<String>,
    market_cap_usd: Option<String>,
    volume_usd24_hr: Option<String>,
    change_percent24_hr: Option<String>,
}

fn coincap(value: Value) -> Option<Vec<Crypto>> {
    let assets: CapAssets = serde_json::from_value(value).ok()?;
    let number = |raw: &Option<String>| raw.as_deref().and_then(|s| s.parse::<f64>().ok());

    Some(
        assets
            .data
            .into_iter()
            .filter_map(|asset| {
                let price = number(&asset.price_usd)?;
                Some(Crypto {
                    market_cap: number(&asset.market_cap_usd).unwrap_or(0.0),
                    volume: number(&asset.volume_usd24_hr).unwrap_or(0.0),
                    change_24h: number(&asset.change_percent24_hr),
                    id: asset.id,
                    symbol: asset.symbol.to_lowercase(),
                    name: asset.name,
                    price,
                })
            })
            .collect(),
    )
}
