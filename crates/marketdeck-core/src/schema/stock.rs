use crate::api::{fetch_configured, Endpoint, Transport};
use crate::config::Config;
use crate::record::{desc, Record};
use crate::schema::{Loaded, MarketSort, Source};
use async_trait::async_trait;
use lazy_static::lazy_static;
use serde::Deserialize;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::BTreeMap as Map;
use tracing::{debug, trace};

pub type StockSort = MarketSort;

/// One listed equity.
#[derive(Clone, Debug, PartialEq)]
pub struct Stock {
    pub symbol: String,
    pub name: String,
    pub price: f64,
    /// 24h change, in percent.
    pub change: f64,
    pub market_cap: f64,
    pub volume: u64,
    /// Lowercase sector, e.g. `technology`.
    pub sector: String,
    /// Lowercase listing venue, `nasdaq` or `nyse`.
    pub market: String,
    pub pe_ratio: Option<f64>,
    pub dividend: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StockDimension {
    Market,
    Sector,
}

impl Record for Stock {
    type Sort = StockSort;
    type Dimension = StockDimension;

    const NOUN: &'static str = "stocks";

    fn id(&self) -> &str {
        &self.symbol
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![&self.name, &self.symbol, &self.sector]
    }

    fn category(&self, dimension: StockDimension) -> &str {
        match dimension {
            StockDimension::Market => &self.market,
            StockDimension::Sector => &self.sector,
        }
    }

    fn compare(&self, other: &Self, sort: StockSort) -> Ordering {
        match sort {
            MarketSort::MarketCap => desc(self.market_cap, other.market_cap),
            MarketSort::Price => desc(self.price, other.price),
            MarketSort::Volume => other.volume.cmp(&self.volume),
            MarketSort::Change => desc(self.change, other.change),
        }
    }

    fn drift(&mut self, factor: f64) {
        self.price *= factor;
        self.market_cap *= factor;
    }
}

#[async_trait]
impl Source for Stock {
    async fn load(transport: &dyn Transport, config: &Config) -> Loaded<Self> {
        let (records, mode) = fetch_configured(transport, &endpoints(), config)
            .await
            .or_demo(demo_stocks);
        debug!("{} stocks loaded | {mode}", records.len());
        Loaded { records, mode }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////

type Row = (&'static str, &'static str, f64, f64, f64, u64, &'static str, &'static str, f64, f64);

/// symbol, name, price, change, market cap, volume, sector, market, P/E, dividend
const TRACKED: [Row; 20] = [
    ("AAPL", "Apple Inc.", 182.63, 1.25, 2850e9, 58_342_900, "technology", "nasdaq", 29.8, 0.96),
    ("MSFT", "Microsoft Corporation", 407.81, -0.42, 3030e9, 25_481_900, "technology", "nasdaq", 36.2, 3.00),
    ("GOOGL", "Alphabet Inc.", 138.21, 2.15, 1750e9, 28_765_400, "technology", "nasdaq", 24.1, 0.00),
    ("AMZN", "Amazon.com Inc.", 174.45, -1.08, 1800e9, 39_876_500, "consumer", "nasdaq", 58.3, 0.00),
    ("TSLA", "Tesla Inc.", 248.42, 3.67, 790e9, 98_765_400, "consumer", "nasdaq", 76.4, 0.00),
    ("META", "Meta Platforms Inc.", 468.05, -0.75, 1190e9, 18_765_400, "technology", "nasdaq", 32.1, 0.00),
    ("NVDA", "NVIDIA Corporation", 118.11, 5.23, 2910e9, 48_765_400, "technology", "nasdaq", 73.8, 0.16),
    ("JPM", "JPMorgan Chase & Co.", 188.91, 0.89, 542e9, 9_876_500, "financial", "nyse", 11.2, 4.20),
    ("JNJ", "Johnson & Johnson", 157.23, 0.34, 380e9, 5_876_500, "healthcare", "nyse", 15.8, 4.76),
    ("V", "Visa Inc.", 269.45, -0.56, 552e9, 6_876_500, "financial", "nyse", 31.5, 2.08),
    ("PG", "Procter & Gamble", 156.78, 0.67, 370e9, 4_876_500, "consumer", "nyse", 26.4, 3.76),
    ("UNH", "UnitedHealth Group", 546.32, -1.23, 503e9, 2_876_500, "healthcare", "nyse", 20.1, 7.52),
    ("HD", "Home Depot Inc.", 354.67, 1.45, 347e9, 3_876_500, "consumer", "nyse", 23.8, 8.36),
    ("BAC", "Bank of America", 33.45, 0.89, 267e9, 45_876_500, "financial", "nyse", 10.5, 0.96),
    ("XOM", "Exxon Mobil", 102.45, -0.78, 408e9, 15_876_500, "energy", "nyse", 11.8, 3.80),
    ("CVX", "Chevron Corporation", 149.32, 0.45, 281e9, 9_876_500, "energy", "nyse", 13.2, 6.04),
    ("KO", "Coca-Cola Company", 59.87, 0.23, 258e9, 12_876_500, "consumer", "nyse", 24.1, 1.84),
    ("PFE", "Pfizer Inc.", 28.67, 0.45, 162e9, 35_876_500, "healthcare", "nyse", 75.4, 1.68),
    ("T", "AT&T Inc.", 16.45, -0.12, 117e9, 45_876_500, "communication", "nyse", 8.9, 1.11),
    ("WMT", "Walmart Inc.", 169.23, 0.34, 456e9, 5_876_500, "consumer", "nyse", 27.8, 2.28),
];

lazy_static! {
    /// Tracked tickers, mapped to their (sector, market).
    ///
    /// The quote endpoint carries no sector, so it is looked up here.
    pub static ref UNIVERSE: Map<&'static str, (&'static str, &'static str)> = TRACKED
        .iter()
        .map(|row| (row.0, (row.6, row.7)))
        .collect();
}

/// The tracked universe with static quotes.
pub fn demo_stocks() -> Vec<Stock> {
    TRACKED
        .iter()
        .map(
            |&(symbol, name, price, change, market_cap, volume, sector, market, pe, dividend)| Stock {
                symbol: symbol.to_string(),
                name: name.to_string(),
                price,
                change,
                market_cap,
                volume,
                sector: sector.to_string(),
                market: market.to_string(),
                pe_ratio: Some(pe),
                dividend,
            },
        )
        .collect()
}

/// Yahoo Finance quotes for the tracked universe, `query1` then `query2`.
pub fn endpoints() -> Vec<Endpoint<Vec<Stock>>> {
    let symbols = TRACKED.iter().map(|row| row.0).collect::<Vec<_>>().join(",");
    ["query1", "query2"]
        .into_iter()
        .map(|host| {
            Endpoint::new(
                format!("Yahoo Finance ({host})"),
                format!("https://{host}.finance.yahoo.com/v7/finance/quote?symbols={symbols}"),
                yahoo,
            )
        })
        .collect()
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Number of listed stocks per sector, alphabetically.
pub fn sector_counts(stocks: &[Stock]) -> Map<String, usize> {
    let mut counts = Map::new();
    for stock in stocks {
        *counts.entry(stock.sector.clone()).or_insert(0) += 1;
    }
    counts
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////

// >> Input: Yahoo Finance `v7/finance/quote`
// ==========================================================================
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct QuoteEnvelope {
    quote_response: QuoteResponse,
}

#[derive(Deserialize, Debug)]
struct QuoteResponse {
    result: Option<Vec<Quote>>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct Quote {
    symbol: String,
    long_name: Option<String>,
    short_name: Option<String>,
    regular_market_price: Option<f64>,
    regular_market_change_percent: Option<f64>,
    market_cap: Option<f64>,
    regular_market_volume: Option<u64>,
    exchange: Option<String>,
    #[serde(rename = "trailingPE")]
    trailing_pe: Option<f64>,
    dividend_rate: Option<f64>,
}

/// Maps Yahoo exchange codes onto the two venues the page filters by.
fn venue(exchange: Option<&str>) -> Option<&'static str> {
    match exchange? {
        "NMS" | "NGM" | "NCM" | "NAS" => Some("nasdaq"),
        "NYQ" | "NYS" => Some("nyse"),
        _ => None,
    }
}

fn yahoo(value: Value) -> Option<Vec<Stock>> {
    let envelope: QuoteEnvelope = serde_json::from_value(value).ok()?;
    let quotes = envelope.quote_response.result?;

    Some(
        quotes
            .into_iter()
            .filter_map(|quote| {
                let Some(&(sector, market)) = UNIVERSE.get(quote.symbol.as_str()) else {
                    trace!("ignoring untracked ticker {}", quote.symbol);
                    return None;
                };
                let price = quote.regular_market_price?;
                Some(Stock {
                    name: quote
                        .long_name
                        .or(quote.short_name)
                        .unwrap_or_else(|| quote.symbol.clone()),
                    price,
                    change: quote.regular_market_change_percent.unwrap_or(0.0),
                    market_cap: quote.market_cap.unwrap_or(0.0),
                    volume: quote.regular_market_volume.unwrap_or(0),
                    sector: sector.to_string(),
                    market: venue(quote.exchange.as_deref()).unwrap_or(market).to_string(),
                    pe_ratio: quote.trailing_pe,
                    dividend: quote.dividend_rate.unwrap_or(0.0),
                    symbol: quote.symbol,
                })
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn yahoo_quotes_take_their_sector_from_the_universe() {
        let body = json!({ "quoteResponse": { "result": [
            { "symbol": "AAPL", "longName": "Apple Inc.", "regularMarketPrice": 190.0,
              "regularMarketChangePercent": 0.5, "marketCap": 2.9e12, "regularMarketVolume": 1000,
              "exchange": "NMS", "trailingPE": 30.1 },
            { "symbol": "ZZZZ", "regularMarketPrice": 1.0 },
            { "symbol": "XOM", "shortName": "Exxon", "exchange": "NYQ" }
        ]}});
        let stocks = yahoo(body).expect("quote payload");
        assert_eq!(stocks.len(), 1);
        assert_eq!(stocks[0].sector, "technology");
        assert_eq!(stocks[0].market, "nasdaq");
        assert_eq!(stocks[0].pe_ratio, Some(30.1));
        assert_eq!(stocks[0].dividend, 0.0);
    }

    #[test]
    fn a_missing_result_is_not_a_payload() {
        assert!(yahoo(json!({ "quoteResponse": { "result": null } })).is_none());
        assert!(yahoo(json!({ "finance": { "error": "Unauthorized" } })).is_none());
    }

    #[test]
    fn endpoints_request_the_whole_universe() {
        let endpoints = endpoints();
        assert_eq!(endpoints.len(), 2);
        assert!(endpoints[0].url.starts_with("https://query1."));
        assert!(endpoints[1].url.contains("symbols=AAPL,MSFT"));
        assert!(endpoints[1].url.ends_with("WMT"));
    }

    #[test]
    fn sectors_are_counted() {
        let counts = sector_counts(&demo_stocks());
        assert_eq!(counts.get("technology"), Some(&5));
        assert_eq!(counts.get("energy"), Some(&2));
        assert_eq!(counts.values().sum::<usize>(), 20);
    }

    #[test]
    fn market_and_sector_are_filter_dimensions() {
        let stock = demo_stocks().remove(7);
        assert_eq!(stock.symbol, "JPM");
        assert_eq!(stock.category(StockDimension::Market), "nyse");
        assert_eq!(stock.category(StockDimension::Sector), "financial");
    }
}
