use crate::api::{fetch_configured, DataMode, Endpoint, Fetched, Transport};
use crate::config::Config;
use crate::record::{desc, Record};
use crate::schema::{Loaded, Source};
use async_trait::async_trait;
use rand::Rng;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashMap;
use strum::{AsRefStr, Display, EnumIter, EnumString};
use tracing::{debug, warn};

/// Units of each currency per 1 USD, keyed by uppercase ISO code.
pub type RateTable = HashMap<String, f64>;

/// Liquidity class of a currency pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, AsRefStr, Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum PairType {
    Major,
    Minor,
    Exotic,
}

impl PairType {
    /// Popularity rank, higher is more popular.
    pub fn rank(self) -> u8 {
        match self {
            PairType::Major => 3,
            PairType::Minor => 2,
            PairType::Exotic => 1,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ForexPair {
    /// `BASE/QUOTE`, e.g. `EUR/USD`.
    pub pair: String,
    pub base: String,
    pub quote: String,
    pub name: String,
    pub kind: PairType,
    pub rate: f64,
    /// 24h change, in percent.
    pub change: f64,
    pub volume: u64,
    pub high: f64,
    pub low: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ForexDimension {
    PairType,
    Base,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ForexSort {
    /// Pair type rank, then volume.
    #[default]
    Popularity,
    /// Magnitude of the 24h change, either direction.
    Change,
    Volume,
}

impl Record for ForexPair {
    type Sort = ForexSort;
    type Dimension = ForexDimension;

    const NOUN: &'static str = "currency pairs";

    fn id(&self) -> &str {
        &self.pair
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![&self.pair, &self.name, &self.base, &self.quote]
    }

    fn category(&self, dimension: ForexDimension) -> &str {
        match dimension {
            ForexDimension::PairType => self.kind.as_ref(),
            ForexDimension::Base => &self.base,
        }
    }

    fn compare(&self, other: &Self, sort: ForexSort) -> Ordering {
        match sort {
            ForexSort::Popularity => other
                .kind
                .rank()
                .cmp(&self.kind.rank())
                .then_with(|| other.volume.cmp(&self.volume)),
            ForexSort::Change => desc(self.change.abs(), other.change.abs()),
            ForexSort::Volume => other.volume.cmp(&self.volume),
        }
    }

    fn drift(&mut self, factor: f64) {
        self.rate *= factor;
        self.high *= factor;
        self.low *= factor;
    }
}

#[async_trait]
impl Source for ForexPair {
    async fn load(transport: &dyn Transport, config: &Config) -> Loaded<Self> {
        let (records, mode) = match fetch_configured(transport, &endpoints(), config).await {
            Fetched::Live { endpoint, payload } => {
                let pairs = derive_live(&payload);
                if pairs.is_empty() {
                    warn!("{endpoint} answered but no pair could be derived");
                    let reason = format!("{endpoint}: no valid forex data could be processed");
                    (demo_pairs(), DataMode::Demo { reason })
                } else {
                    (pairs, DataMode::Live { endpoint })
                }
            }
            unavailable => {
                let (_, mode) = unavailable.or_demo(RateTable::new);
                (demo_pairs(), mode)
            }
        };
        debug!("{} currency pairs loaded | {mode}", records.len());
        Loaded { records, mode }
    }
}

fn derive_live(rates: &RateTable) -> Vec<ForexPair> {
    derive_pairs(rates, &mut rand::rng())
}

/// USD-referenced rate providers, in order of preference.
pub fn endpoints() -> Vec<Endpoint<RateTable>> {
    vec![
        Endpoint::new(
            "exchangerate.host",
            "https://api.exchangerate.host/latest?base=USD",
            rates_field,
        ),
        Endpoint::new(
            "Frankfurter API",
            "https://api.frankfurter.app/latest?from=USD",
            rates_field,
        ),
        Endpoint::new(
            "CurrencyAPI",
            "https://cdn.jsdelivr.net/npm/@fawazahmed0/currency-api@latest/v1/currencies/usd.json",
            usd_field,
        ),
    ]
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// base, quote, name, type
const CATALOGUE: [(&str, &str, &str, PairType); 22] = [
    ("EUR", "USD", "Euro / US Dollar", PairType::Major),
    ("GBP", "USD", "British Pound / US Dollar", PairType::Major),
    ("USD", "JPY", "US Dollar / Japanese Yen", PairType::Major),
    ("USD", "CHF", "US Dollar / Swiss Franc", PairType::Major),
    ("AUD", "USD", "Australian Dollar / US Dollar", PairType::Major),
    ("USD", "CAD", "US Dollar / Canadian Dollar", PairType::Major),
    ("NZD", "USD", "New Zealand Dollar / US Dollar", PairType::Major),
    ("EUR", "GBP", "Euro / British Pound", PairType::Minor),
    ("EUR", "JPY", "Euro / Japanese Yen", PairType::Minor),
    ("GBP", "JPY", "British Pound / Japanese Yen", PairType::Minor),
    ("EUR", "CAD", "Euro / Canadian Dollar", PairType::Minor),
    ("AUD", "JPY", "Australian Dollar / Japanese Yen", PairType::Minor),
    ("GBP", "CAD", "British Pound / Canadian Dollar", PairType::Minor),
    ("EUR", "AUD", "Euro / Australian Dollar", PairType::Minor),
    ("GBP", "AUD", "British Pound / Australian Dollar", PairType::Minor),
    ("USD", "SGD", "US Dollar / Singapore Dollar", PairType::Exotic),
    ("USD", "HKD", "US Dollar / Hong Kong Dollar", PairType::Exotic),
    ("USD", "SEK", "US Dollar / Swedish Krona", PairType::Exotic),
    ("USD", "NOK", "US Dollar / Norwegian Krone", PairType::Exotic),
    ("USD", "MXN", "US Dollar / Mexican Peso", PairType::Exotic),
    ("USD", "ZAR", "US Dollar / South African Rand", PairType::Exotic),
    ("USD", "TRY", "US Dollar / Turkish Lira", PairType::Exotic),
];

/// Price of one `base` in `quote`, from a USD-referenced table.
///
/// USD is implicitly 1. `None` when a leg is missing or the result is not a
/// positive finite number.
pub fn cross_rate(rates: &RateTable, base: &str, quote: &str) -> Option<f64> {
    let leg = |code: &str| -> Option<f64> {
        if code == "USD" {
            Some(1.0)
        } else {
            rates.get(code).copied()
        }
    };

    let rate = match (base, quote) {
        ("USD", quote) => leg(quote)?,
        (base, "USD") => 1.0 / leg(base)?,
        (base, quote) => leg(quote)? / leg(base)?,
    };
    (rate.is_finite() && rate > 0.0).then_some(rate)
}

/// Builds every catalogue pair the table can price, with mocked daily figures.
///
/// Change is uniform in [-2, 2] %; volume depends on the pair type; high and
/// low bracket the rate by the change magnitude plus 0.1 %.
pub fn derive_pairs(rates: &RateTable, rng: &mut impl Rng) -> Vec<ForexPair> {
    CATALOGUE
        .iter()
        .filter_map(|&(base, quote, name, kind)| {
            let pair = format!("{base}/{quote}");
            let Some(rate) = cross_rate(rates, base, quote) else {
                debug!("dropping {pair}: no usable rate");
                return None;
            };

            let change: f64 = rng.random_range(-2.0..=2.0);
            let volume: f64 = match kind {
                PairType::Major => rng.random_range(500_000.0..1_000_000.0),
                PairType::Minor => rng.random_range(200_000.0..500_000.0),
                PairType::Exotic => rng.random_range(50_000.0..150_000.0),
            };
            let spread = change.abs() / 100.0 + 0.001;

            Some(ForexPair {
                pair,
                base: base.to_string(),
                quote: quote.to_string(),
                name: name.to_string(),
                kind,
                rate,
                change: round_to(change, 2),
                volume: volume.round() as u64,
                high: round_to(rate * (1.0 + spread), 4),
                low: round_to(rate * (1.0 - spread), 4),
            })
        })
        .collect()
}

fn round_to(value: f64, places: i32) -> f64 {
    let scale = 10f64.powi(places);
    (value * scale).round() / scale
}

/// The most traded pair; the first one wins a tie.
pub fn most_active(pairs: &[ForexPair]) -> Option<&ForexPair> {
    pairs
        .iter()
        .reduce(|most, current| if current.volume > most.volume { current } else { most })
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Static quotes served when every provider is unavailable.
pub fn demo_pairs() -> Vec<ForexPair> {
    [
        ("EUR", "USD", 1.0850, 0.25, 850_000, 1.0872, 1.0821),
        ("GBP", "USD", 1.2650, -0.15, 720_000, 1.2678, 1.2623),
        ("USD", "JPY", 148.25, 0.42, 950_000, 148.67, 147.89),
        ("USD", "CHF", 0.8820, -0.33, 480_000, 0.8845, 0.8792),
        ("AUD", "USD", 0.6520, 0.18, 550_000, 0.6543, 0.6491),
        ("USD", "CAD", 1.3520, -0.27, 520_000, 1.3556, 1.3498),
        ("NZD", "USD", 0.6120, 0.31, 380_000, 0.6145, 0.6092),
        ("EUR", "GBP", 0.8570, 0.12, 320_000, 0.8589, 0.8551),
        ("EUR", "JPY", 160.85, 0.67, 450_000, 161.23, 160.12),
        ("GBP", "JPY", 187.45, 0.28, 420_000, 187.89, 186.78),
        ("EUR", "CAD", 1.4670, -0.15, 280_000, 1.4698, 1.4634),
        ("AUD", "JPY", 96.75, 0.52, 350_000, 97.12, 96.23),
        ("GBP", "CAD", 1.7120, -0.08, 290_000, 1.7156, 1.7089),
        ("USD", "SGD", 1.3420, 0.05, 120_000, 1.3445, 1.3398),
        ("USD", "HKD", 7.8120, -0.02, 150_000, 7.8145, 7.8098),
        ("USD", "SEK", 10.4520, 0.35, 98_000, 10.4789, 10.4234),
        ("USD", "NOK", 10.8920, 0.28, 85_000, 10.9178, 10.8656),
        ("USD", "MXN", 17.2450, -0.45, 110_000, 17.2890, 17.2012),
        ("USD", "ZAR", 18.8920, 0.82, 75_000, 19.0123, 18.7567),
    ]
    .into_iter()
    .filter_map(|(base, quote, rate, change, volume, high, low)| {
        let &(_, _, name, kind) = CATALOGUE.iter().find(|c| c.0 == base && c.1 == quote)?;
        Some(ForexPair {
            pair: format!("{base}/{quote}"),
            base: base.to_string(),
            quote: quote.to_string(),
            name: name.to_string(),
            kind,
            rate,
            change,
            volume,
            high,
            low,
        })
    })
    .collect()
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// `{ "rates": { "EUR": 0.92, ... } }`, as served by exchangerate.host and Frankfurter.
fn rates_field(value: Value) -> Option<RateTable> {
    numeric_entries(value.get("rates")?)
}

/// `{ "date": ..., "usd": { "eur": 0.92, ... } }`, as served by the currency-api CDN.
fn usd_field(value: Value) -> Option<RateTable> {
    numeric_entries(value.get("usd")?)
}

fn numeric_entries(object: &Value) -> Option<RateTable> {
    let object = object.as_object()?;
    Some(
        object
            .iter()
            .filter_map(|(code, rate)| Some((code.to_uppercase(), rate.as_f64()?)))
            .collect(),
    )
}
