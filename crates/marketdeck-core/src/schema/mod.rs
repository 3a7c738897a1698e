pub mod crypto;
pub mod forex;
pub mod news;
pub mod stock;

use crate::api::{DataMode, Transport};
use crate::config::Config;
use crate::record::Record;
use async_trait::async_trait;
use strum::{Display, EnumIter, EnumString};

/// A freshly loaded record set and where it came from.
#[derive(Clone, Debug)]
pub struct Loaded<R> {
    pub records: Vec<R>,
    pub mode: DataMode,
}

/// Domains that know how to fetch and normalize their own records.
#[async_trait]
pub trait Source: Record {
    /// Fetch with fallback and normalize; never fails, demo data is the floor.
    async fn load(transport: &dyn Transport, config: &Config) -> Loaded<Self>;
}

/// Sort keys shared by the crypto and stock pages.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum MarketSort {
    #[default]
    #[strum(to_string = "market_cap", serialize = "market-cap", serialize = "cap")]
    MarketCap,
    Price,
    Volume,
    Change,
}

/// The four pages.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Domain {
    Crypto,
    Stocks,
    Forex,
    News,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn sort_keys_parse_from_control_values() {
        assert_eq!(MarketSort::from_str("market_cap"), Ok(MarketSort::MarketCap));
        assert_eq!(MarketSort::from_str("Market-Cap"), Ok(MarketSort::MarketCap));
        assert_eq!(MarketSort::from_str("VOLUME"), Ok(MarketSort::Volume));
        assert!(MarketSort::from_str("popularity").is_err());
        assert_eq!(MarketSort::default().to_string(), "market_cap");
    }

    #[test]
    fn every_domain_round_trips_through_its_name() {
        for domain in Domain::iter() {
            assert_eq!(Domain::from_str(&domain.to_string()), Ok(domain));
        }
    }
}
