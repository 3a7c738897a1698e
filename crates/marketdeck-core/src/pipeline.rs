use crate::query::QueryState;
use crate::record::Record;

/// Output of one pipeline run: every match in display order, and the
/// length of the prefix currently on screen.
#[derive(Debug)]
pub struct ResultSet<'a, R> {
    matched: Vec<&'a R>,
    visible: usize,
}

impl<'a, R> ResultSet<'a, R> {
    pub fn matched(&self) -> &[&'a R] {
        &self.matched
    }

    pub fn visible(&self) -> &[&'a R] {
        &self.matched[..self.visible]
    }

    pub fn matched_len(&self) -> usize {
        self.matched.len()
    }

    pub fn visible_len(&self) -> usize {
        self.visible
    }

    pub fn is_empty(&self) -> bool {
        self.matched.is_empty()
    }
}

/// Runs search, categorical filters, sort and pagination over `records`.
///
/// Neither argument is mutated; the result borrows from `records`.
pub fn run<'a, R: Record>(records: &'a [R], query: &QueryState<R>) -> ResultSet<'a, R> {
    let mut matched: Vec<&R> = records
        .iter()
        .filter(|record| matches(*record, query))
        .collect();

    // stable: equal keys keep their load order
    let sort = query.sort();
    matched.sort_by(|a, b| a.compare(b, sort));

    let visible = query.visible().take(matched.len());
    ResultSet { matched, visible }
}

/// Whether `record` passes the search term and every active filter of `query`.
pub fn matches<R: Record>(record: &R, query: &QueryState<R>) -> bool {
    let term = query.search();
    if !term.is_empty()
        && !record
            .search_fields()
            .iter()
            .any(|field| field.to_lowercase().contains(term))
    {
        return false;
    }

    query
        .active_filters()
        .all(|(dimension, value)| record.category(dimension).eq_ignore_ascii_case(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::Selection;
    use crate::schema::crypto::{Crypto, CryptoSort};
    use crate::schema::forex::{self, ForexDimension, ForexSort};
    use crate::schema::news::{self, NewsSort};
    use crate::schema::stock::{self, StockDimension, StockSort};

    fn coins(n: usize) -> Vec<Crypto> {
        (0..n)
            .map(|i| Crypto {
                id: format!("coin-{i}"),
                symbol: format!("c{i}"),
                name: format!("Coin {i}"),
                price: 1.0 + i as f64,
                market_cap: ((i * 7) % n) as f64 * 1_000.0,
                volume: 10.0,
                change_24h: None,
            })
            .collect()
    }

    #[test]
    fn first_page_holds_the_largest_market_caps() {
        let records = coins(25);
        let query = QueryState::<Crypto>::new();
        let result = run(&records, &query);

        assert_eq!(result.matched_len(), 25);
        assert_eq!(result.visible_len(), 20);
        let caps: Vec<f64> = result.visible().iter().map(|c| c.market_cap).collect();
        let mut expected: Vec<f64> = records.iter().map(|c| c.market_cap).collect();
        expected.sort_by(|a, b| b.total_cmp(a));
        assert_eq!(caps, expected[..20].to_vec());
        assert!(result.visible_len() < result.matched_len());
    }

    #[test]
    fn search_is_a_case_insensitive_substring() {
        let records = vec![Crypto {
            id: "bitcoin".into(),
            symbol: "btc".into(),
            name: "Bitcoin".into(),
            price: 1.0,
            market_cap: 1.0,
            volume: 1.0,
            change_24h: Some(0.0),
        }];
        let mut query = QueryState::<Crypto>::new();
        query.set_search("BIT");
        assert_eq!(run(&records, &query).matched_len(), 1);
        query.set_search("coinbit");
        assert!(run(&records, &query).is_empty());
    }

    #[test]
    fn visible_is_bounded_by_the_cursor_and_the_matches() {
        let records = coins(25);
        let mut query = QueryState::<Crypto>::new();
        for _ in 0..3 {
            let result = run(&records, &query);
            assert_eq!(
                result.visible_len(),
                query.visible().take(result.matched_len())
            );
            assert!(result.matched_len() <= records.len());
            query.load_more();
        }
        query.show_all();
        assert_eq!(run(&records, &query).visible_len(), 25);
    }

    #[test]
    fn filtering_is_idempotent() {
        let records = stock::demo_stocks();
        let mut query = QueryState::<stock::Stock>::new();
        query.set_search("o");
        query.set_filter(StockDimension::Market, Selection::parse("nyse"));
        query.set_sort(StockSort::Change);

        let first: Vec<stock::Stock> = run(&records, &query)
            .matched()
            .iter()
            .map(|s| (*s).clone())
            .collect();
        let second = run(&first, &query);
        let a: Vec<&str> = first.iter().map(|s| s.symbol.as_str()).collect();
        let b: Vec<&str> = second.matched().iter().map(|s| s.symbol.as_str()).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn signed_change_sort_puts_losers_last() {
        let records = stock::demo_stocks();
        let mut query = QueryState::<stock::Stock>::new();
        query.set_sort(StockSort::Change);
        query.show_all();
        let result = run(&records, &query);
        assert_eq!(result.visible()[0].symbol, "NVDA");
        assert_eq!(result.visible().last().map(|s| s.symbol.as_str()), Some("UNH"));
    }

    #[test]
    fn usd_search_finds_every_dollar_pair() {
        let records = forex::demo_pairs();
        assert_eq!(records.len(), 19);
        let mut query = QueryState::<forex::ForexPair>::new();
        query.set_search("usd");
        query.show_all();
        let result = run(&records, &query);

        let codes: Vec<&str> = result.matched().iter().map(|p| p.pair.as_str()).collect();
        for code in ["EUR/USD", "USD/JPY", "AUD/USD"] {
            assert!(codes.contains(&code), "{code} missing from {codes:?}");
        }
        let expected = records
            .iter()
            .filter(|p| p.pair.contains("USD") || p.name.to_lowercase().contains("usd"))
            .count();
        assert_eq!(result.matched_len(), expected);
        assert!(!codes.contains(&"EUR/GBP"));
    }

    #[test]
    fn popularity_ranks_pair_type_then_volume() {
        let records = forex::demo_pairs();
        let mut query = QueryState::<forex::ForexPair>::new();
        query.set_sort(ForexSort::Popularity);
        query.show_all();
        let result = run(&records, &query);
        let head: Vec<&str> = result.visible()[..2].iter().map(|p| p.pair.as_str()).collect();
        assert_eq!(head, vec!["USD/JPY", "EUR/USD"]);

        let ranks: Vec<u8> = result.visible().iter().map(|p| p.kind.rank()).collect();
        assert!(ranks.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn change_sort_uses_magnitude_for_forex() {
        let records = forex::demo_pairs();
        let mut query = QueryState::<forex::ForexPair>::new();
        query.set_sort(ForexSort::Change);
        query.set_filter(ForexDimension::PairType, Selection::parse("major"));
        let result = run(&records, &query);
        let moves: Vec<f64> = result.visible().iter().map(|p| p.change.abs()).collect();
        assert!(moves.windows(2).all(|w| w[0] >= w[1]));
        assert_eq!(result.visible()[0].pair, "USD/JPY");
    }

    #[test]
    fn comparators_are_antisymmetric() {
        let records = news::demo_articles(chrono::Utc::now());
        for sort in [NewsSort::Latest, NewsSort::Trending, NewsSort::Popular] {
            for a in &records {
                for b in &records {
                    assert_eq!(a.compare(b, sort), b.compare(a, sort).reverse());
                }
            }
        }
        let pairs = forex::demo_pairs();
        for a in &pairs {
            for b in &pairs {
                assert_eq!(
                    a.compare(b, ForexSort::Popularity),
                    b.compare(a, ForexSort::Popularity).reverse()
                );
            }
        }
    }

    #[test]
    fn equal_keys_keep_load_order() {
        let mut records = coins(5);
        for coin in records.iter_mut() {
            coin.price = 3.0;
        }
        let mut query = QueryState::<Crypto>::new();
        query.set_sort(CryptoSort::Price);
        let ids: Vec<&str> = run(&records, &query)
            .visible()
            .iter()
            .map(|c| c.id.as_str())
            .collect();
        assert_eq!(ids, vec!["coin-0", "coin-1", "coin-2", "coin-3", "coin-4"]);
    }
}
