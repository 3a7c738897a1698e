use crate::query::QueryState;
use std::cmp::Ordering;
use std::fmt::Debug;
use std::hash::Hash;

/// A single entity on one of the pages (coin, stock, currency pair, article).
///
/// The pipeline is schema-agnostic: everything it needs to know about a domain
/// is exposed here, as searchable text, categorical dimensions and a comparator
/// per sort key.
pub trait Record: Clone + Debug + Send + Sync + 'static {
    /// Sort keys offered by the domain; `Default` is the page's initial sort.
    type Sort: Copy + Debug + Default + PartialEq + Send + Sync;

    /// Categorical dimensions usable as equality filters.
    type Dimension: Copy + Debug + Eq + Hash + Send + Sync;

    /// How far one "load more" extends the visible cursor.
    const PAGE_SIZE: usize = 20;

    /// Plural noun used in result summaries, e.g. "stocks".
    const NOUN: &'static str;

    /// Stable identifier within a record set.
    fn id(&self) -> &str;

    /// Text fields matched by the search term.
    fn search_fields(&self) -> Vec<&str>;

    /// The record's value along `dimension`.
    fn category(&self, dimension: Self::Dimension) -> &str;

    /// Order of `self` relative to `other` under `sort`, best first.
    ///
    /// Must be total; equal keys fall back to the domain's documented
    /// secondary key, or `Equal` to keep insertion order.
    fn compare(&self, other: &Self, sort: Self::Sort) -> Ordering;

    /// Multiplies every quoted price by `factor`; records without prices ignore it.
    fn drift(&mut self, _factor: f64) {}

    /// Human readable results line for the presenter.
    fn summary(query: &QueryState<Self>, matched: usize, visible: usize) -> String {
        if query.search().is_empty() {
            format!("Showing {visible} of {matched} {}", Self::NOUN)
        } else {
            format!(
                "Found {matched} {} matching \"{}\"",
                Self::NOUN,
                query.search()
            )
        }
    }
}

/// Descending float order, total over NaN.
pub fn desc(a: f64, b: f64) -> Ordering {
    b.total_cmp(&a)
}
