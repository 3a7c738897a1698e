use crate::record::Record;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;

/// How many matched records the page currently shows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Visible {
    Count(usize),
    Unbounded,
}

impl Visible {
    /// Length of the visible prefix of `matched` records.
    pub fn take(&self, matched: usize) -> usize {
        match self {
            Visible::Count(n) => (*n).min(matched),
            Visible::Unbounded => matched,
        }
    }
}

/// Value of a categorical filter control.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Selection {
    All,
    Only(String),
}

impl Selection {
    /// Parses a control value, where `"all"` (any case) or an empty string clears the filter.
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if value.is_empty() || value.eq_ignore_ascii_case("all") {
            Selection::All
        } else {
            Selection::Only(value.to_string())
        }
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selection::All => f.write_str("all"),
            Selection::Only(value) => f.write_str(value),
        }
    }
}

/// Search, sort, filter and pagination state of one page.
///
/// Each mutator changes exactly one field; callers recompute the
/// [`ResultSet`](crate::pipeline::ResultSet) afterwards.
pub struct QueryState<R: Record> {
    search: String,
    sort: R::Sort,
    filters: HashMap<R::Dimension, String>,
    visible: Visible,
    _record: PhantomData<fn() -> R>,
}

impl<R: Record> QueryState<R> {
    pub fn new() -> Self {
        Self {
            search: String::new(),
            sort: R::Sort::default(),
            filters: HashMap::new(),
            visible: Visible::Count(R::PAGE_SIZE),
            _record: PhantomData,
        }
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn sort(&self) -> R::Sort {
        self.sort
    }

    pub fn visible(&self) -> Visible {
        self.visible
    }

    pub fn shows_all(&self) -> bool {
        self.visible == Visible::Unbounded
    }

    /// Current selection for `dimension`.
    pub fn filter(&self, dimension: R::Dimension) -> Selection {
        match self.filters.get(&dimension) {
            Some(value) => Selection::Only(value.clone()),
            None => Selection::All,
        }
    }

    /// Active (non-"all") filters.
    pub fn active_filters(&self) -> impl Iterator<Item = (R::Dimension, &str)> {
        self.filters.iter().map(|(dim, value)| (*dim, value.as_str()))
    }

    /// Stores the lowercased, trimmed search term.
    ///
    /// The visible cursor is left where it is.
    pub fn set_search(&mut self, term: &str) {
        self.search = term.trim().to_lowercase();
    }

    pub fn set_sort(&mut self, sort: R::Sort) {
        self.sort = sort;
    }

    pub fn set_filter(&mut self, dimension: R::Dimension, selection: Selection) {
        match selection {
            Selection::All => {
                self.filters.remove(&dimension);
            }
            Selection::Only(value) => {
                self.filters.insert(dimension, value);
            }
        }
    }

    /// Extends the cursor by one page; no-op once unbounded.
    pub fn load_more(&mut self) {
        if let Visible::Count(n) = self.visible {
            self.visible = Visible::Count(n.saturating_add(R::PAGE_SIZE));
        }
    }

    pub fn show_all(&mut self) {
        self.visible = Visible::Unbounded;
    }

    /// Sets an explicit cursor, clamped to at least one record.
    pub fn set_visible(&mut self, count: usize) {
        self.visible = Visible::Count(count.max(1));
    }

    /// Back to the domain's first page.
    pub fn reset_visible(&mut self) {
        self.visible = Visible::Count(R::PAGE_SIZE);
    }
}

impl<R: Record> Default for QueryState<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Record> Clone for QueryState<R> {
    fn clone(&self) -> Self {
        Self {
            search: self.search.clone(),
            sort: self.sort,
            filters: self.filters.clone(),
            visible: self.visible,
            _record: PhantomData,
        }
    }
}

impl<R: Record> fmt::Debug for QueryState<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryState")
            .field("search", &self.search)
            .field("sort", &self.sort)
            .field("filters", &self.filters)
            .field("visible", &self.visible)
            .finish()
    }
}
