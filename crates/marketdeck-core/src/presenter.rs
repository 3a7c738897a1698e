use crate::api::DataMode;
use crate::pipeline::ResultSet;
use crate::query::QueryState;
use crate::record::Record;

/// Everything a presenter needs to draw one page state.
#[derive(Debug)]
pub struct View<'a, R: Record> {
    pub result: &'a ResultSet<'a, R>,
    pub query: &'a QueryState<R>,
    pub mode: &'a DataMode,
}

impl<'a, R: Record> View<'a, R> {
    pub fn visible(&self) -> &[&'a R] {
        self.result.visible()
    }

    /// Whether a "load more" control applies: records are hidden and the
    /// cursor is not unbounded.
    pub fn load_more(&self) -> bool {
        self.result.visible_len() < self.result.matched_len() && !self.query.shows_all()
    }

    pub fn summary(&self) -> String {
        R::summary(
            self.query,
            self.result.matched_len(),
            self.result.visible_len(),
        )
    }

    /// No record matched the current query.
    pub fn is_empty(&self) -> bool {
        self.result.is_empty()
    }
}

/// Renders a [`View`]; must not mutate the records or the query.
pub trait Presenter<R: Record> {
    fn present(&mut self, view: &View<'_, R>);
}
