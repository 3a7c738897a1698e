use crate::api::{DataMode, Transport};
use crate::config::Config;
use crate::pipeline::{self, ResultSet};
use crate::presenter::{Presenter, View};
use crate::query::{QueryState, Selection};
use crate::record::Record;
use crate::schema::{Loaded, Source};
use rand::Rng;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Bounds of the per-record multiplier applied on each drift tick.
pub const DRIFT_RANGE: (f64, f64) = (0.9995, 1.0005);

/// One discrete event delivered to a page.
#[derive(Debug)]
pub enum Action<R: Record> {
    Search(String),
    Sort(R::Sort),
    Filter(R::Dimension, Selection),
    LoadMore,
    ShowAll,
    /// Reload from the data source; a manual refresh also rewinds the cursor.
    Refresh { manual: bool },
    /// Nudge demo prices.
    Drift,
    /// Hand the record with this id to the bookmark handler.
    Bookmark(String),
    Quit,
}

/// The record set of one page, with its query and provenance.
#[derive(Debug)]
pub struct Page<R: Record> {
    records: Vec<R>,
    query: QueryState<R>,
    mode: DataMode,
}

impl<R: Record> Page<R> {
    pub fn new(loaded: Loaded<R>) -> Self {
        Self {
            records: loaded.records,
            query: QueryState::new(),
            mode: loaded.mode,
        }
    }

    pub fn records(&self) -> &[R] {
        &self.records
    }

    pub fn query(&self) -> &QueryState<R> {
        &self.query
    }

    pub fn query_mut(&mut self) -> &mut QueryState<R> {
        &mut self.query
    }

    pub fn mode(&self) -> &DataMode {
        &self.mode
    }

    pub fn result(&self) -> ResultSet<'_, R> {
        pipeline::run(&self.records, &self.query)
    }

    pub fn find(&self, id: &str) -> Option<&R> {
        self.records.iter().find(|record| record.id() == id)
    }

    /// Recomputes the pipeline and hands the view to `presenter`.
    pub fn present<P: Presenter<R>>(&self, presenter: &mut P) {
        let result = self.result();
        presenter.present(&View {
            result: &result,
            query: &self.query,
            mode: &self.mode,
        });
    }

    /// Swaps in a fresh record set; query state survives, the cursor only if asked.
    pub fn replace(&mut self, loaded: Loaded<R>, reset_cursor: bool) {
        self.records = loaded.records;
        self.mode = loaded.mode;
        if reset_cursor {
            self.query.reset_visible();
        }
    }

    /// Applies a random multiplier within [`DRIFT_RANGE`] to every record.
    ///
    /// Live data is left untouched; returns whether anything moved.
    pub fn drift(&mut self, rng: &mut impl Rng) -> bool {
        if !self.mode.is_demo() {
            return false;
        }
        let (low, high) = DRIFT_RANGE;
        for record in self.records.iter_mut() {
            record.drift(rng.random_range(low..=high));
        }
        true
    }

    /// Applies a query mutation; `false` for actions that are not query mutations.
    pub fn apply(&mut self, action: &Action<R>) -> bool {
        match action {
            Action::Search(term) => self.query.set_search(term),
            Action::Sort(sort) => self.query.set_sort(*sort),
            Action::Filter(dimension, selection) => {
                self.query.set_filter(*dimension, selection.clone())
            }
            Action::LoadMore => self.query.load_more(),
            Action::ShowAll => self.query.show_all(),
            _ => return false,
        }
        true
    }
}

/// A reload in flight, and whether it was asked for by hand.
type PendingLoad<'a, R> = (Pin<Box<dyn Future<Output = Loaded<R>> + Send + 'a>>, bool);

enum Event<R: Record> {
    Loaded(Loaded<R>),
    Action(Option<Action<R>>),
}

/// Drives a page from `actions` until [`Action::Quit`] or the channel closes.
///
/// Actions are handled one at a time. A refresh runs alongside them: query
/// mutations keep applying to the current records until the load settles and
/// replaces them. A refresh issued while one is in flight supersedes it. When
/// the channel closes, a pending load is still awaited and presented.
pub async fn run_page<R, P, F>(
    mut page: Page<R>,
    transport: &dyn Transport,
    config: &Config,
    mut actions: UnboundedReceiver<Action<R>>,
    presenter: &mut P,
    mut on_bookmark: F,
) -> Page<R>
where
    R: Source,
    P: Presenter<R>,
    F: FnMut(&R),
{
    let mut pending: Option<PendingLoad<'_, R>> = None;
    page.present(presenter);

    loop {
        let event = match pending.as_mut() {
            Some((load, _)) => tokio::select! {
                biased;
                loaded = load.as_mut() => Event::Loaded(loaded),
                action = actions.recv() => Event::Action(action),
            },
            None => Event::Action(actions.recv().await),
        };

        let action = match event {
            Event::Loaded(loaded) => {
                let manual = pending.take().is_some_and(|(_, manual)| manual);
                page.replace(loaded, manual);
                page.present(presenter);
                continue;
            }
            Event::Action(Some(action)) => action,
            Event::Action(None) => {
                if let Some((load, manual)) = pending.take() {
                    debug!("actions closed; waiting for the pending load");
                    page.replace(load.await, manual);
                    page.present(presenter);
                }
                break;
            }
        };

        debug!("{action:?}");
        if page.apply(&action) {
            page.present(presenter);
            continue;
        }

        match action {
            Action::Refresh { manual } => {
                info!("refreshing {} (manual: {manual})", R::NOUN);
                let manual = manual || pending.take().is_some_and(|(_, earlier)| earlier);
                pending = Some((R::load(transport, config), manual));
            }
            Action::Drift => {
                if page.drift(&mut rand::rng()) {
                    page.present(presenter);
                }
            }
            Action::Bookmark(id) => match page.find(&id) {
                Some(record) => on_bookmark(record),
                None => warn!("no record with id {id}"),
            },
            Action::Quit => break,
            _ => {}
        }
    }

    page
}

/// Sends `make()` into `actions` every `period`, starting one period from now.
///
/// The task ends when the receiving page goes away.
pub fn spawn_schedule<R, M>(actions: UnboundedSender<Action<R>>, period: Duration, make: M) -> JoinHandle<()>
where
    R: Record,
    M: Fn() -> Action<R> + Send + 'static,
{
    tokio::spawn(async move {
        let mut interval = time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // the first tick completes immediately
        interval.tick().await;

        loop {
            interval.tick().await;
            if actions.send(make()).is_err() {
                debug!("schedule stopped; page closed");
                break;
            }
        }
    })
}
