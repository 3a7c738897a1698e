use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{trace, warn};

/// Coalesces bursts of values, forwarding only the last one once the input
/// has been quiet for a full window.
///
/// ```rust,ignore
/// let searches = Debouncer::spawn(Duration::from_millis(300), move |term| {
///     let _ = actions.send(Action::Search(term));
/// });
/// searches.send("bit".to_string());
/// ```
pub struct Debouncer<T> {
    tx: UnboundedSender<T>,
    task: JoinHandle<()>,
}

impl<T: Send + 'static> Debouncer<T> {
    /// Spawns the debouncing task on the current runtime; `emit` receives each settled value.
    pub fn spawn<F>(quiet: Duration, emit: F) -> Self
    where
        F: FnMut(T) + Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(settle(rx, quiet, emit));
        Self { tx, task }
    }

    /// Queues `value`, restarting the quiet window. `false` once the task has stopped.
    pub fn send(&self, value: T) -> bool {
        self.tx.send(value).is_ok()
    }

    /// Stops accepting values and flushes the pending one, if any.
    pub async fn close(self) {
        drop(self.tx);
        if let Err(e) = self.task.await {
            warn!("debounce task ended abnormally | {e}");
        }
    }
}

async fn settle<T, F>(mut rx: UnboundedReceiver<T>, quiet: Duration, mut emit: F)
where
    F: FnMut(T),
{
    let mut pending: Option<T> = None;
    loop {
        match pending.take() {
            None => match rx.recv().await {
                Some(value) => pending = Some(value),
                None => break,
            },
            Some(value) => match tokio::time::timeout(quiet, rx.recv()).await {
                Ok(Some(newer)) => {
                    trace!("superseded within the quiet window");
                    pending = Some(newer);
                }
                Ok(None) => {
                    emit(value);
                    break;
                }
                Err(_) => emit(value),
            },
        }
    }
}
