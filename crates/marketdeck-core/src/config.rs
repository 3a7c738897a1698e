use anyhow::{Context, Result};
use dotenv::{dotenv, var};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

/// Runtime settings, read from the environment (and `.env`, if present).
#[derive(Clone)]
pub struct Config {
    pub user_agent: String,

    /// GNews token; without one the news page goes straight to demo data.
    pub news_api_key: Option<String>,

    /// Upper bound on a single endpoint attempt.
    pub request_timeout: Duration,

    pub bookmarks_path: PathBuf,

    /// Period of the scheduled reload in interactive sessions.
    pub refresh_every: Duration,

    /// Period of the demo price drift in interactive sessions.
    pub drift_every: Duration,

    /// Quiet window before a search term is applied.
    pub search_debounce: Duration,

    /// Skip the network entirely and serve demo data.
    pub offline: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            user_agent: format!("marketdeck/{}", env!("CARGO_PKG_VERSION")),
            news_api_key: None,
            request_timeout: Duration::from_millis(5000),
            bookmarks_path: PathBuf::from("./bookmarks.json"),
            refresh_every: Duration::from_secs(10 * 60),
            drift_every: Duration::from_secs(30),
            search_debounce: Duration::from_millis(300),
            offline: false,
        }
    }
}

impl Config {
    /// Loads `.env` and overlays any set variables on [`Config::default`].
    ///
    /// | Variable             | Field             |
    /// |----------------------|-------------------|
    /// | `USER_AGENT`         | `user_agent`      |
    /// | `NEWS_API_KEY`       | `news_api_key`    |
    /// | `REQUEST_TIMEOUT_MS` | `request_timeout` |
    /// | `BOOKMARKS_PATH`     | `bookmarks_path`  |
    /// | `REFRESH_SECS`       | `refresh_every`   |
    /// | `DRIFT_SECS`         | `drift_every`     |
    /// | `SEARCH_DEBOUNCE_MS` | `search_debounce` |
    pub fn from_env() -> Result<Self> {
        dotenv().ok();
        let mut config = Self::default();

        if let Ok(agent) = var("USER_AGENT") {
            config.user_agent = agent;
        }
        config.news_api_key = var("NEWS_API_KEY").ok().filter(|key| !key.trim().is_empty());
        if let Some(ms) = parsed::<u64>("REQUEST_TIMEOUT_MS")? {
            config.set_request_timeout_ms(ms);
        }
        if let Ok(path) = var("BOOKMARKS_PATH") {
            config.bookmarks_path = PathBuf::from(path);
        }
        if let Some(secs) = parsed::<u64>("REFRESH_SECS")? {
            config.refresh_every = Duration::from_secs(secs.max(1));
        }
        if let Some(secs) = parsed::<u64>("DRIFT_SECS")? {
            config.drift_every = Duration::from_secs(secs.max(1));
        }
        if let Some(ms) = parsed::<u64>("SEARCH_DEBOUNCE_MS")? {
            config.search_debounce = Duration::from_millis(ms);
        }

        debug!(
            "configuration loaded; news key set: {}, timeout: {:?}",
            config.news_api_key.is_some(),
            config.request_timeout
        );
        Ok(config)
    }
}

impl Config {
    /// Sets the per-endpoint timeout, clamped to at least one millisecond.
    pub fn set_request_timeout_ms(&mut self, ms: u64) {
        self.request_timeout = Duration::from_millis(ms.max(1));
    }
}

// the news key stays out of logs
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("user_agent", &self.user_agent)
            .field("news_api_key", &self.news_api_key.as_ref().map(|_| "<redacted>"))
            .field("request_timeout", &self.request_timeout)
            .field("bookmarks_path", &self.bookmarks_path)
            .field("refresh_every", &self.refresh_every)
            .field("drift_every", &self.drift_every)
            .field("search_debounce", &self.search_debounce)
            .field("offline", &self.offline)
            .finish()
    }
}

fn parsed<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .with_context(|| format!("{key} is not a valid number: {raw:?}")),
        Err(_) => Ok(None),
    }
}
