use crate::config::Config;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tokio_stream::{self as stream, StreamExt};
use tracing::{debug, info, warn};

/// Why a single endpoint attempt was abandoned.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FetchError {
    #[error("HTTP {0}")]
    Status(u16),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("no response within {0:?}")]
    Timeout(Duration),

    #[error("undecodable body: {0}")]
    Decode(String),

    #[error("payload missing or empty")]
    Empty,
}

/// The HTTP seam; how a JSON document is **extracted** from some URL.
///
/// Implemented for [`reqwest::Client`] in [`crate::client_ext`].
#[async_trait]
pub trait Transport: Send + Sync {
    /// GET `url` and decode the body as JSON; non-2xx statuses are errors.
    async fn get_json(&self, url: &str) -> Result<Value, FetchError>;
}

/// One ranked source of a domain payload.
pub struct Endpoint<P> {
    pub name: String,
    pub url: String,

    /// Pulls the domain payload out of the provider's JSON; `None` when the
    /// expected shape is absent.
    pub parser: fn(Value) -> Option<P>,
}

impl<P> Endpoint<P> {
    pub fn new(name: impl Into<String>, url: impl Into<String>, parser: fn(Value) -> Option<P>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            parser,
        }
    }
}

impl<P> fmt::Debug for Endpoint<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("name", &self.name)
            .field("url", &self.url)
            .finish()
    }
}

/// Payloads that can be checked for emptiness before being accepted.
pub trait Payload {
    fn is_empty(&self) -> bool;
}

impl<T> Payload for Vec<T> {
    fn is_empty(&self) -> bool {
        Vec::is_empty(self)
    }
}

impl<K, V, S> Payload for HashMap<K, V, S> {
    fn is_empty(&self) -> bool {
        HashMap::is_empty(self)
    }
}

impl<K, V> Payload for BTreeMap<K, V> {
    fn is_empty(&self) -> bool {
        BTreeMap::is_empty(self)
    }
}

/// Outcome of [`fetch_with_fallback`].
#[derive(Debug)]
pub enum Fetched<P> {
    /// The first endpoint that produced a non-empty payload.
    Live { endpoint: String, payload: P },

    /// Every endpoint failed (or none were tried), in declared order.
    Unavailable { attempts: Vec<(String, FetchError)> },
}

impl<P> Fetched<P> {
    pub fn is_live(&self) -> bool {
        matches!(self, Fetched::Live { .. })
    }

    /// Takes the live payload, or `fallback()` with a [`DataMode::Demo`] explaining why.
    pub fn or_demo(self, fallback: impl FnOnce() -> P) -> (P, DataMode) {
        match self {
            Fetched::Live { endpoint, payload } => (payload, DataMode::Live { endpoint }),
            Fetched::Unavailable { attempts } => {
                let reason = if attempts.is_empty() {
                    "no live endpoint available".to_string()
                } else {
                    attempts
                        .iter()
                        .map(|(name, err)| format!("{name}: {err}"))
                        .collect::<Vec<_>>()
                        .join("; ")
                };
                (fallback(), DataMode::Demo { reason })
            }
        }
    }
}

/// Where the records currently on a page came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DataMode {
    Live { endpoint: String },
    Demo { reason: String },
}

impl DataMode {
    pub fn is_demo(&self) -> bool {
        matches!(self, DataMode::Demo { .. })
    }
}

impl fmt::Display for DataMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataMode::Live { endpoint } => write!(f, "Live data from {endpoint}"),
            DataMode::Demo { reason } => write!(f, "Using demo data (Live API unavailable: {reason})"),
        }
    }
}

/// Tries `endpoints` in declared order, one at a time, until one yields a
/// non-empty payload.
///
/// Each attempt is raced against `timeout`. Failures are logged and never
/// returned as errors; exhausting the list gives [`Fetched::Unavailable`].
pub async fn fetch_with_fallback<T, P>(
    transport: &T,
    endpoints: &[Endpoint<P>],
    timeout: Duration,
) -> Fetched<P>
where
    T: Transport + ?Sized,
    P: Payload,
{
    let mut attempts = Vec::with_capacity(endpoints.len());

    let mut stream = stream::iter(endpoints);
    while let Some(endpoint) = stream.next().await {
        debug!("trying {}", endpoint.name);
        match attempt(transport, endpoint, timeout).await {
            Ok(payload) => {
                info!("loaded data from {}", endpoint.name);
                return Fetched::Live {
                    endpoint: endpoint.name.clone(),
                    payload,
                };
            }
            Err(e) => {
                warn!("{} failed | {e}", endpoint.name);
                attempts.push((endpoint.name.clone(), e));
            }
        }
    }

    warn!("all {} endpoints unavailable", endpoints.len());
    Fetched::Unavailable { attempts }
}

/// [`fetch_with_fallback`] honouring the configured timeout and offline switch.
pub async fn fetch_configured<T, P>(
    transport: &T,
    endpoints: &[Endpoint<P>],
    config: &Config,
) -> Fetched<P>
where
    T: Transport + ?Sized,
    P: Payload,
{
    if config.offline {
        debug!("offline; skipping {} endpoints", endpoints.len());
        return Fetched::Unavailable { attempts: vec![] };
    }
    fetch_with_fallback(transport, endpoints, config.request_timeout).await
}

async fn attempt<T, P>(transport: &T, endpoint: &Endpoint<P>, timeout: Duration) -> Result<P, FetchError>
where
    T: Transport + ?Sized,
    P: Payload,
{
    let body = match tokio::time::timeout(timeout, transport.get_json(&endpoint.url)).await {
        Ok(result) => result?,
        Err(_) => return Err(FetchError::Timeout(timeout)),
    };

    match (endpoint.parser)(body) {
        Some(payload) if !payload.is_empty() => Ok(payload),
        _ => Err(FetchError::Empty),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    /// Scripted transport: each URL maps to a canned outcome, every request is recorded.
    pub(crate) struct Scripted {
        responses: HashMap<String, Result<Value, FetchError>>,
        stall: Option<String>,
        pub(crate) requested: Mutex<Vec<String>>,
    }

    impl Scripted {
        pub(crate) fn new() -> Self {
            Self {
                responses: HashMap::new(),
                stall: None,
                requested: Mutex::new(vec![]),
            }
        }

        pub(crate) fn respond(mut self, url: &str, outcome: Result<Value, FetchError>) -> Self {
            self.responses.insert(url.to_string(), outcome);
            self
        }

        /// Never answers `url`.
        pub(crate) fn stall(mut self, url: &str) -> Self {
            self.stall = Some(url.to_string());
            self
        }

        pub(crate) fn requested(&self) -> Vec<String> {
            self.requested.lock().expect("requested lock").clone()
        }
    }

    #[async_trait]
    impl Transport for Scripted {
        async fn get_json(&self, url: &str) -> Result<Value, FetchError> {
            self.requested.lock().expect("requested lock").push(url.to_string());
            if self.stall.as_deref() == Some(url) {
                std::future::pending::<()>().await;
            }
            self.responses
                .get(url)
                .cloned()
                .unwrap_or(Err(FetchError::Status(404)))
        }
    }

    fn rates(value: Value) -> Option<HashMap<String, f64>> {
        serde_json::from_value(value.get("rates")?.clone()).ok()
    }

    fn endpoints() -> Vec<Endpoint<HashMap<String, f64>>> {
        vec![
            Endpoint::new("a", "http://a", rates),
            Endpoint::new("b", "http://b", rates),
            Endpoint::new("c", "http://c", rates),
        ]
    }

    #[tokio::test]
    async fn second_endpoint_wins_after_a_500() {
        let transport = Scripted::new()
            .respond("http://a", Err(FetchError::Status(500)))
            .respond("http://b", Ok(json!({ "rates": { "EUR": 0.92 } })))
            .respond("http://c", Ok(json!({ "rates": { "EUR": 0.5 } })));

        match fetch_with_fallback(&transport, &endpoints(), Duration::from_secs(1)).await {
            Fetched::Live { endpoint, payload } => {
                assert_eq!(endpoint, "b");
                assert_eq!(payload.get("EUR"), Some(&0.92));
            }
            other => panic!("expected live data, got {other:?}"),
        }
        assert_eq!(transport.requested(), vec!["http://a", "http://b"]);
    }

    #[tokio::test]
    async fn empty_and_malformed_payloads_fall_through() {
        let transport = Scripted::new()
            .respond("http://a", Ok(json!({ "rates": {} })))
            .respond("http://b", Ok(json!({ "unexpected": true })))
            .respond("http://c", Err(FetchError::Decode("eof".into())));

        match fetch_with_fallback(&transport, &endpoints(), Duration::from_secs(1)).await {
            Fetched::Unavailable { attempts } => {
                let names: Vec<&str> = attempts.iter().map(|(n, _)| n.as_str()).collect();
                assert_eq!(names, vec!["a", "b", "c"]);
                assert_eq!(attempts[0].1, FetchError::Empty);
                assert_eq!(attempts[2].1, FetchError::Decode("eof".into()));
            }
            other => panic!("expected unavailable, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn a_stalled_endpoint_times_out() {
        let transport = Scripted::new()
            .stall("http://a")
            .respond("http://b", Ok(json!({ "rates": { "JPY": 148.25 } })));

        let fetched = fetch_with_fallback(&transport, &endpoints(), Duration::from_millis(5000)).await;
        assert!(fetched.is_live());

        let (payload, mode) = fetched.or_demo(HashMap::new);
        assert_eq!(payload.len(), 1);
        assert_eq!(mode, DataMode::Live { endpoint: "b".into() });
    }

    #[tokio::test]
    async fn unavailable_reports_demo_mode() {
        let transport = Scripted::new();
        let fetched = fetch_with_fallback(&transport, &endpoints(), Duration::from_secs(1)).await;
        let (payload, mode) = fetched.or_demo(|| HashMap::from([("EUR".to_string(), 1.0)]));
        assert_eq!(payload.len(), 1);
        assert!(mode.is_demo());
        assert!(mode.to_string().starts_with("Using demo data"));
    }

    #[tokio::test]
    async fn offline_config_skips_the_network() {
        let transport = Scripted::new().respond("http://a", Ok(json!({ "rates": { "EUR": 1.0 } })));
        let config = Config {
            offline: true,
            ..Config::default()
        };
        let fetched = fetch_configured(&transport, &endpoints(), &config).await;
        assert!(!fetched.is_live());
        assert!(transport.requested().is_empty());
    }
}
