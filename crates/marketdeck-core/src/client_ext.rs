use crate::api::{FetchError, Transport};
use crate::config::Config;
use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{error, trace};

/// Builds the shared HTTP client, identified by the configured user agent.
pub fn build_client(config: &Config) -> Result<Client> {
    let client = reqwest::ClientBuilder::new()
        .user_agent(&config.user_agent)
        .build()?;
    Ok(client)
}

/// [`Transport`] over [`reqwest::Client`].
///
/// [`reqwest::Client`]: https://docs.rs/reqwest/latest/reqwest/struct.Client.html
#[async_trait]
impl Transport for Client {
    async fn get_json(&self, url: &str) -> Result<Value, FetchError> {
        // query strings may carry API tokens
        let shown = url.split('?').next().unwrap_or(url);

        let response = self.get(url).send().await.map_err(|e| {
            error!("failed fetching response from {shown}");
            FetchError::Transport(e.without_url().to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body: Value = response.json().await.map_err(|e| {
            error!("failed deserializing from {shown}");
            FetchError::Decode(e.without_url().to_string())
        })?;

        trace!("{shown} answered {status}");
        Ok(body)
    }
}
