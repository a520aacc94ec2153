//! Upstream provider dispatch.
//!
//! One generic HTTP adapter serves every provider family; endpoint, auth
//! header and credential all come from the [`ProviderConfig`].
//!
//! ### Behaviour
//!
//! - **Request**: one `GET <endpoint>?<normalized query>`.
//! - **Authentication**: `Ocp-Apim-Subscription-Key` (Bing) or
//!   `X-Subscription-Token` (Brave).
//! - **Failures**: transport errors, non-2xx statuses and non-JSON bodies are
//!   logged and reported as `None`. No retries.

pub mod error;

pub use error::DispatchError;

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use edgesearch_core::{AppConfig, Category, NormalizedQuery, ProviderConfig, ProviderDispatcher};
use reqwest::header;

/// HTTP client settings shared by every provider.
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// User-agent header sent to every provider.
    pub user_agent: String,
    /// Transport timeout.
    pub timeout: Duration,
}

/// Same user agent and timeout as a default [`AppConfig`].
impl Default for DispatchConfig {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for DispatchConfig {
    fn from(config: &AppConfig) -> Self {
        Self { user_agent: config.user_agent.clone(), timeout: config.timeout() }
    }
}

/// reqwest-backed provider dispatcher.
#[derive(Debug, Clone)]
pub struct HttpDispatcher {
    http: reqwest::Client,
}

impl HttpDispatcher {
    /// Create a dispatcher with the given client settings.
    pub fn new(config: DispatchConfig) -> Result<Self, DispatchError> {
        let http = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| DispatchError::Network(Arc::new(e)))?;

        Ok(Self { http })
    }

    /// Call the provider and parse its body as JSON.
    ///
    /// This is the fallible core of [`ProviderDispatcher::fetch`].
    pub async fn try_fetch(
        &self, query: &NormalizedQuery, provider: &ProviderConfig,
    ) -> Result<serde_json::Value, DispatchError> {
        let start = Instant::now();

        let response = self
            .http
            .get(provider.request_url(query))
            .header(provider.family.auth_header(), &provider.credential)
            .header(header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        tracing::debug!(provider = %provider.family, status = status.as_u16(), "provider responded");

        if !status.is_success() {
            return Err(DispatchError::from_status(status.as_u16()));
        }

        let bytes = response.bytes().await?;
        let payload = serde_json::from_slice(&bytes).map_err(|e| DispatchError::Parse(e.to_string()))?;

        tracing::debug!(provider = %provider.family, elapsed = ?start.elapsed(), bytes = bytes.len(), "provider call completed");

        Ok(payload)
    }
}

#[async_trait]
impl ProviderDispatcher for HttpDispatcher {
    async fn fetch(
        &self, category: Category, query: &NormalizedQuery, provider: &ProviderConfig,
    ) -> Option<serde_json::Value> {
        match self.try_fetch(query, provider).await {
            Ok(payload) => Some(payload),
            Err(e) => {
                tracing::warn!(provider = %provider.family, category = %category, error = %e, "provider call failed");
                None
            }
        }
    }
}
