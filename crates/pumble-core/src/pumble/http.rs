//! HTTP transport for the Pumble API-keys addon.
//!
//! Every request goes to a fixed base URL and authenticates with the
//! `Api-Key` header. Non-2xx answers become [`CoreError::Transport`] carrying
//! the status and the raw body; nothing is retried.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::ACCEPT;
use serde_json::Value;

use crate::config::ApiConfig;
use crate::pumble::transport::{ApiRequest, Method, Transport};
use crate::{CoreError, Result};

/// Base URL of the Pumble API-keys addon.
pub const DEFAULT_BASE_URL: &str = "https://pumble-api-keys.addons.marketplace.cake.com";

/// Header carrying the API key.
const API_KEY_HEADER: &str = "Api-Key";

/// `reqwest`-backed [`Transport`].
#[derive(Clone)]
pub struct HttpTransport {
    http_client: Client,
    base_url: String,
    api_key: String,
}

impl HttpTransport {
    /// Create a transport for `base_url` authenticating with `api_key`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::MissingApiKey`] for a blank key, or an error if
    /// the HTTP client cannot be built.
    pub fn new(api_key: &str, base_url: &str, timeout: Duration) -> Result<Self> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(CoreError::MissingApiKey);
        }

        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CoreError::Http(format!("creating HTTP client: {e}")))?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    /// Create a transport from the `[api]` config section.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::MissingApiKey`] if no key is configured.
    pub fn from_config(api: &ApiConfig) -> Result<Self> {
        Self::new(
            api.api_key()?,
            &api.base_url,
            Duration::from_secs(api.timeout.max(1)),
        )
    }

    /// Base URL requests are sent to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> Result<Value> {
        let url = self.url(request.path);
        log::debug!("{} {url} ({})", request.method, request.operation);

        let mut builder = match request.method {
            Method::Get => self.http_client.get(&url),
            Method::Post => self.http_client.post(&url),
            Method::Delete => self.http_client.delete(&url),
        }
        .header(API_KEY_HEADER, self.api_key.as_str())
        .header(ACCEPT, "application/json");

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(ref body) = request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| CoreError::Http(format!("{} request failed: {e}", request.operation)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| CoreError::Http(format!("reading {} response: {e}", request.operation)))?;

        if !status.is_success() {
            log::debug!("{} failed with {status}", request.operation);
            return Err(CoreError::Transport {
                operation: request.operation.to_string(),
                status: status.as_u16(),
                body: text,
            });
        }

        decode_body(request.operation, &text)
    }
}

/// Decode a success body. An empty body decodes to `null`.
fn decode_body(operation: &str, text: &str) -> Result<Value> {
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(text)
        .map_err(|e| CoreError::Serialization(format!("parsing {operation} response: {e}")))
}
