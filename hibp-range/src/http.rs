//! `reqwest` range query against the Have I Been Pwned API or a relay.

use std::future::Future;
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::CONTENT_TYPE;
use tracing::debug;

use crate::error::TransportError;
use crate::fingerprint::RoutingPrefix;
use crate::matcher::RangeQuery;

/// Environment variable name for overriding the range API base URL.
pub const RANGE_URL_ENV: &str = "HIBP_RANGE_URL";

/// The public range API. Requests go to `{base}/range/{prefix}`.
pub const DEFAULT_RANGE_URL: &str = "https://api.pwnedpasswords.com";

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Longest upstream error body carried into [`TransportError::Status`].
const MAX_ERROR_BODY: usize = 256;

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Queries `{base_url}/range/{prefix}` over HTTP.
#[derive(Debug, Clone)]
pub struct HttpRangeClient {
    client: reqwest::Client,
    base_url: String,
    padding: bool,
}

impl HttpRangeClient {
    /// Creates a client with its own connection pool and the given timeout.
    ///
    /// Padding is on by default.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().user_agent(USER_AGENT).timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        Self { client, base_url, padding: true }
    }

    /// Asks the API to pad responses with zero-count decoy entries so the
    /// response size does not hint at the prefix.
    pub fn padding(mut self, enabled: bool) -> Self {
        self.padding = enabled;
        self
    }

    pub fn range_url(&self, prefix: RoutingPrefix) -> String {
        format!("{}/range/{}", self.base_url, prefix)
    }

    async fn fetch(&self, prefix: RoutingPrefix) -> Result<String, TransportError> {
        let url = self.range_url(prefix);

        let mut request = self.client.get(&url);
        if self.padding {
            request = request.header("Add-Padding", "true");
        }

        let response = request
            .send()
            .await
            .map_err(|e| TransportError::Unreachable { message: e.to_string() })?;

        let status = response.status();
        debug!(%prefix, status = status.as_u16(), "range response");

        if status != StatusCode::OK {
            let plain_text = response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|value| value.to_str().ok())
                .is_none_or(|value| value.starts_with("text/plain"));
            let body = response.text().await.unwrap_or_default();

            // Only short plain-text bodies are worth repeating; anything else
            // (an HTML error page, say) is replaced by the status reason.
            let message = match body.trim() {
                text if plain_text && !text.is_empty() && text.len() <= MAX_ERROR_BODY => {
                    text.to_owned()
                }
                _ => status.canonical_reason().unwrap_or("unexpected status").to_owned(),
            };
            return Err(TransportError::Status { status: status.as_u16(), message });
        }

        response.text().await.map_err(|e| TransportError::Unreachable { message: e.to_string() })
    }
}

impl RangeQuery for HttpRangeClient {
    fn range(
        &self,
        prefix: RoutingPrefix,
    ) -> impl Future<Output = Result<String, TransportError>> + Send {
        self.fetch(prefix)
    }
}
