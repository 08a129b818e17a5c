//! reqwest-backed response source.
//!
//! # Security Note - Logging
//!
//! The bearer token is held in a `SecretBox` and only exposed while building
//! the Authorization header. `Debug` output never includes it.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, header};
use secrecy::{ExposeSecret, SecretBox};
use url::Url;

use super::{ResponsePage, ResponseSource};
use crate::config::Config;
use crate::error::{FeedError, Result};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Maximum number of body bytes quoted in an HTTP error message.
const ERROR_BODY_LIMIT: usize = 200;

/// HTTP client for the analysis backend.
pub struct HttpResponseSource {
    client: Client,
    base_url: Url,
    token: Option<SecretBox<String>>,
}

impl fmt::Debug for HttpResponseSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpResponseSource")
            .field("base_url", &self.base_url.as_str())
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl HttpResponseSource {
    /// Create a source from configuration.
    ///
    /// Uses a 10s connect timeout and the configured total request timeout.
    pub fn from_config(config: &Config) -> Result<Self> {
        let base = config.backend_url().ok_or_else(|| {
            FeedError::Config(
                "backend URL not configured. Set CONSULT_FEED_BACKEND_URL or run: consult-feed config set backend_url <url>"
                    .to_string(),
            )
        })?;
        let mut source = Self::new(&base, config.request_timeout())?;
        source.token = config.api_token().map(|t| SecretBox::new(Box::new(t)));
        Ok(source)
    }

    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;
        Self::with_client(base_url, client)
    }

    /// Use a preconfigured client against `base_url`.
    pub fn with_client(base_url: &str, client: Client) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| FeedError::Config(format!("invalid backend URL '{base_url}': {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(FeedError::Config(format!(
                "backend URL '{base_url}' cannot be used as a base"
            )));
        }

        Ok(Self {
            client,
            base_url,
            token: None,
        })
    }

    pub fn with_token(mut self, token: String) -> Self {
        self.token = Some(SecretBox::new(Box::new(token)));
        self
    }

    /// Join an endpoint path and query onto the base URL, keeping any path
    /// prefix the base already has.
    fn endpoint(&self, path: &str, query: &str) -> Url {
        let mut url = self.base_url.clone();
        let prefix = url.path().trim_end_matches('/').to_string();
        url.set_path(&format!("{prefix}{path}"));
        url.set_query((!query.is_empty()).then_some(query));
        url
    }
}

#[async_trait]
impl ResponseSource for HttpResponseSource {
    async fn fetch_page(&self, path: &str, query: &str) -> Result<ResponsePage> {
        let url = self.endpoint(path, query);

        let mut request = self
            .client
            .get(url)
            .header(header::ACCEPT, header::HeaderValue::from_static("application/json"));
        if let Some(token) = &self.token {
            request = request.bearer_auth(token.expose_secret());
        }

        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = if body.trim().is_empty() {
                status.canonical_reason().unwrap_or("Unknown").to_string()
            } else {
                body.chars().take(ERROR_BODY_LIMIT).collect()
            };
            return Err(FeedError::Http {
                status: status.as_u16(),
                message,
            });
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| FeedError::MalformedResponse(e.to_string()))
    }
}
