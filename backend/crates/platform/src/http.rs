//! Outbound HTTP client
//!
//! Thin wrapper around `reqwest` for read-only JSON lookups against
//! third-party APIs. Every request carries a timeout, and failures are
//! classified so callers can tell "timed out" from "answered with garbage".

use std::time::Duration;

use serde::de::DeserializeOwned;

/// Default timeout for outbound calls
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Total request timeout (connect + headers + body)
    pub timeout: Duration,
    /// Value sent in the User-Agent header
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            user_agent: concat!("lottery-tracker/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Classified outbound request failure
#[derive(Debug, Clone, thiserror::Error)]
pub enum HttpError {
    #[error("Request to {url} timed out")]
    Timeout { url: String },

    #[error("Could not reach {url}: {message}")]
    Connect { url: String, message: String },

    #[error("{url} answered with HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("Response from {url} could not be decoded: {message}")]
    Decode { url: String, message: String },

    #[error("HTTP client could not be built: {0}")]
    Build(String),
}

impl HttpError {
    /// Whether the failure is a timeout
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Whether the remote side returned data we could not understand
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Decode { .. })
    }

    fn from_reqwest(url: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout {
                url: url.to_string(),
            }
        } else if err.is_decode() {
            Self::Decode {
                url: url.to_string(),
                message: err.to_string(),
            }
        } else {
            Self::Connect {
                url: url.to_string(),
                message: err.to_string(),
            }
        }
    }
}

/// JSON-over-HTTP client
#[derive(Debug, Clone)]
pub struct JsonClient {
    inner: reqwest::Client,
}

impl JsonClient {
    pub fn new(config: &HttpClientConfig) -> Result<Self, HttpError> {
        let inner = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| HttpError::Build(e.to_string()))?;

        Ok(Self { inner })
    }

    /// GET `url` and decode the body as `T`.
    ///
    /// ## Returns
    /// - `Ok(Some(T))` on a 2xx response with a decodable body
    /// - `Ok(None)` on 404, or a 2xx response with an empty body
    /// - `Err(HttpError)` for every other outcome
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<Option<T>, HttpError> {
        let response = self
            .inner
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| HttpError::from_reqwest(url, e))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            tracing::debug!(url = %url, "Resource not found upstream");
            return Ok(None);
        }
        if !status.is_success() {
            tracing::warn!(url = %url, status = status.as_u16(), "Upstream returned error status");
            return Err(HttpError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| HttpError::from_reqwest(url, e))?;

        if body.iter().all(u8::is_ascii_whitespace) {
            tracing::debug!(url = %url, "Upstream returned an empty body");
            return Ok(None);
        }

        serde_json::from_slice(&body)
            .map(Some)
            .map_err(|e| HttpError::Decode {
                url: url.to_string(),
                message: e.to_string(),
            })
    }
}
