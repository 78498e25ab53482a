//! HTTP Client Module
//!
//! One shared `reqwest` client for the feed, the text-generation provider and
//! the messaging API. Every outbound call is a single attempt: a timeout or a
//! non-2xx status aborts the current unit of work, and the next scheduled or
//! manual invocation is the retry.

use std::time::Duration;
use reqwest::{Client, Response};
use tracing::debug;

use crate::config::Config;
use crate::error::{PipelineError, Result};

/// Configuration for the HTTP client
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Request timeout
    pub request_timeout: Duration,
    /// Connection timeout
    pub connect_timeout: Duration,
    /// User agent string
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(60),
            connect_timeout: Duration::from_secs(10),
            user_agent: format!("news-relay/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HttpClientConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            request_timeout: config.request_timeout(),
            ..Default::default()
        }
    }
}

/// Builds the shared outbound client
pub fn build_client(config: &HttpClientConfig) -> Result<Client> {
    let client = Client::builder()
        .timeout(config.request_timeout)
        .connect_timeout(config.connect_timeout)
        .user_agent(&config.user_agent)
        .gzip(true)
        .brotli(true)
        .build()?;
    Ok(client)
}

/// Turns a non-2xx response into `PipelineError::ApiError` carrying the body
pub async fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        debug!(status = %status, url = %response.url(), "Request succeeded");
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(PipelineError::ApiError {
        code: status.to_string(),
        message: body,
    })
}
