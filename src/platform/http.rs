//! HTTP portal session backed by reqwest
//!
//! Session cookies are kept in the client's cookie store for the lifetime of
//! the session, mirroring what a browser tab would hold.

use std::time::Duration;

use reqwest::header::{CACHE_CONTROL, CONTENT_TYPE, PRAGMA};

use crate::config::PortalConfig;
use crate::core::session::{CachePolicy, PortalSession, RawResponse};
use crate::utils::SessionError;

/// Real session against the portal backend
pub struct HttpPortalSession {
    client: reqwest::Client,
    base_url: String,
}

impl HttpPortalSession {
    /// Build a session from the runtime configuration
    pub fn new(config: &PortalConfig) -> Result<Self, SessionError> {
        Self::with_timeout(config.base_url.as_str(), config.request_timeout)
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, SessionError> {
        let client = reqwest::Client::builder()
            .user_agent(format!("access-help/{}", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .cookie_store(true)
            .build()
            .map_err(|e| SessionError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait::async_trait]
impl PortalSession for HttpPortalSession {
    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn get(&self, url: &str, cache: CachePolicy) -> Result<RawResponse, SessionError> {
        let mut request = self.client.get(url);
        if cache == CachePolicy::NoStore {
            request = request
                .header(CACHE_CONTROL, "no-store")
                .header(PRAGMA, "no-cache");
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                SessionError::Transport(format!("Request to {} timed out", url))
            } else {
                SessionError::Transport(format!("Request to {} failed: {}", url, e))
            }
        })?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response
            .bytes()
            .await
            .map_err(|e| SessionError::Transport(format!("Failed to read body: {}", e)))?;

        tracing::debug!(url, status, content_type = ?content_type, len = body.len(), "GET");

        Ok(RawResponse {
            status,
            content_type,
            body: body.to_vec(),
        })
    }
}
