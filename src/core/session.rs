//! Portal session abstraction
//!
//! This trait allows testing without a real backend by supporting mock implementations.
//! The HTTP implementation lives in `src/platform/`.

use serde_json::Value;

use crate::constants::MARKUP_CONTENT_TYPE;
use crate::utils::SessionError;

/// Whether a request may be answered from a cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CachePolicy {
    #[default]
    Default,
    /// Always go to the origin (`Cache-Control: no-store`)
    NoStore,
}

/// Response as seen at the transport boundary, before any interpretation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    /// Declared `Content-Type`, if any
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn new(status: u16, content_type: Option<&str>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            content_type: content_type.map(str::to_string),
            body: body.into(),
        }
    }

    /// 200 response with an `application/json` body
    pub fn json(value: &Value) -> Self {
        Self::new(200, Some("application/json"), value.to_string())
    }

    /// Response carrying a login page instead of data
    pub fn html(status: u16, body: &str) -> Self {
        Self::new(status, Some("text/html; charset=utf-8"), body)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status)
    }

    /// Whether the declared content type is markup rather than structured data
    pub fn is_markup(&self) -> bool {
        self.content_type
            .as_deref()
            .map(|ct| ct.to_ascii_lowercase().contains(MARKUP_CONTENT_TYPE))
            .unwrap_or(false)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn parse_json(&self) -> Result<Value, SessionError> {
        serde_json::from_slice(&self.body).map_err(|e| SessionError::Parse(e.to_string()))
    }
}

/// Session against the portal backend for the current user
///
/// Implementations carry whatever ambient credentials (cookies) the backend
/// expects; callers only deal in paths and absolute URLs.
#[async_trait::async_trait]
pub trait PortalSession: Send + Sync {
    /// Absolute URL of a backend path such as `/api/userdetails`
    fn endpoint(&self, path: &str) -> String;

    /// Issue a GET and return the raw response; only transport failures are errors
    async fn get(&self, url: &str, cache: CachePolicy) -> Result<RawResponse, SessionError>;
}

/// GET a backend path and decode it as JSON.
///
/// Non-2xx statuses and markup bodies are errors.
pub async fn get_json(session: &dyn PortalSession, path: &str) -> Result<Value, SessionError> {
    let url = session.endpoint(path);
    let response = session.get(&url, CachePolicy::Default).await?;

    if !response.is_success() {
        return Err(SessionError::Status(response.status));
    }
    if response.is_markup() {
        return Err(SessionError::StaleSession);
    }
    response.parse_json()
}
