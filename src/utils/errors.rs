//! Error types for access-help
//!
//! All error types use thiserror for clean error handling.
//! SECURITY: Error messages MUST NOT contain session cookies or tokens.

use std::time::Duration;

/// Top-level error type for page loads
#[derive(Debug, thiserror::Error)]
pub enum PortalError {
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Debug page is disabled")]
    DebugDisabled,

    #[error("Page reload budget exhausted after {0} reloads")]
    ReloadBudgetExhausted(u32),
}

/// Errors from fetches against the portal backend
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// Markup came back where structured data was expected
    #[error("Session expired or invalid response")]
    StaleSession,

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("HTTP status {0}")]
    Status(u16),

    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// Retries exhausted; a reload has been requested
    #[error("Session expired. Refreshing for a new session...")]
    SessionExpired,

    /// The hosting view was torn down while the fetch was pending
    #[error("View was torn down before the fetch completed")]
    Abandoned,
}

impl SessionError {
    /// Whether another attempt may succeed.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, SessionError::SessionExpired | SessionError::Abandoned)
    }
}

/// Errors from building the runtime configuration
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid URL for {key}: {value}")]
    InvalidUrl { key: String, value: String },

    #[error("Invalid number for {key}: {value}")]
    InvalidNumber { key: String, value: String },
}
