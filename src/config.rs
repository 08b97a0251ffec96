//! Runtime configuration
//!
//! Defaults come from [`crate::constants`]; each value can be overridden by an
//! `ACCESS_HELP_*` environment variable and then by command-line flags.

use std::time::Duration;
use url::Url;

use crate::constants::{
    DEFAULT_BASE_URL, DEFAULT_MAX_RELOADS, DEFAULT_MAX_RETRIES, DEFAULT_TRACE_URL,
    RELOAD_DELAY_MS, REQUEST_TIMEOUT_SECS, RETRY_DELAY_MS,
};
use crate::utils::{ConfigError, RetryConfig};

pub const ENV_BASE_URL: &str = "ACCESS_HELP_BASE_URL";
pub const ENV_TRACE_URL: &str = "ACCESS_HELP_TRACE_URL";
pub const ENV_MAX_RETRIES: &str = "ACCESS_HELP_MAX_RETRIES";
pub const ENV_RETRY_DELAY_MS: &str = "ACCESS_HELP_RETRY_DELAY_MS";
pub const ENV_RELOAD_DELAY_MS: &str = "ACCESS_HELP_RELOAD_DELAY_MS";
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "ACCESS_HELP_REQUEST_TIMEOUT_SECS";
pub const ENV_MAX_RELOADS: &str = "ACCESS_HELP_MAX_RELOADS";
pub const ENV_DEBUG: &str = "ACCESS_HELP_DEBUG";

/// Settings shared by every page load
#[derive(Debug, Clone, PartialEq)]
pub struct PortalConfig {
    /// Origin of the portal backend (`/api/*`, `/assets/*`)
    pub base_url: Url,
    /// Public trace endpoint used for the WARP probe
    pub trace_url: Url,
    /// Retry budget and interval for session-bound fetches
    pub retry: RetryConfig,
    /// Wait between reporting an expired session and reloading
    pub reload_delay: Duration,
    /// Deadline for a single HTTP request
    pub request_timeout: Duration,
    /// Full page reloads allowed before giving up
    pub max_reloads: u32,
    /// Whether the debug page is reachable
    pub debug_enabled: bool,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base URL is valid"),
            trace_url: Url::parse(DEFAULT_TRACE_URL).expect("default trace URL is valid"),
            retry: RetryConfig::fixed(
                DEFAULT_MAX_RETRIES,
                Duration::from_millis(RETRY_DELAY_MS),
            ),
            reload_delay: Duration::from_millis(RELOAD_DELAY_MS),
            request_timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
            max_reloads: DEFAULT_MAX_RELOADS,
            debug_enabled: false,
        }
    }
}

impl PortalConfig {
    /// Build from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (environment, test fixture, ...)
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_BASE_URL) {
            config.base_url = parse_url(ENV_BASE_URL, &raw)?;
        }
        if let Some(raw) = lookup(ENV_TRACE_URL) {
            config.trace_url = parse_url(ENV_TRACE_URL, &raw)?;
        }
        if let Some(raw) = lookup(ENV_MAX_RETRIES) {
            config.retry.max_retries = parse_number(ENV_MAX_RETRIES, &raw)? as u32;
        }
        if let Some(raw) = lookup(ENV_RETRY_DELAY_MS) {
            let delay = Duration::from_millis(parse_number(ENV_RETRY_DELAY_MS, &raw)?);
            config.retry = RetryConfig::fixed(config.retry.max_retries, delay);
        }
        if let Some(raw) = lookup(ENV_RELOAD_DELAY_MS) {
            config.reload_delay = Duration::from_millis(parse_number(ENV_RELOAD_DELAY_MS, &raw)?);
        }
        if let Some(raw) = lookup(ENV_REQUEST_TIMEOUT_SECS) {
            config.request_timeout =
                Duration::from_secs(parse_number(ENV_REQUEST_TIMEOUT_SECS, &raw)?);
        }
        if let Some(raw) = lookup(ENV_MAX_RELOADS) {
            config.max_reloads = parse_number(ENV_MAX_RELOADS, &raw)? as u32;
        }
        if let Some(raw) = lookup(ENV_DEBUG) {
            config.debug_enabled = parse_flag(&raw);
        }

        Ok(config)
    }

    /// Override the backend origin
    pub fn with_base_url(mut self, raw: &str) -> Result<Self, ConfigError> {
        self.base_url = parse_url("--base-url", raw)?;
        Ok(self)
    }
}

fn parse_url(key: &str, raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw.trim()).map_err(|_| ConfigError::InvalidUrl {
        key: key.to_string(),
        value: raw.to_string(),
    })
}

fn parse_number(key: &str, raw: &str) -> Result<u64, ConfigError> {
    raw.trim()
        .parse::<u64>()
        .ok()
        .filter(|n| *n <= u32::MAX as u64)
        .ok_or_else(|| ConfigError::InvalidNumber {
            key: key.to_string(),
            value: raw.to_string(),
        })
}

fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
