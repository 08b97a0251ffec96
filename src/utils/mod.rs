//! # Utilities Module
//!
//! Cross-cutting concerns and shared functionality used throughout the application.
//!
//! ## Modules
//!
//! - [`errors`]: Typed error hierarchy using `thiserror` for domain-specific errors
//! - [`retry`]: Bounded, sequential retry with an injectable delay
//!
//! ## Design Notes
//!
//! Error types are defined in this module to avoid circular dependencies between
//! the `core` and `platform` modules. Fetch errors are classified once in
//! [`SessionError::is_retryable`]; stale sessions and transport failures are
//! retried, terminal conditions (session expired, view torn down) are not.

pub mod errors;
pub mod retry;

pub use errors::{ConfigError, PortalError, SessionError};
pub use retry::{retry_with_backoff, Delay, RecordingDelay, RetryConfig, TokioDelay};
