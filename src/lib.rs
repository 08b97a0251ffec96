//! access-help - Zero Trust access-denied help portal
//!
//! Core library: posture evaluation, session-bound fetching and the panel
//! views of the portal, independent of how the result is presented.

// Public modules
pub mod config;
pub mod constants;
pub mod core;
pub mod logger;
pub mod models;
pub mod normalize;
pub mod platform;
pub mod render;
pub mod utils;

// Re-export commonly used types
pub use config::PortalConfig;
pub use core::{PostureEvaluator, PostureReport, PostureSummary, SessionFetcher};
pub use models::{IdentityRecord, PostureRule, PostureRuleSet};
pub use utils::{ConfigError, PortalError, SessionError};
