//! # Domain Models
//!
//! Typed views of the JSON the portal backend returns.
//!
//! ## Graceful Degradation
//!
//! Every field defaults to its empty/false value when missing, `null` or of
//! the wrong type, so a partially populated payload still produces a usable
//! record. Posture rule entries that are not objects at all are skipped
//! individually (see [`PostureRuleSet::from_value`]).

pub mod history;
pub mod identity;
pub mod posture;

pub use history::{HistoryDimensions, LoginHistory, LoginHistoryEntry};
pub use identity::{DeviceRecord, IdentityRecord, OrganizationEnv, UserDetails};
pub use posture::{PostureRule, PostureRuleSet, RuleType};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Deserialize a single field leniently
///
/// `null` and values of the wrong shape both become the type's default, so one
/// bad field never discards the rest of its record.
pub(crate) fn default_on_error<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(T::default());
    }
    Ok(T::deserialize(value).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "unreadable field, using default");
        T::default()
    }))
}
