//! Device posture rule records as returned by the portal backend

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use super::default_on_error;
use crate::constants::{CROWDSTRIKE_RULE_TYPE, OS_VERSION_RULE_TYPE};

/// Kind of a posture rule, derived from its `type` string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleType {
    CrowdstrikeS2s,
    OsVersion,
    Other,
}

impl RuleType {
    pub fn from_type_str(raw: &str) -> Self {
        match raw {
            CROWDSTRIKE_RULE_TYPE => RuleType::CrowdstrikeS2s,
            OS_VERSION_RULE_TYPE => RuleType::OsVersion,
            _ => RuleType::Other,
        }
    }
}

/// One named compliance check and its outcome
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostureRule {
    #[serde(deserialize_with = "default_on_error")]
    pub rule_name: String,
    /// Raw rule type (`crowdstrike_s2s`, `os_version`, ...)
    #[serde(rename = "type", deserialize_with = "default_on_error")]
    pub rule_type: String,
    #[serde(deserialize_with = "default_on_error")]
    pub success: bool,
    #[serde(deserialize_with = "default_on_error")]
    pub error: Option<String>,
    /// Evaluation time as sent by the backend (RFC 3339)
    #[serde(deserialize_with = "default_on_error")]
    pub timestamp: Option<String>,
    pub input: Value,
    #[serde(deserialize_with = "default_on_error")]
    pub description: Option<String>,
    /// Present only when the client actually evaluated the rule
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check: Option<Value>,
}

impl PostureRule {
    pub fn kind(&self) -> RuleType {
        RuleType::from_type_str(&self.rule_type)
    }

    /// Whether the rule was evaluated on the device
    pub fn was_checked(&self) -> bool {
        self.check.is_some()
    }

    /// Parsed evaluation time; `None` when absent or malformed
    pub fn parsed_timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamp
            .as_deref()
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }
}

/// Posture rules keyed by opaque rule id
///
/// Entries that cannot be read as a rule are skipped rather than failing the
/// whole set.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PostureRuleSet(BTreeMap<String, PostureRule>);

impl PostureRuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a rule set from loosely-typed JSON; anything but an object is empty.
    pub fn from_value(value: &Value) -> Self {
        let Some(map) = value.as_object() else {
            return Self::default();
        };

        let mut rules = BTreeMap::new();
        for (id, raw) in map {
            if !raw.is_object() {
                tracing::warn!(rule_id = %id, "skipping posture rule that is not an object");
                continue;
            }
            // fields degrade individually, so only a structural failure lands here
            match serde_json::from_value::<PostureRule>(raw.clone()) {
                Ok(rule) => {
                    rules.insert(id.clone(), rule);
                }
                Err(e) => {
                    tracing::warn!(rule_id = %id, error = %e, "skipping unreadable posture rule");
                }
            }
        }
        Self(rules)
    }

    pub fn insert(&mut self, id: impl Into<String>, rule: PostureRule) {
        self.0.insert(id.into(), rule);
    }

    pub fn get(&self, id: &str) -> Option<&PostureRule> {
        self.0.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &PostureRule)> {
        self.0.iter()
    }

    pub fn rules(&self) -> impl Iterator<Item = &PostureRule> {
        self.0.values()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, PostureRule)> for PostureRuleSet {
    fn from_iter<I: IntoIterator<Item = (String, PostureRule)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'de> Deserialize<'de> for PostureRuleSet {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(Self::from_value(&value))
    }
}
