//! Identity, device and organization records from `/api/userdetails` and `/api/env`

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

use super::default_on_error;
use super::posture::PostureRuleSet;

/// The signed-in user as seen by the gateway
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityRecord {
    /// Authentication method references
    #[serde(deserialize_with = "default_on_error")]
    pub amr: BTreeSet<String>,
    /// `None` when the backend sent no group list at all
    #[serde(deserialize_with = "default_on_error")]
    pub groups: Option<Vec<String>>,
    #[serde(deserialize_with = "default_on_error")]
    pub gateway_account_id: String,
    #[serde(deserialize_with = "default_on_error")]
    pub name: String,
    #[serde(deserialize_with = "default_on_error")]
    pub email: String,
    #[serde(deserialize_with = "default_on_error")]
    pub is_warp: bool,
}

/// Device enrolled with the WARP client
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceRecord {
    #[serde(deserialize_with = "default_on_error")]
    pub model: String,
    #[serde(deserialize_with = "default_on_error")]
    pub name: String,
    #[serde(deserialize_with = "default_on_error")]
    pub os_version: String,
    #[serde(deserialize_with = "default_on_error")]
    pub gateway_device_id: String,
}

/// Payload of `/api/userdetails`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UserDetails {
    pub identity: IdentityRecord,
    pub posture: PostureRuleSet,
    pub device: DeviceRecord,
}

impl UserDetails {
    /// Read each section independently; an unreadable section falls back to
    /// its empty value instead of failing the whole payload.
    pub fn from_value(value: &Value) -> Self {
        let identity = section(value.get("identity"), "identity");
        let posture = value
            .get("posture")
            .and_then(|p| p.get("result"))
            .map(PostureRuleSet::from_value)
            .unwrap_or_default();
        let device = section(value.get("device").and_then(|d| d.get("result")), "device");

        Self {
            identity,
            posture,
            device,
        }
    }
}

/// Payload of `/api/env`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrganizationEnv {
    #[serde(rename = "ORGANIZATION_ID", deserialize_with = "default_on_error")]
    pub organization_id: String,
    #[serde(rename = "ORGANIZATION_NAME", deserialize_with = "default_on_error")]
    pub organization_name: String,
}

fn section<T>(value: Option<&Value>, label: &str) -> T
where
    T: Default + serde::de::DeserializeOwned,
{
    match value {
        None | Some(Value::Null) => T::default(),
        Some(raw) => serde_json::from_value(raw.clone()).unwrap_or_else(|e| {
            tracing::warn!(section = label, error = %e, "unreadable section, using defaults");
            T::default()
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_user_details_full_payload() {
        let details = UserDetails::from_value(&json!({
            "identity": {
                "amr": ["pwd", "swk"],
                "groups": ["Engineering", "VPN Users"],
                "gateway_account_id": "acc-123",
                "name": "Sam Doe",
                "email": "sam@example.com",
                "is_warp": true
            },
            "posture": {"result": {
                "r1": {"rule_name": "CrowdStrike", "type": "crowdstrike_s2s", "success": true}
            }},
            "device": {"result": {
                "model": "MacBookPro18,3",
                "name": "sam-laptop",
                "os_version": "14.4.1",
                "gateway_device_id": "C02XYZ"
            }}
        }));

        assert!(details.identity.amr.contains("swk"));
        assert_eq!(details.identity.groups.as_ref().map(Vec::len), Some(2));
        assert!(details.identity.is_warp);
        assert_eq!(details.posture.len(), 1);
        assert_eq!(details.device.model, "MacBookPro18,3");
        assert_eq!(details.device.gateway_device_id, "C02XYZ");
    }

    #[test]
    fn test_user_details_missing_sections_default() {
        let details = UserDetails::from_value(&json!({}));
        assert_eq!(details, UserDetails::default());
    }

    #[test]
    fn test_user_details_malformed_section_degrades() {
        let details = UserDetails::from_value(&json!({
            "identity": "oops",
            "device": {"result": {"model": null, "name": "kiosk"}}
        }));
        assert_eq!(details.identity, IdentityRecord::default());
        assert_eq!(details.device.model, "");
        assert_eq!(details.device.name, "kiosk");
    }

    #[test]
    fn test_wrong_typed_field_keeps_rest_of_identity() {
        let details = UserDetails::from_value(&json!({
            "identity": {"amr": ["swk"], "is_warp": "true", "groups": ["a"]}
        }));
        assert!(details.identity.amr.contains("swk"));
        assert!(!details.identity.is_warp);
        assert_eq!(details.identity.groups, Some(vec!["a".to_string()]));
    }

    #[test]
    fn test_groups_presence() {
        let empty = UserDetails::from_value(&json!({"identity": {"groups": []}}));
        assert_eq!(empty.identity.groups, Some(Vec::new()));

        let missing = UserDetails::from_value(&json!({"identity": {}}));
        assert_eq!(missing.identity.groups, None);

        let null = UserDetails::from_value(&json!({"identity": {"groups": null}}));
        assert_eq!(null.identity.groups, None);
    }

    #[test]
    fn test_organization_env_field_names() {
        let env: OrganizationEnv = serde_json::from_value(json!({
            "ORGANIZATION_ID": "acc-123",
            "ORGANIZATION_NAME": "Example Org"
        }))
        .unwrap();
        assert_eq!(env.organization_id, "acc-123");
        assert_eq!(env.organization_name, "Example Org");
    }
}
