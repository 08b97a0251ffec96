//! Login failure records from `/api/history`

use serde::{Deserialize, Serialize};

use super::default_on_error;

/// Payload of `/api/history`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginHistory {
    #[serde(rename = "loginHistory", deserialize_with = "default_on_error")]
    pub login_history: Vec<LoginHistoryEntry>,
}

/// One failed Access login
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginHistoryEntry {
    #[serde(deserialize_with = "default_on_error")]
    pub dimensions: HistoryDimensions,
    #[serde(rename = "applicationName", deserialize_with = "default_on_error")]
    pub application_name: Option<String>,
}

/// Analytics dimensions attached to a login event
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryDimensions {
    #[serde(deserialize_with = "default_on_error")]
    pub datetime: Option<String>,
    /// 0 when the request did not pass through Gateway
    #[serde(rename = "hasGatewayEnabled", deserialize_with = "default_on_error")]
    pub has_gateway_enabled: Option<i64>,
    /// 0 when the WARP client was not connected
    #[serde(rename = "hasWarpEnabled", deserialize_with = "default_on_error")]
    pub has_warp_enabled: Option<i64>,
}
