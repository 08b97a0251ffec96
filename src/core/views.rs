//! View functions for the portal panels
//!
//! Each view fetches one or two backend endpoints through a [`PortalSession`]
//! and maps the JSON onto a typed panel model. Views catch their own errors:
//! the result is always a [`ViewOutcome`], never a propagated error.
//!
//! # Architecture
//!
//! Views are designed to:
//! - Accept a PortalSession trait object (enabling mocking in tests)
//! - Take the page's [`Precondition`] explicitly instead of probing WARP themselves
//! - Degrade missing fields to empty values rather than failing

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use super::fetcher::{SessionFetchState, SessionFetcher};
use super::posture::{PostureEvaluator, PostureReport};
use super::precondition::Precondition;
use super::session::{get_json, CachePolicy, PortalSession};
use crate::constants::{
    DEFAULT_VISIBLE_GROUPS, ENV_PATH, HISTORY_DISPLAY_LIMIT, HISTORY_PATH, LOGO_PATH,
    UNKNOWN_APPLICATION, USER_DETAILS_PATH,
};
use crate::models::{
    HistoryDimensions, LoginHistory, OrganizationEnv, PostureRuleSet, UserDetails,
};
use crate::normalize::filter_groups;
use crate::utils::SessionError;

/// Result of loading one panel
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum ViewOutcome<T> {
    Ready(T),
    /// WARP is not connected; the panel asks the user to enable it
    Unavailable,
    /// The panel could not be loaded; carries the user-facing message
    Failed(String),
}

impl<T> ViewOutcome<T> {
    pub fn ready(&self) -> Option<&T> {
        match self {
            ViewOutcome::Ready(value) => Some(value),
            _ => None,
        }
    }
}

async fn user_details(session: &dyn PortalSession) -> Result<UserDetails, String> {
    get_json(session, USER_DETAILS_PATH)
        .await
        .map(|value| UserDetails::from_value(&value))
        .map_err(|e| e.to_string())
}

// ==================== WARP information ====================

/// WARP information panel
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WarpInfoView {
    pub user_name: String,
    pub user_email: String,
    pub is_warp_enabled: bool,
    pub gateway_account_id: String,
    pub organization_name: String,
    /// The device is enrolled in the organization this portal serves
    pub is_in_org: bool,
}

pub async fn warp_info_view(
    session: &dyn PortalSession,
    precondition: &Precondition,
) -> ViewOutcome<WarpInfoView> {
    if !precondition.is_met() {
        return ViewOutcome::Unavailable;
    }

    let (env, details) = futures::join!(get_json(session, ENV_PATH), user_details(session));
    let env: OrganizationEnv = match env {
        Ok(value) => serde_json::from_value(value).unwrap_or_default(),
        Err(e) => {
            tracing::warn!(error = %e, "failed to fetch organization env");
            return ViewOutcome::Failed(
                "Error fetching WARP or user data. Please try again later.".to_string(),
            );
        }
    };
    let details = match details {
        Ok(details) => details,
        Err(e) => {
            tracing::warn!(error = %e, "failed to fetch user details");
            return ViewOutcome::Failed(
                "Error fetching WARP or user data. Please try again later.".to_string(),
            );
        }
    };

    let identity = details.identity;
    let is_in_org = identity.gateway_account_id == env.organization_id;
    tracing::info!(is_in_org, "warp info loaded");

    ViewOutcome::Ready(WarpInfoView {
        user_name: identity.name,
        user_email: identity.email,
        is_warp_enabled: identity.is_warp,
        gateway_account_id: identity.gateway_account_id,
        organization_name: env.organization_name,
        is_in_org,
    })
}

// ==================== Device information ====================

/// Device information panel
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceInfoView {
    pub model: String,
    pub name: String,
    pub os_version: String,
    /// Gateway device id, shown as the serial number
    pub serial_number: String,
}

pub async fn device_info_view(
    session: &dyn PortalSession,
    precondition: &Precondition,
) -> ViewOutcome<DeviceInfoView> {
    match precondition {
        Precondition::Met => {}
        Precondition::Unmet => return ViewOutcome::Unavailable,
        Precondition::ProbeFailed(_) => {
            return ViewOutcome::Failed(
                "Error fetching WARP status. Please try again later.".to_string(),
            )
        }
    }

    match user_details(session).await {
        Ok(details) => {
            let device = details.device;
            ViewOutcome::Ready(DeviceInfoView {
                model: device.model,
                name: device.name,
                os_version: device.os_version,
                serial_number: device.gateway_device_id,
            })
        }
        Err(e) => {
            tracing::warn!(error = %e, "failed to fetch device data");
            ViewOutcome::Failed("Device information unavailable.".to_string())
        }
    }
}

// ==================== Posture ====================

/// Posture panel; an unmet precondition yields a report with every check unavailable
pub async fn posture_view(
    session: &dyn PortalSession,
    precondition: &Precondition,
) -> ViewOutcome<PostureReport> {
    if !precondition.is_met() {
        return ViewOutcome::Ready(PostureReport::unavailable());
    }

    match user_details(session).await {
        Ok(details) => {
            let summary = PostureEvaluator::evaluate(&details.posture, &details.identity);
            tracing::debug!(?summary, "posture evaluated");
            ViewOutcome::Ready(PostureReport::from_summary(precondition, &summary))
        }
        Err(e) => {
            tracing::warn!(error = %e, "failed to fetch posture data");
            ViewOutcome::Failed("Error fetching posture data. Please try again later.".to_string())
        }
    }
}

// ==================== Login history ====================

/// Why a login was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FailureReason {
    Gateway,
    #[serde(rename = "WARP")]
    Warp,
    Other,
}

impl FailureReason {
    pub fn from_dimensions(dimensions: &HistoryDimensions) -> Self {
        if dimensions.has_gateway_enabled == Some(0) {
            FailureReason::Gateway
        } else if dimensions.has_warp_enabled == Some(0) {
            FailureReason::Warp
        } else {
            FailureReason::Other
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FailureReason::Gateway => "Gateway",
            FailureReason::Warp => "WARP",
            FailureReason::Other => "Other",
        }
    }
}

/// One row of the history table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryRow {
    pub date: String,
    pub time: String,
    pub application_name: String,
    pub reason: FailureReason,
}

/// Recent login failures; `None` when there are none to show
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryView {
    pub entries: Option<Vec<HistoryRow>>,
}

fn format_datetime(raw: Option<&str>) -> (String, String) {
    let parsed = raw
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc));
    match parsed {
        Some(dt) => (
            dt.format("%d/%m/%Y").to_string(),
            dt.format("%H:%M:%S").to_string(),
        ),
        None => ("Invalid Date".to_string(), "Invalid Date".to_string()),
    }
}

/// Map the most recent failures onto table rows
pub fn history_rows(history: &LoginHistory) -> Option<Vec<HistoryRow>> {
    let entries = &history.login_history;
    if entries.is_empty() {
        return None;
    }

    let start = entries.len().saturating_sub(HISTORY_DISPLAY_LIMIT);
    let rows = entries[start..]
        .iter()
        .map(|entry| {
            let (date, time) = format_datetime(entry.dimensions.datetime.as_deref());
            HistoryRow {
                date,
                time,
                application_name: entry
                    .application_name
                    .clone()
                    .filter(|name| !name.is_empty())
                    .unwrap_or_else(|| UNKNOWN_APPLICATION.to_string()),
                reason: FailureReason::from_dimensions(&entry.dimensions),
            }
        })
        .collect();
    Some(rows)
}

/// History panel
///
/// A 4xx answer means there is no history for this user; a 5xx answer (or a
/// transport failure) is an error.
pub async fn history_view(
    session: &dyn PortalSession,
    precondition: &Precondition,
) -> ViewOutcome<HistoryView> {
    const FAILED: &str = "Error fetching login history. Please try again later.";

    if !precondition.is_met() {
        tracing::warn!("WARP is not enabled, skipping login history");
        return ViewOutcome::Unavailable;
    }

    let url = session.endpoint(HISTORY_PATH);
    let response = match session.get(&url, CachePolicy::Default).await {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(error = %e, "failed to fetch login history");
            return ViewOutcome::Failed(FAILED.to_string());
        }
    };

    if response.is_client_error() {
        return ViewOutcome::Ready(HistoryView { entries: None });
    }
    if !response.is_success() {
        tracing::error!(status = response.status, "login history request failed");
        return ViewOutcome::Failed(FAILED.to_string());
    }

    let parsed = response.parse_json().and_then(|value| {
        serde_json::from_value::<LoginHistory>(value)
            .map_err(|e| SessionError::Parse(e.to_string()))
    });
    let history = match parsed {
        Ok(history) => history,
        Err(e) => {
            tracing::error!(error = %e, "unreadable login history");
            return ViewOutcome::Failed(FAILED.to_string());
        }
    };

    let entries = history_rows(&history);
    if entries.is_none() {
        tracing::warn!("no login failures found");
    }
    ViewOutcome::Ready(HistoryView { entries })
}

// ==================== Groups ====================

/// Group list panel
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupListView {
    /// Groups to display after search, sort and collapse
    pub visible: Vec<String>,
    /// Groups matching the search before collapsing
    pub total_matches: usize,
    pub expanded: bool,
}

impl GroupListView {
    pub fn build(groups: &[String], search: &str, expanded: bool) -> Self {
        let matches = filter_groups(groups, search);
        let total_matches = matches.len();
        let visible = if expanded {
            matches
        } else {
            matches.into_iter().take(DEFAULT_VISIBLE_GROUPS).collect()
        };
        Self {
            visible,
            total_matches,
            expanded,
        }
    }

    pub fn hidden_count(&self) -> usize {
        self.total_matches - self.visible.len()
    }
}

/// Group list panel; independent of the WARP precondition
pub async fn group_list_view(
    session: &dyn PortalSession,
    search: &str,
    expanded: bool,
) -> ViewOutcome<GroupListView> {
    match user_details(session).await {
        Ok(details) => match details.identity.groups {
            Some(groups) => ViewOutcome::Ready(GroupListView::build(&groups, search, expanded)),
            None => ViewOutcome::Failed("No group data available".to_string()),
        },
        Err(e) => {
            tracing::error!(error = %e, "failed to fetch group data");
            ViewOutcome::Failed("Error fetching group data".to_string())
        }
    }
}

// ==================== Debug ====================

/// One posture rule in the debug listing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DebugRuleRow {
    pub rule_id: String,
    pub name: String,
    pub rule_type: String,
    pub success: bool,
    pub error: String,
    pub timestamp: String,
    pub input: String,
}

/// Debug page contents
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DebugView {
    pub state: SessionFetchState,
    pub posture_rules: Option<Vec<DebugRuleRow>>,
}

/// Rows for the `devicePosture` member of the debug payload
pub fn debug_rule_rows(rules: &PostureRuleSet) -> Vec<DebugRuleRow> {
    rules
        .iter()
        .map(|(id, rule)| DebugRuleRow {
            rule_id: id.clone(),
            name: if rule.rule_name.is_empty() {
                "Unnamed Rule".to_string()
            } else {
                rule.rule_name.clone()
            },
            rule_type: rule.rule_type.clone(),
            success: rule.success,
            error: rule
                .error
                .clone()
                .filter(|e| !e.is_empty())
                .unwrap_or_else(|| "No errors".to_string()),
            timestamp: rule
                .parsed_timestamp()
                .map(|ts| ts.format("%d/%m/%Y, %H:%M:%S").to_string())
                .unwrap_or_else(|| "Invalid Date".to_string()),
            input: serde_json::to_string_pretty(&rule.input).unwrap_or_default(),
        })
        .collect()
}

/// Debug panel through the session fetcher
///
/// A stale session is retried and eventually triggers the fetcher's reload;
/// the state records whichever outcome was reached.
pub async fn debug_view(fetcher: &SessionFetcher<'_>, endpoint: &str) -> DebugView {
    let mut state = SessionFetchState::default();
    let posture_rules = match fetcher.fetch(endpoint, &mut state).await {
        Ok(data) => data
            .get("devicePosture")
            .filter(|v| !v.is_null())
            .map(|v| debug_rule_rows(&PostureRuleSet::from_value(v))),
        Err(e) => {
            tracing::error!(error = %e, "error fetching debug information");
            None
        }
    };
    DebugView {
        state,
        posture_rules,
    }
}

// ==================== Logo ====================

/// Organization logo bytes; `None` falls back to the text logotype
pub async fn fetch_logo(session: &dyn PortalSession) -> Option<Vec<u8>> {
    let url = session.endpoint(LOGO_PATH);
    match session.get(&url, CachePolicy::Default).await {
        Ok(response) if response.is_success() => Some(response.body),
        Ok(response) => {
            tracing::error!(status = response.status, "failed to fetch logo");
            None
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to fetch logo");
            None
        }
    }
}

/// Pretty JSON for the raw debug dump
pub fn pretty_json(value: Option<&Value>) -> String {
    value
        .map(|v| serde_json::to_string_pretty(v).unwrap_or_default())
        .unwrap_or_else(|| "null".to_string())
}
