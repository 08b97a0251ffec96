//! WARP connectivity precondition
//!
//! Device, posture and history data are only meaningful when the WARP client
//! is connected. The public trace endpoint reports this as a `warp=on` line in
//! its plaintext body. The probe runs once per page load and its result is
//! handed to each view.

use serde::Serialize;
use std::collections::BTreeMap;

use super::session::{CachePolicy, PortalSession};
use crate::constants::WARP_ON_MARKER;

/// Outcome of the connectivity probe
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "reason", rename_all = "snake_case")]
pub enum Precondition {
    Met,
    Unmet,
    /// The probe itself could not be completed
    ProbeFailed(String),
}

impl Precondition {
    pub fn is_met(&self) -> bool {
        matches!(self, Precondition::Met)
    }
}

/// Parsed trace body
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TraceInfo {
    pub fields: BTreeMap<String, String>,
    pub warp_enabled: bool,
}

impl TraceInfo {
    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }
}

/// Parse a `key=value` per line trace body
pub fn parse_trace(body: &str) -> TraceInfo {
    let fields = body
        .lines()
        .filter_map(|line| line.split_once('='))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .filter(|(k, _)| !k.is_empty())
        .collect();

    TraceInfo {
        fields,
        warp_enabled: body.contains(WARP_ON_MARKER),
    }
}

/// Precondition plus the trace it was derived from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreconditionReport {
    pub precondition: Precondition,
    pub trace: Option<TraceInfo>,
}

/// Runs the trace probe
#[derive(Debug, Clone)]
pub struct PreconditionChecker {
    trace_url: String,
}

impl PreconditionChecker {
    pub fn new(trace_url: impl Into<String>) -> Self {
        Self {
            trace_url: trace_url.into(),
        }
    }

    pub async fn check(&self, session: &dyn PortalSession) -> PreconditionReport {
        match session.get(&self.trace_url, CachePolicy::NoStore).await {
            Ok(response) => {
                let trace = parse_trace(&response.text());
                let precondition = if trace.warp_enabled {
                    Precondition::Met
                } else {
                    Precondition::Unmet
                };
                tracing::info!(warp_enabled = trace.warp_enabled, "connectivity probe complete");
                PreconditionReport {
                    precondition,
                    trace: Some(trace),
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "connectivity probe failed");
                PreconditionReport {
                    precondition: Precondition::ProbeFailed(e.to_string()),
                    trace: None,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::mock_session::{MockPortalSession, MOCK_TRACE};

    #[test]
    fn test_parse_trace_fields() {
        let trace = parse_trace("fl=29f1\nh=www.cloudflare.com\nip=192.0.2.10\nwarp=on\ngateway=on\n");
        assert!(trace.warp_enabled);
        assert_eq!(trace.field("ip"), Some("192.0.2.10"));
        assert_eq!(trace.field("gateway"), Some("on"));
        assert_eq!(trace.fields.len(), 5);
    }

    #[test]
    fn test_parse_trace_warp_off() {
        let trace = parse_trace("warp=off\n");
        assert!(!trace.warp_enabled);
        assert_eq!(trace.field("warp"), Some("off"));
    }

    #[test]
    fn test_parse_trace_ignores_garbage_lines() {
        let trace = parse_trace("<html>\n=x\nwarp=on");
        assert_eq!(trace.fields.len(), 1);
        assert!(trace.warp_enabled);
    }

    #[tokio::test]
    async fn test_check_met() {
        let session = MockPortalSession::warp_on();
        let report = PreconditionChecker::new(MOCK_TRACE).check(&session).await;
        assert_eq!(report.precondition, Precondition::Met);
        assert!(report.precondition.is_met());
        assert_eq!(session.calls_to(MOCK_TRACE), 1);
    }

    #[tokio::test]
    async fn test_check_unmet() {
        let session = MockPortalSession::warp_off();
        let report = PreconditionChecker::new(MOCK_TRACE).check(&session).await;
        assert_eq!(report.precondition, Precondition::Unmet);
        assert!(report.trace.is_some());
    }

    #[tokio::test]
    async fn test_check_probe_failure() {
        let session = MockPortalSession::new();
        let report = PreconditionChecker::new(MOCK_TRACE).check(&session).await;
        assert!(matches!(report.precondition, Precondition::ProbeFailed(_)));
        assert!(!report.precondition.is_met());
        assert!(report.trace.is_none());
    }
}
