//! Device posture evaluation
//!
//! [`PostureEvaluator::evaluate`] is a pure function of the rule set and the
//! identity record. [`PostureReport`] layers the WARP precondition on top so
//! that "unavailable" and "failed" remain distinct display states.

use serde::Serialize;

use super::precondition::Precondition;
use crate::constants::{
    NO_DESCRIPTION, PLACEHOLDER_OS_CHECK_DESCRIPTION, PLACEHOLDER_OS_CHECK_NAME,
    SECURITY_KEY_AMR,
};
use crate::models::{IdentityRecord, PostureRule, PostureRuleSet, RuleType};
use crate::normalize::classify_os_rule_name;

/// One OS version rule prepared for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OsPostureCheck {
    pub name: String,
    pub success: bool,
    pub description: String,
    pub checked: bool,
    pub is_min_constraint: bool,
    pub is_patch: bool,
}

impl OsPostureCheck {
    fn from_rule(rule: &PostureRule) -> Self {
        let (is_min_constraint, is_patch) = classify_os_rule_name(&rule.rule_name);
        Self {
            name: rule.rule_name.clone(),
            success: rule.success,
            description: rule
                .description
                .clone()
                .filter(|d| !d.is_empty())
                .unwrap_or_else(|| NO_DESCRIPTION.to_string()),
            checked: rule.was_checked(),
            is_min_constraint,
            is_patch,
        }
    }

    /// Stand-in for devices that have no OS version rules at all
    fn placeholder() -> Self {
        Self {
            name: PLACEHOLDER_OS_CHECK_NAME.to_string(),
            success: false,
            description: PLACEHOLDER_OS_CHECK_DESCRIPTION.to_string(),
            checked: false,
            is_min_constraint: false,
            is_patch: false,
        }
    }

    /// Whether this rule counts toward the OS aggregate
    pub fn is_gating(&self) -> bool {
        self.is_min_constraint || self.is_patch
    }

    pub fn status_label(&self) -> &'static str {
        match (self.checked, self.success) {
            (false, _) => "Rule was not checked",
            (true, true) => "Compliant",
            (true, false) => "Non-compliant",
        }
    }
}

/// Raw pass/fail results of a posture evaluation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostureSummary {
    pub security_key_in_use: bool,
    pub crowdstrike_passed: bool,
    pub os_passed: bool,
    pub os_checks: Vec<OsPostureCheck>,
}

impl PostureSummary {
    /// All checks passed, ignoring the connectivity precondition
    pub fn checks_passed(&self) -> bool {
        self.security_key_in_use && self.crowdstrike_passed && self.os_passed
    }
}

/// Stateless evaluator
#[derive(Debug, Clone, Copy, Default)]
pub struct PostureEvaluator;

impl PostureEvaluator {
    pub fn evaluate(rules: &PostureRuleSet, identity: &IdentityRecord) -> PostureSummary {
        let (os_passed, os_checks) = evaluate_os(rules);
        PostureSummary {
            security_key_in_use: security_key_in_use(identity),
            crowdstrike_passed: crowdstrike_passed(rules),
            os_passed,
            os_checks,
        }
    }
}

/// Proof-of-possession of a software-secured key was part of the login
pub fn security_key_in_use(identity: &IdentityRecord) -> bool {
    identity.amr.contains(SECURITY_KEY_AMR)
}

/// At least one successful CrowdStrike rule
pub fn crowdstrike_passed(rules: &PostureRuleSet) -> bool {
    rules
        .rules()
        .any(|rule| rule.kind() == RuleType::CrowdstrikeS2s && rule.success)
}

/// OS aggregate and per-rule checks
///
/// With no OS version rules a single failing placeholder is produced.
/// Otherwise the aggregate holds iff every gating rule succeeded.
pub fn evaluate_os(rules: &PostureRuleSet) -> (bool, Vec<OsPostureCheck>) {
    let checks: Vec<OsPostureCheck> = rules
        .rules()
        .filter(|rule| rule.kind() == RuleType::OsVersion)
        .map(OsPostureCheck::from_rule)
        .collect();

    if checks.is_empty() {
        return (false, vec![OsPostureCheck::placeholder()]);
    }

    let passed = checks
        .iter()
        .filter(|check| check.is_gating())
        .all(|check| check.success);
    (passed, checks)
}

/// Display state of a single check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckState {
    Passed,
    Failed,
    /// Not evaluated because WARP is not connected
    Unavailable,
}

impl CheckState {
    fn from_bool(passed: bool) -> Self {
        if passed {
            CheckState::Passed
        } else {
            CheckState::Failed
        }
    }
}

/// Posture panel contents
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostureReport {
    pub warp_enabled: bool,
    pub security_key: CheckState,
    pub crowdstrike: CheckState,
    pub os: CheckState,
    pub os_message: String,
    pub os_checks: Vec<OsPostureCheck>,
    pub all_passed: bool,
}

impl PostureReport {
    /// Every check unavailable; nothing was evaluated
    pub fn unavailable() -> Self {
        Self {
            warp_enabled: false,
            security_key: CheckState::Unavailable,
            crowdstrike: CheckState::Unavailable,
            os: CheckState::Unavailable,
            os_message: "Posture information unavailable, please enable WARP".to_string(),
            os_checks: Vec::new(),
            all_passed: false,
        }
    }

    pub fn from_summary(precondition: &Precondition, summary: &PostureSummary) -> Self {
        if !precondition.is_met() {
            return Self::unavailable();
        }

        let os_message = if summary.os_passed {
            "Operating system up to date"
        } else {
            "Operating system update required"
        };

        Self {
            warp_enabled: true,
            security_key: CheckState::from_bool(summary.security_key_in_use),
            crowdstrike: CheckState::from_bool(summary.crowdstrike_passed),
            os: CheckState::from_bool(summary.os_passed),
            os_message: os_message.to_string(),
            os_checks: summary.os_checks.clone(),
            all_passed: summary.checks_passed(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rules(value: serde_json::Value) -> PostureRuleSet {
        PostureRuleSet::from_value(&value)
    }

    fn identity_with_amr(amr: &[&str]) -> IdentityRecord {
        IdentityRecord {
            amr: amr.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_security_key_only_empty_posture() {
        let summary = PostureEvaluator::evaluate(&PostureRuleSet::new(), &identity_with_amr(&["swk"]));

        assert!(summary.security_key_in_use);
        assert!(!summary.crowdstrike_passed);
        assert!(!summary.os_passed);
        assert_eq!(summary.os_checks.len(), 1);
        assert_eq!(summary.os_checks[0].name, "OS Version Check");
        assert_eq!(
            summary.os_checks[0].description,
            "No relevant OS version rules found for this device type"
        );
        assert!(!summary.checks_passed());
    }

    #[test]
    fn test_crowdstrike_only() {
        let summary = PostureEvaluator::evaluate(
            &rules(json!({"a": {"type": "crowdstrike_s2s", "success": true}})),
            &identity_with_amr(&[]),
        );

        assert!(!summary.security_key_in_use);
        assert!(summary.crowdstrike_passed);
        assert!(!summary.checks_passed());
    }

    #[test]
    fn test_crowdstrike_requires_success() {
        let set = rules(json!({
            "a": {"type": "crowdstrike_s2s", "success": false},
            "b": {"type": "os_version", "success": true}
        }));
        assert!(!crowdstrike_passed(&set));
        assert!(!crowdstrike_passed(&PostureRuleSet::new()));
    }

    #[test]
    fn test_crowdstrike_any_success_passes() {
        let set = rules(json!({
            "a": {"type": "crowdstrike_s2s", "success": false},
            "b": {"type": "crowdstrike_s2s", "success": true}
        }));
        assert!(crowdstrike_passed(&set));
    }

    #[test]
    fn test_security_key_requires_swk_marker() {
        assert!(!security_key_in_use(&identity_with_amr(&["pwd", "mfa", "hwk"])));
        assert!(security_key_in_use(&identity_with_amr(&["pwd", "swk"])));
        assert!(!security_key_in_use(&IdentityRecord::default()));
    }

    #[test]
    fn test_failed_min_constraint_fails_os() {
        let (passed, checks) = evaluate_os(&rules(json!({
            "min": {"rule_name": "OS Min Constraint", "type": "os_version", "success": false},
            "patch": {"rule_name": "OS Patch", "type": "os_version", "success": true}
        })));

        assert!(!passed);
        assert_eq!(checks.len(), 2);
        assert!(checks.iter().all(OsPostureCheck::is_gating));
    }

    #[test]
    fn test_non_gating_failure_does_not_fail_os() {
        let (passed, checks) = evaluate_os(&rules(json!({
            "min": {"rule_name": "OS Min Constraint", "type": "os_version", "success": true},
            "max": {"rule_name": "OS Max Version", "type": "os_version", "success": false}
        })));

        assert!(passed);
        assert_eq!(checks.len(), 2);
        let max = checks.iter().find(|c| c.name == "OS Max Version").unwrap();
        assert!(!max.is_gating());
    }

    #[test]
    fn test_only_non_gating_rules_pass() {
        let (passed, checks) = evaluate_os(&rules(json!({
            "max": {"rule_name": "OS Max Version", "type": "os_version", "success": false}
        })));
        assert!(passed);
        assert_eq!(checks.len(), 1);
    }

    #[test]
    fn test_os_check_fields() {
        let (_, checks) = evaluate_os(&rules(json!({
            "p": {
                "rule_name": "macOS Patch",
                "type": "os_version",
                "success": true,
                "description": "Requires 14.4.1",
                "check": {"version": "14.4.1"}
            },
            "m": {"rule_name": "OS Min Constraint", "type": "os_version", "success": false}
        })));

        let patch = checks.iter().find(|c| c.is_patch).unwrap();
        assert!(patch.checked);
        assert_eq!(patch.description, "Requires 14.4.1");
        assert_eq!(patch.status_label(), "Compliant");

        let min = checks.iter().find(|c| c.is_min_constraint).unwrap();
        assert!(!min.checked);
        assert_eq!(min.description, "No description available");
        assert_eq!(min.status_label(), "Rule was not checked");
    }

    #[test]
    fn test_evaluate_is_deterministic() {
        let set = rules(json!({
            "z": {"rule_name": "OS Patch", "type": "os_version", "success": true},
            "a": {"rule_name": "OS Min Constraint", "type": "os_version", "success": true},
            "c": {"type": "crowdstrike_s2s", "success": true}
        }));
        let identity = identity_with_amr(&["swk"]);

        let first = PostureEvaluator::evaluate(&set, &identity);
        let second = PostureEvaluator::evaluate(&set, &identity);
        assert_eq!(first, second);
        assert!(first.checks_passed());
    }

    #[test]
    fn test_unrelated_bad_fields_do_not_change_checks() {
        let details = crate::models::UserDetails::from_value(&json!({
            "identity": {"amr": ["swk"], "is_warp": "true"},
            "posture": {"result": {
                "cs": {
                    "type": "crowdstrike_s2s",
                    "success": true,
                    "description": {"nested": true}
                }
            }}
        }));

        let summary = PostureEvaluator::evaluate(&details.posture, &details.identity);
        assert!(summary.security_key_in_use);
        assert!(summary.crowdstrike_passed);
    }

    #[test]
    fn test_report_all_passed_requires_precondition() {
        let set = rules(json!({
            "a": {"rule_name": "OS Min Constraint", "type": "os_version", "success": true},
            "c": {"type": "crowdstrike_s2s", "success": true}
        }));
        let summary = PostureEvaluator::evaluate(&set, &identity_with_amr(&["swk"]));

        let met = PostureReport::from_summary(&Precondition::Met, &summary);
        assert!(met.all_passed);
        assert_eq!(met.security_key, CheckState::Passed);
        assert_eq!(met.os_message, "Operating system up to date");

        let unmet = PostureReport::from_summary(&Precondition::Unmet, &summary);
        assert!(!unmet.all_passed);
        assert_eq!(unmet.security_key, CheckState::Unavailable);
        assert_eq!(unmet.crowdstrike, CheckState::Unavailable);
        assert_eq!(unmet.os, CheckState::Unavailable);
    }

    #[test]
    fn test_report_failed_is_not_unavailable() {
        let summary = PostureEvaluator::evaluate(&PostureRuleSet::new(), &IdentityRecord::default());
        let report = PostureReport::from_summary(&Precondition::Met, &summary);

        assert_eq!(report.security_key, CheckState::Failed);
        assert_eq!(report.crowdstrike, CheckState::Failed);
        assert_eq!(report.os, CheckState::Failed);
        assert_eq!(report.os_message, "Operating system update required");
        assert!(!report.all_passed);
    }
}
