//! Plain-text rendering of portal pages for the terminal

use std::fmt::Write;

use crate::core::{
    AccessDeniedPage, CheckState, DebugView, FaqEntry, PostureReport, ViewOutcome,
};
use crate::core::views::pretty_json;

const WARP_WARNING: &str = "Please enable WARP to view this information.";

fn heading(out: &mut String, title: &str) {
    let _ = writeln!(out, "\n{}\n{}", title, "-".repeat(title.len()));
}

fn row(out: &mut String, key: &str, value: &str) {
    let _ = writeln!(out, "  {:<16} {}", key, value);
}

fn outcome_message<T>(outcome: &ViewOutcome<T>) -> Option<String> {
    match outcome {
        ViewOutcome::Ready(_) => None,
        ViewOutcome::Unavailable => Some(format!("  ! {}", WARP_WARNING)),
        ViewOutcome::Failed(message) => Some(format!("  ! {}", message)),
    }
}

fn check_tag(state: CheckState, pass: &str, fail: &str) -> String {
    match state {
        CheckState::Passed => format!("[{}]", pass),
        CheckState::Failed => format!("[{}]", fail),
        CheckState::Unavailable => "[Unavailable]".to_string(),
    }
}

fn render_posture(out: &mut String, report: &PostureReport) {
    if !report.warp_enabled {
        let _ = writeln!(out, "  ! Please enable WARP to view device posture information.");
        return;
    }
    let status = if report.all_passed { "PASSED" } else { "ACTION REQUIRED" };
    row(out, "Overall", status);
    row(out, "Security Key", &check_tag(report.security_key, "In Use", "Not Used"));
    row(out, "CrowdStrike", &check_tag(report.crowdstrike, "Pass", "Fail"));
    row(
        out,
        "Operating System",
        &format!(
            "{} {}",
            check_tag(report.os, "Up to date", "Update required"),
            report.os_message
        ),
    );
    for check in &report.os_checks {
        let mark = if check.success { "✓" } else { "✗" };
        let _ = writeln!(out, "      {} {}: {}", mark, check.name, check.status_label());
    }
}

pub fn render_access_denied(page: &AccessDeniedPage) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Identity and Access Help Page");
    if page.logo_bytes.is_none() {
        let _ = writeln!(out, "[Logo]");
    }
    if let Some(url) = &page.refresh_url {
        let _ = writeln!(out, "Refresh Access Application: {}", url);
    }

    heading(&mut out, "WARP Information");
    match &page.warp_info {
        ViewOutcome::Ready(info) => {
            row(&mut out, "User name", &info.user_name);
            row(&mut out, "Email", &info.user_email);
            row(&mut out, "WARP status", "Enabled");
            let org = if info.is_in_org {
                format!("[Correct] {}", info.organization_name)
            } else {
                format!("[Incorrect] Not in \"{}\"", info.organization_name)
            };
            row(&mut out, "Organization", &org);
        }
        other => {
            if let Some(msg) = outcome_message(other) {
                let _ = writeln!(out, "{}", msg);
            }
        }
    }

    heading(&mut out, "Device Information");
    match &page.device_info {
        ViewOutcome::Ready(device) => {
            row(&mut out, "Device Model", &device.model);
            row(&mut out, "Device Name", &device.name);
            row(&mut out, "OS Version", &device.os_version);
            row(&mut out, "Serial Number", &device.serial_number);
        }
        other => {
            if let Some(msg) = outcome_message(other) {
                let _ = writeln!(out, "{}", msg);
            }
        }
    }

    heading(&mut out, "Device Posture Requirements");
    match &page.posture {
        ViewOutcome::Ready(report) => render_posture(&mut out, report),
        other => {
            if let Some(msg) = outcome_message(other) {
                let _ = writeln!(out, "{}", msg);
            }
        }
    }

    heading(&mut out, "Recent Access Login Failures");
    match &page.history {
        ViewOutcome::Ready(history) => match &history.entries {
            Some(rows) => {
                for entry in rows {
                    let _ = writeln!(
                        out,
                        "  {}  {}  {:<24} [{}]",
                        entry.date,
                        entry.time,
                        entry.application_name,
                        entry.reason.label()
                    );
                }
            }
            None => {
                let _ = writeln!(out, "  No recent Access login failures observed.");
            }
        },
        other => {
            if let Some(msg) = outcome_message(other) {
                let _ = writeln!(out, "{}", msg);
            }
        }
    }

    heading(&mut out, "Your Current Groups");
    match &page.groups {
        ViewOutcome::Ready(groups) => {
            for group in &groups.visible {
                let _ = writeln!(out, "  • {}", group);
            }
            if groups.hidden_count() > 0 {
                let _ = writeln!(
                    out,
                    "  ... {} more (use --expand-groups)",
                    groups.hidden_count()
                );
            }
        }
        other => {
            if let Some(msg) = outcome_message(other) {
                let _ = writeln!(out, "{}", msg);
            }
        }
    }

    out
}

pub fn render_information(faq: &[FaqEntry]) -> String {
    let mut out = String::from("Information\n\nFrequently Asked Questions\n");
    for entry in faq {
        heading(&mut out, entry.question);
        let _ = writeln!(out, "  {}", entry.answer);
    }
    out
}

pub fn render_debug(view: &DebugView) -> String {
    let mut out = String::from("Debug Information\n");

    heading(&mut out, "get-identity response");
    match &view.state.error {
        Some(error) => {
            let _ = writeln!(out, "  {}", error);
        }
        None => {
            let _ = writeln!(out, "{}", pretty_json(view.state.data.as_ref()));
        }
    }

    heading(&mut out, "Device Posture Information");
    match &view.posture_rules {
        Some(rules) => {
            for rule in rules {
                let _ = writeln!(out, "  {} ({})", rule.name, rule.rule_type);
                row(&mut out, "Success", if rule.success { "Yes" } else { "No" });
                row(&mut out, "Error", &rule.error);
                row(&mut out, "Timestamp", &rule.timestamp);
                for line in rule.input.lines() {
                    let _ = writeln!(out, "    {}", line);
                }
            }
        }
        None => {
            let _ = writeln!(out, "  No device posture information available.");
        }
    }
    out
}
