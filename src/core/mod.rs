//! Core portal logic (transport-agnostic)
//!
//! CRITICAL: This module MUST NOT import reqwest or any other transport directly.

pub mod fetcher;
pub mod pages;
pub mod posture;
pub mod precondition;
pub mod session;
pub mod views;

// Test utilities for mock sessions (tests only)
#[cfg(test)]
pub mod mock_session;

pub use fetcher::{ReloadSignal, Reloader, SessionFetchState, SessionFetcher, ViewGuard};
pub use pages::{
    information_page, load_access_denied_page, load_debug_page, load_debug_page_with_reloads,
    AccessDeniedOptions, AccessDeniedPage, FaqEntry,
};
pub use posture::{
    CheckState, OsPostureCheck, PostureEvaluator, PostureReport, PostureSummary,
};
pub use precondition::{parse_trace, Precondition, PreconditionChecker, PreconditionReport, TraceInfo};
pub use session::{get_json, CachePolicy, PortalSession, RawResponse};
pub use views::{
    DebugRuleRow, DebugView, DeviceInfoView, FailureReason, GroupListView, HistoryRow,
    HistoryView, ViewOutcome, WarpInfoView,
};
