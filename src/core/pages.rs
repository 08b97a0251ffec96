//! Page assembly
//!
//! A page load runs the connectivity probe once and hands its result to every
//! panel. Panels load concurrently but share nothing else.

use serde::Serialize;

use super::fetcher::{ReloadSignal, SessionFetcher, ViewGuard};
use super::posture::PostureReport;
use super::precondition::{PreconditionChecker, PreconditionReport};
use super::session::PortalSession;
use super::views::{
    debug_view, device_info_view, fetch_logo, group_list_view, history_view, posture_view,
    warp_info_view, DebugView, DeviceInfoView, GroupListView, HistoryView, ViewOutcome,
    WarpInfoView,
};
use crate::config::PortalConfig;
use crate::constants::DEBUG_PATH;
use crate::normalize::normalize_original_url;
use crate::utils::{Delay, PortalError};

/// Options for the access-denied page
#[derive(Debug, Clone, Default)]
pub struct AccessDeniedOptions {
    /// `original_url` query parameter of the blocked request
    pub original_url: Option<String>,
    /// Group search term
    pub group_search: String,
    pub expand_groups: bool,
}

/// The access-denied dashboard
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccessDeniedPage {
    pub connectivity: PreconditionReport,
    /// Target for the "Refresh Access Application" button
    pub refresh_url: Option<String>,
    /// Size of the organization logo, when one could be fetched
    pub logo_bytes: Option<usize>,
    pub warp_info: ViewOutcome<WarpInfoView>,
    pub device_info: ViewOutcome<DeviceInfoView>,
    pub posture: ViewOutcome<PostureReport>,
    pub history: ViewOutcome<HistoryView>,
    pub groups: ViewOutcome<GroupListView>,
}

pub async fn load_access_denied_page(
    session: &dyn PortalSession,
    config: &PortalConfig,
    options: &AccessDeniedOptions,
) -> AccessDeniedPage {
    let connectivity = PreconditionChecker::new(config.trace_url.as_str())
        .check(session)
        .await;
    let precondition = &connectivity.precondition;

    let (logo, warp_info, device_info, posture, history, groups) = tokio::join!(
        fetch_logo(session),
        warp_info_view(session, precondition),
        device_info_view(session, precondition),
        posture_view(session, precondition),
        history_view(session, precondition),
        group_list_view(session, &options.group_search, options.expand_groups),
    );

    AccessDeniedPage {
        refresh_url: normalize_original_url(options.original_url.as_deref()),
        logo_bytes: logo.map(|bytes| bytes.len()),
        connectivity,
        warp_info,
        device_info,
        posture,
        history,
        groups,
    }
}

/// One entry of the information page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FaqEntry {
    pub question: &'static str,
    pub answer: &'static str,
}

/// Static help content
pub fn information_page() -> Vec<FaqEntry> {
    vec![
        FaqEntry {
            question: "How do I identify my current Gateway organization?",
            answer: "If you need to confirm the currently enrolled Gateway organization for \
                     your WARP client instance, run the command `warp-cli registration show` \
                     in your terminal (Linux/MacOS) or command prompt (Windows).",
        },
        FaqEntry {
            question: "Where can I find troubleshooting guidance?",
            answer: "https://developers.cloudflare.com/cloudflare-one/faq/troubleshooting/",
        },
    ]
}

/// Load the debug page once
pub async fn load_debug_page(
    session: &dyn PortalSession,
    config: &PortalConfig,
    delay: &dyn Delay,
    reload: &ReloadSignal,
    guard: ViewGuard,
) -> Result<DebugView, PortalError> {
    if !config.debug_enabled {
        return Err(PortalError::DebugDisabled);
    }

    let fetcher = SessionFetcher::new(session, delay, reload)
        .with_retry(config.retry.clone())
        .with_reload_delay(config.reload_delay)
        .with_request_timeout(config.request_timeout)
        .with_guard(guard);
    Ok(debug_view(&fetcher, &session.endpoint(DEBUG_PATH)).await)
}

/// Load the debug page, starting over from scratch each time the fetcher
/// asks for a reload, up to `config.max_reloads` times.
///
/// `on_expired` receives the session-expired message of every load that ends
/// in a reload, before the next load starts.
pub async fn load_debug_page_with_reloads<F>(
    session: &dyn PortalSession,
    config: &PortalConfig,
    delay: &dyn Delay,
    mut on_expired: F,
) -> Result<DebugView, PortalError>
where
    F: FnMut(&str),
{
    let mut reloads = 0;
    loop {
        let reload = ReloadSignal::new();
        let view = load_debug_page(session, config, delay, &reload, ViewGuard::new()).await?;

        if !reload.requested() {
            return Ok(view);
        }
        if let Some(message) = view.state.error.as_deref() {
            on_expired(message);
        }
        if reloads >= config.max_reloads {
            tracing::error!(reloads, "giving up after repeated session expiry");
            return Err(PortalError::ReloadBudgetExhausted(reloads));
        }
        reloads += 1;
        tracing::info!(reloads, "reloading page for a new session");
    }
}
