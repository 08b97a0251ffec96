//! Session-bound fetch with bounded retry and forced reload
//!
//! A session-bound endpoint answers with the portal's login page (markup)
//! once the session cookie has gone stale. That case and any transport or
//! parse failure are retried a fixed number of times; when the budget is
//! spent the fetch reports [`SessionError::SessionExpired`] and, after the
//! reload delay, asks the host to reload from scratch.

use serde::Serialize;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::session::{CachePolicy, PortalSession};
use crate::utils::{retry_with_backoff, Delay, RetryConfig, SessionError};

/// Action taken once retries are exhausted
pub trait Reloader: Send + Sync {
    fn reload(&self);
}

/// Reloader that records the request for the hosting loop to act on
#[derive(Debug, Default)]
pub struct ReloadSignal {
    requests: AtomicU32,
}

impl ReloadSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn requested(&self) -> bool {
        self.count() > 0
    }

    pub fn count(&self) -> u32 {
        self.requests.load(Ordering::SeqCst)
    }
}

impl Reloader for ReloadSignal {
    fn reload(&self) {
        self.requests.fetch_add(1, Ordering::SeqCst);
    }
}

/// Liveness of the view that owns a fetch
///
/// Clones share the same flag. Once torn down, pending fetches stop before
/// their next attempt and never write their result back.
#[derive(Debug, Clone)]
pub struct ViewGuard {
    live: Arc<AtomicBool>,
}

impl Default for ViewGuard {
    fn default() -> Self {
        Self {
            live: Arc::new(AtomicBool::new(true)),
        }
    }
}

impl ViewGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tear_down(&self) {
        self.live.store(false, Ordering::SeqCst);
    }

    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }
}

/// Per-view fetch state
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionFetchState {
    pub data: Option<Value>,
    pub error: Option<String>,
    pub retries_remaining: u32,
}

/// Fetcher for session-bound endpoints
pub struct SessionFetcher<'a> {
    session: &'a dyn PortalSession,
    delay: &'a dyn Delay,
    reloader: &'a dyn Reloader,
    retry: RetryConfig,
    reload_delay: Duration,
    request_timeout: Duration,
    guard: ViewGuard,
}

impl<'a> SessionFetcher<'a> {
    pub fn new(
        session: &'a dyn PortalSession,
        delay: &'a dyn Delay,
        reloader: &'a dyn Reloader,
    ) -> Self {
        Self {
            session,
            delay,
            reloader,
            retry: RetryConfig::default(),
            reload_delay: Duration::from_millis(crate::constants::RELOAD_DELAY_MS),
            request_timeout: Duration::from_secs(crate::constants::REQUEST_TIMEOUT_SECS),
            guard: ViewGuard::new(),
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_reload_delay(mut self, reload_delay: Duration) -> Self {
        self.reload_delay = reload_delay;
        self
    }

    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    pub fn with_guard(mut self, guard: ViewGuard) -> Self {
        self.guard = guard;
        self
    }

    /// Fetch using the configured retry budget
    pub async fn fetch(
        &self,
        endpoint: &str,
        state: &mut SessionFetchState,
    ) -> Result<Value, SessionError> {
        self.fetch_with_retry(endpoint, self.retry.max_retries, state)
            .await
    }

    /// Fetch `endpoint`, retrying up to `max_retries` times.
    ///
    /// On exhaustion the terminal error is recorded in `state` before the
    /// reload delay elapses and the reload is requested.
    pub async fn fetch_with_retry(
        &self,
        endpoint: &str,
        max_retries: u32,
        state: &mut SessionFetchState,
    ) -> Result<Value, SessionError> {
        let config = RetryConfig {
            max_retries,
            ..self.retry.clone()
        };
        let attempts = AtomicU32::new(0);

        let result = retry_with_backoff(
            &config,
            self.delay,
            || {
                attempts.fetch_add(1, Ordering::SeqCst);
                self.attempt(endpoint)
            },
            SessionError::is_retryable,
        )
        .await;

        if !self.guard.is_live() {
            tracing::debug!(endpoint, "view torn down, dropping fetch result");
            return Err(SessionError::Abandoned);
        }

        let used = attempts.load(Ordering::SeqCst).saturating_sub(1);
        state.retries_remaining = max_retries.saturating_sub(used);

        match result {
            Ok(data) => {
                state.data = Some(data.clone());
                state.error = None;
                Ok(data)
            }
            Err(SessionError::Abandoned) => Err(SessionError::Abandoned),
            Err(err) => {
                tracing::error!(endpoint, error = %err, "session fetch failed, reloading");
                state.error = Some(SessionError::SessionExpired.to_string());
                state.retries_remaining = 0;

                self.delay.wait(self.reload_delay).await;
                if self.guard.is_live() {
                    self.reloader.reload();
                }
                Err(SessionError::SessionExpired)
            }
        }
    }

    /// One bounded GET.
    ///
    /// Markup is a stale session. A non-2xx status is reported as
    /// [`SessionError::Status`] and retried like any other failure, even when
    /// the body is JSON; only 2xx JSON bodies are returned as data.
    async fn attempt(&self, endpoint: &str) -> Result<Value, SessionError> {
        if !self.guard.is_live() {
            return Err(SessionError::Abandoned);
        }

        let response = tokio::time::timeout(
            self.request_timeout,
            self.session.get(endpoint, CachePolicy::NoStore),
        )
        .await
        .map_err(|_| {
            SessionError::Transport(format!("request timed out after {:?}", self.request_timeout))
        })??;

        if response.is_markup() {
            return Err(SessionError::StaleSession);
        }
        if !response.is_success() {
            return Err(SessionError::Status(response.status));
        }
        response.parse_json()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::DEBUG_PATH;
    use crate::core::mock_session::MockPortalSession;
    use crate::core::session::RawResponse;
    use crate::utils::RecordingDelay;
    use serde_json::json;

    fn stale() -> Result<RawResponse, SessionError> {
        Ok(RawResponse::html(200, "<html>Sign in</html>"))
    }

    fn debug_url(session: &MockPortalSession) -> String {
        session.endpoint(DEBUG_PATH)
    }

    #[tokio::test]
    async fn test_fetch_succeeds_first_attempt() {
        let session = MockPortalSession::new().with_json(DEBUG_PATH, json!({"email": "a@b.c"}));
        let delay = RecordingDelay::new();
        let reload = ReloadSignal::new();
        let fetcher = SessionFetcher::new(&session, &delay, &reload);
        let mut state = SessionFetchState::default();

        let data = fetcher
            .fetch(&debug_url(&session), &mut state)
            .await
            .unwrap();

        assert_eq!(data["email"], "a@b.c");
        assert_eq!(state.data, Some(data));
        assert_eq!(state.error, None);
        assert_eq!(state.retries_remaining, 1);
        assert_eq!(session.calls_to(&debug_url(&session)), 1);
        assert_eq!(session.cache_policies(), vec![CachePolicy::NoStore]);
        assert!(!reload.requested());
    }

    #[tokio::test]
    async fn test_always_stale_attempts_one_plus_retries_then_expires() {
        let session = MockPortalSession::new();
        let url = debug_url(&session);
        let session = session.with_response(&url, stale());
        let delay = RecordingDelay::new();
        let reload = ReloadSignal::new();
        let fetcher = SessionFetcher::new(&session, &delay, &reload);
        let mut state = SessionFetchState::default();

        let result = fetcher.fetch_with_retry(&url, 2, &mut state).await;

        assert_eq!(result, Err(SessionError::SessionExpired));
        assert_eq!(session.calls_to(&url), 3);
        assert_eq!(
            state.error.as_deref(),
            Some("Session expired. Refreshing for a new session...")
        );
        assert_eq!(state.retries_remaining, 0);
        assert_eq!(reload.count(), 1);
        // two retry waits, then the reload delay
        assert_eq!(delay.waits(), vec![Duration::from_secs(1); 3]);
    }

    #[tokio::test]
    async fn test_success_on_second_attempt_short_circuits() {
        let session = MockPortalSession::new();
        let url = debug_url(&session);
        let session = session
            .with_response(&url, stale())
            .with_response(&url, Ok(RawResponse::json(&json!({"ok": true}))))
            .with_response(&url, stale());
        let delay = RecordingDelay::new();
        let reload = ReloadSignal::new();
        let fetcher = SessionFetcher::new(&session, &delay, &reload);
        let mut state = SessionFetchState::default();

        let data = fetcher.fetch_with_retry(&url, 3, &mut state).await.unwrap();

        assert_eq!(data["ok"], true);
        assert_eq!(session.calls_to(&url), 2);
        assert_eq!(state.retries_remaining, 2);
        assert_eq!(delay.waits().len(), 1);
        assert!(!reload.requested());
    }

    #[tokio::test]
    async fn test_transport_and_parse_failures_are_retried() {
        let session = MockPortalSession::new();
        let url = debug_url(&session);
        let session = session
            .with_response(&url, Err(SessionError::Transport("reset".to_string())))
            .with_response(&url, Ok(RawResponse::new(200, Some("application/json"), "{oops")))
            .with_response(&url, Ok(RawResponse::json(&json!({"ok": 1}))));
        let delay = RecordingDelay::new();
        let reload = ReloadSignal::new();
        let fetcher = SessionFetcher::new(&session, &delay, &reload);
        let mut state = SessionFetchState::default();

        let data = fetcher.fetch_with_retry(&url, 2, &mut state).await.unwrap();

        assert_eq!(data["ok"], 1);
        assert_eq!(session.calls_to(&url), 3);
        assert_eq!(state.retries_remaining, 0);
    }

    #[tokio::test]
    async fn test_zero_retries_expires_after_single_attempt() {
        let session = MockPortalSession::new();
        let url = debug_url(&session);
        let session = session.with_response(&url, stale());
        let delay = RecordingDelay::new();
        let reload = ReloadSignal::new();
        let fetcher = SessionFetcher::new(&session, &delay, &reload)
            .with_reload_delay(Duration::from_millis(250));
        let mut state = SessionFetchState::default();

        let result = fetcher.fetch_with_retry(&url, 0, &mut state).await;

        assert_eq!(result, Err(SessionError::SessionExpired));
        assert_eq!(session.calls_to(&url), 1);
        assert_eq!(delay.waits(), vec![Duration::from_millis(250)]);
        assert!(reload.requested());
    }

    #[tokio::test]
    async fn test_torn_down_view_is_not_updated() {
        let session = MockPortalSession::new().with_json(DEBUG_PATH, json!({"ok": true}));
        let delay = RecordingDelay::new();
        let reload = ReloadSignal::new();
        let guard = ViewGuard::new();
        let fetcher = SessionFetcher::new(&session, &delay, &reload).with_guard(guard.clone());
        let mut state = SessionFetchState::default();

        guard.tear_down();
        let result = fetcher.fetch(&debug_url(&session), &mut state).await;

        assert_eq!(result, Err(SessionError::Abandoned));
        assert_eq!(state, SessionFetchState::default());
        assert_eq!(session.calls_to(&debug_url(&session)), 0);
        assert!(!reload.requested());
    }

    #[tokio::test]
    async fn test_error_status_is_retried() {
        let session = MockPortalSession::new();
        let url = debug_url(&session);
        let session = session
            .with_response(&url, Ok(RawResponse::new(502, Some("application/json"), "{}")))
            .with_response(&url, Ok(RawResponse::json(&json!({"ok": true}))));
        let delay = RecordingDelay::new();
        let reload = ReloadSignal::new();
        let fetcher = SessionFetcher::new(&session, &delay, &reload);
        let mut state = SessionFetchState::default();

        assert!(fetcher.fetch(&url, &mut state).await.is_ok());
        assert_eq!(session.calls_to(&url), 2);
    }

    struct HangingSession;

    #[async_trait::async_trait]
    impl PortalSession for HangingSession {
        fn endpoint(&self, path: &str) -> String {
            format!("http://portal.test{}", path)
        }

        async fn get(&self, _url: &str, _cache: CachePolicy) -> Result<RawResponse, SessionError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(RawResponse::json(&json!({})))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_hung_request_hits_deadline() {
        let session = HangingSession;
        let delay = RecordingDelay::new();
        let reload = ReloadSignal::new();
        let fetcher = SessionFetcher::new(&session, &delay, &reload)
            .with_request_timeout(Duration::from_secs(10));
        let mut state = SessionFetchState::default();

        let result = fetcher.fetch(&session.endpoint(DEBUG_PATH), &mut state).await;

        assert_eq!(result, Err(SessionError::SessionExpired));
        assert!(reload.requested());
        assert_eq!(delay.waits().len(), 2);
    }
}
