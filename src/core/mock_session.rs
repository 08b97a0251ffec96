//! Mock portal session for testing without a real backend
//!
//! Responses are scripted per URL. Each call pops the next scripted response;
//! the last one is repeated once the script runs out.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use serde_json::Value;

use super::session::{CachePolicy, PortalSession, RawResponse};
use crate::utils::SessionError;

pub const MOCK_BASE: &str = "http://portal.test";
pub const MOCK_TRACE: &str = "http://trace.test/cdn-cgi/trace";

type Scripted = Result<RawResponse, SessionError>;

#[derive(Default)]
struct MockState {
    scripts: HashMap<String, VecDeque<Scripted>>,
    calls: Vec<(String, CachePolicy)>,
}

/// Mock session for testing
pub struct MockPortalSession {
    state: Mutex<MockState>,
}

impl MockPortalSession {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState::default()),
        }
    }

    /// Session whose trace probe reports WARP as connected
    pub fn warp_on() -> Self {
        Self::new().with_trace("fl=1\nip=192.0.2.10\nwarp=on\ngateway=on\n")
    }

    /// Session whose trace probe reports WARP as disconnected
    pub fn warp_off() -> Self {
        Self::new().with_trace("fl=1\nip=192.0.2.10\nwarp=off\ngateway=off\n")
    }

    pub fn with_trace(self, body: &str) -> Self {
        self.with_response(MOCK_TRACE, Ok(RawResponse::new(200, Some("text/plain"), body)))
    }

    pub fn with_json(self, path: &str, value: Value) -> Self {
        let url = self.endpoint(path);
        self.with_response(&url, Ok(RawResponse::json(&value)))
    }

    pub fn with_status(self, path: &str, status: u16) -> Self {
        let url = self.endpoint(path);
        self.with_response(&url, Ok(RawResponse::new(status, Some("text/plain"), "error")))
    }

    /// Append a scripted response for an absolute URL
    pub fn with_response(self, url: &str, response: Scripted) -> Self {
        if let Ok(mut state) = self.state.lock() {
            state
                .scripts
                .entry(url.to_string())
                .or_default()
                .push_back(response);
        }
        self
    }

    /// Number of GETs issued for an absolute URL
    pub fn calls_to(&self, url: &str) -> usize {
        self.state
            .lock()
            .map(|s| s.calls.iter().filter(|(u, _)| u == url).count())
            .unwrap_or(0)
    }

    /// Cache policy of every call, in order
    pub fn cache_policies(&self) -> Vec<CachePolicy> {
        self.state
            .lock()
            .map(|s| s.calls.iter().map(|(_, c)| *c).collect())
            .unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl PortalSession for MockPortalSession {
    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", MOCK_BASE, path.trim_start_matches('/'))
    }

    async fn get(&self, url: &str, cache: CachePolicy) -> Result<RawResponse, SessionError> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| SessionError::Transport("mock poisoned".to_string()))?;
        state.calls.push((url.to_string(), cache));

        let Some(script) = state.scripts.get_mut(url) else {
            return Err(SessionError::Transport(format!("connection refused: {}", url)));
        };
        if script.len() > 1 {
            script
                .pop_front()
                .unwrap_or_else(|| Err(SessionError::Transport("empty script".to_string())))
        } else {
            script
                .front()
                .cloned()
                .unwrap_or_else(|| Err(SessionError::Transport("empty script".to_string())))
        }
    }
}
