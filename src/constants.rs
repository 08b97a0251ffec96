//! # Application-Wide Constants
//!
//! Centralized endpoint paths, timings and marker strings used throughout
//! access-help. Runtime overrides live in [`crate::config`].

// ============================================================================
// Endpoints
// ============================================================================

/// Default portal origin used when no base URL is configured
pub const DEFAULT_BASE_URL: &str = "http://localhost:8787";

/// Public trace endpoint whose plaintext body reports the WARP state
pub const DEFAULT_TRACE_URL: &str = "https://www.cloudflare.com/cdn-cgi/trace";

/// Session-bound debug dump (identity plus `devicePosture`)
pub const DEBUG_PATH: &str = "/api/debug";

/// Identity, posture results and device record for the current user
pub const USER_DETAILS_PATH: &str = "/api/userdetails";

/// Recent Access login failures
pub const HISTORY_PATH: &str = "/api/history";

/// Organization id/name the portal is deployed for
pub const ENV_PATH: &str = "/api/env";

/// Organization logo image
pub const LOGO_PATH: &str = "/assets/logo";

// ============================================================================
// Timeouts and Retry
// ============================================================================

/// Retries after the first attempt for session-bound fetches
pub const DEFAULT_MAX_RETRIES: u32 = 1;

/// Fixed wait between session fetch attempts (milliseconds)
pub const RETRY_DELAY_MS: u64 = 1000;

/// Wait between reporting an expired session and reloading (milliseconds)
pub const RELOAD_DELAY_MS: u64 = 1000;

/// Deadline for a single HTTP request
///
/// **Rationale**: the portal backend answers from the edge; anything slower
/// than this is treated as a transport failure and enters the retry path.
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Full page reloads allowed before the CLI gives up
pub const DEFAULT_MAX_RELOADS: u32 = 3;

// ============================================================================
// Markers
// ============================================================================

/// Trace body token reported when the WARP client is connected
pub const WARP_ON_MARKER: &str = "warp=on";

/// Authentication method reference for proof-of-possession of a software-secured key
pub const SECURITY_KEY_AMR: &str = "swk";

/// Posture rule type for the CrowdStrike service-to-service integration
pub const CROWDSTRIKE_RULE_TYPE: &str = "crowdstrike_s2s";

/// Posture rule type for OS version checks
pub const OS_VERSION_RULE_TYPE: &str = "os_version";

/// Rule-name fragment (lowercase) marking a minimum OS version rule
pub const MIN_CONSTRAINT_MARKER: &str = "min constraint";

/// Rule-name fragment (lowercase) marking an OS patch level rule
pub const PATCH_MARKER: &str = "patch";

/// Content type fragment that identifies a login page instead of JSON
pub const MARKUP_CONTENT_TYPE: &str = "text/html";

// ============================================================================
// Display
// ============================================================================

/// Number of login failures shown in the history panel
pub const HISTORY_DISPLAY_LIMIT: usize = 3;

/// Groups listed before the group panel is expanded
pub const DEFAULT_VISIBLE_GROUPS: usize = 5;

/// Name of the synthesized OS check when a device has no OS version rules
pub const PLACEHOLDER_OS_CHECK_NAME: &str = "OS Version Check";

/// Description of the synthesized OS check
pub const PLACEHOLDER_OS_CHECK_DESCRIPTION: &str =
    "No relevant OS version rules found for this device type";

/// Description used when a rule carries none
pub const NO_DESCRIPTION: &str = "No description available";

/// Application name used when a history entry carries none
pub const UNKNOWN_APPLICATION: &str = "Unknown App";

// ============================================================================
// Logging
// ============================================================================

/// Log file size that triggers rotation at startup
pub const MAX_LOG_BYTES: u64 = 10 * 1024 * 1024;
