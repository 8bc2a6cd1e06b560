// LogStream - util/constants.rs
//
// Single source of truth for all named constants, limits, and defaults.

// =============================================================================
// Application metadata
// =============================================================================

/// Application display name.
pub const APP_NAME: &str = "LogStream";

/// Application identifier used for config/data directories.
pub const APP_ID: &str = "LogStream";

/// Current application version.
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

// =============================================================================
// Default sources
// =============================================================================

/// Sources watched when no `[sources]` table is configured.
pub const DEFAULT_SOURCES: &[(&str, &str)] = &[
    ("system", "/var/log/custom/system.log"),
    ("auth", "/var/log/custom/auth.log"),
    ("combined", "/var/log/custom/combined.log"),
    ("error", "/var/log/custom/error.log"),
    ("access", "/var/log/custom/access.log"),
];

// =============================================================================
// Parsing
// =============================================================================

/// Placeholder used for header fields of lines that do not match the grammar.
pub const FALLBACK_FIELD: &str = "unknown";

/// Severity assigned to lines that do not match the grammar.
pub const FALLBACK_SEVERITY: &str = "info";

// =============================================================================
// Snapshot limits
// =============================================================================

/// Records per source in the subscribe-time snapshot and per-source lookups.
pub const DEFAULT_SNAPSHOT_LIMIT: usize = 1_000;

/// Records per source in the all-sources overview.
pub const DEFAULT_OVERVIEW_LIMIT: usize = 100;

/// Minimum user-configurable snapshot limit.
pub const MIN_SNAPSHOT_LIMIT: usize = 1;

/// Maximum user-configurable snapshot limit.
pub const MAX_SNAPSHOT_LIMIT: usize = 100_000;

// =============================================================================
// Live tail
// =============================================================================

/// How often each growth watcher stats its file (ms).
pub const TAIL_POLL_INTERVAL_MS: u64 = 1_000;

/// How often the cancel flag is checked within each poll sleep interval (ms).
pub const TAIL_CANCEL_CHECK_INTERVAL_MS: u64 = 100;

/// Minimum user-configurable tail poll interval (ms).
pub const MIN_TAIL_POLL_INTERVAL_MS: u64 = 100;

/// Maximum user-configurable tail poll interval (ms).
pub const MAX_TAIL_POLL_INTERVAL_MS: u64 = 10_000; // 10 s

// =============================================================================
// Subscriber hub
// =============================================================================

/// Events queued per channel subscriber before it is considered lagging and
/// dropped.
pub const DEFAULT_SUBSCRIBER_QUEUE: usize = 256;

/// Minimum user-configurable subscriber queue depth.
pub const MIN_SUBSCRIBER_QUEUE: usize = 1;

/// Maximum user-configurable subscriber queue depth.
pub const MAX_SUBSCRIBER_QUEUE: usize = 65_536;

// =============================================================================
// Logging
// =============================================================================

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Log levels accepted in `[logging] level`.
pub const VALID_LOG_LEVELS: &[&str] = &["error", "warn", "info", "debug", "trace"];

// =============================================================================
// Configuration
// =============================================================================

/// Configuration file name.
pub const CONFIG_FILE_NAME: &str = "config.toml";
