// LogStream - platform/config.rs
//
// Platform-specific configuration path resolution and config.toml loading
// with startup validation.
//
// Uses the `directories` crate for XDG (Linux), AppData (Windows),
// Library (macOS) compliance.

use crate::util::constants;
use crate::util::error::ConfigError;
use directories::ProjectDirs;
use std::collections::BTreeMap;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Resolved platform paths for LogStream configuration.
#[derive(Debug, Clone)]
pub struct PlatformPaths {
    /// Configuration directory (e.g. ~/.config/logstream/ or %APPDATA%\LogStream\config\)
    pub config_dir: PathBuf,
}

impl PlatformPaths {
    /// Resolve platform-appropriate paths.
    ///
    /// Falls back to the current directory if platform dirs cannot be determined.
    pub fn resolve() -> Self {
        if let Some(proj_dirs) = ProjectDirs::from("", "", constants::APP_ID) {
            let config_dir = proj_dirs.config_dir().to_path_buf();

            tracing::debug!(config = %config_dir.display(), "Platform paths resolved");

            Self { config_dir }
        } else {
            tracing::warn!("Could not determine platform directories, using current directory");
            Self {
                config_dir: PathBuf::from("."),
            }
        }
    }

    /// Default location of `config.toml`.
    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join(constants::CONFIG_FILE_NAME)
    }
}

// =============================================================================
// config.toml loading and validation
// =============================================================================

/// Raw deserialisable shape of config.toml.
///
/// Unknown keys are silently ignored so a newer config file still loads with
/// an older binary.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct RawConfig {
    /// `[sources]` table: source name -> file path.
    pub sources: Option<BTreeMap<String, String>>,
    /// `[tail]` section.
    pub tail: TailSection,
    /// `[snapshot]` section.
    pub snapshot: SnapshotSection,
    /// `[hub]` section.
    pub hub: HubSection,
    /// `[logging]` section.
    pub logging: LoggingSection,
}

/// `[tail]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct TailSection {
    /// Poll interval per source in milliseconds.
    pub poll_interval_ms: Option<u64>,
}

/// `[snapshot]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct SnapshotSection {
    /// Records per source sent on subscribe and for per-source lookups.
    pub default_limit: Option<usize>,
    /// Records per source in the all-sources overview.
    pub overview_limit: Option<usize>,
}

/// `[hub]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct HubSection {
    /// Queue depth of each channel-backed subscriber.
    pub subscriber_queue: Option<usize>,
}

/// `[logging]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub level: Option<String>,
}

/// Validated application configuration derived from `config.toml`.
///
/// Invalid values produce actionable warnings and fall back to defaults.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Watched sources in name order.
    pub sources: Vec<(String, PathBuf)>,
    /// Growth watcher poll interval.
    pub poll_interval: Duration,
    /// Snapshot size for subscribers and per-source lookups.
    pub default_limit: usize,
    /// Snapshot size for the all-sources overview.
    pub overview_limit: usize,
    /// Channel subscriber queue depth.
    pub subscriber_queue: usize,
    /// Logging level string (for init before tracing is available).
    pub log_level: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            sources: constants::DEFAULT_SOURCES
                .iter()
                .map(|(name, path)| ((*name).to_string(), PathBuf::from(path)))
                .collect(),
            poll_interval: Duration::from_millis(constants::TAIL_POLL_INTERVAL_MS),
            default_limit: constants::DEFAULT_SNAPSHOT_LIMIT,
            overview_limit: constants::DEFAULT_OVERVIEW_LIMIT,
            subscriber_queue: constants::DEFAULT_SUBSCRIBER_QUEUE,
            log_level: None,
        }
    }
}

/// Load and validate the config file at `config_path`.
///
/// Returns `AppConfig` with validated values and a list of non-fatal warnings.
/// If the file does not exist, returns defaults with no warnings.
/// If the file is unreadable or unparseable, returns defaults with a warning;
/// the application still starts but the operator is informed.
pub fn load_config(config_path: &Path) -> (AppConfig, Vec<String>) {
    if !config_path.exists() {
        tracing::debug!(path = %config_path.display(), "No config.toml found; using defaults");
        return (AppConfig::default(), Vec::new());
    }

    let content = match std::fs::read_to_string(config_path) {
        Ok(c) => c,
        Err(source) => {
            let err = ConfigError::Io {
                path: config_path.to_path_buf(),
                source,
            };
            let msg = format!("{err}. Using defaults.");
            tracing::warn!("{}", msg);
            return (AppConfig::default(), vec![msg]);
        }
    };

    let raw: RawConfig = match toml::from_str(&content) {
        Ok(r) => r,
        Err(source) => {
            let err = ConfigError::TomlParse {
                path: config_path.to_path_buf(),
                source,
            };
            let msg = format!(
                "{err}. Using defaults. See config.example.toml for the expected format."
            );
            tracing::warn!("{}", msg);
            return (AppConfig::default(), vec![msg]);
        }
    };

    tracing::info!(path = %config_path.display(), "Loaded config.toml");

    validate(raw)
}

/// Validate each field of a parsed config against named constants,
/// accumulating every problem instead of stopping at the first.
pub fn validate(raw: RawConfig) -> (AppConfig, Vec<String>) {
    let mut config = AppConfig::default();
    let mut warnings: Vec<String> = Vec::new();

    // -- Sources --
    if let Some(sources) = raw.sources {
        let mut accepted = Vec::with_capacity(sources.len());
        for (name, path) in sources {
            if name.trim().is_empty() || path.trim().is_empty() {
                warnings.push(format!(
                    "[sources] entry '{name}' = \"{path}\" has an empty name or path. Skipping it.",
                ));
                continue;
            }
            accepted.push((name, PathBuf::from(path)));
        }
        if accepted.is_empty() {
            warnings.push(
                "[sources] contains no usable entries. Using the default source table."
                    .to_string(),
            );
        } else {
            config.sources = accepted;
        }
    }

    // -- Tail: poll_interval_ms --
    if let Some(ms) = raw.tail.poll_interval_ms {
        if (constants::MIN_TAIL_POLL_INTERVAL_MS..=constants::MAX_TAIL_POLL_INTERVAL_MS)
            .contains(&ms)
        {
            config.poll_interval = Duration::from_millis(ms);
        } else {
            warnings.push(out_of_range(
                "tail.poll_interval_ms",
                ms,
                format!(
                    "{}-{}",
                    constants::MIN_TAIL_POLL_INTERVAL_MS,
                    constants::MAX_TAIL_POLL_INTERVAL_MS
                ),
                constants::TAIL_POLL_INTERVAL_MS,
            ));
        }
    }

    // -- Snapshot limits --
    let limit_range = constants::MIN_SNAPSHOT_LIMIT..=constants::MAX_SNAPSHOT_LIMIT;
    let limit_expected = format!(
        "{}-{}",
        constants::MIN_SNAPSHOT_LIMIT,
        constants::MAX_SNAPSHOT_LIMIT
    );
    if let Some(limit) = raw.snapshot.default_limit {
        if limit_range.contains(&limit) {
            config.default_limit = limit;
        } else {
            warnings.push(out_of_range(
                "snapshot.default_limit",
                limit,
                limit_expected.clone(),
                constants::DEFAULT_SNAPSHOT_LIMIT,
            ));
        }
    }
    if let Some(limit) = raw.snapshot.overview_limit {
        if limit_range.contains(&limit) {
            config.overview_limit = limit;
        } else {
            warnings.push(out_of_range(
                "snapshot.overview_limit",
                limit,
                limit_expected,
                constants::DEFAULT_OVERVIEW_LIMIT,
            ));
        }
    }

    // -- Hub: subscriber_queue --
    if let Some(depth) = raw.hub.subscriber_queue {
        if (constants::MIN_SUBSCRIBER_QUEUE..=constants::MAX_SUBSCRIBER_QUEUE).contains(&depth) {
            config.subscriber_queue = depth;
        } else {
            warnings.push(out_of_range(
                "hub.subscriber_queue",
                depth,
                format!(
                    "{}-{}",
                    constants::MIN_SUBSCRIBER_QUEUE,
                    constants::MAX_SUBSCRIBER_QUEUE
                ),
                constants::DEFAULT_SUBSCRIBER_QUEUE,
            ));
        }
    }

    // -- Logging: level --
    if let Some(ref level) = raw.logging.level {
        if constants::VALID_LOG_LEVELS.contains(&level.to_lowercase().as_str()) {
            config.log_level = Some(level.to_lowercase());
        } else {
            warnings.push(out_of_range(
                "logging.level",
                level,
                format!("one of {}", constants::VALID_LOG_LEVELS.join(", ")),
                constants::DEFAULT_LOG_LEVEL,
            ));
        }
    }

    if !warnings.is_empty() {
        tracing::warn!(
            count = warnings.len(),
            "Config validation produced warnings"
        );
    }

    (config, warnings)
}

/// Render a rejected value as a warning that names the fallback in use.
fn out_of_range(
    field: &str,
    value: impl Display,
    expected: String,
    default: impl Display,
) -> String {
    let err = ConfigError::ValueOutOfRange {
        field: field.to_string(),
        value: value.to_string(),
        expected,
    };
    format!("{err}. Using default ({default}).")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(content: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(constants::CONFIG_FILE_NAME);
        std::fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let (config, warnings) = load_config(&dir.path().join("nope.toml"));

        assert!(warnings.is_empty());
        assert_eq!(config.sources.len(), constants::DEFAULT_SOURCES.len());
        assert_eq!(config.poll_interval, Duration::from_millis(1_000));
        assert_eq!(config.default_limit, 1_000);
        assert_eq!(config.overview_limit, 100);
    }

    #[test]
    fn test_full_config_is_applied() {
        let (_dir, path) = write_config(
            r#"
[sources]
system = "/tmp/system.log"
auth = "/tmp/auth.log"

[tail]
poll_interval_ms = 250

[snapshot]
default_limit = 50
overview_limit = 10

[hub]
subscriber_queue = 8

[logging]
level = "DEBUG"
"#,
        );
        let (config, warnings) = load_config(&path);

        assert!(warnings.is_empty(), "unexpected warnings: {warnings:?}");
        assert_eq!(
            config.sources,
            vec![
                ("auth".to_string(), PathBuf::from("/tmp/auth.log")),
                ("system".to_string(), PathBuf::from("/tmp/system.log")),
            ]
        );
        assert_eq!(config.poll_interval, Duration::from_millis(250));
        assert_eq!(config.default_limit, 50);
        assert_eq!(config.overview_limit, 10);
        assert_eq!(config.subscriber_queue, 8);
        assert_eq!(config.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_out_of_range_values_warn_and_fall_back() {
        let (_dir, path) = write_config(
            r#"
[tail]
poll_interval_ms = 5

[snapshot]
default_limit = 0

[hub]
subscriber_queue = 1000000

[logging]
level = "loud"
"#,
        );
        let (config, warnings) = load_config(&path);

        assert_eq!(warnings.len(), 4, "got: {warnings:?}");
        assert_eq!(
            warnings[0],
            "Config 'tail.poll_interval_ms' = '5' is out of range. \
             Expected: 100-10000. Using default (1000)."
        );
        assert!(warnings[3].starts_with("Config 'logging.level' = 'loud'"));
        assert_eq!(config.poll_interval, Duration::from_millis(1_000));
        assert_eq!(config.default_limit, 1_000);
        assert_eq!(config.subscriber_queue, constants::DEFAULT_SUBSCRIBER_QUEUE);
        assert_eq!(config.log_level, None);
    }

    #[test]
    fn test_blank_source_entries_are_skipped() {
        let (_dir, path) = write_config(
            r#"
[sources]
system = "/tmp/system.log"
broken = ""
"#,
        );
        let (config, warnings) = load_config(&path);

        assert_eq!(warnings.len(), 1);
        assert_eq!(config.sources.len(), 1);
        assert_eq!(config.sources[0].0, "system");
    }

    #[test]
    fn test_unreadable_file_warns_and_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        // A directory exists but cannot be read as a file.
        let (config, warnings) = load_config(dir.path());

        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].starts_with("Config I/O error"), "got: {warnings:?}");
        assert_eq!(config.sources.len(), constants::DEFAULT_SOURCES.len());
    }

    #[test]
    fn test_unparseable_file_warns_and_uses_defaults() {
        let (_dir, path) = write_config("[tail\npoll_interval_ms = ");
        let (config, warnings) = load_config(&path);

        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].starts_with("Config parse error"), "got: {warnings:?}");
        assert_eq!(config.sources.len(), constants::DEFAULT_SOURCES.len());
    }
}
