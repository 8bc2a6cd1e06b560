// LogStream - util/error.rs
//
// Typed error hierarchy with context-preserving error chains.
// Every variant keeps its cause reachable through `source()` so a single
// `tracing` call can log the full chain.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Top-level error type for all LogStream operations.
#[derive(Debug)]
pub enum LogStreamError {
    /// Configuration loading or validation failed.
    Config(ConfigError),

    /// A snapshot lookup could not be served.
    Api(ApiError),

    /// A subscriber could not be reached.
    Hub(HubError),

    /// I/O error with path context.
    Io {
        path: PathBuf,
        operation: &'static str,
        source: io::Error,
    },
}

impl fmt::Display for LogStreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "Configuration error: {e}"),
            Self::Api(e) => write!(f, "Request error: {e}"),
            Self::Hub(e) => write!(f, "Subscriber error: {e}"),
            Self::Io {
                path,
                operation,
                source,
            } => write!(
                f,
                "I/O error during {operation} on '{}': {source}",
                path.display()
            ),
        }
    }
}

impl std::error::Error for LogStreamError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Api(e) => Some(e),
            Self::Hub(e) => Some(e),
            Self::Io { source, .. } => Some(source),
        }
    }
}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

/// Errors related to configuration loading and source registration.
#[derive(Debug)]
pub enum ConfigError {
    /// TOML parsing failed.
    TomlParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// A config value is out of the allowed range.
    ValueOutOfRange {
        field: String,
        value: String,
        expected: String,
    },

    /// A source was registered with an empty or whitespace-only name.
    EmptySourceName { path: PathBuf },

    /// Two sources share the same name.
    DuplicateSource {
        name: String,
        path1: PathBuf,
        path2: PathBuf,
    },

    /// No sources were configured at all.
    NoSources,

    /// I/O error reading config file.
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TomlParse { path, source } => {
                write!(f, "Config parse error '{}': {source}", path.display())
            }
            Self::ValueOutOfRange {
                field,
                value,
                expected,
            } => write!(
                f,
                "Config '{field}' = '{value}' is out of range. Expected: {expected}"
            ),
            Self::EmptySourceName { path } => {
                write!(f, "Source for '{}' has an empty name", path.display())
            }
            Self::DuplicateSource { name, path1, path2 } => write!(
                f,
                "Duplicate source name '{name}' for '{}' and '{}'",
                path1.display(),
                path2.display()
            ),
            Self::NoSources => write!(f, "No log sources configured"),
            Self::Io { path, source } => {
                write!(f, "Config I/O error '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::TomlParse { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<ConfigError> for LogStreamError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// API errors
// ---------------------------------------------------------------------------

/// Errors surfaced to the routing layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The requested source name is not registered.
    SourceNotFound { name: String },
}

impl ApiError {
    /// HTTP status code a router should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::SourceNotFound { .. } => 404,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SourceNotFound { name } => write!(f, "Log type '{name}' not found"),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<ApiError> for LogStreamError {
    fn from(e: ApiError) -> Self {
        Self::Api(e)
    }
}

// ---------------------------------------------------------------------------
// Hub errors
// ---------------------------------------------------------------------------

/// Errors raised while delivering an event to a subscriber.
#[derive(Debug)]
pub enum HubError {
    /// The receiving side of the connection has gone away.
    Disconnected,

    /// The subscriber's outbound queue is full; it is not keeping up.
    Lagging { capacity: usize },

    /// The event could not be serialised to JSON.
    Serialize(serde_json::Error),
}

impl fmt::Display for HubError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "connection closed"),
            Self::Lagging { capacity } => {
                write!(f, "outbound queue full ({capacity} events pending)")
            }
            Self::Serialize(e) => write!(f, "cannot serialise event: {e}"),
        }
    }
}

impl std::error::Error for HubError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Serialize(e) => Some(e),
            _ => None,
        }
    }
}

impl From<HubError> for LogStreamError {
    fn from(e: HubError) -> Self {
        Self::Hub(e)
    }
}

/// Convenience type alias for LogStream results.
pub type Result<T> = std::result::Result<T, LogStreamError>;
