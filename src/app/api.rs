// LogStream - app/api.rs
//
// Request-level operations a router exposes over HTTP:
//   GET /api/logs/:name?limit=N  -> `LogApi::logs_for`
//   GET /api/logs                -> `LogApi::overview`
//   GET /health                  -> `LogApi::health`
//
// No HTTP here; callers serialise the returned values as JSON.

use crate::app::registry::SourceRegistry;
use crate::app::snapshot;
use crate::core::model::LogRecord;
use crate::util::error::ApiError;
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

/// Liveness report listing every watched path.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub status: &'static str,
    pub timestamp: String,
    pub log_paths: BTreeMap<String, PathBuf>,
}

/// Snapshot lookups over the source registry.
#[derive(Debug, Clone)]
pub struct LogApi {
    registry: Arc<SourceRegistry>,
    default_limit: usize,
    overview_limit: usize,
}

impl LogApi {
    pub fn new(registry: Arc<SourceRegistry>, default_limit: usize, overview_limit: usize) -> Self {
        Self {
            registry,
            default_limit,
            overview_limit,
        }
    }

    /// Newest-first records of one source, `limit` defaulting to the
    /// configured snapshot size.
    pub fn logs_for(&self, name: &str, limit: Option<usize>) -> Result<Vec<LogRecord>, ApiError> {
        let source = self
            .registry
            .get(name)
            .ok_or_else(|| ApiError::SourceNotFound {
                name: name.to_string(),
            })?;

        Ok(snapshot::snapshot(
            source.path(),
            limit.unwrap_or(self.default_limit),
        ))
    }

    /// Newest-first records of every source, capped at the overview limit.
    pub fn overview(&self) -> BTreeMap<String, Vec<LogRecord>> {
        self.registry
            .iter()
            .map(|source| {
                (
                    source.name().to_string(),
                    snapshot::snapshot(source.path(), self.overview_limit),
                )
            })
            .collect()
    }

    pub fn health(&self) -> HealthReport {
        HealthReport {
            status: "healthy",
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            log_paths: self
                .registry
                .iter()
                .map(|source| (source.name().to_string(), source.path().to_path_buf()))
                .collect(),
        }
    }
}
