// LogStream - core/model.rs
//
// Core data model types. Pure data definitions with no I/O and no platform
// dependencies. These types are the shared vocabulary across all layers and
// serialise to the exact JSON shape the dashboard consumes.

use serde::{Deserialize, Serialize};

// =============================================================================
// Log Record (normalised output of parsing)
// =============================================================================

/// A single parsed log line.
///
/// `raw` always reproduces the input line byte-for-byte (after lossy UTF-8
/// decoding); every other field is best-effort and filled with placeholders
/// when the line does not follow the syslog-style grammar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    /// Timestamp as written in the line, or the parse time for fallback records.
    pub timestamp: String,

    /// Host that emitted the line.
    pub hostname: String,

    /// Syslog facility (the part before the last `.` of the priority token).
    pub facility: String,

    /// Syslog severity (the part after the last `.` of the priority token).
    pub severity: String,

    /// Program name preceding the optional `[pid]`.
    pub program: String,

    /// Process ID, present only when the line carried `[digits]`.
    pub pid: Option<String>,

    /// Everything after the header's `:`.
    pub message: String,

    /// The original, unmodified line.
    pub raw: String,
}

// =============================================================================
// Update Batch
// =============================================================================

/// Records parsed from one growth event of one source, in file order.
///
/// Batches are ephemeral: they are handed to the hub, broadcast once and
/// dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateBatch {
    /// Name of the source the lines were appended to.
    pub source_name: String,

    /// Parsed records, oldest-appended first.
    pub entries: Vec<LogRecord>,
}

impl UpdateBatch {
    pub fn new(source_name: impl Into<String>, entries: Vec<LogRecord>) -> Self {
        Self {
            source_name: source_name.into(),
            entries,
        }
    }

    /// Number of records in the batch.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the batch carries no records.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
