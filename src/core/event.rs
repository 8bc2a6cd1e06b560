// LogStream - core/event.rs
//
// Events pushed to subscribers. Each variant serialises to one JSON object
// tagged with `type`:
//
//   {"type":"initial","logs":{"system":[...],"auth":[...]}}
//   {"type":"update","logType":"system","entries":[...]}

use crate::core::model::{LogRecord, UpdateBatch};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A message the hub delivers to a subscriber connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServerEvent {
    /// Snapshot of every source, sent once when a subscriber connects.
    Initial {
        logs: BTreeMap<String, Vec<LogRecord>>,
    },

    /// Newly appended records of a single source.
    Update {
        #[serde(rename = "logType")]
        log_type: String,
        entries: Vec<LogRecord>,
    },
}

impl From<UpdateBatch> for ServerEvent {
    fn from(batch: UpdateBatch) -> Self {
        ServerEvent::Update {
            log_type: batch.source_name,
            entries: batch.entries,
        }
    }
}
