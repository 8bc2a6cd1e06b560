// LogStream - app/registry.rs
//
// The fixed table of watched sources. Built once at startup and read-only
// afterwards, except for each source's consumed-byte offset.
//
// A source allows at most one read in flight: a watcher must hold the
// source's `ReadClaim` for the whole stat-read-publish cycle, and the offset
// only moves forward through a compare-and-swap from the value the claim
// holder started at. Clones share both the claim flag and the offset.

use crate::platform::fs;
use crate::util::error::ConfigError;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// One watched log file.
#[derive(Debug, Clone)]
pub struct Source {
    name: String,
    path: PathBuf,
    /// Bytes already consumed by the growth watcher. Shared so the hub can
    /// bound subscribe-time snapshots to what has already been broadcast.
    last_known_size: Arc<AtomicU64>,
    /// Set while a watcher holds the source's `ReadClaim`.
    reading: Arc<AtomicBool>,
}

/// Exclusive right to read a source's appended range. Released on drop.
#[derive(Debug)]
pub struct ReadClaim<'a> {
    reading: &'a AtomicBool,
}

impl Drop for ReadClaim<'_> {
    fn drop(&mut self) {
        self.reading.store(false, Ordering::Release);
    }
}

impl Source {
    /// Create a source whose offset starts at the file's current size, or 0
    /// if the file does not exist yet.
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        let name = name.into();
        let path = path.into();

        let initial = match fs::file_size(&path) {
            Ok(size) => size.unwrap_or(0),
            Err(e) => {
                tracing::warn!(
                    source = %name,
                    file = %path.display(),
                    error = %e,
                    "Cannot stat source at startup; starting from offset 0"
                );
                0
            }
        };

        tracing::debug!(source = %name, file = %path.display(), offset = initial, "Source registered");

        Self {
            name,
            path,
            last_known_size: Arc::new(AtomicU64::new(initial)),
            reading: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Byte offset up to which the file has been read and broadcast.
    pub fn last_known_size(&self) -> u64 {
        self.last_known_size.load(Ordering::Acquire)
    }

    /// Claim the source for one read. Returns `None` while another watcher
    /// holds the claim.
    pub fn try_claim_read(&self) -> Option<ReadClaim<'_>> {
        self.reading
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| ReadClaim {
                reading: &self.reading,
            })
    }

    /// Move the consumed offset from `from` to `to`.
    ///
    /// Fails, leaving the offset alone, if it is no longer `from` or if `to`
    /// would move it backwards.
    pub(crate) fn advance(&self, from: u64, to: u64) -> bool {
        to >= from
            && self
                .last_known_size
                .compare_exchange(from, to, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
    }
}

/// Name-keyed table of every source the process watches.
#[derive(Debug, Clone)]
pub struct SourceRegistry {
    sources: Vec<Source>,
}

impl SourceRegistry {
    /// Register the given `(name, path)` pairs in order.
    ///
    /// Fails on an empty table, an empty name, or a name used twice.
    pub fn new(entries: Vec<(String, PathBuf)>) -> Result<Self, ConfigError> {
        if entries.is_empty() {
            return Err(ConfigError::NoSources);
        }

        let mut sources: Vec<Source> = Vec::with_capacity(entries.len());

        for (name, path) in entries {
            if name.trim().is_empty() {
                return Err(ConfigError::EmptySourceName { path });
            }
            if let Some(existing) = sources.iter().find(|s| s.name == name) {
                return Err(ConfigError::DuplicateSource {
                    name,
                    path1: existing.path.clone(),
                    path2: path,
                });
            }
            sources.push(Source::new(name, path));
        }

        tracing::info!(sources = sources.len(), "Source registry built");

        Ok(Self { sources })
    }

    /// Look up a source by name.
    pub fn get(&self, name: &str) -> Option<&Source> {
        self.sources.iter().find(|s| s.name == name)
    }

    /// Iterate over all sources in registration order.
    pub fn iter(&self) -> std::slice::Iter<'_, Source> {
        self.sources.iter()
    }

    /// Names of all sources in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}
