// LogStream - app/tail.rs
//
// Live tail: one growth watcher per source polls its file for bytes appended
// since the last tick and hands the parsed lines to the subscriber hub.
//
// Architecture:
//   - `GrowthWatcher` holds a single source's state. Every `tick` first
//     claims the source's read guard, so there is never more than one read in
//     flight per source, even with several watchers (or several managers) on
//     the same source. A tick that finds the guard taken returns `Busy`.
//   - `TailManager` spawns those threads and stops them through a shared
//     `Arc<AtomicBool>` cancel flag. Sources are independent: a slow read on
//     one file never delays another file's tick.
//
// Encoding: new bytes are decoded as lossy UTF-8.
//
// Failure handling:
//   - Stat/read errors are returned from `tick`, logged as warnings by the
//     poll loop, and leave the offset untouched so the next tick retries.
//   - A file that shrinks or stays the same size is a no-op. Truncated or
//     rotated files are not re-read until they grow past the old offset.
//   - The poll loop sleeps in small sub-intervals so cancel is checked
//     promptly (within TAIL_CANCEL_CHECK_INTERVAL_MS of the flag being set).

use crate::app::hub::SubscriberHub;
use crate::app::registry::{Source, SourceRegistry};
use crate::core::model::UpdateBatch;
use crate::core::parser;
use crate::platform::fs;
use crate::util::constants::TAIL_CANCEL_CHECK_INTERVAL_MS;
use crate::util::error::LogStreamError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

// =============================================================================
// GrowthWatcher
// =============================================================================

/// What a single tick observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tick {
    /// The file does not exist (yet).
    Missing,
    /// The file is no larger than the consumed offset.
    Unchanged,
    /// Another watcher is reading this source; nothing was done.
    Busy,
    /// New bytes were consumed; `entries` non-blank lines were broadcast.
    Grew { bytes: u64, entries: usize },
}

/// Incremental reader for one source.
#[derive(Debug)]
pub struct GrowthWatcher {
    source: Source,
}

impl GrowthWatcher {
    pub fn new(source: Source) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &Source {
        &self.source
    }

    /// Check the file once and deliver anything appended since the last
    /// successful tick.
    ///
    /// The offset is published only after the appended range has been fully
    /// read and parsed; on error it is left where it was.
    pub fn tick(&mut self, hub: &SubscriberHub) -> Result<Tick, LogStreamError> {
        let Some(_claim) = self.source.try_claim_read() else {
            return Ok(Tick::Busy);
        };

        let path = self.source.path();
        let last_known_size = self.source.last_known_size();

        // -----------------------------------------------------------------
        // 1. Check current file size.
        // -----------------------------------------------------------------
        let current_size = match fs::file_size(path) {
            Ok(Some(size)) => size,
            Ok(None) => return Ok(Tick::Missing),
            Err(source) => {
                return Err(LogStreamError::Io {
                    path: path.to_path_buf(),
                    operation: "stat",
                    source,
                })
            }
        };

        // -----------------------------------------------------------------
        // 2. Nothing new (or truncated).
        // -----------------------------------------------------------------
        if current_size <= last_known_size {
            if current_size < last_known_size {
                tracing::debug!(
                    file = %path.display(),
                    offset = last_known_size,
                    size = current_size,
                    "Tail: file shrank; waiting for it to grow past the old offset"
                );
            }
            return Ok(Tick::Unchanged);
        }

        // -----------------------------------------------------------------
        // 3. Read exactly the appended range.
        // -----------------------------------------------------------------
        let new_bytes = fs::read_range(path, last_known_size, current_size - last_known_size)
            .map_err(|source| LogStreamError::Io {
                path: path.to_path_buf(),
                operation: "read",
                source,
            })?;

        // The file may have shrunk between stat and read; only what was
        // actually read counts as consumed.
        let bytes = new_bytes.len() as u64;
        if bytes == 0 {
            return Ok(Tick::Unchanged);
        }

        // -----------------------------------------------------------------
        // 4. Decode and parse in file order.
        // -----------------------------------------------------------------
        let decoded = String::from_utf8_lossy(&new_bytes);
        let entries = parser::parse_content(&decoded);
        let count = entries.len();

        // -----------------------------------------------------------------
        // 5. Publish the offset and broadcast, in one step.
        // -----------------------------------------------------------------
        let batch = UpdateBatch::new(self.source.name(), entries);
        let Some(delivered) =
            hub.commit_growth(&self.source, last_known_size, last_known_size + bytes, batch)
        else {
            return Ok(Tick::Busy);
        };

        tracing::debug!(
            source = %self.source.name(),
            bytes,
            entries = count,
            subscribers = delivered,
            "Tail: new entries"
        );

        Ok(Tick::Grew {
            bytes,
            entries: count,
        })
    }
}

// =============================================================================
// TailManager
// =============================================================================

/// Runs one growth watcher thread per registered source.
#[derive(Debug, Default)]
pub struct TailManager {
    cancel_flag: Option<Arc<AtomicBool>>,
    handles: Vec<JoinHandle<()>>,
}

impl TailManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start one watcher thread per source in the hub's registry, each
    /// ticking every `poll_interval`.
    ///
    /// If watchers are already running they are stopped first.
    pub fn start(&mut self, hub: Arc<SubscriberHub>, poll_interval: Duration) {
        self.stop();

        let cancel = Arc::new(AtomicBool::new(false));
        let sources: Vec<Source> = hub.registry().iter().cloned().collect();
        let source_count = sources.len();

        for source in sources {
            let watcher = GrowthWatcher::new(source);
            let hub = Arc::clone(&hub);
            let cancel = Arc::clone(&cancel);
            let name = format!("tail-{}", watcher.source().name());

            let spawned = std::thread::Builder::new()
                .name(name)
                .spawn(move || run_growth_watcher(watcher, hub, poll_interval, cancel));

            match spawned {
                Ok(handle) => self.handles.push(handle),
                Err(e) => tracing::error!(error = %e, "Failed to spawn tail thread"),
            }
        }

        self.cancel_flag = Some(cancel);

        tracing::info!(
            sources = source_count,
            interval_ms = poll_interval.as_millis() as u64,
            "Live tail started"
        );
    }

    /// Start watchers for every source of `registry` against a fresh hub.
    ///
    /// Convenience for callers that have not built a hub yet.
    pub fn start_for(
        &mut self,
        registry: Arc<SourceRegistry>,
        snapshot_limit: usize,
        poll_interval: Duration,
    ) -> Arc<SubscriberHub> {
        let hub = Arc::new(SubscriberHub::new(registry, snapshot_limit));
        self.start(Arc::clone(&hub), poll_interval);
        hub
    }

    /// Signal every watcher thread to exit and wait for them.
    ///
    /// Threads exit within `TAIL_CANCEL_CHECK_INTERVAL_MS` plus the duration
    /// of any read already in progress.
    pub fn stop(&mut self) {
        if let Some(flag) = self.cancel_flag.take() {
            flag.store(true, Ordering::SeqCst);
        }
        for handle in self.handles.drain(..) {
            if handle.join().is_err() {
                tracing::error!("Tail thread panicked");
            }
        }
    }

    /// Returns `true` if watcher threads are currently running.
    pub fn is_active(&self) -> bool {
        self.cancel_flag.is_some()
    }
}

impl Drop for TailManager {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Background poll loop for a single source.
fn run_growth_watcher(
    mut watcher: GrowthWatcher,
    hub: Arc<SubscriberHub>,
    poll_interval: Duration,
    cancel: Arc<AtomicBool>,
) {
    let slice = Duration::from_millis(TAIL_CANCEL_CHECK_INTERVAL_MS).min(poll_interval);

    tracing::debug!(
        source = %watcher.source().name(),
        file = %watcher.source().path().display(),
        offset = watcher.source().last_known_size(),
        "Tail: watcher started"
    );

    loop {
        // Interruptible sleep: check cancel flag between slices.
        let mut slept = Duration::ZERO;
        while slept < poll_interval {
            if cancel.load(Ordering::SeqCst) {
                tracing::debug!(source = %watcher.source().name(), "Tail: watcher stopped");
                return;
            }
            let step = slice.min(poll_interval - slept);
            std::thread::sleep(step);
            slept += step;
        }

        if cancel.load(Ordering::SeqCst) {
            tracing::debug!(source = %watcher.source().name(), "Tail: watcher stopped");
            return;
        }

        if let Err(e) = watcher.tick(&hub) {
            tracing::warn!(
                source = %watcher.source().name(),
                error = %e,
                "Tail: tick failed; will retry from the same offset"
            );
        }
    }
}
