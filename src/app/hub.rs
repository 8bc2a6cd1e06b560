// LogStream - app/hub.rs
//
// Subscriber hub: the owned set of live connections.
//
// Architecture:
//   - Subscribers sit in a `Mutex`-guarded map keyed by a monotonic id.
//   - Every send goes through `Connection::send`, which must not block. The
//     bundled `ChannelConnection` uses a bounded `sync_channel` and
//     `try_send`, so a stalled consumer fills its own queue and is dropped
//     instead of stalling delivery to everyone else.
//   - A growth watcher publishes its new offset and broadcasts its batch in
//     one critical section (`commit_growth`). `subscribe` builds its snapshot
//     from published offsets inside the same lock, so every line reaches a
//     subscriber exactly once: either in the initial snapshot or in a later
//     update event.
//   - The price of that partition: `subscribe` reads every source file while
//     holding the lock, so watcher commits and broadcasts wait for as long as
//     one subscribe-time snapshot takes, roughly proportional to the total
//     size of the watched files.
//
// A failed send is an implicit unsubscribe: the connection is removed and
// never retried.

use crate::app::registry::{Source, SourceRegistry};
use crate::app::snapshot;
use crate::core::event::ServerEvent;
use crate::core::model::UpdateBatch;
use crate::util::error::HubError;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, SyncSender, TrySendError};
use std::sync::{Arc, Mutex, MutexGuard};

// =============================================================================
// Connections
// =============================================================================

/// Transport adapter for one subscriber.
///
/// Implementations receive each event already serialised to JSON and must
/// return promptly: either hand the message off without blocking or fail.
pub trait Connection: Send {
    fn send(&mut self, message: &str) -> Result<(), HubError>;
}

/// A connection backed by a bounded in-process queue.
///
/// The transport side drains the paired [`Receiver`]. When the receiver is
/// dropped the connection reports `Disconnected`; when the queue is full it
/// reports `Lagging`.
#[derive(Debug)]
pub struct ChannelConnection {
    tx: SyncSender<String>,
    capacity: usize,
}

impl ChannelConnection {
    /// Create a connection holding at most `capacity` undelivered events.
    pub fn new(capacity: usize) -> (Self, Receiver<String>) {
        let capacity = capacity.max(1);
        let (tx, rx) = mpsc::sync_channel(capacity);
        (Self { tx, capacity }, rx)
    }
}

impl Connection for ChannelConnection {
    fn send(&mut self, message: &str) -> Result<(), HubError> {
        match self.tx.try_send(message.to_string()) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => Err(HubError::Lagging {
                capacity: self.capacity,
            }),
            Err(TrySendError::Disconnected(_)) => Err(HubError::Disconnected),
        }
    }
}

// =============================================================================
// SubscriberHub
// =============================================================================

/// Opaque handle for a registered subscriber. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriberId(u64);

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

type Subscribers = BTreeMap<SubscriberId, Box<dyn Connection>>;

/// Tracks open subscriber connections and fans events out to them.
pub struct SubscriberHub {
    registry: Arc<SourceRegistry>,
    snapshot_limit: usize,
    next_id: AtomicU64,
    subscribers: Mutex<Subscribers>,
}

impl SubscriberHub {
    /// `snapshot_limit` caps the records per source in each initial event.
    pub fn new(registry: Arc<SourceRegistry>, snapshot_limit: usize) -> Self {
        Self {
            registry,
            snapshot_limit,
            next_id: AtomicU64::new(1),
            subscribers: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    /// Register `connection` and send it one `initial` event covering every
    /// source.
    ///
    /// If that first send fails the connection is not registered; the
    /// returned id is then already closed and `unsubscribe` on it is a no-op.
    pub fn subscribe(&self, connection: impl Connection + 'static) -> SubscriberId {
        self.subscribe_boxed(Box::new(connection))
    }

    /// Boxed form of [`subscribe`](Self::subscribe) for transports that
    /// already erase their connection type.
    pub fn subscribe_boxed(&self, mut connection: Box<dyn Connection>) -> SubscriberId {
        let id = SubscriberId(self.next_id.fetch_add(1, Ordering::Relaxed));

        let mut subscribers = self.lock();

        let logs = self
            .registry
            .iter()
            .map(|source| {
                let records = snapshot::snapshot_until(
                    source.path(),
                    self.snapshot_limit,
                    source.last_known_size(),
                );
                (source.name().to_string(), records)
            })
            .collect();

        let delivered = serialize(&ServerEvent::Initial { logs })
            .and_then(|message| connection.send(&message));

        match delivered {
            Ok(()) => {
                subscribers.insert(id, connection);
                tracing::info!(
                    subscriber = %id,
                    active = subscribers.len(),
                    "Subscriber connected"
                );
            }
            Err(e) => {
                tracing::warn!(subscriber = %id, error = %e, "Initial snapshot not delivered; dropping subscriber");
            }
        }

        id
    }

    /// Remove a subscriber. Returns `false` if it was not (or no longer)
    /// registered.
    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        let mut subscribers = self.lock();
        let removed = subscribers.remove(&id).is_some();
        if removed {
            tracing::info!(
                subscriber = %id,
                active = subscribers.len(),
                "Subscriber disconnected"
            );
        }
        removed
    }

    /// Send one `update` event for `batch` to every open subscriber.
    ///
    /// Returns the number of subscribers the event reached. Subscribers whose
    /// send fails are removed.
    pub fn broadcast(&self, batch: UpdateBatch) -> usize {
        let mut subscribers = self.lock();
        broadcast_locked(&mut subscribers, batch)
    }

    /// Move `source` from offset `from` to `to` and broadcast the batch read
    /// from that range, atomically with respect to `subscribe`.
    ///
    /// Returns `None` and drops the batch if the offset is no longer `from`:
    /// the range has already been published by another read.
    pub(crate) fn commit_growth(
        &self,
        source: &Source,
        from: u64,
        to: u64,
        batch: UpdateBatch,
    ) -> Option<usize> {
        let mut subscribers = self.lock();
        if !source.advance(from, to) {
            tracing::warn!(
                source = %source.name(),
                from,
                to,
                offset = source.last_known_size(),
                "Stale growth commit dropped"
            );
            return None;
        }
        if batch.is_empty() {
            return Some(0);
        }
        Some(broadcast_locked(&mut subscribers, batch))
    }

    /// Number of open subscribers.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, Subscribers> {
        // Every mutation is a single insert/remove; poison carries no state.
        self.subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl fmt::Debug for SubscriberHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriberHub")
            .field("sources", &self.registry.len())
            .field("snapshot_limit", &self.snapshot_limit)
            .field(
                "subscribers",
                &self.subscribers.try_lock().map(|s| s.len()).ok(),
            )
            .finish()
    }
}

fn broadcast_locked(subscribers: &mut Subscribers, batch: UpdateBatch) -> usize {
    let source_name = batch.source_name.clone();
    let count = batch.len();

    let message = match serialize(&ServerEvent::from(batch)) {
        Ok(m) => m,
        Err(e) => {
            tracing::error!(source = %source_name, error = %e, "Cannot serialise update event");
            return 0;
        }
    };

    subscribers.retain(|id, connection| match connection.send(&message) {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(subscriber = %id, error = %e, "Send failed; removing subscriber");
            false
        }
    });

    tracing::debug!(
        source = %source_name,
        entries = count,
        delivered = subscribers.len(),
        "Update broadcast"
    );

    subscribers.len()
}

fn serialize(event: &ServerEvent) -> Result<String, HubError> {
    serde_json::to_string(event).map_err(HubError::Serialize)
}
