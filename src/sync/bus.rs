//! Cross-instance change bus
//!
//! Broadcast channel connecting every store handle that shares one persisted
//! blob. It plays the role of the platform storage event: when one handle
//! rewrites the blob, every other handle hears about it and re-loads. The bus
//! carries only notices, never data; the blob itself is the transport.

use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Default capacity of the broadcast channel
pub const DEFAULT_BUS_CAPACITY: usize = 64;

/// Notice that some handle rewrote the shared blob
///
/// Handles compare `origin` against their own id and ignore their own
/// notices, matching the storage-event contract (only *other* contexts
/// observe a write).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChangeNotice {
    /// Id of the store handle that performed the write
    pub origin: Uuid,
    /// When the write happened
    pub changed_at: DateTime<Utc>,
}

impl ChangeNotice {
    pub fn from_origin(origin: Uuid) -> Self {
        Self {
            origin,
            changed_at: Utc::now(),
        }
    }
}

/// Broadcast channel shared by all store handles over one blob
#[derive(Debug, Clone)]
pub struct ChangeBus {
    tx: broadcast::Sender<ChangeNotice>,
}

impl ChangeBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Get a receiver for change notices
    pub fn subscribe(&self) -> broadcast::Receiver<ChangeNotice> {
        self.tx.subscribe()
    }

    /// Publish a notice to all current subscribers
    ///
    /// A bus with no subscribers is fine; the notice is simply dropped.
    pub fn publish(&self, notice: ChangeNotice) {
        let receivers = self.tx.send(notice).unwrap_or(0);
        tracing::trace!(origin = %notice.origin, receivers, "published change notice");
    }

    /// Number of attached receivers
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for ChangeBus {
    fn default() -> Self {
        Self::new(DEFAULT_BUS_CAPACITY)
    }
}
