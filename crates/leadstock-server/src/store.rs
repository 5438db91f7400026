//! In-memory snapshot store.
//!
//! Holds the single most recent snapshot. No history, no versioning: the
//! previous value is dropped on replace. Restart-loses-cache is intentional
//! for this domain (status, not audit).

use std::sync::Arc;

use chrono::Utc;
use leadstock_core::{Snapshot, WireMessage};
use parking_lot::RwLock;

/// Shared handle to the single most recent snapshot.
///
/// `get` never blocks beyond the Arc clone under a read lock, and a reader
/// can never observe a partial write: `set` swaps one Arc.
#[derive(Clone, Default)]
pub struct SnapshotStore {
    inner: Arc<RwLock<Option<Arc<Snapshot>>>>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last-written snapshot, or `None` before the first refresh completes.
    pub fn get(&self) -> Option<Arc<Snapshot>> {
        self.inner.read().clone()
    }

    /// Atomically replace the current snapshot.
    pub fn set(&self, snapshot: Snapshot) -> Arc<Snapshot> {
        let snapshot = Arc::new(snapshot);
        *self.inner.write() = Some(snapshot.clone());
        snapshot
    }

    /// Wire envelope for the pull endpoint: the current snapshot, or the
    /// explicit empty/pending marker.
    pub fn envelope(&self) -> WireMessage {
        match self.get() {
            Some(snapshot) => WireMessage::Snapshot {
                data: (*snapshot).clone(),
            },
            None => WireMessage::Empty {
                server_time_ms: Utc::now().timestamp_millis(),
            },
        }
    }
}
