//! Client registry and snapshot broadcaster.
//!
//! Tracks the set of connected push-channel sessions. Each session owns an
//! mpsc queue drained by its socket task; broadcasting iterates a
//! point-in-time copy of the registered senders so sessions may register
//! and unregister concurrently.

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use leadstock_core::{Snapshot, WireMessage};
use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

/// Identity of one connected push session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Registry of connected push sessions.
///
/// `register` and `unregister` are idempotent and safe to call concurrently
/// with a broadcast in progress.
#[derive(Default)]
pub struct ClientRegistry {
    sessions: DashMap<SessionId, mpsc::Sender<String>>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session's outbound queue. Registering the same id again
    /// replaces the previous queue, so a session is never delivered to twice.
    pub fn register(&self, id: SessionId, tx: mpsc::Sender<String>) {
        self.sessions.insert(id, tx);
        debug!(session = %id, connections = self.len(), "Session registered");
    }

    /// Remove a session. No-op if it is already gone.
    pub fn unregister(&self, id: SessionId) {
        if self.sessions.remove(&id).is_some() {
            debug!(session = %id, connections = self.len(), "Session unregistered");
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Deliver a new snapshot to every registered session.
    ///
    /// Serializes once, then attempts a non-blocking enqueue per session. A
    /// closed or full queue unregisters that session — no retry, the client
    /// reconnects. Returns the number of successful deliveries.
    pub fn broadcast_snapshot(&self, snapshot: &Arc<Snapshot>) -> usize {
        let msg = WireMessage::Snapshot {
            data: (**snapshot).clone(),
        };
        let json = match serde_json::to_string(&msg) {
            Ok(json) => json,
            Err(e) => {
                warn!(error = %e, "Failed to serialize snapshot for broadcast");
                return 0;
            }
        };

        // Point-in-time copy: sessions may register/unregister while we
        // deliver, the live map is never iterated during sends.
        let targets: Vec<(SessionId, mpsc::Sender<String>)> = self
            .sessions
            .iter()
            .map(|e| (*e.key(), e.value().clone()))
            .collect();

        let mut delivered = 0;
        for (id, tx) in targets {
            match tx.try_send(json.clone()) {
                Ok(()) => delivered += 1,
                Err(e) => {
                    warn!(session = %id, error = %e, "Delivery failed, dropping session");
                    self.unregister(id);
                }
            }
        }

        debug!(
            delivered,
            timestamp_ms = snapshot.timestamp_ms,
            "Snapshot broadcast"
        );
        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use leadstock_core::Snapshot;

    fn snapshot_at(ts: i64) -> Arc<Snapshot> {
        Arc::new(Snapshot {
            timestamp_ms: ts,
            indices: vec![],
            themes: vec![],
            stocks: vec![],
        })
    }

    #[tokio::test]
    async fn test_register_twice_single_delivery() {
        let registry = ClientRegistry::new();
        let id = SessionId::new();
        let (tx, mut rx) = mpsc::channel(8);
        registry.register(id, tx.clone());
        registry.register(id, tx);

        assert_eq!(registry.broadcast_snapshot(&snapshot_at(1)), 1);
        assert!(rx.recv().await.is_some());
        assert!(rx.try_recv().is_err(), "must not deliver twice");
    }

    #[tokio::test]
    async fn test_unregister_is_idempotent() {
        let registry = ClientRegistry::new();
        let id = SessionId::new();
        let (tx, _rx) = mpsc::channel(1);
        registry.register(id, tx);
        registry.unregister(id);
        registry.unregister(id);
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_failed_delivery_drops_session() {
        let registry = ClientRegistry::new();
        let id = SessionId::new();
        let (tx, rx) = mpsc::channel(1);
        registry.register(id, tx);
        drop(rx);

        assert_eq!(registry.broadcast_snapshot(&snapshot_at(1)), 0);
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_full_queue_drops_session() {
        let registry = ClientRegistry::new();
        let id = SessionId::new();
        let (tx, _rx) = mpsc::channel(1);
        registry.register(id, tx);

        assert_eq!(registry.broadcast_snapshot(&snapshot_at(1)), 1);
        // Queue capacity is 1 and nothing drained it: buffer exceeded.
        assert_eq!(registry.broadcast_snapshot(&snapshot_at(2)), 0);
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_session_observes_publish_order() {
        let registry = ClientRegistry::new();
        let id = SessionId::new();
        let (tx, mut rx) = mpsc::channel(8);
        registry.register(id, tx);

        registry.broadcast_snapshot(&snapshot_at(1_000));
        registry.broadcast_snapshot(&snapshot_at(2_000));

        let first: WireMessage = serde_json::from_str(&rx.recv().await.unwrap()).unwrap();
        let second: WireMessage = serde_json::from_str(&rx.recv().await.unwrap()).unwrap();
        let a = first.into_snapshot().unwrap().timestamp_ms;
        let b = second.into_snapshot().unwrap().timestamp_ms;
        assert_eq!((a, b), (1_000, 2_000));
    }
}
