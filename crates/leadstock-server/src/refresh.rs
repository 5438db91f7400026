//! Refresh scheduling and single-flight execution.
//!
//! One refresh runs at a time. The scheduler drives a fixed-interval
//! refresh; manual triggers from the gateway run the same path out of band
//! without touching the timer's phase. Callers that arrive while a refresh
//! is in flight join it and share its outcome instead of invoking the
//! producer again.

use std::sync::Arc;
use std::time::Duration;

use leadstock_feed::{FeedError, SnapshotProducer};
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::registry::ClientRegistry;
use crate::store::SnapshotStore;

/// Result of one refresh, cloned to every coalesced caller.
pub type RefreshOutcome = Result<Arc<leadstock_core::Snapshot>, Arc<FeedError>>;

type InflightRx = watch::Receiver<Option<RefreshOutcome>>;

/// Fetch-and-publish executor with single-flight coalescing.
#[derive(Clone)]
pub struct Refresher {
    inner: Arc<RefresherInner>,
}

struct RefresherInner {
    producer: Arc<dyn SnapshotProducer>,
    store: SnapshotStore,
    registry: Arc<ClientRegistry>,
    inflight: Mutex<Option<InflightRx>>,
}

impl Refresher {
    pub fn new(
        producer: Arc<dyn SnapshotProducer>,
        store: SnapshotStore,
        registry: Arc<ClientRegistry>,
    ) -> Self {
        Self {
            inner: Arc::new(RefresherInner {
                producer,
                store,
                registry,
                inflight: Mutex::new(None),
            }),
        }
    }

    /// Run a refresh, or join the one already in flight.
    ///
    /// On success the store is updated and the new snapshot broadcast before
    /// any caller observes the outcome, so publish order is serialized. On
    /// failure the store keeps its previous snapshot.
    pub async fn refresh(&self) -> RefreshOutcome {
        let mut rx = {
            let mut inflight = self.inner.inflight.lock();
            match inflight.as_ref() {
                Some(rx) => rx.clone(),
                None => {
                    let (tx, rx) = watch::channel(None);
                    *inflight = Some(rx.clone());
                    let this = self.clone();
                    tokio::spawn(async move {
                        let outcome = this.run_once().await;
                        // Clear the flight before publishing the outcome so
                        // a caller arriving now starts a fresh refresh
                        // instead of joining a finished one.
                        *this.inner.inflight.lock() = None;
                        let _ = tx.send(Some(outcome));
                    });
                    rx
                }
            }
        };

        loop {
            if let Some(outcome) = rx.borrow_and_update().as_ref() {
                return outcome.clone();
            }
            if rx.changed().await.is_err() {
                return Err(Arc::new(FeedError::Producer(
                    "refresh task dropped".to_string(),
                )));
            }
        }
    }

    async fn run_once(&self) -> RefreshOutcome {
        match self.inner.producer.produce().await {
            Ok(snapshot) => {
                let snapshot = self.inner.store.set(snapshot);
                let delivered = self.inner.registry.broadcast_snapshot(&snapshot);
                info!(
                    timestamp_ms = snapshot.timestamp_ms,
                    stocks = snapshot.stocks.len(),
                    delivered,
                    "Snapshot refreshed"
                );
                Ok(snapshot)
            }
            Err(e) => {
                // Stale-but-valid beats cleared-on-transient-error: the
                // store keeps its previous snapshot.
                warn!(error = %e, "Refresh failed, keeping previous snapshot");
                Err(Arc::new(e))
            }
        }
    }
}

/// Run the background refresh loop: once on start, then every `interval`.
///
/// Producer failures are non-fatal; the loop never exits on error, only on
/// shutdown.
pub async fn run_scheduler(refresher: Refresher, interval: Duration, shutdown: CancellationToken) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!(interval_secs = interval.as_secs(), "Refresh scheduler started");
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let _ = refresher.refresh().await;
            }
            () = shutdown.cancelled() => {
                info!("Refresh scheduler stopped");
                break;
            }
        }
    }
}
