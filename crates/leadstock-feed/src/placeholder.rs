//! Placeholder collaborators for running the server without a real scraper.
//!
//! The production producer is wired in by the deployment; until then the
//! server refreshes with an empty-but-valid snapshot so the distribution
//! path (store, broadcast, pull) is fully exercisable.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use leadstock_core::{ItemDetail, Snapshot, StockCode};
use tracing::debug;

use crate::error::FeedResult;
use crate::producer::{DetailProvider, SnapshotProducer};

/// Produces an empty snapshot stamped with the current time.
#[derive(Debug, Default)]
pub struct PlaceholderProducer {
    refreshes: AtomicU64,
}

#[async_trait]
impl SnapshotProducer for PlaceholderProducer {
    async fn produce(&self) -> FeedResult<Snapshot> {
        let seq = self.refreshes.fetch_add(1, Ordering::Relaxed) + 1;
        debug!(seq, "Placeholder producer refresh");
        Ok(Snapshot::now())
    }
}

/// Detail provider that knows no items.
#[derive(Debug, Default)]
pub struct NoDetailProvider;

#[async_trait]
impl DetailProvider for NoDetailProvider {
    async fn fetch_detail(&self, _code: &StockCode) -> FeedResult<Option<ItemDetail>> {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_placeholder_produces_valid_snapshot() {
        let producer = PlaceholderProducer::default();
        let snapshot = producer.produce().await.unwrap();
        assert!(snapshot.timestamp_ms > 0);
        assert!(snapshot.stocks.is_empty());
    }

    #[tokio::test]
    async fn test_no_detail_provider_returns_none() {
        let provider = NoDetailProvider;
        let code = StockCode::parse("005930").unwrap();
        assert!(provider.fetch_detail(&code).await.unwrap().is_none());
    }
}
