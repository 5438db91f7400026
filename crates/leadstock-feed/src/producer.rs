//! Producer seams.
//!
//! Implementations are external collaborators (scrapers, aggregators,
//! exchange APIs). The synchronization core only depends on these traits.

use async_trait::async_trait;
use leadstock_core::{ItemDetail, Snapshot, StockCode};

use crate::error::FeedResult;

/// Builds a complete snapshot on demand.
///
/// A call either returns a fully populated snapshot or an error; the caller
/// (refresh scheduler) keeps the previous snapshot on error. Implementations
/// are expected to bound their own I/O with timeouts — the manual-refresh
/// wait in the gateway inherits that bound.
#[async_trait]
pub trait SnapshotProducer: Send + Sync {
    async fn produce(&self) -> FeedResult<Snapshot>;
}

/// Looks up per-item detail on demand.
///
/// Not cached by the synchronization core; any caching policy belongs to the
/// implementation.
#[async_trait]
pub trait DetailProvider: Send + Sync {
    /// Fetch detail for a validated code. `Ok(None)` means the item is
    /// unknown to the provider, which is not an error.
    async fn fetch_detail(&self, code: &StockCode) -> FeedResult<Option<ItemDetail>>;
}
