//! Producer-side interfaces for leadstock.
//!
//! The scraping/aggregation collaborator that actually builds snapshot
//! content lives outside this workspace; this crate defines the seams it
//! plugs into ([`SnapshotProducer`], [`DetailProvider`]) plus the pure
//! ranking helpers applied to its output.

pub mod error;
pub mod placeholder;
pub mod producer;
pub mod rank;

pub use error::{FeedError, FeedResult};
pub use placeholder::{NoDetailProvider, PlaceholderProducer};
pub use producer::{DetailProvider, SnapshotProducer};
pub use rank::{rank_items, score_item, top_themes};
