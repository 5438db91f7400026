//! Core domain types for the leadstock snapshot dashboard.
//!
//! Everything distributed to viewers is derived from a single immutable
//! [`Snapshot`]: market indices, detected themes, and the ranked list of
//! rising stocks. Per-item details ([`ItemDetail`]) are fetched on demand
//! and are not part of the snapshot.

pub mod detail;
pub mod error;
pub mod types;
pub mod wire;

pub use detail::{FinancialPeriod, InvestorTrend, ItemDetail, NewsItem, PivotLevels};
pub use error::{CoreError, Result};
pub use types::{IndexQuote, Market, RankedItem, Snapshot, StockCode, Theme};
pub use wire::{DetailResponse, RefreshAck, WireMessage};
