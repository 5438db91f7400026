//! Feed error types.

use thiserror::Error;

/// Errors surfaced by snapshot producers and detail providers.
///
/// These never reach a viewer: the refresh scheduler swallows them at its
/// boundary and keeps the previous snapshot.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("Producer failed: {0}")]
    Producer(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type FeedResult<T> = Result<T, FeedError>;
