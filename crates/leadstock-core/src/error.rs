//! Error types for leadstock-core.

use thiserror::Error;

/// Core error types.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid stock code: {0}")]
    InvalidStockCode(String),

    #[error("Invalid market: {0}")]
    InvalidMarket(String),

    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(String),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
