//! Client error types.
//!
//! The variants map directly onto what the view layer needs to distinguish:
//! a rejected credential is terminal for that credential, everything else is
//! a transient transport condition the manager retries through.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    /// The server rejected the shared secret. Retrying with the same
    /// credential cannot succeed.
    #[error("Unauthorized: credential rejected by server")]
    Unauthorized,

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Malformed server response: {0}")]
    Malformed(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    pub fn is_auth(&self) -> bool {
        matches!(self, ClientError::Unauthorized)
    }
}

pub type ClientResult<T> = Result<T, ClientError>;
