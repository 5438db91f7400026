//! Application error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Server error: {0}")]
    Server(#[from] leadstock_server::ServerError),

    #[error("Client error: {0}")]
    Client(#[from] leadstock_client::ClientError),
}

pub type AppResult<T> = Result<T, AppError>;
