//! Application configuration.

use crate::error::{AppError, AppResult};
use leadstock_client::ClientConfig;
use leadstock_server::ServerConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level configuration, one file for both roles.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub client: ClientConfig,
}

impl AppConfig {
    /// Load configuration from a toml file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        toml::from_str(&text).map_err(|e| AppError::Config(e.to_string()))
    }
}
