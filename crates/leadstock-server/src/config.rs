//! Server configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Gateway and refresh loop configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Seconds between scheduled refreshes.
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,
    /// Shared secret; empty = open access.
    #[serde(default)]
    pub app_token: String,
    /// Per-session outbound queue capacity. A session falling this many
    /// snapshots behind is dropped.
    #[serde(default = "default_session_queue")]
    pub session_queue: usize,
}

fn default_port() -> u16 {
    8787
}

fn default_refresh_interval_secs() -> u64 {
    60
}

fn default_session_queue() -> usize {
    32
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            refresh_interval_secs: default_refresh_interval_secs(),
            app_token: String::new(),
            session_queue: default_session_queue(),
        }
    }
}

impl ServerConfig {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs.max(1))
    }

    pub fn app_token(&self) -> Option<String> {
        let t = self.app_token.trim();
        (!t.is_empty()).then(|| t.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 8787);
        assert_eq!(config.refresh_interval(), Duration::from_secs(60));
        assert!(config.app_token().is_none());
    }

    #[test]
    fn test_interval_floor() {
        let config = ServerConfig {
            refresh_interval_secs: 0,
            ..Default::default()
        };
        assert_eq!(config.refresh_interval(), Duration::from_secs(1));
    }
}
