//! Client configuration and persisted settings.

use crate::error::{ClientError, ClientResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Connection settings for the dashboard client.
///
/// `server_url` is the HTTP origin (`http://host:port`); the push URL is
/// derived from it. Saved to and loaded from a small toml file so the
/// server address and token survive restarts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    pub server_url: String,
    /// Shared secret; empty = none sent.
    #[serde(default)]
    pub token: String,
    /// Poll fallback interval in seconds.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// Per-request timeout for pulls, in seconds.
    #[serde(default = "default_pull_timeout_secs")]
    pub pull_timeout_secs: u64,
    /// Push handshake timeout in seconds.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Never open a push channel; poll only.
    #[serde(default)]
    pub pull_only: bool,
}

fn default_poll_interval_secs() -> u64 {
    60
}

fn default_pull_timeout_secs() -> u64 {
    15
}

fn default_connect_timeout_secs() -> u64 {
    10
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:8787".to_string(),
            token: String::new(),
            poll_interval_secs: default_poll_interval_secs(),
            pull_timeout_secs: default_pull_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            pull_only: false,
        }
    }
}

impl ClientConfig {
    /// Derive the push endpoint from the HTTP origin, carrying the token as
    /// a query parameter since the handshake cannot set headers everywhere.
    pub fn ws_url(&self) -> String {
        let origin = self.server_url.trim_end_matches('/');
        let ws_origin = if let Some(rest) = origin.strip_prefix("https://") {
            format!("wss://{rest}")
        } else if let Some(rest) = origin.strip_prefix("http://") {
            format!("ws://{rest}")
        } else {
            format!("ws://{origin}")
        };
        match self.token() {
            Some(token) => format!("{ws_origin}/ws?token={token}"),
            None => format!("{ws_origin}/ws"),
        }
    }

    /// Pull endpoint URL.
    pub fn snapshot_url(&self) -> String {
        format!("{}/snapshot", self.server_url.trim_end_matches('/'))
    }

    pub fn token(&self) -> Option<&str> {
        let t = self.token.trim();
        (!t.is_empty()).then_some(t)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }

    pub fn pull_timeout(&self) -> Duration {
        Duration::from_secs(self.pull_timeout_secs.max(1))
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs.max(1))
    }

    /// Load persisted settings.
    pub fn load(path: &Path) -> ClientResult<Self> {
        let text = std::fs::read_to_string(path)?;
        toml::from_str(&text).map_err(|e| ClientError::Config(e.to_string()))
    }

    /// Persist settings, creating parent directories as needed.
    pub fn save(&self, path: &Path) -> ClientResult<()> {
        let text = toml::to_string_pretty(self).map_err(|e| ClientError::Config(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, text)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ws_url_derivation() {
        let config = ClientConfig {
            server_url: "http://localhost:8787".to_string(),
            ..Default::default()
        };
        assert_eq!(config.ws_url(), "ws://localhost:8787/ws");

        let config = ClientConfig {
            server_url: "https://dash.example.com/".to_string(),
            token: "s3cret".to_string(),
            ..Default::default()
        };
        assert_eq!(config.ws_url(), "wss://dash.example.com/ws?token=s3cret");
    }

    #[test]
    fn test_snapshot_url_trims_slash() {
        let config = ClientConfig {
            server_url: "http://localhost:8787/".to_string(),
            ..Default::default()
        };
        assert_eq!(config.snapshot_url(), "http://localhost:8787/snapshot");
    }

    #[test]
    fn test_blank_token_is_none() {
        let config = ClientConfig {
            token: "   ".to_string(),
            ..Default::default()
        };
        assert!(config.token().is_none());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let path = std::env::temp_dir().join(format!(
            "leadstock-client-settings-{}.toml",
            std::process::id()
        ));
        let config = ClientConfig {
            server_url: "http://10.0.0.5:9000".to_string(),
            token: "abc".to_string(),
            ..Default::default()
        };
        config.save(&path).unwrap();
        let loaded = ClientConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_load_applies_defaults_for_missing_fields() {
        let parsed: ClientConfig = toml::from_str(r#"server_url = "http://h:1""#).unwrap();
        assert_eq!(parsed.poll_interval(), Duration::from_secs(60));
        assert_eq!(parsed.pull_timeout(), Duration::from_secs(15));
        assert!(!parsed.pull_only);
    }
}
