//! View state published by the connection manager.

use leadstock_core::Snapshot;
use serde::{Deserialize, Serialize};

/// Coarse connection state for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// No connection and none in progress. With `auth_failed` set this is
    /// terminal until the user changes the credential or asks to reconnect.
    Disconnected,
    /// Push handshake in progress.
    Connecting,
    /// Push channel established, data arrives by broadcast.
    Live,
    /// Push channel down. Data may still arrive through the poll fallback.
    Degraded,
}

/// Everything a renderer needs to draw the dashboard. Published through a
/// `watch` channel, so readers always see the latest consistent value.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    pub connection: ConnectionState,
    /// The data producer (or the path to it) is down. Set synchronously on
    /// push loss, never cleared by a successful pull.
    pub producer_offline: bool,
    /// The credential was rejected. Distinct from being offline.
    pub auth_failed: bool,
    /// The current snapshot arrived over the poll fallback rather than push.
    pub via_pull: bool,
    pub snapshot: Option<Snapshot>,
    /// Producer timestamp of the applied snapshot.
    pub last_update_ms: Option<i64>,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            connection: ConnectionState::Disconnected,
            producer_offline: false,
            auth_failed: false,
            via_pull: false,
            snapshot: None,
            last_update_ms: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_clean_disconnected() {
        let view = ViewState::default();
        assert_eq!(view.connection, ConnectionState::Disconnected);
        assert!(!view.producer_offline);
        assert!(!view.auth_failed);
        assert!(view.snapshot.is_none());
    }
}
