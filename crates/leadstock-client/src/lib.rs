//! leadstock-client — dashboard connection manager.
//!
//! Maintains the live link to a leadstock server:
//! - push channel (WebSocket) with automatic reconnect and backoff
//! - poll fallback over HTTP while the push channel is down
//! - synchronous down-detection and an explicit producer-offline banner
//! - monotonic snapshot application (stale pulls never overwrite push data)
//!
//! All state is published through a `watch` channel of [`ViewState`];
//! renderers subscribe and draw whatever the latest value says.

pub mod backoff;
pub mod config;
pub mod error;
pub mod manager;
pub mod poller;
pub mod view;

pub use backoff::BackoffPolicy;
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use manager::{ClientHandle, Command, ConnectionManager};
pub use poller::{Poller, PullEvent};
pub use view::{ConnectionState, ViewState};

use std::sync::Once;

static INIT_CRYPTO: Once = Once::new();

/// Initialize the TLS crypto provider.
/// Must be called before any WebSocket connections are made.
pub fn init_crypto() {
    INIT_CRYPTO.call_once(|| {
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}
