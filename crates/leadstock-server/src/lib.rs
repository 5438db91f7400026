//! leadstock-server — live-state distribution for the snapshot dashboard.
//!
//! One background scheduler refreshes the in-memory [`SnapshotStore`] from
//! the external producer; every successful refresh is broadcast to all
//! registered push sessions and immediately visible to pull requests.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      leadstock server                        │
//! │                                                              │
//! │  Scheduler ──▶ Refresher (single-flight) ──▶ SnapshotStore   │
//! │                      │                           ▲           │
//! │                      ▼                           │           │
//! │              ClientRegistry ──▶ push sessions    │           │
//! │                                                  │           │
//! │  axum gateway:                                   │           │
//! │    GET  /snapshot ───────────────────────────────┘           │
//! │    POST /refresh  ──▶ Refresher (joins the flight)           │
//! │    GET  /item/{code} ──▶ DetailProvider (external)           │
//! │    GET  /ws       ──▶ session registration + forwarding      │
//! └──────────────────────────────────────────────────────────────┘
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod gateway;
pub mod refresh;
pub mod registry;
pub mod store;

pub use auth::TokenGate;
pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use gateway::{create_router, run_server, run_server_on, AppState};
pub use refresh::{run_scheduler, RefreshOutcome, Refresher};
pub use registry::{ClientRegistry, SessionId};
pub use store::SnapshotStore;
