//! Wire envelopes shared by the push channel and the pull endpoint.
//!
//! Both channels carry the same tagged JSON envelopes, so a client parses
//! one message type regardless of the data path it is currently on.

use serde::{Deserialize, Serialize};

use crate::detail::ItemDetail;
use crate::types::Snapshot;

/// Envelope for snapshot distribution.
///
/// - `hello` is sent once on a fresh push-channel session.
/// - `snapshot` is pushed after every refresh and returned by `GET /snapshot`
///   once a refresh has completed.
/// - `empty` is the pull response before the first refresh completes. It is
///   a first-class state, not an error: viewers render "warming up".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WireMessage {
    Hello { server_time_ms: i64 },
    Snapshot { data: Snapshot },
    Empty { server_time_ms: i64 },
}

impl WireMessage {
    /// The snapshot payload, if this envelope carries one.
    pub fn into_snapshot(self) -> Option<Snapshot> {
        match self {
            WireMessage::Snapshot { data } => Some(data),
            _ => None,
        }
    }
}

/// Acknowledgement for `POST /refresh`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefreshAck {
    pub ok: bool,
    pub server_time_ms: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Response for `GET /item/{code}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailResponse {
    pub ok: bool,
    pub data: Option<ItemDetail>,
    pub error: Option<String>,
}

impl DetailResponse {
    pub fn found(detail: ItemDetail) -> Self {
        Self {
            ok: true,
            data: Some(detail),
            error: None,
        }
    }

    pub fn not_found() -> Self {
        Self {
            ok: true,
            data: None,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(error.into()),
        }
    }
}
