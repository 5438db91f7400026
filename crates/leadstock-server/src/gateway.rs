//! Request gateway: pull endpoint, manual refresh, detail delegation, and
//! the push-channel handshake.
//!
//! axum-based HTTP server. Every endpoint except `/health` is gated by the
//! optional shared secret; the WS handshake additionally accepts the secret
//! as a `token` query parameter since browsers cannot set headers there.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use chrono::Utc;
use futures_util::{SinkExt, StreamExt};
use leadstock_core::{DetailResponse, RefreshAck, StockCode, WireMessage};
use leadstock_feed::DetailProvider;
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::auth::TokenGate;
use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::refresh::{run_scheduler, Refresher};
use crate::registry::{ClientRegistry, SessionId};
use crate::store::SnapshotStore;

/// Shared application state for axum handlers.
#[derive(Clone)]
pub struct AppState {
    store: SnapshotStore,
    refresher: Refresher,
    registry: Arc<ClientRegistry>,
    details: Arc<dyn DetailProvider>,
    gate: TokenGate,
    session_queue: usize,
}

impl AppState {
    pub fn new(
        store: SnapshotStore,
        refresher: Refresher,
        registry: Arc<ClientRegistry>,
        details: Arc<dyn DetailProvider>,
        gate: TokenGate,
        session_queue: usize,
    ) -> Self {
        Self {
            store,
            refresher,
            registry,
            details,
            gate,
            session_queue,
        }
    }
}

/// Create the axum router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(get_health))
        .route("/snapshot", get(get_snapshot))
        .route("/refresh", post(post_refresh))
        .route("/item/{code}", get(get_item))
        .route("/ws", get(ws_handler))
        .with_state(state)
}

async fn get_health() -> Json<serde_json::Value> {
    Json(json!({
        "ok": true,
        "server_time_ms": Utc::now().timestamp_millis(),
    }))
}

/// Pull endpoint: the current snapshot, or the explicit empty marker.
/// Never blocks waiting for a refresh.
async fn get_snapshot(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<WireMessage>, Response> {
    if !state.gate.check_headers(&headers) {
        return Err(unauthorized_response());
    }
    Ok(Json(state.store.envelope()))
}

/// Manual refresh: joins the single-flight refresh and reports its outcome.
/// Idempotent and safe to call repeatedly; the wait is bounded by the
/// producer's own timeout.
async fn post_refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<RefreshAck>, Response> {
    if !state.gate.check_headers(&headers) {
        return Err(unauthorized_response());
    }

    let ack = match state.refresher.refresh().await {
        Ok(_) => RefreshAck {
            ok: true,
            server_time_ms: Utc::now().timestamp_millis(),
            error: None,
        },
        Err(e) => RefreshAck {
            ok: false,
            server_time_ms: Utc::now().timestamp_millis(),
            error: Some(e.to_string()),
        },
    };
    Ok(Json(ack))
}

/// On-demand detail lookup, delegated to the detail collaborator. The code
/// is validated before delegation; results are not cached here.
async fn get_item(
    State(state): State<AppState>,
    Path(code): Path<String>,
    headers: HeaderMap,
) -> Result<Response, Response> {
    if !state.gate.check_headers(&headers) {
        return Err(unauthorized_response());
    }

    let code = match StockCode::parse(&code) {
        Ok(code) => code,
        Err(e) => {
            return Ok((
                StatusCode::BAD_REQUEST,
                Json(DetailResponse::failed(e.to_string())),
            )
                .into_response());
        }
    };

    let body = match state.details.fetch_detail(&code).await {
        Ok(Some(detail)) => DetailResponse::found(detail),
        Ok(None) => DetailResponse::not_found(),
        Err(e) => {
            warn!(code = %code, error = %e, "Detail lookup failed");
            DetailResponse::failed(e.to_string())
        }
    };
    Ok(Json(body).into_response())
}

/// Push-channel handshake. The credential may come from the `token` query
/// parameter or the usual header; rejection is an HTTP 401 before upgrade.
async fn ws_handler(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Response {
    let query_token = params.get("token").map(String::as_str);
    if !(state.gate.check(query_token) || state.gate.check_headers(&headers)) {
        return unauthorized_response();
    }

    ws.on_upgrade(move |socket| handle_session(socket, state))
}

/// One push session: register, greet with the current state, then forward
/// broadcast snapshots until the transport closes or a send fails.
async fn handle_session(socket: WebSocket, state: AppState) {
    let id = SessionId::new();
    let (tx, mut rx) = mpsc::channel::<String>(state.session_queue);
    state.registry.register(id, tx);

    let (mut sender, mut receiver) = socket.split();

    let hello = WireMessage::Hello {
        server_time_ms: Utc::now().timestamp_millis(),
    };
    let greeting = match serde_json::to_string(&hello) {
        Ok(json) => json,
        Err(_) => {
            state.registry.unregister(id);
            return;
        }
    };
    if sender.send(Message::Text(greeting.into())).await.is_err() {
        state.registry.unregister(id);
        return;
    }

    // A session that connects between refreshes still gets data right away.
    if let Some(snapshot) = state.store.get() {
        let envelope = WireMessage::Snapshot {
            data: (*snapshot).clone(),
        };
        if let Ok(json) = serde_json::to_string(&envelope) {
            if sender.send(Message::Text(json.into())).await.is_err() {
                state.registry.unregister(id);
                return;
            }
        }
    }

    info!(session = %id, connections = state.registry.len(), "Push session opened");

    // Drain the client side for close frames; no client payload is required
    // beyond the handshake.
    let mut incoming = tokio::spawn(async move {
        while let Some(result) = receiver.next().await {
            match result {
                Ok(Message::Close(_)) => {
                    debug!("Client sent close frame");
                    break;
                }
                Err(e) => {
                    debug!(error = %e, "WebSocket receive error");
                    break;
                }
                _ => {}
            }
        }
    });

    loop {
        tokio::select! {
            maybe = rx.recv() => {
                match maybe {
                    Some(json) => {
                        if sender.send(Message::Text(json.into())).await.is_err() {
                            debug!(session = %id, "Send failed, closing session");
                            break;
                        }
                    }
                    // Queue dropped by the registry (delivery failure path).
                    None => break,
                }
            }
            _ = &mut incoming => break,
        }
    }

    state.registry.unregister(id);
    info!(session = %id, connections = state.registry.len(), "Push session closed");
}

fn unauthorized_response() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "ok": false, "error": "unauthorized" })),
    )
        .into_response()
}

/// Run the gateway on a pre-bound listener. Spawns the refresh scheduler and
/// serves until `shutdown` is cancelled.
pub async fn run_server_on(
    listener: TcpListener,
    producer: Arc<dyn leadstock_feed::SnapshotProducer>,
    details: Arc<dyn DetailProvider>,
    config: ServerConfig,
    shutdown: CancellationToken,
) -> ServerResult<()> {
    let store = SnapshotStore::new();
    let registry = Arc::new(ClientRegistry::new());
    let refresher = Refresher::new(producer, store.clone(), registry.clone());

    tokio::spawn(run_scheduler(
        refresher.clone(),
        config.refresh_interval(),
        shutdown.child_token(),
    ));

    let gate = TokenGate::new(config.app_token());
    if gate.enabled() {
        info!("Shared-secret gate enabled");
    }
    let state = AppState::new(
        store,
        refresher,
        registry,
        details,
        gate,
        config.session_queue,
    );
    let app = create_router(state);

    let addr = listener.local_addr()?;
    info!(%addr, "Gateway listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await?;

    info!("Gateway stopped");
    Ok(())
}

/// Bind and run the gateway per `config`.
pub async fn run_server(
    producer: Arc<dyn leadstock_feed::SnapshotProducer>,
    details: Arc<dyn DetailProvider>,
    config: ServerConfig,
    shutdown: CancellationToken,
) -> ServerResult<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr).await.map_err(ServerError::Bind)?;
    run_server_on(listener, producer, details, config, shutdown).await
}
