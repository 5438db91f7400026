//! Connection manager.
//!
//! One task owns the connection lifecycle: push first, poll fallback while
//! the push channel is down, exponential backoff between push retries. All
//! observable state goes out through a `watch` channel; user intent comes
//! in through a command channel. Each state owns its timers and helper
//! tasks, and dropping out of a state cancels them.

use crate::backoff::BackoffPolicy;
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::poller::{run_poll_loop, Poller, PullEvent};
use crate::view::{ConnectionState, ViewState};
use futures_util::{SinkExt, StreamExt};
use leadstock_core::{Snapshot, WireMessage};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::{connect_async, tungstenite, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// User intent fed into the state loop.
#[derive(Debug)]
pub enum Command {
    /// Retry the push channel now, cancelling any pending backoff.
    Reconnect,
    /// Replace the connection settings and reconnect.
    ApplySettings(ClientConfig),
}

/// Cloneable handle for driving a running [`ConnectionManager`].
#[derive(Clone)]
pub struct ClientHandle {
    commands: mpsc::Sender<Command>,
    view: watch::Receiver<ViewState>,
    shutdown: CancellationToken,
}

impl ClientHandle {
    /// Fresh receiver for the view channel.
    pub fn view(&self) -> watch::Receiver<ViewState> {
        self.view.clone()
    }

    pub async fn reconnect(&self) {
        let _ = self.commands.send(Command::Reconnect).await;
    }

    pub async fn apply_settings(&self, config: ClientConfig) {
        let _ = self.commands.send(Command::ApplySettings(config)).await;
    }

    /// Stop the manager and all of its helper tasks.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }
}

/// Next state, returned by each state function.
enum Step {
    Connect,
    Degrade,
    AuthWait,
    Halt,
}

/// Push/pull connection state machine.
pub struct ConnectionManager {
    config: ClientConfig,
    backoff: BackoffPolicy,
    retries: u32,
    last_applied_ms: Option<i64>,
    view: watch::Sender<ViewState>,
    commands: mpsc::Receiver<Command>,
    shutdown: CancellationToken,
}

impl ConnectionManager {
    pub fn new(config: ClientConfig) -> (Self, ClientHandle) {
        let (view_tx, view_rx) = watch::channel(ViewState::default());
        let (command_tx, command_rx) = mpsc::channel(8);
        let shutdown = CancellationToken::new();
        let manager = Self {
            config,
            backoff: BackoffPolicy::default(),
            retries: 0,
            last_applied_ms: None,
            view: view_tx,
            commands: command_rx,
            shutdown: shutdown.clone(),
        };
        let handle = ClientHandle {
            commands: command_tx,
            view: view_rx,
            shutdown,
        };
        (manager, handle)
    }

    /// Create a manager and run it on a background task.
    pub fn spawn(config: ClientConfig) -> ClientHandle {
        let (manager, handle) = Self::new(config);
        tokio::spawn(manager.run());
        handle
    }

    /// Run until shutdown.
    pub async fn run(mut self) {
        if self.config.pull_only {
            self.run_pull_only().await;
        } else {
            let mut step = Step::Connect;
            loop {
                if self.shutdown.is_cancelled() {
                    break;
                }
                step = match step {
                    Step::Connect => self.connecting().await,
                    Step::Degrade => self.degraded().await,
                    Step::AuthWait => self.auth_wait().await,
                    Step::Halt => break,
                };
            }
        }
        self.view
            .send_modify(|v| v.connection = ConnectionState::Disconnected);
        info!("Connection manager stopped");
    }

    fn handle_command(&mut self, command: Command) -> Step {
        match command {
            Command::Reconnect => {
                info!("Reconnect requested");
            }
            Command::ApplySettings(config) => {
                info!("Applying new connection settings");
                self.config = config;
            }
        }
        self.retries = 0;
        self.view.send_modify(|v| v.auth_failed = false);
        Step::Connect
    }

    fn mark_offline(&mut self) {
        self.view.send_modify(|v| {
            v.producer_offline = true;
            v.connection = ConnectionState::Degraded;
        });
    }

    /// Apply a snapshot through the monotonic timestamp guard. Equal
    /// timestamps pass so a pull of the same state can refresh the quality
    /// flag; strictly older data is discarded.
    fn apply_snapshot(&mut self, snapshot: Snapshot, via_pull: bool) {
        if let Some(last) = self.last_applied_ms {
            if snapshot.timestamp_ms < last {
                debug!(
                    incoming = snapshot.timestamp_ms,
                    last, "Discarding stale snapshot"
                );
                return;
            }
        }
        self.last_applied_ms = Some(snapshot.timestamp_ms);
        self.view.send_modify(|v| {
            v.last_update_ms = Some(snapshot.timestamp_ms);
            v.via_pull = via_pull;
            v.snapshot = Some(snapshot);
        });
    }

    async fn connecting(&mut self) -> Step {
        self.view
            .send_modify(|v| v.connection = ConnectionState::Connecting);
        let url = self.config.ws_url();
        debug!(%url, "Opening push channel");

        let connect = tokio::time::timeout(self.config.connect_timeout(), connect_async(&url));
        tokio::select! {
            () = self.shutdown.cancelled() => Step::Halt,
            command = self.commands.recv() => match command {
                Some(command) => self.handle_command(command),
                None => Step::Halt,
            },
            result = connect => match result {
                Ok(Ok((ws, _response))) => {
                    self.retries = 0;
                    self.view.send_modify(|v| {
                        v.connection = ConnectionState::Live;
                        v.producer_offline = false;
                        v.auth_failed = false;
                    });
                    info!("Push channel live");
                    self.live(ws).await
                }
                Ok(Err(e)) if is_unauthorized(&e) => {
                    warn!("Push handshake rejected: unauthorized");
                    Step::AuthWait
                }
                Ok(Err(e)) => {
                    warn!(error = %e, "Push connect failed");
                    self.mark_offline();
                    Step::Degrade
                }
                Err(_) => {
                    warn!("Push connect timed out");
                    self.mark_offline();
                    Step::Degrade
                }
            },
        }
    }

    async fn live(&mut self, mut ws: WsStream) -> Step {
        loop {
            tokio::select! {
                () = self.shutdown.cancelled() => {
                    let _ = ws.close(None).await;
                    return Step::Halt;
                }
                command = self.commands.recv() => {
                    let _ = ws.close(None).await;
                    return match command {
                        Some(command) => self.handle_command(command),
                        None => Step::Halt,
                    };
                }
                frame = ws.next() => match frame {
                    Some(Ok(tungstenite::Message::Text(text))) => {
                        // A frame we cannot parse means the server no longer
                        // speaks our protocol; staying Live would show stale
                        // data as fresh. Treat it like a channel error.
                        if !self.handle_push_frame(&text) {
                            let _ = ws.close(None).await;
                            self.mark_offline();
                            return Step::Degrade;
                        }
                    }
                    Some(Ok(tungstenite::Message::Ping(data))) => {
                        let _ = ws.send(tungstenite::Message::Pong(data)).await;
                    }
                    Some(Ok(tungstenite::Message::Close(_))) | None => {
                        // Down-detection is synchronous with the close: the
                        // banner is up before any poll round trip happens.
                        warn!("Push channel closed");
                        self.mark_offline();
                        return Step::Degrade;
                    }
                    Some(Err(e)) => {
                        warn!(error = %e, "Push channel error");
                        self.mark_offline();
                        return Step::Degrade;
                    }
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    /// Apply one push frame. Returns `false` when the frame does not parse
    /// as a wire envelope, which the caller treats as a transport fault.
    fn handle_push_frame(&mut self, text: &str) -> bool {
        match serde_json::from_str::<WireMessage>(text) {
            Ok(WireMessage::Snapshot { data }) => self.apply_snapshot(data, false),
            Ok(WireMessage::Hello { server_time_ms }) => {
                debug!(server_time_ms, "Server greeting");
            }
            Ok(WireMessage::Empty { .. }) => {
                debug!("Server has no data yet");
            }
            Err(e) => {
                warn!(error = %e, "Malformed push frame");
                return false;
            }
        }
        true
    }

    /// Push channel is down: schedule one retry with backoff and run the
    /// poll fallback until the retry fires. Pulled data refreshes the view
    /// but never clears the offline banner.
    async fn degraded(&mut self) -> Step {
        let delay = self.backoff.delay(self.retries);
        self.retries = self.retries.saturating_add(1);
        info!(
            delay_ms = delay.as_millis() as u64,
            attempt = self.retries,
            "Push retry scheduled"
        );

        let (events_tx, mut events) = mpsc::channel(4);
        let poll_cancel = CancellationToken::new();
        let _poll_guard = poll_cancel.clone().drop_guard();
        let mut poller_alive = match Poller::new(&self.config) {
            Ok(poller) => {
                tokio::spawn(run_poll_loop(
                    poller,
                    self.config.poll_interval(),
                    events_tx,
                    poll_cancel,
                ));
                true
            }
            Err(e) => {
                warn!(error = %e, "Poll fallback unavailable");
                false
            }
        };

        let retry = tokio::time::sleep(delay);
        tokio::pin!(retry);

        loop {
            tokio::select! {
                () = self.shutdown.cancelled() => return Step::Halt,
                command = self.commands.recv() => return match command {
                    Some(command) => self.handle_command(command),
                    None => Step::Halt,
                },
                () = &mut retry => return Step::Connect,
                event = events.recv(), if poller_alive => match event {
                    Some(PullEvent::Snapshot(snapshot)) => self.apply_snapshot(snapshot, true),
                    Some(PullEvent::Empty) => debug!("Pull returned no data"),
                    Some(PullEvent::Failed(ClientError::Unauthorized)) => {
                        warn!("Pull rejected: unauthorized");
                        return Step::AuthWait;
                    }
                    Some(PullEvent::Failed(e)) => debug!(error = %e, "Pull failed"),
                    None => poller_alive = false,
                }
            }
        }
    }

    /// The credential was rejected. Nothing is retried until the user acts.
    async fn auth_wait(&mut self) -> Step {
        self.view.send_modify(|v| {
            v.connection = ConnectionState::Disconnected;
            v.auth_failed = true;
        });
        tokio::select! {
            () = self.shutdown.cancelled() => Step::Halt,
            command = self.commands.recv() => match command {
                Some(command) => self.handle_command(command),
                None => Step::Halt,
            },
        }
    }

    /// Poll-only operation for clients without a push path. The banner
    /// tracks pull results directly here: set on failure, cleared on the
    /// next success.
    async fn run_pull_only(&mut self) {
        info!("Running in pull-only mode");
        'outer: loop {
            if self.shutdown.is_cancelled() {
                return;
            }
            let poller = match Poller::new(&self.config) {
                Ok(poller) => poller,
                Err(e) => {
                    warn!(error = %e, "Cannot build poller");
                    return;
                }
            };
            let (events_tx, mut events) = mpsc::channel(4);
            let poll_cancel = CancellationToken::new();
            let poll_guard = poll_cancel.clone().drop_guard();
            tokio::spawn(run_poll_loop(
                poller,
                self.config.poll_interval(),
                events_tx,
                poll_cancel,
            ));
            self.view.send_modify(|v| {
                v.connection = ConnectionState::Connecting;
                v.via_pull = true;
            });

            loop {
                tokio::select! {
                    () = self.shutdown.cancelled() => return,
                    command = self.commands.recv() => match command {
                        Some(Command::Reconnect) => continue 'outer,
                        Some(Command::ApplySettings(config)) => {
                            self.config = config;
                            self.view.send_modify(|v| v.auth_failed = false);
                            continue 'outer;
                        }
                        None => return,
                    },
                    event = events.recv() => match event {
                        Some(PullEvent::Snapshot(snapshot)) => {
                            self.apply_snapshot(snapshot, true);
                            self.view.send_modify(|v| {
                                v.connection = ConnectionState::Live;
                                v.producer_offline = false;
                            });
                        }
                        Some(PullEvent::Empty) => {
                            self.view.send_modify(|v| {
                                v.connection = ConnectionState::Live;
                                v.producer_offline = false;
                            });
                        }
                        Some(PullEvent::Failed(ClientError::Unauthorized)) => {
                            warn!("Pull rejected: unauthorized");
                            self.view.send_modify(|v| {
                                v.connection = ConnectionState::Disconnected;
                                v.auth_failed = true;
                            });
                            break;
                        }
                        Some(PullEvent::Failed(e)) => {
                            debug!(error = %e, "Pull failed");
                            self.view.send_modify(|v| {
                                v.connection = ConnectionState::Degraded;
                                v.producer_offline = true;
                            });
                        }
                        None => continue 'outer,
                    }
                }
            }

            // Bad credential: stop polling, wait for new settings.
            drop(poll_guard);
            loop {
                tokio::select! {
                    () = self.shutdown.cancelled() => return,
                    command = self.commands.recv() => match command {
                        Some(Command::Reconnect) => {
                            self.view.send_modify(|v| v.auth_failed = false);
                            continue 'outer;
                        }
                        Some(Command::ApplySettings(config)) => {
                            self.config = config;
                            self.view.send_modify(|v| v.auth_failed = false);
                            continue 'outer;
                        }
                        None => return,
                    },
                }
            }
        }
    }
}

fn is_unauthorized(error: &tungstenite::Error) -> bool {
    matches!(error, tungstenite::Error::Http(response) if response.status().as_u16() == 401)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot_at(timestamp_ms: i64) -> Snapshot {
        Snapshot {
            timestamp_ms,
            indices: vec![],
            themes: vec![],
            stocks: vec![],
        }
    }

    #[test]
    fn test_stale_snapshot_discarded() {
        let (mut manager, handle) = ConnectionManager::new(ClientConfig::default());
        manager.apply_snapshot(snapshot_at(100), false);
        manager.apply_snapshot(snapshot_at(50), true);

        let view = handle.view();
        let view = view.borrow();
        assert_eq!(view.last_update_ms, Some(100));
        assert!(!view.via_pull, "stale pull must not win");
    }

    #[test]
    fn test_equal_timestamp_passes_guard() {
        let (mut manager, handle) = ConnectionManager::new(ClientConfig::default());
        manager.apply_snapshot(snapshot_at(100), false);
        manager.apply_snapshot(snapshot_at(100), true);

        let view = handle.view();
        assert!(view.borrow().via_pull, "equal timestamp refreshes the view");
    }

    #[test]
    fn test_command_resets_retries_and_auth_flag() {
        let (mut manager, handle) = ConnectionManager::new(ClientConfig::default());
        manager.retries = 5;
        manager.view.send_modify(|v| v.auth_failed = true);

        let step = manager.handle_command(Command::Reconnect);
        assert!(matches!(step, Step::Connect));
        assert_eq!(manager.retries, 0);
        assert!(!handle.view().borrow().auth_failed);
    }

    #[test]
    fn test_malformed_push_frame_reports_failure() {
        let (mut manager, _handle) = ConnectionManager::new(ClientConfig::default());
        assert!(manager.handle_push_frame(r#"{"type":"hello","server_time_ms":1}"#));
        assert!(!manager.handle_push_frame(r#"{"type":"surprise"}"#));
        assert!(!manager.handle_push_frame("not json"));
    }

    #[test]
    fn test_apply_settings_swaps_config() {
        let (mut manager, _handle) = ConnectionManager::new(ClientConfig::default());
        let new_config = ClientConfig {
            server_url: "http://10.1.2.3:9999".to_string(),
            ..Default::default()
        };
        manager.handle_command(Command::ApplySettings(new_config.clone()));
        assert_eq!(manager.config, new_config);
    }
}
