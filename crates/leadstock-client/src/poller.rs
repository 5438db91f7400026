//! Poll fallback.
//!
//! When the push channel is down (or in pull-only mode) a poll loop fetches
//! the snapshot over plain HTTP at a fixed interval and feeds the results
//! back into the state loop as events.

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use leadstock_core::{Snapshot, WireMessage};
use reqwest::StatusCode;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Header carrying the shared secret.
pub const TOKEN_HEADER: &str = "x-app-token";

/// Result of one pull attempt, delivered to the state loop.
#[derive(Debug)]
pub enum PullEvent {
    Snapshot(Snapshot),
    /// Server is up but has no data yet.
    Empty,
    Failed(ClientError),
}

/// One-shot snapshot fetcher over HTTP.
pub struct Poller {
    http: reqwest::Client,
    url: String,
    token: Option<String>,
}

impl Poller {
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.pull_timeout())
            .build()
            .map_err(|e| ClientError::Config(e.to_string()))?;
        Ok(Self {
            http,
            url: config.snapshot_url(),
            token: config.token().map(str::to_string),
        })
    }

    /// Fetch the current snapshot envelope.
    pub async fn fetch(&self) -> ClientResult<WireMessage> {
        let mut request = self.http.get(&self.url);
        if let Some(token) = &self.token {
            request = request.header(TOKEN_HEADER, token);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                ClientError::Timeout
            } else {
                ClientError::Transport(e.to_string())
            }
        })?;

        if response.status() == StatusCode::UNAUTHORIZED {
            return Err(ClientError::Unauthorized);
        }
        if !response.status().is_success() {
            return Err(ClientError::Transport(format!(
                "unexpected status {}",
                response.status()
            )));
        }

        let text = response
            .text()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        serde_json::from_str(&text).map_err(|e| ClientError::Malformed(e.to_string()))
    }
}

/// Run the poll loop until cancelled. The first pull happens immediately,
/// subsequent ones on the fixed interval.
pub async fn run_poll_loop(
    poller: Poller,
    interval: Duration,
    events: mpsc::Sender<PullEvent>,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            () = cancel.cancelled() => {
                debug!("Poll loop cancelled");
                return;
            }
            _ = ticker.tick() => {}
        }

        let event = match poller.fetch().await {
            Ok(WireMessage::Snapshot { data }) => PullEvent::Snapshot(data),
            Ok(WireMessage::Empty { .. }) => PullEvent::Empty,
            Ok(WireMessage::Hello { .. }) => {
                warn!("Unexpected hello on the pull endpoint");
                continue;
            }
            Err(e) => PullEvent::Failed(e),
        };

        if events.send(event).await.is_err() {
            // State loop moved on; this poller is stale.
            return;
        }
    }
}
