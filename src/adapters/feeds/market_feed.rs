//! Market Data WebSocket Feed - Live Tick Listener
//!
//! Authorizes against the backend, connects to the returned WebSocket
//! URL and pushes every frame into the shared `FeedBuffer`. Runs in its
//! own tokio task, decoupled from command handling.
//!
//! Features:
//! - Optional subscription message after connecting
//! - Re-authorization on every reconnect (socket URLs may be single-use)
//! - Bounded consecutive reconnects with a fixed backoff
//! - Event-driven via tokio::select! (NEVER polling)

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use tokio::sync::{broadcast, watch, RwLock};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::adapters::metrics::MetricsRegistry;
use crate::adapters::persistence::FeedRecorder;
use crate::config::FeedConfig;
use crate::domain::{AccessToken, FeedBuffer, FeedMessage, FeedPayload, FeedStatus};
use crate::ports::TradingBackend;

/// Listener tuning, resolved from `[feed]`.
#[derive(Debug, Clone)]
pub struct FeedSettings {
    pub buffer_capacity: usize,
    pub reconnect_delay: Duration,
    /// Consecutive failed sessions tolerated before giving up.
    pub max_reconnects: u32,
    pub instrument_keys: Vec<String>,
    pub mode: String,
}

impl From<&FeedConfig> for FeedSettings {
    fn from(config: &FeedConfig) -> Self {
        Self {
            buffer_capacity: config.buffer_capacity,
            reconnect_delay: Duration::from_secs(config.reconnect_delay_secs),
            max_reconnects: config.max_reconnects,
            instrument_keys: config.instrument_keys.clone(),
            mode: config.mode.clone(),
        }
    }
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self::from(&FeedConfig::default())
    }
}

/// How a single connection session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEnd {
    Shutdown,
    /// Socket lost. `streamed` is true if the session got as far as
    /// streaming, which resets the consecutive-failure count.
    Dropped { streamed: bool, reason: String },
}

/// Subscription frame for the given instruments.
pub fn subscription_message(mode: &str, instrument_keys: &[String]) -> serde_json::Value {
    json!({
        "guid": Uuid::new_v4().to_string(),
        "method": "sub",
        "data": {
            "mode": mode,
            "instrumentKeys": instrument_keys,
        }
    })
}

/// Live market feed listener.
pub struct MarketFeedListener {
    backend: Arc<dyn TradingBackend>,
    token: AccessToken,
    settings: FeedSettings,
    buffer: Arc<RwLock<FeedBuffer>>,
    status_tx: watch::Sender<FeedStatus>,
    recorder: Option<FeedRecorder>,
    metrics: Option<MetricsRegistry>,
}

impl MarketFeedListener {
    pub fn new(
        backend: Arc<dyn TradingBackend>,
        token: AccessToken,
        settings: FeedSettings,
        buffer: Arc<RwLock<FeedBuffer>>,
        status_tx: watch::Sender<FeedStatus>,
    ) -> Self {
        Self {
            backend,
            token,
            settings,
            buffer,
            status_tx,
            recorder: None,
            metrics: None,
        }
    }

    #[must_use]
    pub fn with_recorder(mut self, recorder: FeedRecorder) -> Self {
        self.recorder = Some(recorder);
        self
    }

    #[must_use]
    pub fn with_metrics(mut self, metrics: MetricsRegistry) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Run the connection loop until shutdown or until reconnects are
    /// exhausted (returned as an error, status `Failed`).
    #[instrument(skip(self, shutdown_rx))]
    pub async fn run(self, mut shutdown_rx: broadcast::Receiver<()>) -> Result<()> {
        let mut failures: u32 = 0;

        loop {
            self.set_status(FeedStatus::Connecting);

            match self.connect_and_stream(&mut shutdown_rx).await {
                SessionEnd::Shutdown => {
                    info!("Market feed shut down gracefully");
                    self.set_status(FeedStatus::Stopped);
                    return Ok(());
                }
                SessionEnd::Dropped { streamed, reason } => {
                    if streamed {
                        failures = 0;
                    }
                    failures += 1;

                    if failures > self.settings.max_reconnects {
                        warn!(%reason, failures, "Market feed giving up");
                        self.set_status(FeedStatus::Failed(reason.clone()));
                        anyhow::bail!("market feed stopped after {failures} failed attempts: {reason}");
                    }

                    warn!(
                        %reason,
                        attempt = failures,
                        delay_s = self.settings.reconnect_delay.as_secs(),
                        "Market feed disconnected, reconnecting"
                    );
                    if let Some(m) = &self.metrics {
                        m.feed_reconnects.inc();
                    }

                    tokio::select! {
                        _ = shutdown_rx.recv() => {
                            self.set_status(FeedStatus::Stopped);
                            return Ok(());
                        }
                        () = tokio::time::sleep(self.settings.reconnect_delay) => {},
                    }
                }
            }
        }
    }

    /// Single session: authorize, connect, subscribe, stream until error
    /// or shutdown.
    async fn connect_and_stream(&self, shutdown_rx: &mut broadcast::Receiver<()>) -> SessionEnd {
        let authorization = tokio::select! {
            biased;
            _ = shutdown_rx.recv() => return SessionEnd::Shutdown,
            auth = self.backend.authorize_market_feed(&self.token) => auth,
        };
        let authorization = match authorization {
            Ok(a) => a,
            Err(e) => return dropped(false, format!("authorization failed: {e}")),
        };

        let connected = tokio::select! {
            biased;
            _ = shutdown_rx.recv() => return SessionEnd::Shutdown,
            conn = connect_async(authorization.socket_url.as_str()) => conn,
        };
        let (ws_stream, _) = match connected {
            Ok(pair) => pair,
            Err(e) => return dropped(false, format!("connect failed: {e}")),
        };

        let (mut write, mut read) = ws_stream.split();

        if !self.settings.instrument_keys.is_empty() {
            let sub = subscription_message(&self.settings.mode, &self.settings.instrument_keys);
            let frame = Message::Binary(sub.to_string().into_bytes());
            if let Err(e) = write.send(frame).await {
                return dropped(false, format!("subscribe failed: {e}"));
            }
            info!(
                instruments = self.settings.instrument_keys.len(),
                mode = %self.settings.mode,
                "Market feed subscription sent"
            );
        }

        info!("Market feed WebSocket connected");
        self.set_status(FeedStatus::Streaming);
        if let Some(m) = &self.metrics {
            m.feed_connected.set(1);
        }

        let end = loop {
            tokio::select! {
                biased;
                _ = shutdown_rx.recv() => {
                    info!("Shutdown signal in market feed");
                    let _ = write.close().await;
                    break SessionEnd::Shutdown;
                }
                msg = read.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            self.ingest(FeedPayload::Text(text.to_string())).await;
                        }
                        Some(Ok(Message::Binary(bytes))) => {
                            self.ingest(FeedPayload::Binary(bytes.to_vec())).await;
                        }
                        Some(Ok(Message::Ping(_))) => {
                            debug!("Market feed ping received");
                        }
                        Some(Ok(Message::Close(frame))) => {
                            let reason = frame
                                .map_or_else(|| "closed by server".to_string(), |f| format!("closed by server: {}", f.reason));
                            break dropped(true, reason);
                        }
                        Some(Err(e)) => break dropped(true, format!("socket error: {e}")),
                        None => break dropped(true, "stream ended".to_string()),
                        _ => {}
                    }
                }
            }
        };

        if let Some(m) = &self.metrics {
            m.feed_connected.set(0);
        }
        end
    }

    /// Store one frame: optional recording, then the bounded buffer.
    async fn ingest(&self, payload: FeedPayload) {
        let size = payload.len();
        let message = FeedMessage::now(payload);

        if let Some(recorder) = &self.recorder {
            if let Err(e) = recorder.append(&message).await {
                warn!(error = %e, "Failed to record feed message");
            }
        }

        let len = {
            let mut buffer = self.buffer.write().await;
            buffer.push(message);
            buffer.len()
        };

        if let Some(m) = &self.metrics {
            m.feed_messages.inc();
            m.feed_buffer_len.set(i64::try_from(len).unwrap_or(i64::MAX));
            #[allow(clippy::cast_precision_loss)]
            m.feed_frame_bytes.observe(size as f64);
        }
    }

    fn set_status(&self, status: FeedStatus) {
        self.status_tx.send_replace(status);
    }
}

fn dropped(streamed: bool, reason: String) -> SessionEnd {
    SessionEnd::Dropped { streamed, reason }
}
