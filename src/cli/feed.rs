//! Live feed control for the terminal: one listener at a time.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use crate::adapters::feeds::{FeedHandle, FeedSettings};
use crate::adapters::metrics::MetricsRegistry;
use crate::adapters::persistence::FeedRecorder;
use crate::config::AppConfig;
use crate::domain::{AccessToken, FeedMessage, FeedStatus};
use crate::ports::TradingBackend;

pub struct FeedController {
    settings: FeedSettings,
    record_dir: Option<PathBuf>,
    metrics: Option<MetricsRegistry>,
    handle: Option<FeedHandle>,
}

impl FeedController {
    pub fn new(config: &AppConfig, metrics: Option<MetricsRegistry>) -> Self {
        Self {
            settings: FeedSettings::from(&config.feed),
            record_dir: config
                .persistence
                .record_feed
                .then(|| PathBuf::from(&config.persistence.data_dir)),
            metrics,
            handle: None,
        }
    }

    /// Spawn the listener. Returns `false` if one is already running.
    pub async fn start(
        &mut self,
        backend: Arc<dyn TradingBackend>,
        token: AccessToken,
    ) -> Result<bool> {
        if self.is_running() {
            return Ok(false);
        }

        let recorder = match &self.record_dir {
            Some(dir) => Some(
                FeedRecorder::new(dir)
                    .await
                    .with_context(|| format!("Failed to open feed recorder under {}", dir.display()))?,
            ),
            None => None,
        };

        if let Some(mut previous) = self.handle.take() {
            previous.stop().await;
        }
        self.handle = Some(FeedHandle::spawn(
            backend,
            token,
            self.settings.clone(),
            recorder,
            self.metrics.clone(),
        ));
        Ok(true)
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(FeedHandle::is_running)
    }

    pub fn status(&self) -> FeedStatus {
        self.handle
            .as_ref()
            .map_or(FeedStatus::Idle, FeedHandle::status)
    }

    /// Most recent `limit` buffered messages, oldest first.
    pub async fn recent(&self, limit: usize) -> Vec<FeedMessage> {
        let Some(handle) = &self.handle else {
            return Vec::new();
        };
        let mut messages = handle.snapshot().await;
        let skip = messages.len().saturating_sub(limit);
        messages.drain(..skip);
        messages
    }

    pub async fn total_received(&self) -> u64 {
        match &self.handle {
            Some(handle) => handle.total_received().await,
            None => 0,
        }
    }

    pub const fn capacity(&self) -> usize {
        self.settings.buffer_capacity
    }

    /// Stop the listener, keeping its buffer for `recent`. Returns
    /// `false` when nothing was running.
    pub async fn stop(&mut self) -> bool {
        let Some(handle) = self.handle.as_mut() else {
            return false;
        };
        let was_running = handle.is_running();
        handle.stop().await;
        if was_running {
            info!("Market feed stopped by user");
        }
        was_running
    }
}
