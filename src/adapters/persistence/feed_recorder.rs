//! Feed Recorder - Append-only JSONL Feed Messages
//!
//! Persists live feed messages to daily JSONL files in the format
//! `feed/YYYY-MM-DD.jsonl`. Each line is a self-contained JSON
//! record, so a recording can be replayed or inspected line by line.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{info, instrument, warn};

use crate::domain::FeedMessage;

/// Append-only JSONL feed recorder with daily file rotation.
#[derive(Debug, Clone)]
pub struct FeedRecorder {
    /// Directory holding the daily files.
    feed_dir: PathBuf,
}

impl FeedRecorder {
    /// Create a recorder under `data_dir/feed`.
    pub async fn new(data_dir: impl AsRef<Path>) -> Result<Self> {
        let feed_dir = data_dir.as_ref().join("feed");

        fs::create_dir_all(&feed_dir)
            .await
            .with_context(|| format!("Failed to create feed directory {}", feed_dir.display()))?;

        Ok(Self { feed_dir })
    }

    /// Path of the file holding messages received on `date` (UTC).
    pub fn day_path(&self, date: NaiveDate) -> PathBuf {
        self.feed_dir.join(format!("{}.jsonl", date.format("%Y-%m-%d")))
    }

    /// Append a message to the file of the day it was received.
    pub async fn append(&self, message: &FeedMessage) -> Result<()> {
        let path = self.day_path(message.received_at.date_naive());

        let mut json =
            serde_json::to_string(message).context("Failed to serialize feed message")?;
        json.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .context("Failed to open feed log file")?;

        file.write_all(json.as_bytes())
            .await
            .context("Failed to write feed message")?;

        file.flush().await.context("Failed to flush feed log")?;

        Ok(())
    }

    /// Load every message recorded on `date`. Malformed lines are skipped.
    #[instrument(skip(self))]
    pub async fn load_day(&self, date: NaiveDate) -> Result<Vec<FeedMessage>> {
        let path = self.day_path(date);

        if !path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;

        let mut messages = Vec::new();
        for line in content.lines() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<FeedMessage>(line) {
                Ok(message) => messages.push(message),
                Err(e) => {
                    warn!(
                        file = %path.display(),
                        error = %e,
                        "Skipping malformed feed record"
                    );
                }
            }
        }

        info!(count = messages.len(), %date, "Loaded feed recording");
        Ok(messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FeedPayload;

    #[tokio::test]
    async fn test_append_then_load_same_day() {
        let dir = tempfile::tempdir().unwrap();
        let recorder = FeedRecorder::new(dir.path()).await.unwrap();

        let first = FeedMessage::now(FeedPayload::Text("{\"ltp\":22150.5}".into()));
        let second = FeedMessage::now(FeedPayload::Binary(vec![1, 2, 3]));
        recorder.append(&first).await.unwrap();
        recorder.append(&second).await.unwrap();

        let day = first.received_at.date_naive();
        let loaded = recorder.load_day(day).await.unwrap();
        assert!(!loaded.is_empty());
        assert_eq!(loaded[0], first);
    }

    #[tokio::test]
    async fn test_missing_day_is_empty_and_garbage_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let recorder = FeedRecorder::new(dir.path()).await.unwrap();
        let day = NaiveDate::from_ymd_opt(2025, 1, 2).unwrap();
        assert!(recorder.load_day(day).await.unwrap().is_empty());

        tokio::fs::write(recorder.day_path(day), "not json\n\n")
            .await
            .unwrap();
        assert!(recorder.load_day(day).await.unwrap().is_empty());
    }
}
