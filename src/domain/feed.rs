//! Live market feed model: messages, bounded buffer, listener status.

use std::collections::VecDeque;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Default number of messages kept in memory.
pub const DEFAULT_BUFFER_CAPACITY: usize = 50;

/// Raw frame content from the market data socket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "lowercase")]
pub enum FeedPayload {
    Text(String),
    /// Binary frames (protobuf ticks) are kept undecoded.
    Binary(Vec<u8>),
}

impl FeedPayload {
    pub fn len(&self) -> usize {
        match self {
            Self::Text(t) => t.len(),
            Self::Binary(b) => b.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Short printable rendering, truncated to `max` characters.
    pub fn preview(&self, max: usize) -> String {
        match self {
            Self::Text(t) => {
                let mut out: String = t.chars().take(max).collect();
                if t.chars().count() > max {
                    out.push('…');
                }
                out
            }
            Self::Binary(b) => {
                let hex: String = b
                    .iter()
                    .take(max / 2)
                    .map(|byte| format!("{byte:02x}"))
                    .collect();
                format!("<{} bytes> {hex}", b.len())
            }
        }
    }
}

/// One message received from the live feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedMessage {
    pub received_at: DateTime<Utc>,
    pub payload: FeedPayload,
}

impl FeedMessage {
    pub fn now(payload: FeedPayload) -> Self {
        Self {
            received_at: Utc::now(),
            payload,
        }
    }
}

/// Fixed-capacity FIFO of the most recent feed messages.
///
/// Pushing into a full buffer evicts the oldest message.
#[derive(Debug, Clone)]
pub struct FeedBuffer {
    messages: VecDeque<FeedMessage>,
    capacity: usize,
    total_received: u64,
}

impl FeedBuffer {
    /// A zero capacity is bumped to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            messages: VecDeque::with_capacity(capacity),
            capacity,
            total_received: 0,
        }
    }

    /// Append a message, returning the evicted one if the buffer was full.
    pub fn push(&mut self, message: FeedMessage) -> Option<FeedMessage> {
        self.total_received += 1;
        let evicted = if self.messages.len() >= self.capacity {
            self.messages.pop_front()
        } else {
            None
        };
        self.messages.push_back(message);
        evicted
    }

    /// Messages oldest first.
    pub fn snapshot(&self) -> Vec<FeedMessage> {
        self.messages.iter().cloned().collect()
    }

    pub fn last(&self) -> Option<&FeedMessage> {
        self.messages.back()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Every message ever pushed, evicted ones included.
    pub const fn total_received(&self) -> u64 {
        self.total_received
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }
}

impl Default for FeedBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_BUFFER_CAPACITY)
    }
}

/// Listener lifecycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FeedStatus {
    #[default]
    Idle,
    Connecting,
    Streaming,
    Stopped,
    Failed(String),
}

impl FeedStatus {
    pub const fn is_running(&self) -> bool {
        matches!(self, Self::Connecting | Self::Streaming)
    }
}

impl fmt::Display for FeedStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::Connecting => f.write_str("connecting"),
            Self::Streaming => f.write_str("streaming"),
            Self::Stopped => f.write_str("stopped"),
            Self::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

const URL_KEYS: [&str; 5] = [
    "socket_url",
    "url",
    "ws_url",
    "authorized_redirect_uri",
    "authorizedRedirectUri",
];

/// Result of `/authorize-market-feed`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedAuthorization {
    /// WebSocket URL, `ws://` or `wss://`.
    pub socket_url: String,
}

impl FeedAuthorization {
    /// Locate the socket URL at top level or under `data`.
    pub fn from_value(value: &Value) -> Option<Self> {
        let scopes = [Some(value), value.get("data")];
        scopes
            .into_iter()
            .flatten()
            .flat_map(|scope| URL_KEYS.iter().filter_map(move |k| scope.get(*k)))
            .filter_map(Value::as_str)
            .map(str::trim)
            .find(|url| url.starts_with("ws://") || url.starts_with("wss://"))
            .map(|url| Self {
                socket_url: url.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn text(s: &str) -> FeedMessage {
        FeedMessage::now(FeedPayload::Text(s.to_string()))
    }

    #[test]
    fn test_buffer_evicts_oldest_beyond_capacity() {
        let mut buf = FeedBuffer::new(3);
        for i in 0..5 {
            buf.push(text(&i.to_string()));
        }
        let kept: Vec<_> = buf
            .snapshot()
            .into_iter()
            .map(|m| m.payload.preview(10))
            .collect();
        assert_eq!(kept, vec!["2", "3", "4"]);
        assert_eq!(buf.total_received(), 5);
        assert_eq!(buf.len(), 3);
    }

    #[test]
    fn test_push_returns_evicted_message() {
        let mut buf = FeedBuffer::new(1);
        assert!(buf.push(text("a")).is_none());
        let evicted = buf.push(text("b")).unwrap();
        assert_eq!(evicted.payload, FeedPayload::Text("a".into()));
    }

    #[test]
    fn test_zero_capacity_is_bumped() {
        assert_eq!(FeedBuffer::new(0).capacity(), 1);
        assert_eq!(FeedBuffer::default().capacity(), 50);
    }

    #[test]
    fn test_binary_preview_shows_size() {
        let p = FeedPayload::Binary(vec![0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(p.preview(4), "<4 bytes> dead");
    }

    #[test]
    fn test_authorization_url_lookup() {
        let nested = json!({
            "status": "success",
            "data": {"authorizedRedirectUri": "wss://feed.example/v3?code=abc"}
        });
        assert_eq!(
            FeedAuthorization::from_value(&nested).unwrap().socket_url,
            "wss://feed.example/v3?code=abc"
        );

        let top = json!({"socket_url": "ws://localhost:9000"});
        assert!(FeedAuthorization::from_value(&top).is_some());

        let http = json!({"url": "https://not-a-socket"});
        assert!(FeedAuthorization::from_value(&http).is_none());
    }
}
