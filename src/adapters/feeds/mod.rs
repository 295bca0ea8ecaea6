//! Market Data Feed Adapters - Live Tick Streaming
//!
//! - `market_feed`: WebSocket listener with re-authorizing reconnects
//! - `supervisor`: spawns the listener task and exposes its buffer/status

pub mod market_feed;
pub mod supervisor;

pub use market_feed::{FeedSettings, MarketFeedListener, SessionEnd};
pub use supervisor::FeedHandle;
