//! Persistence Adapters - JSONL-based File Storage
//!
//! Append-only JSONL recording of live feed messages.
//! No database dependency.

pub mod feed_recorder;

pub use feed_recorder::FeedRecorder;
