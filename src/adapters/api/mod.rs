//! Trading Backend REST Adapter
//!
//! Implements the HTTP client for the remote options-trading backend.
//! Handles token authentication, timeout classes and error mapping.
//!
//! Sub-modules:
//! - `backend`: `TradingBackend` implementation, one method per endpoint
//! - `client`: HTTP client with timeouts and concurrency limiting
//! - `types`: response envelopes for list endpoints

pub mod backend;
pub mod client;
pub mod types;

pub use backend::HttpBackend;
pub use client::{BackendClient, BackendClientConfig, TimeoutClass};
