//! Adapters Layer - Hexagonal Architecture Outer Ring
//!
//! Implements the port traits defined in `crate::ports` with concrete
//! external dependencies (HTTP client, WebSocket, file I/O, metrics).
//!
//! Adapter categories:
//! - `api`: trading backend REST client
//! - `feeds`: live market data WebSocket listener
//! - `metrics`: Prometheus metrics registry
//! - `persistence`: JSONL feed recording

pub mod api;
pub mod feeds;
pub mod metrics;
pub mod persistence;
