//! Metrics Adapters
//!
//! Prometheus registry for backend request and live-feed metrics,
//! rendered on demand by the `metrics` command.

pub mod prometheus;

pub use self::prometheus::MetricsRegistry;
