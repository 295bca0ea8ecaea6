//! Prometheus Metrics Registry - Client-side Observability
//!
//! Counts backend requests by endpoint and outcome, records request
//! latency, and tracks live-feed health. The registry is rendered in
//! the Prometheus text format by the `metrics` command.

use prometheus::{
    Encoder, Histogram, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts,
    Registry, TextEncoder,
};

/// Centralized Prometheus metrics for the terminal.
///
/// All metrics follow the naming convention `voluguard_*`.
#[derive(Clone)]
pub struct MetricsRegistry {
    registry: Registry,
    /// Backend requests by endpoint and outcome (`ok` or an `ApiError` kind).
    pub api_requests: IntCounterVec,
    /// Backend request latency in milliseconds.
    pub api_latency_ms: HistogramVec,
    /// Feed messages received.
    pub feed_messages: IntCounter,
    /// Feed reconnect attempts.
    pub feed_reconnects: IntCounter,
    /// Feed connection status (1 = streaming, 0 = not).
    pub feed_connected: IntGauge,
    /// Messages currently held in the feed buffer.
    pub feed_buffer_len: IntGauge,
    /// Size of feed frames in bytes.
    pub feed_frame_bytes: Histogram,
}

impl MetricsRegistry {
    /// Create and register all Prometheus metrics.
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let api_requests = IntCounterVec::new(
            Opts::new("voluguard_api_requests_total", "Backend requests issued"),
            &["endpoint", "outcome"],
        )?;

        let api_latency_ms = HistogramVec::new(
            HistogramOpts::new(
                "voluguard_api_latency_ms",
                "Backend request latency in milliseconds",
            )
            .buckets(vec![
                50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0, 10000.0, 30000.0, 60000.0,
            ]),
            &["endpoint"],
        )?;

        let feed_messages = IntCounter::new(
            "voluguard_feed_messages_total",
            "Live feed messages received",
        )?;

        let feed_reconnects = IntCounter::new(
            "voluguard_feed_reconnects_total",
            "Live feed reconnect attempts",
        )?;

        let feed_connected = IntGauge::new(
            "voluguard_feed_connected",
            "Feed connection status (1=streaming, 0=not)",
        )?;

        let feed_buffer_len = IntGauge::new(
            "voluguard_feed_buffer_len",
            "Messages currently held in the feed buffer",
        )?;

        let feed_frame_bytes = Histogram::with_opts(
            HistogramOpts::new("voluguard_feed_frame_bytes", "Feed frame size in bytes")
                .buckets(vec![64.0, 256.0, 1024.0, 4096.0, 16384.0, 65536.0]),
        )?;

        registry.register(Box::new(api_requests.clone()))?;
        registry.register(Box::new(api_latency_ms.clone()))?;
        registry.register(Box::new(feed_messages.clone()))?;
        registry.register(Box::new(feed_reconnects.clone()))?;
        registry.register(Box::new(feed_connected.clone()))?;
        registry.register(Box::new(feed_buffer_len.clone()))?;
        registry.register(Box::new(feed_frame_bytes.clone()))?;

        Ok(Self {
            registry,
            api_requests,
            api_latency_ms,
            feed_messages,
            feed_reconnects,
            feed_connected,
            feed_buffer_len,
            feed_frame_bytes,
        })
    }

    /// Record one finished backend request.
    pub fn observe_request(&self, endpoint: &str, outcome: &str, elapsed_ms: f64) {
        self.api_requests
            .with_label_values(&[endpoint, outcome])
            .inc();
        self.api_latency_ms
            .with_label_values(&[endpoint])
            .observe(elapsed_ms);
    }

    /// Encode all metrics in the Prometheus text exposition format.
    pub fn render(&self) -> anyhow::Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}
