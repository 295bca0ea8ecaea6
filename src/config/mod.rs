//! Configuration Module - TOML-based Terminal Configuration
//!
//! Loads and validates configuration from `config.toml` with
//! environment variable overrides (a `.env` file is honoured).
//! Every section is optional; a missing file means defaults.
//! The access token is never read from this file.

pub mod loader;

use serde::{Deserialize, Serialize};

pub use loader::{load_config, DEFAULT_CONFIG_PATH};

/// Top-level terminal configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
  /// Identity and logging.
  pub app: AppSection,
  /// Backend endpoint and timeouts.
  pub api: ApiConfig,
  /// Live market feed listener.
  pub feed: FeedConfig,
  /// Session cache behaviour.
  pub session: SessionConfig,
  /// Local files.
  pub persistence: PersistenceConfig,
}

/// Identity and logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSection {
  /// Human-readable name shown in the header line.
  pub name: String,
  /// Log level (trace, debug, info, warn, error).
  pub log_level: String,
  pub log_format: LogFormat,
}

/// Log output encoding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
  #[default]
  Pretty,
  Json,
}

/// Backend endpoint configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
  /// Backend REST base URL, no trailing slash.
  pub base_url: String,
  /// Token probe (`/expiries`) timeout in seconds.
  pub probe_timeout_secs: u64,
  /// Default request timeout in seconds.
  pub request_timeout_secs: u64,
  /// Timeout for model-backed endpoints (volatility, regime, strategy, risk).
  pub heavy_timeout_secs: u64,
  pub user_agent: String,
}

/// Live feed configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
  /// Messages kept in memory (oldest evicted).
  pub buffer_capacity: usize,
  /// Delay before reconnecting after a dropped socket.
  pub reconnect_delay_secs: u64,
  /// Consecutive reconnect attempts before giving up.
  pub max_reconnects: u32,
  /// Instruments to subscribe to after connecting. Empty means no
  /// subscription message is sent.
  pub instrument_keys: Vec<String>,
  /// Subscription mode (`ltpc` or `full`).
  pub mode: String,
}

/// When market views are fetched again.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketRefetch {
  /// Fetch once per session, until `refresh`.
  #[default]
  OnDemand,
  /// Fetch on every view.
  EveryView,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
  pub market_refetch: MarketRefetch,
}

/// Persistence configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistenceConfig {
  /// Directory for JSONL feed recordings.
  pub data_dir: String,
  /// Append every feed message to `data_dir/feed/YYYY-MM-DD.jsonl`.
  pub record_feed: bool,
}

impl Default for AppSection {
  fn default() -> Self {
    Self {
      name: default_app_name(),
      log_level: default_log_level(),
      log_format: LogFormat::default(),
    }
  }
}

impl Default for ApiConfig {
  fn default() -> Self {
    Self {
      base_url: default_base_url(),
      probe_timeout_secs: default_probe_timeout(),
      request_timeout_secs: default_request_timeout(),
      heavy_timeout_secs: default_heavy_timeout(),
      user_agent: default_user_agent(),
    }
  }
}

impl Default for FeedConfig {
  fn default() -> Self {
    Self {
      buffer_capacity: default_buffer_capacity(),
      reconnect_delay_secs: default_reconnect_delay(),
      max_reconnects: default_max_reconnects(),
      instrument_keys: Vec::new(),
      mode: default_feed_mode(),
    }
  }
}

impl Default for PersistenceConfig {
  fn default() -> Self {
    Self {
      data_dir: default_data_dir(),
      record_feed: false,
    }
  }
}

// Default value functions

fn default_app_name() -> String {
  "VoluGuard".to_string()
}

fn default_log_level() -> String {
  "info".to_string()
}

fn default_base_url() -> String {
  "https://golu-8xwd.onrender.com".to_string()
}

const fn default_probe_timeout() -> u64 {
  5
}

const fn default_request_timeout() -> u64 {
  10
}

const fn default_heavy_timeout() -> u64 {
  60
}

fn default_user_agent() -> String {
  concat!("voluguard/", env!("CARGO_PKG_VERSION")).to_string()
}

const fn default_buffer_capacity() -> usize {
  crate::domain::feed::DEFAULT_BUFFER_CAPACITY
}

const fn default_reconnect_delay() -> u64 {
  5
}

const fn default_max_reconnects() -> u32 {
  3
}

fn default_feed_mode() -> String {
  "full".to_string()
}

fn default_data_dir() -> String {
  "data".to_string()
}
