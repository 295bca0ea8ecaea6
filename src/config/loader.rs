//! Configuration Loader - File Loading, Env Overrides and Validation
//!
//! Handles loading `config.toml`, applying `VOLUGUARD_*` environment
//! overrides, validating all parameters, and providing clear error
//! messages for misconfiguration.

use std::path::Path;

use anyhow::{Context, Result};
use reqwest::Url;
use tracing::info;

use super::AppConfig;

/// Config file looked up when `--config` is not given.
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Overrides `[api] base_url`.
pub const ENV_BASE_URL: &str = "VOLUGUARD_BASE_URL";
/// Overrides `[app] log_level`.
pub const ENV_LOG_LEVEL: &str = "VOLUGUARD_LOG_LEVEL";

const FEED_MODES: [&str; 2] = ["ltpc", "full"];

/// Load and validate configuration from a TOML file.
///
/// A missing file yields defaults. Environment overrides are applied
/// after parsing and before validation.
///
/// # Errors
/// Returns detailed error if:
/// - The file exists but can't be read
/// - TOML parsing fails
/// - Validation rules are violated
pub fn load_config(path: impl AsRef<Path>) -> Result<AppConfig> {
  let path = path.as_ref();

  let config = if path.exists() {
    let content = std::fs::read_to_string(path)
      .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    parse_config(&content)
      .with_context(|| format!("Failed to parse {}", path.display()))?
  } else {
    info!(path = %path.display(), "Config file not found, using defaults");
    AppConfig::default()
  };

  let config = apply_overrides(config, |key| std::env::var(key).ok());
  validate_config(&config)?;

  info!(
    base_url = %config.api.base_url,
    refetch = ?config.session.market_refetch,
    feed_capacity = config.feed.buffer_capacity,
    "Configuration loaded successfully"
  );

  Ok(config)
}

/// Parse TOML text into a config. Unknown keys are ignored.
pub fn parse_config(content: &str) -> Result<AppConfig> {
  toml::from_str(content).context("Invalid config TOML")
}

/// Apply environment overrides through `lookup` (normally `std::env::var`).
pub fn apply_overrides<F>(mut config: AppConfig, lookup: F) -> AppConfig
where
  F: Fn(&str) -> Option<String>,
{
  if let Some(url) = lookup(ENV_BASE_URL).filter(|v| !v.trim().is_empty()) {
    config.api.base_url = url.trim().to_string();
  }
  if let Some(level) = lookup(ENV_LOG_LEVEL).filter(|v| !v.trim().is_empty()) {
    config.app.log_level = level.trim().to_string();
  }
  config.api.base_url = config.api.base_url.trim_end_matches('/').to_string();
  config
}

/// Validate all configuration parameters.
///
/// Checks for:
/// - An http(s) base URL
/// - Timeouts within 1..=60 seconds
/// - A non-zero feed buffer
/// - A known feed subscription mode
pub fn validate_config(config: &AppConfig) -> Result<()> {
  let url = Url::parse(&config.api.base_url)
    .with_context(|| format!("api.base_url is not a valid URL: {}", config.api.base_url))?;
  anyhow::ensure!(
    matches!(url.scheme(), "http" | "https"),
    "api.base_url must be http or https, got {}",
    url.scheme()
  );

  for (name, secs) in [
    ("probe_timeout_secs", config.api.probe_timeout_secs),
    ("request_timeout_secs", config.api.request_timeout_secs),
    ("heavy_timeout_secs", config.api.heavy_timeout_secs),
  ] {
    anyhow::ensure!(
      (1..=60).contains(&secs),
      "api.{} must be in 1..=60 seconds, got {}",
      name,
      secs
    );
  }

  anyhow::ensure!(
    config.feed.buffer_capacity > 0,
    "feed.buffer_capacity must be positive"
  );
  anyhow::ensure!(
    FEED_MODES.contains(&config.feed.mode.as_str()),
    "feed.mode must be one of {:?}, got {}",
    FEED_MODES,
    config.feed.mode
  );
  anyhow::ensure!(
    !config.persistence.data_dir.trim().is_empty(),
    "persistence.data_dir must not be empty"
  );

  Ok(())
}
