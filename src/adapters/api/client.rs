//! Backend HTTP Client - Token-authenticated REST Client
//!
//! Wraps reqwest with per-class timeouts, a concurrency limit and
//! token authentication for every backend REST interaction. Requests
//! are never retried: a failure is reported and the user decides.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::Semaphore;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::adapters::metrics::MetricsRegistry;
use crate::config::ApiConfig;
use crate::domain::AccessToken;
use crate::error::{ApiError, ApiResult};

/// Timeout class of a backend endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutClass {
  /// Token probe.
  Probe,
  Standard,
  /// Model-backed endpoints.
  Heavy,
}

/// Configuration for the backend HTTP client.
#[derive(Debug, Clone)]
pub struct BackendClientConfig {
  /// Base URL for the backend, no trailing slash.
  pub base_url: String,
  pub probe_timeout: Duration,
  pub request_timeout: Duration,
  pub heavy_timeout: Duration,
  /// Maximum concurrent requests.
  pub max_concurrent: usize,
  pub user_agent: String,
}

impl Default for BackendClientConfig {
  fn default() -> Self {
    Self::from(&ApiConfig::default())
  }
}

impl From<&ApiConfig> for BackendClientConfig {
  fn from(api: &ApiConfig) -> Self {
    Self {
      base_url: api.base_url.trim_end_matches('/').to_string(),
      probe_timeout: Duration::from_secs(api.probe_timeout_secs),
      request_timeout: Duration::from_secs(api.request_timeout_secs),
      heavy_timeout: Duration::from_secs(api.heavy_timeout_secs),
      max_concurrent: 4,
      user_agent: api.user_agent.clone(),
    }
  }
}

impl BackendClientConfig {
  pub const fn timeout(&self, class: TimeoutClass) -> Duration {
    match class {
      TimeoutClass::Probe => self.probe_timeout,
      TimeoutClass::Standard => self.request_timeout,
      TimeoutClass::Heavy => self.heavy_timeout,
    }
  }
}

/// Shared HTTP client for the trading backend.
pub struct BackendClient {
  /// Underlying HTTP client, built once.
  http: Client,
  config: BackendClientConfig,
  /// Concurrency limiter.
  semaphore: Arc<Semaphore>,
  metrics: Option<MetricsRegistry>,
}

impl BackendClient {
  /// Create a new backend client.
  pub fn new(config: BackendClientConfig) -> Result<Self> {
    let http = Client::builder()
      .user_agent(config.user_agent.clone())
      .pool_max_idle_per_host(4)
      .build()
      .context("Failed to build HTTP client")?;

    let semaphore = Arc::new(Semaphore::new(config.max_concurrent.max(1)));

    Ok(Self {
      http,
      config,
      semaphore,
      metrics: None,
    })
  }

  /// Record request counters and latency into `metrics`.
  #[must_use]
  pub fn with_metrics(mut self, metrics: MetricsRegistry) -> Self {
    self.metrics = Some(metrics);
    self
  }

  pub fn config(&self) -> &BackendClientConfig {
    &self.config
  }

  /// GET `path` and decode the JSON body.
  pub async fn get_json<T: DeserializeOwned>(
    &self,
    path: &str,
    token: &AccessToken,
    query: &[(&str, &str)],
    class: TimeoutClass,
  ) -> ApiResult<T> {
    let url = format!("{}{}", self.config.base_url, path);
    let request = self.http.get(&url).query(query);
    let response = self.execute(request, "GET", path, token, class).await?;
    decode_body(path, response).await
  }

  /// POST a JSON body to `path` and decode the JSON response.
  pub async fn post_json<B, T>(
    &self,
    path: &str,
    token: &AccessToken,
    body: &B,
    class: TimeoutClass,
  ) -> ApiResult<T>
  where
    B: Serialize + ?Sized + Sync,
    T: DeserializeOwned,
  {
    let url = format!("{}{}", self.config.base_url, path);
    let request = self.http.post(&url).json(body);
    let response = self.execute(request, "POST", path, token, class).await?;
    decode_body(path, response).await
  }

  /// GET `path` and return the raw status, without treating non-2xx
  /// as an error. Used by the token probe.
  pub async fn probe(&self, path: &str, token: &AccessToken) -> ApiResult<StatusCode> {
    let url = format!("{}{}", self.config.base_url, path);
    let request = self.http.get(&url);
    let started = Instant::now();
    let result = self.send(request, "GET", path, token, TimeoutClass::Probe).await;
    let outcome = match &result {
      Ok(r) if r.status() == StatusCode::OK => "ok",
      Ok(_) => "http",
      Err(e) => e.kind(),
    };
    self.observe(path, outcome, started);
    result.map(|r| r.status())
  }

  /// Send with auth, then map non-2xx to `ApiError::Http`.
  async fn execute(
    &self,
    request: RequestBuilder,
    method: &str,
    path: &str,
    token: &AccessToken,
    class: TimeoutClass,
  ) -> ApiResult<Response> {
    let started = Instant::now();
    let result = match self.send(request, method, path, token, class).await {
      Ok(response) if response.status().is_success() => Ok(response),
      Ok(response) => {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        warn!(method, path, status, "Backend returned error status");
        Err(ApiError::Http { status, body })
      }
      Err(e) => {
        warn!(method, path, error = %e, "Backend request failed");
        Err(e)
      }
    };
    let outcome = result.as_ref().map_or_else(ApiError::kind, |_| "ok");
    self.observe(path, outcome, started);
    result
  }

  async fn send(
    &self,
    request: RequestBuilder,
    method: &str,
    path: &str,
    token: &AccessToken,
    class: TimeoutClass,
  ) -> ApiResult<Response> {
    let _permit = self
      .semaphore
      .acquire()
      .await
      .map_err(|_| ApiError::Network("HTTP client is shut down".to_string()))?;

    let request_id = Uuid::new_v4();
    debug!(method, path, %request_id, ?class, "Backend request");

    let response = request
      .query(&[("access_token", token.expose())])
      .bearer_auth(token.expose())
      .header("x-request-id", request_id.to_string())
      .timeout(self.config.timeout(class))
      .send()
      .await?;

    debug!(method, path, %request_id, status = response.status().as_u16(), "Backend response");
    Ok(response)
  }

  fn observe(&self, path: &str, outcome: &str, started: Instant) {
    if let Some(metrics) = &self.metrics {
      let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
      metrics.observe_request(path, outcome, elapsed_ms);
    }
  }
}

/// Decode a successful body. An empty body decodes as JSON `null`.
async fn decode_body<T: DeserializeOwned>(path: &str, response: Response) -> ApiResult<T> {
  let text = response.text().await?;
  let text = if text.trim().is_empty() { "null" } else { text.as_str() };
  serde_json::from_str(text).map_err(|e| ApiError::decode(path, e))
}
