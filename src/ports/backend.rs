//! Trading Backend Port - Remote REST Contract
//!
//! Every capability of the terminal is a call to the remote backend.
//! Use cases depend on this trait only; `adapters::api::HttpBackend`
//! implements it over HTTP and tests mock it with mockall.
//!
//! Contract:
//! - Every call carries the caller's `AccessToken`
//! - Timeouts are per request class (probe / standard / heavy)
//! - Failures are returned, never retried

use async_trait::async_trait;

use crate::domain::{
  AccessToken, ChainRow, FeedAuthorization, GttOrder, JournalEntry, MarketSnapshot,
  ModelOutput, MultiLegGttOrder, MultiLegOrder, NewJournalEntry, OrderAck,
  PlaceStrategyRequest, RiskEvaluation, SingleLegOrder, StrategyDetails,
  StrategyDetailsRequest, StrategySuggestion, TradeFilter, TradeRecord,
};
use crate::error::ApiResult;

/// Outcome of the `/expiries` token probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenCheck {
  /// Backend answered 200.
  Valid,
  /// Backend answered with any other status.
  Rejected(u16),
  /// Backend could not be reached in time.
  Unreachable(String),
}

impl TokenCheck {
  pub const fn is_valid(&self) -> bool {
    matches!(self, Self::Valid)
  }
}

/// Remote options-trading backend.
#[async_trait]
pub trait TradingBackend: Send + Sync + 'static {
  /// Probe `/expiries` with the token. Never errors: failures are
  /// folded into `TokenCheck`.
  async fn validate_token(&self, token: &AccessToken) -> TokenCheck;

  /// Option-seller dashboard snapshot.
  async fn option_seller_dashboard(&self, token: &AccessToken) -> ApiResult<MarketSnapshot>;

  /// Live dashboard snapshot (same shape, refreshed server-side).
  async fn live_dashboard(&self, token: &AccessToken) -> ApiResult<MarketSnapshot>;

  /// Full option chain, one row per strike.
  async fn full_chain_table(&self, token: &AccessToken) -> ApiResult<Vec<ChainRow>>;

  /// GARCH / XGBoost volatility forecast.
  async fn predict_volatility(&self, token: &AccessToken) -> ApiResult<ModelOutput>;

  /// Volatility regime classification.
  async fn calculate_regime(&self, token: &AccessToken) -> ApiResult<ModelOutput>;

  async fn suggest_strategy(&self, token: &AccessToken) -> ApiResult<StrategySuggestion>;

  async fn strategy_details(
    &self,
    token: &AccessToken,
    request: &StrategyDetailsRequest,
  ) -> ApiResult<StrategyDetails>;

  /// Place all legs of a suggested strategy.
  async fn place_multileg(
    &self,
    token: &AccessToken,
    request: &PlaceStrategyRequest,
  ) -> ApiResult<OrderAck>;

  async fn create_order(&self, token: &AccessToken, order: &SingleLegOrder) -> ApiResult<OrderAck>;

  async fn multi_leg_order(&self, token: &AccessToken, order: &MultiLegOrder) -> ApiResult<OrderAck>;

  async fn create_gtt_order(&self, token: &AccessToken, order: &GttOrder) -> ApiResult<OrderAck>;

  async fn multi_leg_gtt_order(
    &self,
    token: &AccessToken,
    order: &MultiLegGttOrder,
  ) -> ApiResult<OrderAck>;

  /// Portfolio risk for the given active trades.
  async fn evaluate_risk(
    &self,
    token: &AccessToken,
    active_trades: &[TradeRecord],
  ) -> ApiResult<RiskEvaluation>;

  async fn log_trade(&self, token: &AccessToken, trade: &TradeRecord) -> ApiResult<OrderAck>;

  async fn fetch_trades(&self, token: &AccessToken, filter: TradeFilter) -> ApiResult<Vec<TradeRecord>>;

  async fn log_journal(&self, token: &AccessToken, entry: &NewJournalEntry) -> ApiResult<OrderAck>;

  async fn fetch_journals(&self, token: &AccessToken) -> ApiResult<Vec<JournalEntry>>;

  /// Obtain a (possibly single-use) WebSocket URL for the market feed.
  async fn authorize_market_feed(&self, token: &AccessToken) -> ApiResult<FeedAuthorization>;
}
