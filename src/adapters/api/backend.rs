//! HTTP implementation of the `TradingBackend` port.
//!
//! One method per backend endpoint. Paths and timeout classes live here
//! and nowhere else.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;
use tracing::{info, instrument, warn};

use super::client::{BackendClient, TimeoutClass};
use super::types::{ChainTableResponse, EvaluateRiskRequest, JournalsResponse, TradesResponse};
use crate::domain::{
  AccessToken, ChainRow, FeedAuthorization, GttOrder, JournalEntry, MarketSnapshot, ModelOutput,
  MultiLegGttOrder, MultiLegOrder, NewJournalEntry, OrderAck, PlaceStrategyRequest,
  RiskEvaluation, SingleLegOrder, StrategyDetails, StrategyDetailsRequest, StrategySuggestion,
  TradeFilter, TradeRecord,
};
use crate::error::{ApiError, ApiResult};
use crate::ports::{TokenCheck, TradingBackend};

/// Backend endpoint paths.
pub mod paths {
  pub const EXPIRIES: &str = "/expiries";
  pub const OPTION_SELLER_DASHBOARD: &str = "/option-seller-dashboard";
  pub const LIVE_DASHBOARD: &str = "/live/dashboard";
  pub const FULL_CHAIN_TABLE: &str = "/full-chain-table";
  pub const PREDICT_VOLATILITY: &str = "/predict/volatility";
  pub const CALCULATE_REGIME: &str = "/calculate/regime";
  pub const SUGGEST_STRATEGY: &str = "/suggest/strategy";
  pub const STRATEGY_DETAILS: &str = "/strategy/details";
  pub const PLACE_MULTILEG: &str = "/place/multileg";
  pub const CREATE_ORDER: &str = "/create_order";
  pub const MULTI_LEG_ORDER: &str = "/multi_leg_order";
  pub const CREATE_GTT_ORDER: &str = "/create_gtt_order";
  pub const MULTI_LEG_GTT_ORDER: &str = "/multi_leg_gtt_order";
  pub const EVALUATE_RISK: &str = "/evaluate/risk";
  pub const LOG_TRADE: &str = "/log/trade";
  pub const FETCH_TRADES: &str = "/fetch/trades";
  pub const LOG_JOURNAL: &str = "/log/journal";
  pub const FETCH_JOURNALS: &str = "/fetch/journals";
  pub const AUTHORIZE_MARKET_FEED: &str = "/authorize-market-feed";
}

/// `TradingBackend` over the shared `BackendClient`.
pub struct HttpBackend {
  client: BackendClient,
}

impl HttpBackend {
  pub const fn new(client: BackendClient) -> Self {
    Self { client }
  }

  async fn get<T: serde::de::DeserializeOwned>(
    &self,
    path: &str,
    token: &AccessToken,
    class: TimeoutClass,
  ) -> ApiResult<T> {
    self.client.get_json(path, token, &[], class).await
  }
}

#[async_trait]
impl TradingBackend for HttpBackend {
  #[instrument(skip_all)]
  async fn validate_token(&self, token: &AccessToken) -> TokenCheck {
    match self.client.probe(paths::EXPIRIES, token).await {
      Ok(StatusCode::OK) => {
        info!(token = %token, "Access token accepted");
        TokenCheck::Valid
      }
      Ok(status) => {
        warn!(status = status.as_u16(), "Access token rejected");
        TokenCheck::Rejected(status.as_u16())
      }
      Err(e) => {
        warn!(error = %e, "Token probe failed");
        TokenCheck::Unreachable(e.to_string())
      }
    }
  }

  async fn option_seller_dashboard(&self, token: &AccessToken) -> ApiResult<MarketSnapshot> {
    self.get(paths::OPTION_SELLER_DASHBOARD, token, TimeoutClass::Standard).await
  }

  async fn live_dashboard(&self, token: &AccessToken) -> ApiResult<MarketSnapshot> {
    self.get(paths::LIVE_DASHBOARD, token, TimeoutClass::Standard).await
  }

  async fn full_chain_table(&self, token: &AccessToken) -> ApiResult<Vec<ChainRow>> {
    let response: ChainTableResponse =
      self.get(paths::FULL_CHAIN_TABLE, token, TimeoutClass::Standard).await?;
    Ok(response.into_rows())
  }

  async fn predict_volatility(&self, token: &AccessToken) -> ApiResult<ModelOutput> {
    self.get(paths::PREDICT_VOLATILITY, token, TimeoutClass::Heavy).await
  }

  async fn calculate_regime(&self, token: &AccessToken) -> ApiResult<ModelOutput> {
    self.get(paths::CALCULATE_REGIME, token, TimeoutClass::Heavy).await
  }

  async fn suggest_strategy(&self, token: &AccessToken) -> ApiResult<StrategySuggestion> {
    self.get(paths::SUGGEST_STRATEGY, token, TimeoutClass::Heavy).await
  }

  async fn strategy_details(
    &self,
    token: &AccessToken,
    request: &StrategyDetailsRequest,
  ) -> ApiResult<StrategyDetails> {
    self
      .client
      .post_json(paths::STRATEGY_DETAILS, token, request, TimeoutClass::Standard)
      .await
  }

  #[instrument(skip(self, token, request), fields(strategy = %request.strategy, lots = request.lots))]
  async fn place_multileg(
    &self,
    token: &AccessToken,
    request: &PlaceStrategyRequest,
  ) -> ApiResult<OrderAck> {
    self
      .client
      .post_json(paths::PLACE_MULTILEG, token, request, TimeoutClass::Standard)
      .await
  }

  #[instrument(skip_all, fields(side = %order.transaction_type, qty = order.quantity))]
  async fn create_order(&self, token: &AccessToken, order: &SingleLegOrder) -> ApiResult<OrderAck> {
    self
      .client
      .post_json(paths::CREATE_ORDER, token, order, TimeoutClass::Standard)
      .await
  }

  #[instrument(skip_all, fields(legs = order.legs.len()))]
  async fn multi_leg_order(&self, token: &AccessToken, order: &MultiLegOrder) -> ApiResult<OrderAck> {
    self
      .client
      .post_json(paths::MULTI_LEG_ORDER, token, order, TimeoutClass::Standard)
      .await
  }

  #[instrument(skip_all, fields(expiry = %order.gtt_expiry_date))]
  async fn create_gtt_order(&self, token: &AccessToken, order: &GttOrder) -> ApiResult<OrderAck> {
    self
      .client
      .post_json(paths::CREATE_GTT_ORDER, token, order, TimeoutClass::Standard)
      .await
  }

  #[instrument(skip_all, fields(legs = order.legs.len(), expiry = %order.gtt_expiry_date))]
  async fn multi_leg_gtt_order(
    &self,
    token: &AccessToken,
    order: &MultiLegGttOrder,
  ) -> ApiResult<OrderAck> {
    self
      .client
      .post_json(paths::MULTI_LEG_GTT_ORDER, token, order, TimeoutClass::Standard)
      .await
  }

  #[instrument(skip_all, fields(trades = active_trades.len()))]
  async fn evaluate_risk(
    &self,
    token: &AccessToken,
    active_trades: &[TradeRecord],
  ) -> ApiResult<RiskEvaluation> {
    let body = EvaluateRiskRequest { active_trades };
    self
      .client
      .post_json(paths::EVALUATE_RISK, token, &body, TimeoutClass::Heavy)
      .await
  }

  async fn log_trade(&self, token: &AccessToken, trade: &TradeRecord) -> ApiResult<OrderAck> {
    self
      .client
      .post_json(paths::LOG_TRADE, token, trade, TimeoutClass::Standard)
      .await
  }

  async fn fetch_trades(&self, token: &AccessToken, filter: TradeFilter) -> ApiResult<Vec<TradeRecord>> {
    let query: Vec<(&str, &str)> = filter
      .query_value()
      .map(|status| vec![("status", status)])
      .unwrap_or_default();
    let response: TradesResponse = self
      .client
      .get_json(paths::FETCH_TRADES, token, &query, TimeoutClass::Standard)
      .await?;
    Ok(response.into_trades())
  }

  async fn log_journal(&self, token: &AccessToken, entry: &NewJournalEntry) -> ApiResult<OrderAck> {
    self
      .client
      .post_json(paths::LOG_JOURNAL, token, entry, TimeoutClass::Standard)
      .await
  }

  async fn fetch_journals(&self, token: &AccessToken) -> ApiResult<Vec<JournalEntry>> {
    let response: JournalsResponse =
      self.get(paths::FETCH_JOURNALS, token, TimeoutClass::Standard).await?;
    Ok(response.into_entries())
  }

  async fn authorize_market_feed(&self, token: &AccessToken) -> ApiResult<FeedAuthorization> {
    let value: Value = self
      .get(paths::AUTHORIZE_MARKET_FEED, token, TimeoutClass::Standard)
      .await?;
    FeedAuthorization::from_value(&value).ok_or_else(|| {
      ApiError::decode(
        paths::AUTHORIZE_MARKET_FEED,
        "response carries no ws:// or wss:// URL",
      )
    })
  }
}
