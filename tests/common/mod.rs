//! Shared test doubles for the integration test crates.

#![allow(dead_code)]

use mockall::mock;

use voluguard::domain::{
    AccessToken, ChainRow, FeedAuthorization, GttOrder, JournalEntry, MarketSnapshot, ModelOutput,
    MultiLegGttOrder, MultiLegOrder, NewJournalEntry, OrderAck, PlaceStrategyRequest,
    RiskEvaluation, SingleLegOrder, StrategyDetails, StrategyDetailsRequest, StrategySuggestion,
    TradeFilter, TradeRecord,
};
use voluguard::error::ApiResult;
use voluguard::ports::{TokenCheck, TradingBackend};

// ---- Mock Definitions ----

mock! {
    pub Backend {}

    #[async_trait::async_trait]
    impl TradingBackend for Backend {
        async fn validate_token(&self, token: &AccessToken) -> TokenCheck;
        async fn option_seller_dashboard(&self, token: &AccessToken) -> ApiResult<MarketSnapshot>;
        async fn live_dashboard(&self, token: &AccessToken) -> ApiResult<MarketSnapshot>;
        async fn full_chain_table(&self, token: &AccessToken) -> ApiResult<Vec<ChainRow>>;
        async fn predict_volatility(&self, token: &AccessToken) -> ApiResult<ModelOutput>;
        async fn calculate_regime(&self, token: &AccessToken) -> ApiResult<ModelOutput>;
        async fn suggest_strategy(&self, token: &AccessToken) -> ApiResult<StrategySuggestion>;
        async fn strategy_details(
            &self,
            token: &AccessToken,
            request: &StrategyDetailsRequest,
        ) -> ApiResult<StrategyDetails>;
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
        async fn evaluate_risk(
            &self,
            token: &AccessToken,
            active_trades: &[TradeRecord],
        ) -> ApiResult<RiskEvaluation>;
        async fn log_trade(&self, token: &AccessToken, trade: &TradeRecord) -> ApiResult<OrderAck>;
        async fn fetch_trades(&self, token: &AccessToken, filter: TradeFilter) -> ApiResult<Vec<TradeRecord>>;
        async fn log_journal(&self, token: &AccessToken, entry: &NewJournalEntry) -> ApiResult<OrderAck>;
        async fn fetch_journals(&self, token: &AccessToken) -> ApiResult<Vec<JournalEntry>>;
        async fn authorize_market_feed(&self, token: &AccessToken) -> ApiResult<FeedAuthorization>;
    }
}
