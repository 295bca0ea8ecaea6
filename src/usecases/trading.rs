//! Trading - Order Submission, Strategy Placement, Trade Log and Risk
//!
//! Orders are validated locally (see `order_ticket`) before anything is
//! sent. The multi-leg book is reset after every submission that
//! reached the backend, whatever the backend answered.

use chrono::NaiveDate;
use thiserror::Error;
use tracing::{info, instrument, warn};

use super::order_ticket::{
    build_multi_leg, build_multi_leg_gtt, is_positive, CommonParams, TicketError,
};
use super::session::Session;
use super::view_cache::Fetched;
use crate::domain::{
    OrderAck, OrderRequest, PlaceStrategyRequest, RiskEvaluation, StrategyDetails, TradeFilter,
    TradeRecord, TradeStatus,
};
use crate::error::{ApiError, ApiResult};

/// Failure of a trading operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TradingError {
    #[error(transparent)]
    Ticket(#[from] TicketError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("{0}")]
    InvalidTrade(String),
    #[error("Strategy '{0}' returned no orders to place.")]
    NoOrders(String),
    #[error("No active trades to evaluate.")]
    NoActiveTrades,
}

/// Where the risk review takes its active trades from.
#[derive(Debug, Clone, PartialEq)]
pub enum RiskSource {
    /// Trades supplied by the user.
    Provided(Vec<TradeRecord>),
    /// The backend's open trades.
    OpenTrades,
}

/// Outcome of a risk review.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskReview {
    /// Number of active trades evaluated.
    pub trades: usize,
    pub evaluation: RiskEvaluation,
}

/// Strategy placement: the details the legs came from and the ack.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyPlacement {
    pub details: StrategyDetails,
    pub ack: OrderAck,
}

/// Check a manually logged trade before it is sent.
pub fn validate_trade(trade: &TradeRecord) -> Result<(), TradingError> {
    if trade.strategy.trim().is_empty() {
        return Err(TradingError::InvalidTrade("Strategy is required.".to_string()));
    }
    if trade.instrument_token.trim().is_empty() {
        return Err(TradingError::InvalidTrade("Instrument token is required.".to_string()));
    }
    if !is_positive(trade.entry_price) {
        return Err(TradingError::InvalidTrade(
            "Entry price must be greater than 0.".to_string(),
        ));
    }
    if !is_positive(trade.quantity) {
        return Err(TradingError::InvalidTrade(
            "Quantity must be greater than 0.".to_string(),
        ));
    }
    Ok(())
}

impl Session {
    /// Submit a fully built order to its endpoint.
    #[instrument(skip_all, fields(kind = request.label()))]
    pub async fn submit_order(&mut self, request: &OrderRequest) -> ApiResult<OrderAck> {
        let token = self.require_token()?;
        let backend = self.backend();
        let result = match request {
            OrderRequest::Single(order) => backend.create_order(&token, order).await,
            OrderRequest::MultiLeg(order) => backend.multi_leg_order(&token, order).await,
            OrderRequest::Gtt(order) => backend.create_gtt_order(&token, order).await,
            OrderRequest::MultiLegGtt(order) => backend.multi_leg_gtt_order(&token, order).await,
        };
        match &result {
            Ok(ack) => {
                info!(summary = %ack.summary(), "Order accepted");
                self.mark_updated();
            }
            Err(e) => warn!(error = %e, "Order failed"),
        }
        result
    }

    /// Build a multi-leg order from the leg book and submit it.
    pub async fn submit_leg_book(&mut self, common: &CommonParams) -> Result<OrderAck, TradingError> {
        self.require_token()?;
        let order = build_multi_leg(common, &self.legs)?;
        let result = self.submit_order(&OrderRequest::MultiLeg(order)).await;
        self.legs.reset();
        Ok(result?)
    }

    /// Build a multi-leg GTT order from the leg book and submit it.
    pub async fn submit_leg_book_gtt(
        &mut self,
        common: &CommonParams,
        trigger_price: f64,
        expiry: NaiveDate,
        today: NaiveDate,
    ) -> Result<OrderAck, TradingError> {
        self.require_token()?;
        let order = build_multi_leg_gtt(common, &self.legs, trigger_price, expiry, today)?;
        let result = self.submit_order(&OrderRequest::MultiLegGtt(order)).await;
        self.legs.reset();
        Ok(result?)
    }

    /// Fetch a suggested strategy's legs and place them in one request.
    #[instrument(skip(self))]
    pub async fn place_strategy(
        &mut self,
        strategy: &str,
        lots: u32,
    ) -> Result<StrategyPlacement, TradingError> {
        let details = self.strategy_details(strategy, lots).await?;
        if details.orders.is_empty() {
            return Err(TradingError::NoOrders(strategy.to_string()));
        }

        let token = self.require_token()?;
        let request = PlaceStrategyRequest {
            strategy: strategy.to_string(),
            lots: lots.max(1),
            orders: details.orders.clone(),
        };
        let ack = self.backend.place_multileg(&token, &request).await?;
        info!(summary = %ack.summary(), "Strategy placed");
        self.mark_updated();
        Ok(StrategyPlacement { details, ack })
    }

    /// Log a manual trade. Invalidates the trade log on success.
    pub async fn log_trade(&mut self, trade: &TradeRecord) -> Result<OrderAck, TradingError> {
        let token = self.require_token()?;
        validate_trade(trade)?;
        let ack = self.backend.log_trade(&token, trade).await?;
        self.views.trades.invalidate();
        self.mark_updated();
        Ok(ack)
    }

    /// Trade log, filtered by status. Changing the filter invalidates.
    pub async fn trades(&mut self, filter: TradeFilter) -> ApiResult<Fetched<Vec<TradeRecord>>> {
        let token = self.require_token()?;
        if self.views.trades_filter != filter {
            self.views.trades_filter = filter;
            self.views.trades.invalidate();
        }
        let backend = self.backend();
        let fetched = self
            .views
            .trades
            .resolve(move || async move { backend.fetch_trades(&token, filter).await })
            .await?;
        self.mark_updated();
        Ok(fetched)
    }

    /// Evaluate portfolio risk. Always recomputed; nothing is posted
    /// when there are no active trades.
    #[instrument(skip_all)]
    pub async fn risk_review(&mut self, source: RiskSource) -> Result<RiskReview, TradingError> {
        let token = self.require_token()?;
        let active: Vec<TradeRecord> = match source {
            RiskSource::Provided(trades) => trades,
            RiskSource::OpenTrades => self
                .backend
                .fetch_trades(&token, TradeFilter::Open)
                .await?
                .into_iter()
                .filter(|t| t.status == TradeStatus::Open)
                .collect(),
        };

        if active.is_empty() {
            info!("No active trades, risk evaluation skipped");
            return Err(TradingError::NoActiveTrades);
        }

        let evaluation = self.backend.evaluate_risk(&token, &active).await?;
        self.mark_updated();
        Ok(RiskReview {
            trades: active.len(),
            evaluation,
        })
    }
}
