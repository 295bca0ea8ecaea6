//! Market Data Views - Overview, Chain, Models and Strategies
//!
//! The overview pairs the dashboard snapshot with the strategy
//! suggestion. Both are fetched concurrently and cached together: the
//! pair is stored only when both succeed.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, instrument};

use super::session::Session;
use super::view_cache::Fetched;
use crate::domain::{
    ChainRow, MarketSnapshot, ModelOutput, StrategyDetails, StrategyDetailsRequest,
    StrategySuggestion,
};
use crate::error::{ApiError, ApiResult};

/// Which dashboard endpoint feeds the snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SnapshotSource {
    /// `/option-seller-dashboard`.
    #[default]
    OptionSeller,
    /// `/live/dashboard`.
    Live,
}

/// Snapshot and suggestion, fetched as one unit.
#[derive(Debug, Clone, PartialEq)]
pub struct MarketOverview {
    pub source: SnapshotSource,
    pub snapshot: MarketSnapshot,
    pub suggestion: StrategySuggestion,
}

/// Failure of the overview pair, naming the half that failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OverviewError {
    #[error(transparent)]
    Session(#[from] ApiError),
    #[error("Failed to fetch market metrics: {0}")]
    Metrics(ApiError),
    #[error("Failed to fetch strategy suggestions: {0}")]
    Suggestions(ApiError),
}

impl Session {
    /// Market overview under the session's market refetch policy.
    #[instrument(skip(self))]
    pub async fn overview(
        &mut self,
        source: SnapshotSource,
    ) -> Result<Fetched<MarketOverview>, OverviewError> {
        let token = self.require_token()?;
        let backend = Arc::clone(&self.backend);

        if self
            .views
            .overview
            .peek()
            .is_some_and(|cached| cached.source != source)
        {
            self.views.overview.refresh();
        }

        let fetched = self
            .views
            .overview
            .resolve(move || async move {
                let snapshot = async {
                    match source {
                        SnapshotSource::OptionSeller => backend.option_seller_dashboard(&token).await,
                        SnapshotSource::Live => backend.live_dashboard(&token).await,
                    }
                };
                let (snapshot, suggestion) =
                    tokio::join!(snapshot, backend.suggest_strategy(&token));
                let snapshot = snapshot.map_err(OverviewError::Metrics)?;
                let suggestion = suggestion.map_err(OverviewError::Suggestions)?;
                Ok::<_, OverviewError>(MarketOverview {
                    source,
                    snapshot,
                    suggestion,
                })
            })
            .await?;

        if fetched.fresh {
            self.mark_updated();
        } else {
            debug!("Serving cached market overview");
        }
        Ok(fetched)
    }

    /// Full option chain under the session's market refetch policy.
    #[instrument(skip(self))]
    pub async fn chain(&mut self) -> ApiResult<Fetched<Vec<ChainRow>>> {
        let token = self.require_token()?;
        let backend = Arc::clone(&self.backend);

        let fetched = self
            .views
            .chain
            .resolve(move || async move { backend.full_chain_table(&token).await })
            .await?;
        if fetched.fresh {
            self.mark_updated();
        }
        Ok(fetched)
    }

    /// Volatility forecast. Never cached.
    pub async fn volatility(&mut self) -> ApiResult<ModelOutput> {
        let token = self.require_token()?;
        let output = self.backend.predict_volatility(&token).await?;
        self.mark_updated();
        Ok(output)
    }

    /// Regime classification. Never cached.
    pub async fn regime(&mut self) -> ApiResult<ModelOutput> {
        let token = self.require_token()?;
        let output = self.backend.calculate_regime(&token).await?;
        self.mark_updated();
        Ok(output)
    }

    /// Strategy suggestions for the strategy view. Never cached.
    pub async fn suggestions(&mut self) -> ApiResult<StrategySuggestion> {
        let token = self.require_token()?;
        let suggestion = self.backend.suggest_strategy(&token).await?;
        self.mark_updated();
        Ok(suggestion)
    }

    /// Details (legs, premium, payoff bounds) of one suggested strategy.
    pub async fn strategy_details(
        &mut self,
        strategy: &str,
        lots: u32,
    ) -> ApiResult<StrategyDetails> {
        let token = self.require_token()?;
        let request = StrategyDetailsRequest {
            strategy: strategy.to_string(),
            lots: lots.max(1),
        };
        let details = self.backend.strategy_details(&token, &request).await?;
        self.mark_updated();
        Ok(details)
    }
}
