//! Session - Authentication Gate and Per-session State
//!
//! Holds the access token once it has been validated against the
//! backend, the cached views, and the multi-leg order book. Logging out
//! drops all of it.

use std::sync::Arc;

use chrono::{DateTime, Local, Utc};
use thiserror::Error;
use tracing::{info, instrument, warn};

use super::order_ticket::LegBook;
use super::view_cache::{CachedView, OnFailure, RefetchPolicy};
use crate::config::MarketRefetch;
use crate::domain::{AccessToken, ChainRow, JournalEntry, TradeFilter, TradeRecord};
use crate::error::{ApiError, ApiResult};
use crate::ports::{TokenCheck, TradingBackend};

use super::market_data::MarketOverview;

/// Why a login attempt failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoginError {
    #[error("Insert correct access token.")]
    Empty,
    #[error("Insert correct access token. (backend answered {0})")]
    Rejected(u16),
    #[error("Insert correct access token. (backend unreachable: {0})")]
    Unreachable(String),
}

impl From<MarketRefetch> for RefetchPolicy {
    fn from(value: MarketRefetch) -> Self {
        match value {
            MarketRefetch::OnDemand => Self::UntilInvalidated,
            MarketRefetch::EveryView => Self::EveryView,
        }
    }
}

/// Cached views held for the lifetime of a login.
#[derive(Debug, Clone)]
pub(super) struct SessionViews {
    pub overview: CachedView<MarketOverview>,
    pub chain: CachedView<Vec<ChainRow>>,
    pub trades: CachedView<Vec<TradeRecord>>,
    pub trades_filter: TradeFilter,
    pub journals: CachedView<Vec<JournalEntry>>,
}

impl SessionViews {
    fn new(market: RefetchPolicy) -> Self {
        Self {
            overview: CachedView::new(market, OnFailure::Clear),
            chain: CachedView::new(market, OnFailure::Clear),
            trades: CachedView::new(RefetchPolicy::EveryView, OnFailure::Clear),
            trades_filter: TradeFilter::All,
            journals: CachedView::new(RefetchPolicy::UntilInvalidated, OnFailure::PinEmpty),
        }
    }
}

/// One authenticated (or not yet authenticated) user session.
pub struct Session {
    pub(super) backend: Arc<dyn TradingBackend>,
    token: Option<AccessToken>,
    connected_at: Option<DateTime<Utc>>,
    last_updated: Option<DateTime<Utc>>,
    market_policy: RefetchPolicy,
    pub(super) views: SessionViews,
    pub(super) legs: LegBook,
}

impl Session {
    pub fn new(backend: Arc<dyn TradingBackend>, market_refetch: MarketRefetch) -> Self {
        let market_policy = RefetchPolicy::from(market_refetch);
        Self {
            backend,
            token: None,
            connected_at: None,
            last_updated: None,
            market_policy,
            views: SessionViews::new(market_policy),
            legs: LegBook::new(),
        }
    }

    /// Validate `raw` against `/expiries` and authenticate on HTTP 200.
    ///
    /// A blank token is rejected without a request. A failed attempt
    /// leaves any previous session untouched.
    #[instrument(skip_all)]
    pub async fn login(&mut self, raw: &str) -> Result<(), LoginError> {
        let Some(token) = AccessToken::new(raw) else {
            return Err(LoginError::Empty);
        };

        match self.backend.validate_token(&token).await {
            TokenCheck::Valid => {
                self.reset_state();
                let now = Utc::now();
                info!(token = %token, "Session authenticated");
                self.token = Some(token);
                self.connected_at = Some(now);
                self.last_updated = Some(now);
                Ok(())
            }
            TokenCheck::Rejected(status) => {
                warn!(status, "Login rejected");
                Err(LoginError::Rejected(status))
            }
            TokenCheck::Unreachable(reason) => {
                warn!(%reason, "Login failed, backend unreachable");
                Err(LoginError::Unreachable(reason))
            }
        }
    }

    /// Drop the token and everything cached under it.
    pub fn logout(&mut self) {
        if self.token.take().is_some() {
            info!("Session logged out");
        }
        self.connected_at = None;
        self.last_updated = None;
        self.reset_state();
    }

    pub const fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// The session token, or `MissingToken` before login.
    pub fn require_token(&self) -> ApiResult<AccessToken> {
        self.token.clone().ok_or(ApiError::MissingToken)
    }

    pub fn backend(&self) -> Arc<dyn TradingBackend> {
        Arc::clone(&self.backend)
    }

    pub const fn connected_at(&self) -> Option<DateTime<Utc>> {
        self.connected_at
    }

    pub const fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.last_updated
    }

    pub(super) fn mark_updated(&mut self) {
        self.last_updated = Some(Utc::now());
    }

    /// `Connected | Last Updated: <local time>` once authenticated.
    pub fn header_line(&self) -> Option<String> {
        self.last_updated.filter(|_| self.is_authenticated()).map(|t| {
            format!(
                "Connected | Last Updated: {}",
                t.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S")
            )
        })
    }

    /// Force every cached view to fetch again on next view.
    pub fn refresh_all(&mut self) {
        self.views.overview.refresh();
        self.views.chain.refresh();
        self.views.trades.refresh();
        self.views.journals.refresh();
    }

    pub fn refresh_overview(&mut self) {
        self.views.overview.refresh();
    }

    pub fn refresh_chain(&mut self) {
        self.views.chain.refresh();
    }

    /// Clears a pinned-empty journal list too.
    pub fn refresh_journals(&mut self) {
        self.views.journals.refresh();
    }

    pub const fn legs(&self) -> &LegBook {
        &self.legs
    }

    pub fn legs_mut(&mut self) -> &mut LegBook {
        &mut self.legs
    }

    fn reset_state(&mut self) {
        self.views = SessionViews::new(self.market_policy);
        self.legs.reset();
    }
}
