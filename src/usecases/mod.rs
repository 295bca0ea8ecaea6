//! Use Cases Layer - Dashboard Workflows
//!
//! Everything a view does between the user's input and the backend:
//! the authentication gate, per-view caching, local order validation
//! and the multi-leg order book.
//!
//! Use cases:
//! - `Session`: login gate, cached views, leg book
//! - `market_data`: overview pair, chain, model outputs, strategies
//! - `trading`: order submission, strategy placement, trade log, risk
//! - `journal`: journal list and new entries
//! - `order_ticket`: order forms and their validation

pub mod journal;
pub mod market_data;
pub mod order_ticket;
pub mod session;
pub mod trading;
pub mod view_cache;

pub use journal::JournalError;
pub use market_data::{MarketOverview, OverviewError, SnapshotSource};
pub use order_ticket::{
    CommonParams, GttTicket, LegBook, LegDraft, SingleLegTicket, TicketError,
};
pub use session::{LoginError, Session};
pub use trading::{RiskReview, RiskSource, StrategyPlacement, TradingError};
pub use view_cache::{CachedView, Fetched, OnFailure, RefetchPolicy};
