//! Domain layer - Typed views of the trading backend's payloads.
//!
//! The backend owns every entity; this layer only declares what the
//! terminal knows about each payload and how to decode it tolerantly.
//! No I/O here (hexagonal architecture inner ring).

pub mod feed;
pub mod journal;
pub mod lenient;
pub mod market;
pub mod orders;
pub mod risk;
pub mod strategy;
pub mod token;

pub use feed::{FeedAuthorization, FeedBuffer, FeedMessage, FeedPayload, FeedStatus};
pub use journal::{JournalEntry, Mood, NewJournalEntry};
pub use market::{ChainRow, MarketSnapshot, ModelOutput};
pub use orders::{
    GttOrder, MultiLegGttOrder, MultiLegOrder, OrderAck, OrderLeg, OrderMode, OrderRequest,
    PriceType, ProductType, SingleLegOrder, TransactionType, Validity,
};
pub use risk::{
    FlagLevel, PortfolioRisk, RiskEvaluation, StrategyRisk, TradeFilter, TradeRecord, TradeStatus,
};
pub use strategy::{
    MaxLoss, PlaceStrategyRequest, Rationale, RegimeTone, StrategyDetails, StrategyDetailsRequest,
    StrategyOrder, StrategySuggestion,
};
pub use token::AccessToken;
