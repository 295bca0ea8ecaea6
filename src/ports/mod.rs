//! Ports Layer - Hexagonal Architecture Boundaries
//!
//! Defines the interfaces (traits) that the usecases layer requires
//! from the outside world. Adapters implement these traits.
//!
//! Port categories:
//! - `TradingBackend`: the remote options-trading REST backend

pub mod backend;

pub use backend::{TokenCheck, TradingBackend};
