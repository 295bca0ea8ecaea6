//! Backend Request/Response Envelopes
//!
//! List endpoints wrap their rows in a named field (`data`, `trades`,
//! `journals`). Some deployments return the bare list instead, so each
//! envelope accepts both shapes.

use serde::{Deserialize, Serialize};

use crate::domain::{ChainRow, JournalEntry, TradeRecord};

/// `{"data": [...]}` or `[...]` from `/full-chain-table`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ChainTableResponse {
  Wrapped {
    #[serde(default)]
    data: Vec<ChainRow>,
  },
  Bare(Vec<ChainRow>),
}

impl ChainTableResponse {
  pub fn into_rows(self) -> Vec<ChainRow> {
    match self {
      Self::Wrapped { data } => data,
      Self::Bare(rows) => rows,
    }
  }
}

/// `{"trades": [...]}` or `[...]` from `/fetch/trades`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum TradesResponse {
  Wrapped {
    #[serde(default)]
    trades: Vec<TradeRecord>,
  },
  Bare(Vec<TradeRecord>),
}

impl TradesResponse {
  pub fn into_trades(self) -> Vec<TradeRecord> {
    match self {
      Self::Wrapped { trades } => trades,
      Self::Bare(trades) => trades,
    }
  }
}

/// `{"journals": [...]}` or `[...]` from `/fetch/journals`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum JournalsResponse {
  Wrapped {
    #[serde(default)]
    journals: Vec<JournalEntry>,
  },
  Bare(Vec<JournalEntry>),
}

impl JournalsResponse {
  pub fn into_entries(self) -> Vec<JournalEntry> {
    match self {
      Self::Wrapped { journals } => journals,
      Self::Bare(entries) => entries,
    }
  }
}

/// `POST /evaluate/risk` body.
#[derive(Debug, Serialize)]
pub struct EvaluateRiskRequest<'a> {
  pub active_trades: &'a [TradeRecord],
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_envelopes_accept_wrapped_and_bare() {
    let wrapped: TradesResponse =
      serde_json::from_value(json!({"trades": [{"strategy": "Iron Fly"}]})).unwrap();
    assert_eq!(wrapped.into_trades().len(), 1);

    let bare: JournalsResponse = serde_json::from_value(json!([{"title": "a"}, {"title": "b"}])).unwrap();
    assert_eq!(bare.into_entries().len(), 2);

    let empty: ChainTableResponse = serde_json::from_value(json!({})).unwrap();
    assert!(empty.into_rows().is_empty());
  }
}
