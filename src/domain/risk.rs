//! Trade records and portfolio risk evaluation payloads.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::lenient;

/// Lifecycle status of a logged trade.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeStatus {
    #[default]
    Open,
    Closed,
    /// Anything else the backend invents.
    Other,
}

/// Case-insensitive; non-string values decode as `Other`.
impl<'de> Deserialize<'de> for TradeStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(s) if s.trim().eq_ignore_ascii_case("open") => Self::Open,
            Value::String(s) if s.trim().eq_ignore_ascii_case("closed") => Self::Closed,
            _ => Self::Other,
        })
    }
}

impl fmt::Display for TradeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::Closed => write!(f, "closed"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// Status filter for `/fetch/trades`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TradeFilter {
    #[default]
    All,
    Open,
    Closed,
}

impl TradeFilter {
    /// Value of the `status` query parameter (`None` for all trades).
    pub const fn query_value(self) -> Option<&'static str> {
        match self {
            Self::All => None,
            Self::Open => Some("open"),
            Self::Closed => Some("closed"),
        }
    }
}

impl FromStr for TradeFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "open" => Ok(Self::Open),
            "closed" => Ok(Self::Closed),
            other => Err(format!("unknown trade status filter '{other}' (all|open|closed)")),
        }
    }
}

impl fmt::Display for TradeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.query_value().unwrap_or("all"))
    }
}

/// An active or historical trade as the backend stores it.
///
/// Same shape for `/log/trade`, `/fetch/trades` and the
/// `active_trades` list posted to `/evaluate/risk`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    #[serde(default, deserialize_with = "lenient::text_or_empty")]
    pub strategy: String,
    #[serde(default, deserialize_with = "lenient::text_or_empty")]
    pub instrument_token: String,
    #[serde(default, deserialize_with = "lenient::f64_or_zero")]
    pub entry_price: f64,
    #[serde(default, deserialize_with = "lenient::f64_or_zero")]
    pub quantity: f64,
    #[serde(default, deserialize_with = "lenient::f64_or_zero")]
    pub realized_pnl: f64,
    #[serde(default, deserialize_with = "lenient::f64_or_zero")]
    pub unrealized_pnl: f64,
    #[serde(default, deserialize_with = "lenient::f64_or_zero")]
    pub capital_used: f64,
    #[serde(default, deserialize_with = "lenient::f64_or_zero")]
    pub potential_loss: f64,
    /// Stop-loss already hit.
    #[serde(default)]
    pub sl_hit: bool,
    #[serde(default, deserialize_with = "lenient::f64_or_zero")]
    pub vega: f64,
    #[serde(default)]
    pub status: TradeStatus,
    /// Backend-assigned fields (id, timestamps...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Portfolio block of `/evaluate/risk`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortfolioRisk {
    #[serde(rename = "Total Funds", default, deserialize_with = "lenient::opt_f64")]
    pub total_funds: Option<f64>,
    #[serde(rename = "Capital Deployed", default, deserialize_with = "lenient::opt_f64")]
    pub capital_deployed: Option<f64>,
    #[serde(rename = "Exposure Percent", default, deserialize_with = "lenient::opt_f64")]
    pub exposure_percent: Option<f64>,
    #[serde(rename = "Risk on Table", default, deserialize_with = "lenient::opt_f64")]
    pub risk_on_table: Option<f64>,
    #[serde(rename = "Total Vega Exposure", default, deserialize_with = "lenient::opt_f64")]
    pub total_vega: Option<f64>,
    #[serde(rename = "Flags", default)]
    pub flags: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Per-strategy row of the risk summary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StrategyRisk {
    #[serde(rename = "Strategy", default, deserialize_with = "lenient::text_or_empty")]
    pub strategy: String,
    #[serde(rename = "Capital Used", default, deserialize_with = "lenient::opt_f64")]
    pub capital_used: Option<f64>,
    #[serde(rename = "Cap Limit", default, deserialize_with = "lenient::opt_f64")]
    pub cap_limit: Option<f64>,
    #[serde(rename = "% Used", default, deserialize_with = "lenient::opt_f64")]
    pub pct_used: Option<f64>,
    #[serde(rename = "Potential Risk", default, deserialize_with = "lenient::opt_f64")]
    pub potential_risk: Option<f64>,
    #[serde(rename = "Risk Limit", default, deserialize_with = "lenient::opt_f64")]
    pub risk_limit: Option<f64>,
    #[serde(rename = "Realized P&L", default, deserialize_with = "lenient::opt_f64")]
    pub realized_pnl: Option<f64>,
    #[serde(rename = "Unrealized P&L", default, deserialize_with = "lenient::opt_f64")]
    pub unrealized_pnl: Option<f64>,
    #[serde(rename = "Vega", default, deserialize_with = "lenient::opt_f64")]
    pub vega: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `/evaluate/risk` response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskEvaluation {
    #[serde(default)]
    pub portfolio: PortfolioRisk,
    #[serde(default)]
    pub summary: Vec<StrategyRisk>,
}

/// Severity of a portfolio flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagLevel {
    Breach,
    Ok,
}

impl FlagLevel {
    /// The backend marks breaches with ❌ or ⚠️ inside the flag text.
    pub fn classify(flag: &str) -> Self {
        if flag.contains('❌') || flag.contains('⚠') {
            Self::Breach
        } else {
            Self::Ok
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_trade_record_round_trips_backend_fields() {
        let rec: TradeRecord = serde_json::from_value(json!({
            "id": 17,
            "strategy": "Iron Fly",
            "instrument_token": "NSE_FO|NIFTY",
            "entry_price": "22000",
            "quantity": 50,
            "capital_used": 60000.0,
            "potential_loss": 1000.0,
            "sl_hit": false,
            "vega": 150.0,
            "status": "open"
        }))
        .unwrap();
        assert!((rec.entry_price - 22000.0).abs() < f64::EPSILON);
        assert_eq!(rec.status, TradeStatus::Open);
        assert_eq!(rec.extra.get("id"), Some(&json!(17)));

        let back = serde_json::to_value(&rec).unwrap();
        assert_eq!(back["status"], json!("open"));
        assert_eq!(back["id"], json!(17));
    }

    #[test]
    fn test_status_decodes_case_insensitively() {
        for (raw, want) in [
            ("OPEN", TradeStatus::Open),
            ("Open", TradeStatus::Open),
            (" open ", TradeStatus::Open),
            ("CLOSED", TradeStatus::Closed),
        ] {
            let rec: TradeRecord = serde_json::from_value(json!({"status": raw})).unwrap();
            assert_eq!(rec.status, want, "{raw}");
        }
        let rec: TradeRecord = serde_json::from_value(json!({"status": 1})).unwrap();
        assert_eq!(rec.status, TradeStatus::Other);
    }

    #[test]
    fn test_unknown_status_does_not_fail_decode() {
        let rec: TradeRecord =
            serde_json::from_value(json!({"status": "expired"})).unwrap();
        assert_eq!(rec.status, TradeStatus::Other);
    }

    #[test]
    fn test_risk_evaluation_decodes_display_keys() {
        let eval: RiskEvaluation = serde_json::from_value(json!({
            "portfolio": {
                "Total Funds": 500000.0,
                "Capital Deployed": 60000.0,
                "Exposure Percent": 12.0,
                "Risk on Table": 1000.0,
                "Total Vega Exposure": 150.0,
                "Flags": ["✅ Exposure within limits", "❌ Iron Fly over risk limit"]
            },
            "summary": [{
                "Strategy": "Iron Fly",
                "Capital Used": 60000.0,
                "Cap Limit": 100000.0,
                "% Used": 60.0,
                "Potential Risk": 1000.0,
                "Risk Limit": 2000.0,
                "Realized P&L": 0.0,
                "Unrealized P&L": -250.0,
                "Vega": 150.0
            }]
        }))
        .unwrap();
        assert_eq!(eval.portfolio.total_funds, Some(500000.0));
        assert_eq!(eval.portfolio.flags.len(), 2);
        assert_eq!(eval.summary[0].cap_limit, Some(100000.0));
        assert_eq!(eval.summary[0].unrealized_pnl, Some(-250.0));
    }

    #[test]
    fn test_flag_classification() {
        assert_eq!(FlagLevel::classify("❌ Exposure above 80%"), FlagLevel::Breach);
        assert_eq!(FlagLevel::classify("⚠️ Vega concentrated"), FlagLevel::Breach);
        assert_eq!(FlagLevel::classify("✅ Within limits"), FlagLevel::Ok);
    }

    #[test]
    fn test_trade_filter_parse_and_query() {
        assert_eq!("OPEN".parse::<TradeFilter>().unwrap(), TradeFilter::Open);
        assert_eq!(TradeFilter::All.query_value(), None);
        assert_eq!(TradeFilter::Closed.query_value(), Some("closed"));
        assert!("pending".parse::<TradeFilter>().is_err());
    }
}
