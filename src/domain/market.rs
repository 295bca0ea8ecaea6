//! Market data views: dashboard snapshot, option chain, model outputs.
//!
//! The backend owns these payloads. Known fields are typed; anything
//! else is kept in `extra` so a richer backend never breaks decoding.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::lenient;

/// Option-seller dashboard snapshot (`/option-seller-dashboard`, `/live/dashboard`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    /// Nifty spot price.
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub nifty_spot: Option<f64>,
    /// India VIX level.
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub india_vix: Option<f64>,
    /// Calendar days to the nearest expiry.
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub days_to_expiry: Option<f64>,
    /// At-the-money strike.
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub atm_strike: Option<f64>,
    /// ATM straddle premium.
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub straddle_price: Option<f64>,
    /// Average ATM implied volatility (%).
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub avg_iv: Option<f64>,
    /// Implied volatility percentile (%).
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub ivp: Option<f64>,
    /// Implied minus realized volatility.
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub iv_rv_spread: Option<f64>,
    /// 7-day historical volatility (%).
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub hv_7_day: Option<f64>,
    /// 7-day GARCH forecast (%).
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub garch_7_day: Option<f64>,
    /// Max-pain strike.
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub max_pain: Option<f64>,
    /// Put-call ratio.
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub pcr: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub theta: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub vega: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub delta: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub gamma: Option<f64>,
    /// Probability of profit (%).
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub pop: Option<f64>,
    /// Fields this client does not know about.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One strike row of `/full-chain-table`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChainRow {
    #[serde(rename = "Strike", default, deserialize_with = "lenient::opt_f64")]
    pub strike: Option<f64>,
    #[serde(rename = "Call IV", default, deserialize_with = "lenient::opt_f64")]
    pub call_iv: Option<f64>,
    #[serde(rename = "Put IV", default, deserialize_with = "lenient::opt_f64")]
    pub put_iv: Option<f64>,
    #[serde(rename = "IV Skew", default, deserialize_with = "lenient::opt_f64")]
    pub iv_skew: Option<f64>,
    #[serde(rename = "Total Theta", default, deserialize_with = "lenient::opt_f64")]
    pub total_theta: Option<f64>,
    #[serde(rename = "Total Vega", default, deserialize_with = "lenient::opt_f64")]
    pub total_vega: Option<f64>,
    #[serde(rename = "Straddle Price", default, deserialize_with = "lenient::opt_f64")]
    pub straddle_price: Option<f64>,
    #[serde(rename = "Total OI", default, deserialize_with = "lenient::opt_f64")]
    pub total_oi: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Opaque model output (`/predict/volatility`, `/calculate/regime`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelOutput(pub Value);

impl ModelOutput {
    /// Flatten nested objects into `(dotted.key, rendered value)` pairs.
    ///
    /// Arrays of scalars are joined; arrays of objects are indexed
    /// (`forecast[0].date`). Keys come out sorted.
    pub fn entries(&self) -> Vec<(String, String)> {
        let mut out = Vec::new();
        flatten_into(&self.0, String::new(), &mut out);
        out
    }

    /// Look up a top-level number (e.g. `regime_score`).
    pub fn number(&self, key: &str) -> Option<f64> {
        self.0.get(key).and_then(lenient::number)
    }
}

fn flatten_into(value: &Value, prefix: String, out: &mut Vec<(String, String)>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                flatten_into(child, path, out);
            }
        }
        Value::Array(items) if items.iter().all(|v| !v.is_object() && !v.is_array()) => {
            let joined = items.iter().map(scalar).collect::<Vec<_>>().join(", ");
            out.push((label(prefix), joined));
        }
        Value::Array(items) => {
            for (i, child) in items.iter().enumerate() {
                flatten_into(child, format!("{prefix}[{i}]"), out);
            }
        }
        other => out.push((label(prefix), scalar(other))),
    }
}

fn label(prefix: String) -> String {
    if prefix.is_empty() {
        "value".to_string()
    } else {
        prefix
    }
}

fn scalar(value: &Value) -> String {
    match value {
        Value::Null => "N/A".to_string(),
        Value::String(s) => s.clone(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() => format!("{f:.4}"),
            _ => n.to_string(),
        },
        other => other.to_string(),
    }
}
