//! Strategy suggestion and strategy detail payloads.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use super::lenient;

/// Backend rationale: a single paragraph or a list of bullet points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Rationale {
    Text(String),
    Points(Vec<String>),
}

impl Rationale {
    /// Rationale as bullet points.
    pub fn points(&self) -> Vec<String> {
        match self {
            Self::Text(text) if text.trim().is_empty() => Vec::new(),
            Self::Text(text) => vec![text.clone()],
            Self::Points(points) => points.clone(),
        }
    }
}

/// `/suggest/strategy` response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StrategySuggestion {
    /// Volatility regime label (e.g. "High Vol Trend").
    #[serde(default, alias = "regime_label", deserialize_with = "lenient::opt_text")]
    pub regime: Option<String>,
    /// Regime score.
    #[serde(default, alias = "regime_score", deserialize_with = "lenient::opt_f64")]
    pub score: Option<f64>,
    #[serde(default, alias = "regime_summary", deserialize_with = "lenient::opt_text")]
    pub note: Option<String>,
    #[serde(default, alias = "regime_implications", deserialize_with = "lenient::opt_text")]
    pub explanation: Option<String>,
    /// Upcoming event warning (expiry, RBI policy, budget...).
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub event_warning: Option<String>,
    /// Suggested strategy names, in backend priority order.
    #[serde(default, alias = "suggested_strategies")]
    pub strategies: Vec<String>,
    #[serde(default)]
    pub rationale: Option<Rationale>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl StrategySuggestion {
    /// Regime colour class used by the terminal renderer.
    pub fn regime_tone(&self) -> RegimeTone {
        match self.regime.as_deref() {
            Some(r) if r.contains("High Vol") => RegimeTone::Elevated,
            Some(r) if r.contains("Low Vol") => RegimeTone::Calm,
            _ => RegimeTone::Neutral,
        }
    }
}

/// Coarse regime classification for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegimeTone {
    Elevated,
    Calm,
    Neutral,
}

/// `POST /strategy/details` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyDetailsRequest {
    pub strategy: String,
    pub lots: u32,
}

/// Maximum loss of a strategy; naked short legs have no bound.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum MaxLoss {
    Bounded(f64),
    #[default]
    Unlimited,
}

impl<'de> Deserialize<'de> for MaxLoss {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(value
            .as_ref()
            .and_then(lenient::number)
            .map_or(Self::Unlimited, Self::Bounded))
    }
}

impl Serialize for MaxLoss {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Bounded(v) => serializer.serialize_f64(*v),
            Self::Unlimited => serializer.serialize_str("Unlimited"),
        }
    }
}

/// One order leg proposed by `/strategy/details`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StrategyOrder {
    #[serde(default, deserialize_with = "lenient::text_or_empty")]
    pub instrument_key: String,
    #[serde(default, deserialize_with = "lenient::text_or_empty")]
    pub transaction_type: String,
    #[serde(default, deserialize_with = "lenient::f64_or_zero")]
    pub quantity: f64,
    #[serde(default, deserialize_with = "lenient::f64_or_zero")]
    pub price: f64,
    #[serde(default, deserialize_with = "lenient::f64_or_zero")]
    pub current_price: f64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `POST /strategy/details` response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StrategyDetails {
    #[serde(default, deserialize_with = "lenient::f64_or_zero")]
    pub premium_total: f64,
    #[serde(default, deserialize_with = "lenient::f64_or_zero")]
    pub max_profit: f64,
    #[serde(default)]
    pub max_loss: MaxLoss,
    #[serde(default)]
    pub strikes: Vec<f64>,
    #[serde(default)]
    pub orders: Vec<StrategyOrder>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `POST /place/multileg` request: a suggested strategy with its legs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaceStrategyRequest {
    pub strategy: String,
    pub lots: u32,
    pub orders: Vec<StrategyOrder>,
}
