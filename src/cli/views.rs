//! Table rows and value formatting for the terminal views.
//!
//! Formatting rules:
//! - 2 decimals by default, 4 for delta and IV skew, 6 for gamma
//! - `%` suffix for IV, IVP, HV, GARCH, POP and exposure
//! - `₹` prefix for rupee amounts
//! - `N/A` for anything the backend did not send

use tabled::Tabled;

use crate::domain::{
    ChainRow, FeedMessage, FeedPayload, JournalEntry, MarketSnapshot, StrategyOrder, StrategyRisk,
    TradeRecord,
};
use crate::usecases::LegDraft;

pub const NA: &str = "N/A";

/// `v` with `decimals` places, `N/A` when missing or not finite.
pub fn fixed(v: Option<f64>, decimals: usize) -> String {
    match v {
        Some(v) if v.is_finite() => format!("{v:.decimals$}"),
        _ => NA.to_string(),
    }
}

pub fn percent(v: Option<f64>) -> String {
    match v {
        Some(v) if v.is_finite() => format!("{v:.2}%"),
        _ => NA.to_string(),
    }
}

pub fn rupees(v: Option<f64>) -> String {
    match v {
        Some(v) if v.is_finite() => format!("₹{v:.2}"),
        _ => NA.to_string(),
    }
}

/// Whole numbers without decimals, anything else with two.
pub fn whole(v: Option<f64>) -> String {
    match v {
        Some(v) if v.is_finite() && v.fract() == 0.0 => format!("{v:.0}"),
        other => fixed(other, 2),
    }
}

/// Rounded to an integer with `,` thousands separators.
pub fn grouped(v: Option<f64>) -> String {
    match v {
        #[allow(clippy::cast_possible_truncation)]
        Some(v) if v.is_finite() => group_thousands(v.round() as i64),
        _ => NA.to_string(),
    }
}

pub fn group_thousands(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if n < 0 {
        out.push('-');
    }
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Truncate to `max` characters, marking the cut with `…`.
pub fn clip(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let mut out: String = text.chars().take(max.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}

/// One labelled metric of a dashboard section.
#[derive(Debug, Clone, PartialEq, Eq, Tabled)]
pub struct MetricRow {
    #[tabled(rename = "Section")]
    pub section: &'static str,
    #[tabled(rename = "Metric")]
    pub metric: &'static str,
    #[tabled(rename = "Value")]
    pub value: String,
}

impl MetricRow {
    const fn new(section: &'static str, metric: &'static str, value: String) -> Self {
        Self {
            section,
            metric,
            value,
        }
    }
}

/// Dashboard snapshot laid out in its four sections.
pub fn snapshot_rows(s: &MarketSnapshot) -> Vec<MetricRow> {
    const OVERVIEW: &str = "Market Overview";
    const ATM: &str = "ATM Metrics";
    const GREEKS: &str = "Greeks & Volatility";
    const MARKET: &str = "Market Metrics";

    vec![
        MetricRow::new(OVERVIEW, "Nifty Spot", rupees(s.nifty_spot)),
        MetricRow::new(OVERVIEW, "India VIX", fixed(s.india_vix, 2)),
        MetricRow::new(OVERVIEW, "Days to Expiry", whole(s.days_to_expiry)),
        MetricRow::new(ATM, "ATM Strike", rupees(s.atm_strike)),
        MetricRow::new(ATM, "Straddle Price", rupees(s.straddle_price)),
        MetricRow::new(ATM, "Average IV", percent(s.avg_iv)),
        MetricRow::new(ATM, "IV Percentile (IVP)", percent(s.ivp)),
        MetricRow::new(GREEKS, "Theta", fixed(s.theta, 2)),
        MetricRow::new(GREEKS, "Vega", fixed(s.vega, 2)),
        MetricRow::new(GREEKS, "Delta", fixed(s.delta, 4)),
        MetricRow::new(GREEKS, "Gamma", fixed(s.gamma, 6)),
        MetricRow::new(GREEKS, "7-Day HV", percent(s.hv_7_day)),
        MetricRow::new(GREEKS, "GARCH 7-Day", percent(s.garch_7_day)),
        MetricRow::new(MARKET, "Put-Call Ratio (PCR)", fixed(s.pcr, 2)),
        MetricRow::new(MARKET, "Max Pain", rupees(s.max_pain)),
        MetricRow::new(MARKET, "IV-RV Spread", percent(s.iv_rv_spread)),
        MetricRow::new(MARKET, "Probability of Profit (POP)", percent(s.pop)),
    ]
}

#[derive(Debug, Clone, PartialEq, Eq, Tabled)]
pub struct ChainView {
    #[tabled(rename = "Strike")]
    pub strike: String,
    #[tabled(rename = "Call IV")]
    pub call_iv: String,
    #[tabled(rename = "Put IV")]
    pub put_iv: String,
    #[tabled(rename = "IV Skew")]
    pub iv_skew: String,
    #[tabled(rename = "Total Theta")]
    pub total_theta: String,
    #[tabled(rename = "Total Vega")]
    pub total_vega: String,
    #[tabled(rename = "Straddle Price")]
    pub straddle_price: String,
    #[tabled(rename = "Total OI")]
    pub total_oi: String,
}

impl From<&ChainRow> for ChainView {
    fn from(r: &ChainRow) -> Self {
        Self {
            strike: rupees(r.strike),
            call_iv: percent(r.call_iv),
            put_iv: percent(r.put_iv),
            iv_skew: fixed(r.iv_skew, 4),
            total_theta: fixed(r.total_theta, 2),
            total_vega: fixed(r.total_vega, 2),
            straddle_price: rupees(r.straddle_price),
            total_oi: grouped(r.total_oi),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Tabled)]
pub struct StrategyOrderView {
    #[tabled(rename = "Instrument")]
    pub instrument: String,
    #[tabled(rename = "Type")]
    pub side: String,
    #[tabled(rename = "Quantity")]
    pub quantity: String,
    #[tabled(rename = "Price")]
    pub price: String,
    #[tabled(rename = "Current Price")]
    pub current_price: String,
}

impl From<&StrategyOrder> for StrategyOrderView {
    fn from(o: &StrategyOrder) -> Self {
        let or_na = |s: &str| if s.is_empty() { NA.to_string() } else { s.to_string() };
        Self {
            instrument: or_na(&o.instrument_key),
            side: or_na(&o.transaction_type),
            quantity: whole(Some(o.quantity)),
            price: rupees(Some(o.price)),
            current_price: rupees(Some(o.current_price)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Tabled)]
pub struct StrategyRiskView {
    #[tabled(rename = "Strategy")]
    pub strategy: String,
    #[tabled(rename = "Capital Used")]
    pub capital_used: String,
    #[tabled(rename = "Cap Limit")]
    pub cap_limit: String,
    #[tabled(rename = "% Used")]
    pub pct_used: String,
    #[tabled(rename = "Potential Risk")]
    pub potential_risk: String,
    #[tabled(rename = "Risk Limit")]
    pub risk_limit: String,
    #[tabled(rename = "Realized P&L")]
    pub realized_pnl: String,
    #[tabled(rename = "Unrealized P&L")]
    pub unrealized_pnl: String,
    #[tabled(rename = "Vega")]
    pub vega: String,
}

impl From<&StrategyRisk> for StrategyRiskView {
    fn from(r: &StrategyRisk) -> Self {
        Self {
            strategy: r.strategy.clone(),
            capital_used: rupees(r.capital_used),
            cap_limit: rupees(r.cap_limit),
            pct_used: percent(r.pct_used),
            potential_risk: rupees(r.potential_risk),
            risk_limit: rupees(r.risk_limit),
            realized_pnl: rupees(r.realized_pnl),
            unrealized_pnl: rupees(r.unrealized_pnl),
            vega: fixed(r.vega, 2),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Tabled)]
pub struct TradeView {
    #[tabled(rename = "Strategy")]
    pub strategy: String,
    #[tabled(rename = "Instrument")]
    pub instrument: String,
    #[tabled(rename = "Status")]
    pub status: String,
    #[tabled(rename = "Entry")]
    pub entry_price: String,
    #[tabled(rename = "Qty")]
    pub quantity: String,
    #[tabled(rename = "Realized P&L")]
    pub realized_pnl: String,
    #[tabled(rename = "Unrealized P&L")]
    pub unrealized_pnl: String,
    #[tabled(rename = "Capital Used")]
    pub capital_used: String,
    #[tabled(rename = "Potential Loss")]
    pub potential_loss: String,
    #[tabled(rename = "SL Hit")]
    pub sl_hit: &'static str,
    #[tabled(rename = "Vega")]
    pub vega: String,
}

impl From<&TradeRecord> for TradeView {
    fn from(t: &TradeRecord) -> Self {
        Self {
            strategy: t.strategy.clone(),
            instrument: t.instrument_token.clone(),
            status: t.status.to_string(),
            entry_price: rupees(Some(t.entry_price)),
            quantity: fixed(Some(t.quantity), 0),
            realized_pnl: rupees(Some(t.realized_pnl)),
            unrealized_pnl: rupees(Some(t.unrealized_pnl)),
            capital_used: rupees(Some(t.capital_used)),
            potential_loss: rupees(Some(t.potential_loss)),
            sl_hit: if t.sl_hit { "yes" } else { "no" },
            vega: fixed(Some(t.vega), 2),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Tabled)]
pub struct JournalView {
    #[tabled(rename = "Timestamp")]
    pub timestamp: String,
    #[tabled(rename = "Title")]
    pub title: String,
    #[tabled(rename = "Mood")]
    pub mood: String,
    #[tabled(rename = "Tags")]
    pub tags: String,
    #[tabled(rename = "Content")]
    pub content: String,
}

impl From<&JournalEntry> for JournalView {
    fn from(j: &JournalEntry) -> Self {
        let tags = j.tag_list();
        Self {
            timestamp: j.timestamp.clone().unwrap_or_else(|| NA.to_string()),
            title: j.title.clone(),
            mood: j.mood.clone().unwrap_or_else(|| NA.to_string()),
            tags: if tags.is_empty() {
                NA.to_string()
            } else {
                tags.join(", ")
            },
            content: clip(&j.content, 60),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Tabled)]
pub struct KeyValueView {
    #[tabled(rename = "Key")]
    pub key: String,
    #[tabled(rename = "Value")]
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Tabled)]
pub struct LegView {
    #[tabled(rename = "Leg")]
    pub position: usize,
    #[tabled(rename = "Instrument")]
    pub instrument: String,
    #[tabled(rename = "Side")]
    pub side: &'static str,
    #[tabled(rename = "Qty")]
    pub quantity: u32,
    #[tabled(rename = "Price Type")]
    pub price_type: &'static str,
    #[tabled(rename = "Price")]
    pub price: String,
}

/// Leg book rows, numbered from 1.
pub fn leg_rows(legs: &[LegDraft]) -> Vec<LegView> {
    legs.iter()
        .enumerate()
        .map(|(i, leg)| LegView {
            position: i + 1,
            instrument: if leg.instrument_token.is_empty() {
                "<blank>".to_string()
            } else {
                leg.instrument_token.clone()
            },
            side: leg.transaction_type.as_str(),
            quantity: leg.quantity,
            price_type: leg.price_type.as_str(),
            price: rupees(Some(leg.price)),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Tabled)]
pub struct FeedView {
    #[tabled(rename = "Received")]
    pub received: String,
    #[tabled(rename = "Kind")]
    pub kind: &'static str,
    #[tabled(rename = "Bytes")]
    pub bytes: usize,
    #[tabled(rename = "Payload")]
    pub preview: String,
}

impl From<&FeedMessage> for FeedView {
    fn from(m: &FeedMessage) -> Self {
        Self {
            received: m.received_at.format("%H:%M:%S%.3f").to_string(),
            kind: match m.payload {
                FeedPayload::Text(_) => "text",
                FeedPayload::Binary(_) => "binary",
            },
            bytes: m.payload.len(),
            preview: m.payload.preview(80),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_formatting() {
        assert_eq!(fixed(Some(0.123_456_78), 4), "0.1235");
        assert_eq!(fixed(Some(0.000_123_4), 6), "0.000123");
        assert_eq!(fixed(None, 2), NA);
        assert_eq!(fixed(Some(f64::NAN), 2), NA);
        assert_eq!(percent(Some(14.5)), "14.50%");
        assert_eq!(rupees(Some(22_015.456)), "₹22015.46");
        assert_eq!(whole(Some(4.0)), "4");
        assert_eq!(whole(Some(4.5)), "4.50");
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1_000), "1,000");
        assert_eq!(group_thousands(12_345_678), "12,345,678");
        assert_eq!(group_thousands(-4_500), "-4,500");
        assert_eq!(grouped(Some(1_234_567.6)), "1,234,568");
    }

    #[test]
    fn test_snapshot_rows_keep_missing_as_na() {
        let snapshot = MarketSnapshot {
            nifty_spot: Some(24_350.2),
            delta: Some(-0.123_45),
            gamma: Some(0.000_012),
            ..MarketSnapshot::default()
        };
        let rows = snapshot_rows(&snapshot);
        let value = |name: &str| {
            rows.iter()
                .find(|r| r.metric == name)
                .map(|r| r.value.clone())
                .unwrap()
        };
        assert_eq!(value("Nifty Spot"), "₹24350.20");
        assert_eq!(value("Delta"), "-0.1235");
        assert_eq!(value("Gamma"), "0.000012");
        assert_eq!(value("India VIX"), NA);
        assert_eq!(rows.len(), 17);
    }

    #[test]
    fn test_clip_marks_truncation() {
        assert_eq!(clip("short", 10), "short");
        assert_eq!(clip("abcdefghij", 5), "abcd…");
    }
}
