//! Order payloads for the four order endpoints.
//!
//! Field names and enum spellings follow the backend's broker conventions
//! (BUY/SELL, LIMIT/MARKET, product codes D/I/C/B).

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Buy or sell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionType {
    #[default]
    Buy,
    Sell,
}

/// Limit or market pricing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PriceType {
    #[default]
    Limit,
    Market,
}

/// Broker product code.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductType {
    /// Delivery.
    #[default]
    #[serde(rename = "D")]
    Delivery,
    /// Intraday.
    #[serde(rename = "I")]
    Intraday,
    /// Cover order.
    #[serde(rename = "C")]
    Cover,
    /// Bracket order.
    #[serde(rename = "B")]
    Bracket,
}

/// Regular session order or after-market order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderMode {
    #[default]
    Regular,
    Amo,
}

/// Time in force.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Validity {
    #[default]
    Day,
    /// Immediate or cancel.
    Ioc,
    /// Good till date.
    Gtd,
    /// Good till cancelled.
    Gtc,
}

impl TransactionType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Buy => "BUY",
            Self::Sell => "SELL",
        }
    }
}

impl PriceType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Limit => "LIMIT",
            Self::Market => "MARKET",
        }
    }
}

impl ProductType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Delivery => "D",
            Self::Intraday => "I",
            Self::Cover => "C",
            Self::Bracket => "B",
        }
    }
}

impl OrderMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Regular => "REGULAR",
            Self::Amo => "AMO",
        }
    }
}

impl Validity {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Day => "DAY",
            Self::Ioc => "IOC",
            Self::Gtd => "GTD",
            Self::Gtc => "GTC",
        }
    }
}

impl FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BUY" | "B" => Ok(Self::Buy),
            "SELL" | "S" => Ok(Self::Sell),
            other => Err(format!("unknown transaction type '{other}' (BUY|SELL)")),
        }
    }
}

impl FromStr for PriceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LIMIT" | "L" => Ok(Self::Limit),
            "MARKET" | "M" => Ok(Self::Market),
            other => Err(format!("unknown price type '{other}' (LIMIT|MARKET)")),
        }
    }
}

impl FromStr for ProductType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "D" | "DELIVERY" => Ok(Self::Delivery),
            "I" | "INTRADAY" => Ok(Self::Intraday),
            "C" | "COVER" => Ok(Self::Cover),
            "B" | "BRACKET" => Ok(Self::Bracket),
            other => Err(format!("unknown product type '{other}' (D|I|C|B)")),
        }
    }
}

impl FromStr for OrderMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "REGULAR" => Ok(Self::Regular),
            "AMO" => Ok(Self::Amo),
            other => Err(format!("unknown order mode '{other}' (REGULAR|AMO)")),
        }
    }
}

impl FromStr for Validity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DAY" => Ok(Self::Day),
            "IOC" => Ok(Self::Ioc),
            "GTD" => Ok(Self::Gtd),
            "GTC" => Ok(Self::Gtc),
            other => Err(format!("unknown validity '{other}' (DAY|IOC|GTD|GTC)")),
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for PriceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `POST /create_order` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SingleLegOrder {
    pub instrument_token: String,
    pub transaction_type: TransactionType,
    pub quantity: u32,
    pub price_type: PriceType,
    /// Always 0.0 for market orders.
    pub price: f64,
    pub trigger_price: f64,
    pub product_type: ProductType,
    pub order_mode: OrderMode,
    pub validity: Validity,
}

/// One leg of a multi-leg order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLeg {
    pub instrument_token: String,
    pub transaction_type: TransactionType,
    pub quantity: u32,
    pub price_type: PriceType,
    pub price: f64,
}

/// `POST /multi_leg_order` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiLegOrder {
    pub product_type: ProductType,
    pub order_mode: OrderMode,
    pub validity: Validity,
    pub legs: Vec<OrderLeg>,
}

/// `POST /create_gtt_order` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GttOrder {
    pub instrument_token: String,
    pub transaction_type: TransactionType,
    pub quantity: u32,
    /// GTT orders are always LIMIT.
    pub price_type: PriceType,
    pub price: f64,
    pub trigger_price: f64,
    pub product_type: ProductType,
    pub order_mode: OrderMode,
    /// Serialized as `YYYY-MM-DD`.
    pub gtt_expiry_date: NaiveDate,
}

/// `POST /multi_leg_gtt_order` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiLegGttOrder {
    pub product_type: ProductType,
    pub order_mode: OrderMode,
    pub gtt_expiry_date: NaiveDate,
    /// Common trigger for all legs.
    pub trigger_price: f64,
    pub legs: Vec<OrderLeg>,
}

/// Any of the four order tickets, ready to submit.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OrderRequest {
    Single(SingleLegOrder),
    MultiLeg(MultiLegOrder),
    Gtt(GttOrder),
    MultiLegGtt(MultiLegGttOrder),
}

impl OrderRequest {
    /// Human label used in success/failure messages.
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Single(_) => "Order",
            Self::MultiLeg(_) => "Multi-Leg Order",
            Self::Gtt(_) => "GTT Order",
            Self::MultiLegGtt(_) => "Multi-Leg GTT Order",
        }
    }
}

/// Opaque acknowledgement returned by order and logging endpoints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderAck(pub Value);

impl OrderAck {
    /// Broker order id(s), wherever the backend put them.
    pub fn order_ids(&self) -> Vec<String> {
        let mut ids = Vec::new();
        collect_ids(&self.0, &mut ids);
        ids
    }

    /// Compact one-line rendering of the acknowledgement.
    pub fn summary(&self) -> String {
        let ids = self.order_ids();
        if !ids.is_empty() {
            return format!("order id(s): {}", ids.join(", "));
        }
        match &self.0 {
            Value::Null => "no details returned".to_string(),
            Value::String(s) => s.clone(),
            Value::Object(map) => map
                .get("message")
                .or_else(|| map.get("status"))
                .and_then(Value::as_str)
                .map_or_else(|| self.0.to_string(), str::to_string),
            other => other.to_string(),
        }
    }
}

fn collect_ids(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let is_id = matches!(
                    key.as_str(),
                    "order_id" | "orderId" | "order_ids" | "gtt_order_id" | "gtt_order_ids"
                );
                match child {
                    Value::String(s) if is_id => out.push(s.clone()),
                    Value::Number(n) if is_id => out.push(n.to_string()),
                    Value::Array(items) if is_id => out.extend(
                        items
                            .iter()
                            .filter_map(|v| v.as_str().map(str::to_string)),
                    ),
                    _ => collect_ids(child, out),
                }
            }
        }
        Value::Array(items) => items.iter().for_each(|v| collect_ids(v, out)),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_gtt_order_serializes_expiry_as_iso_date() {
        let order = GttOrder {
            instrument_token: "NSE_FO|45012".to_string(),
            transaction_type: TransactionType::Sell,
            quantity: 50,
            price_type: PriceType::Limit,
            price: 120.0,
            trigger_price: 118.5,
            product_type: ProductType::Delivery,
            order_mode: OrderMode::Regular,
            gtt_expiry_date: NaiveDate::from_ymd_opt(2025, 8, 28).unwrap(),
        };
        let v = serde_json::to_value(&order).unwrap();
        assert_eq!(v["gtt_expiry_date"], json!("2025-08-28"));
        assert_eq!(v["transaction_type"], json!("SELL"));
        assert_eq!(v["product_type"], json!("D"));
        assert_eq!(v["price_type"], json!("LIMIT"));
    }

    #[test]
    fn test_enum_parsing_is_case_insensitive() {
        assert_eq!("sell".parse::<TransactionType>().unwrap(), TransactionType::Sell);
        assert_eq!("i".parse::<ProductType>().unwrap(), ProductType::Intraday);
        assert_eq!("amo".parse::<OrderMode>().unwrap(), OrderMode::Amo);
        assert_eq!("gtc".parse::<Validity>().unwrap(), Validity::Gtc);
        assert!("STOP".parse::<PriceType>().is_err());
    }

    #[test]
    fn test_ack_finds_nested_order_ids() {
        let ack = OrderAck(json!({
            "status": "success",
            "data": {"order_ids": ["2508280001", "2508280002"]}
        }));
        assert_eq!(ack.order_ids(), vec!["2508280001", "2508280002"]);
        assert!(ack.summary().contains("2508280001"));

        let plain = OrderAck(json!({"message": "Trade logged"}));
        assert_eq!(plain.summary(), "Trade logged");
    }
}
