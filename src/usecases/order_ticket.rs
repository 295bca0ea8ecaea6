//! Order Tickets - Draft, Validate and Build Order Payloads
//!
//! A ticket holds what the user typed; `build` turns it into the wire
//! payload or a `TicketError` naming what is wrong. Nothing here talks
//! to the backend.
//!
//! Rules:
//! - Instrument tokens must be present and not the form placeholder
//! - Quantities are at least 1, prices never negative
//! - MARKET prices are sent as 0.0
//! - GTT orders are LIMIT, need a positive trigger and expire tomorrow or later

use chrono::{Days, NaiveDate};
use thiserror::Error;

use crate::domain::{
    GttOrder, MultiLegGttOrder, MultiLegOrder, OrderLeg, OrderMode, PriceType, ProductType,
    SingleLegOrder, TransactionType, Validity,
};

/// Pre-filled value of the instrument field; never a real instrument.
pub const PLACEHOLDER_TOKEN: &str = "YOUR_INSTRUMENT_TOKEN_HERE";
/// One Nifty lot.
pub const DEFAULT_QUANTITY: u32 = 50;
/// Days ahead of today proposed as GTT expiry.
pub const DEFAULT_GTT_DAYS: u64 = 7;

/// Validation failure of an order ticket. Legs are numbered from 1.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TicketError {
    #[error("Please enter a valid Instrument Token.")]
    MissingInstrument,

    #[error("Please provide Instrument Token for Leg {0}.")]
    LegInstrument(usize),

    #[error("Quantity must be at least 1.")]
    ZeroQuantity,

    #[error("Quantity for Leg {0} must be at least 1.")]
    LegQuantity(usize),

    #[error("Price must not be negative.")]
    NegativePrice,

    #[error("Price for Leg {0} must not be negative.")]
    LegPrice(usize),

    #[error("Trigger Price must be greater than 0 for GTT orders.")]
    TriggerPrice,

    #[error("GTT expiry must be on or after {earliest}, got {expiry}.")]
    ExpiryTooSoon { expiry: NaiveDate, earliest: NaiveDate },

    #[error("Add at least one leg.")]
    NoLegs,

    #[error("Invalid leg '{spec}': {reason}")]
    LegSpec { spec: String, reason: String },
}

/// Fields shared by every order form.
#[derive(Debug, Clone, PartialEq)]
pub struct CommonParams {
    pub instrument_token: String,
    pub transaction_type: TransactionType,
    pub quantity: u32,
    pub product_type: ProductType,
    pub order_mode: OrderMode,
    pub validity: Validity,
}

impl Default for CommonParams {
    fn default() -> Self {
        Self {
            instrument_token: PLACEHOLDER_TOKEN.to_string(),
            transaction_type: TransactionType::Buy,
            quantity: DEFAULT_QUANTITY,
            product_type: ProductType::Delivery,
            order_mode: OrderMode::Regular,
            validity: Validity::Day,
        }
    }
}

fn is_real_token(token: &str) -> bool {
    let token = token.trim();
    !token.is_empty() && token != PLACEHOLDER_TOKEN
}

/// Single-leg order form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SingleLegTicket {
    pub common: CommonParams,
    pub price_type: PriceType,
    pub price: f64,
    pub trigger_price: f64,
}

impl SingleLegTicket {
    pub fn build(&self) -> Result<SingleLegOrder, TicketError> {
        let c = &self.common;
        if !is_real_token(&c.instrument_token) {
            return Err(TicketError::MissingInstrument);
        }
        if c.quantity == 0 {
            return Err(TicketError::ZeroQuantity);
        }
        if !is_price(self.price) || !is_price(self.trigger_price) {
            return Err(TicketError::NegativePrice);
        }

        Ok(SingleLegOrder {
            instrument_token: c.instrument_token.trim().to_string(),
            transaction_type: c.transaction_type,
            quantity: c.quantity,
            price_type: self.price_type,
            price: effective_price(self.price_type, self.price),
            trigger_price: self.trigger_price,
            product_type: c.product_type,
            order_mode: c.order_mode,
            validity: c.validity,
        })
    }
}

/// Single-leg GTT form. Always LIMIT.
#[derive(Debug, Clone, PartialEq)]
pub struct GttTicket {
    pub common: CommonParams,
    pub price: f64,
    pub trigger_price: f64,
    pub expiry: NaiveDate,
}

impl GttTicket {
    /// Ticket with the default expiry, a week after `today`.
    pub fn new(common: CommonParams, today: NaiveDate) -> Self {
        Self {
            common,
            price: 0.0,
            trigger_price: 0.0,
            expiry: default_gtt_expiry(today),
        }
    }

    pub fn build(&self, today: NaiveDate) -> Result<GttOrder, TicketError> {
        let c = &self.common;
        if !is_real_token(&c.instrument_token) {
            return Err(TicketError::MissingInstrument);
        }
        if !is_positive(self.trigger_price) {
            return Err(TicketError::TriggerPrice);
        }
        if c.quantity == 0 {
            return Err(TicketError::ZeroQuantity);
        }
        if !is_price(self.price) {
            return Err(TicketError::NegativePrice);
        }
        check_expiry(self.expiry, today)?;

        Ok(GttOrder {
            instrument_token: c.instrument_token.trim().to_string(),
            transaction_type: c.transaction_type,
            quantity: c.quantity,
            price_type: PriceType::Limit,
            price: self.price,
            trigger_price: self.trigger_price,
            product_type: c.product_type,
            order_mode: c.order_mode,
            gtt_expiry_date: self.expiry,
        })
    }
}

/// One editable leg of a multi-leg form.
#[derive(Debug, Clone, PartialEq)]
pub struct LegDraft {
    pub instrument_token: String,
    pub transaction_type: TransactionType,
    pub quantity: u32,
    pub price_type: PriceType,
    pub price: f64,
}

impl Default for LegDraft {
    fn default() -> Self {
        Self {
            instrument_token: String::new(),
            transaction_type: TransactionType::Buy,
            quantity: DEFAULT_QUANTITY,
            price_type: PriceType::Limit,
            price: 0.0,
        }
    }
}

impl LegDraft {
    /// Parse `TOKEN:SIDE:QTY[:PRICE_TYPE[:PRICE]]`.
    pub fn parse(spec: &str) -> Result<Self, TicketError> {
        let fail = |reason: String| TicketError::LegSpec {
            spec: spec.to_string(),
            reason,
        };

        let parts: Vec<&str> = spec.split(':').map(str::trim).collect();
        if !(3..=5).contains(&parts.len()) {
            return Err(fail("expected TOKEN:SIDE:QTY[:PRICE_TYPE[:PRICE]]".to_string()));
        }

        let transaction_type = parts[1].parse().map_err(fail)?;
        let quantity = parts[2]
            .parse::<u32>()
            .map_err(|e| fail(format!("quantity: {e}")))?;
        let price_type = match parts.get(3) {
            Some(p) => p.parse().map_err(fail)?,
            None => PriceType::Limit,
        };
        let price = match parts.get(4) {
            Some(p) => p
                .parse::<f64>()
                .map_err(|e| fail(format!("price: {e}")))?,
            None => 0.0,
        };

        Ok(Self {
            instrument_token: parts[0].to_string(),
            transaction_type,
            quantity,
            price_type,
            price,
        })
    }

    fn validate(&self, leg: usize) -> Result<(), TicketError> {
        if !is_real_token(&self.instrument_token) {
            return Err(TicketError::LegInstrument(leg));
        }
        if self.quantity == 0 {
            return Err(TicketError::LegQuantity(leg));
        }
        if !is_price(self.price) {
            return Err(TicketError::LegPrice(leg));
        }
        Ok(())
    }
}

/// Finite and not negative. NaN fails.
pub(crate) const fn is_price(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}

/// Finite and strictly positive. NaN fails.
pub(crate) const fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

/// Ordered, editable list of legs. Starts with one blank leg.
#[derive(Debug, Clone, PartialEq)]
pub struct LegBook {
    legs: Vec<LegDraft>,
}

impl Default for LegBook {
    fn default() -> Self {
        Self::new()
    }
}

impl LegBook {
    pub fn new() -> Self {
        Self {
            legs: vec![LegDraft::default()],
        }
    }

    /// Book holding exactly `legs`.
    pub const fn from_legs(legs: Vec<LegDraft>) -> Self {
        Self { legs }
    }

    pub fn legs(&self) -> &[LegDraft] {
        &self.legs
    }

    pub fn len(&self) -> usize {
        self.legs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.legs.is_empty()
    }

    pub fn add(&mut self, leg: LegDraft) {
        self.legs.push(leg);
    }

    pub fn add_blank(&mut self) {
        self.legs.push(LegDraft::default());
    }

    /// Remove the leg at 1-based `position`. Later legs shift down.
    pub fn remove(&mut self, position: usize) -> Option<LegDraft> {
        if position == 0 || position > self.legs.len() {
            return None;
        }
        Some(self.legs.remove(position - 1))
    }

    /// Replace the leg at 1-based `position`.
    pub fn set(&mut self, position: usize, leg: LegDraft) -> bool {
        match position.checked_sub(1).and_then(|i| self.legs.get_mut(i)) {
            Some(slot) => {
                *slot = leg;
                true
            }
            None => false,
        }
    }

    /// Back to a single blank leg.
    pub fn reset(&mut self) {
        self.legs = vec![LegDraft::default()];
    }

    fn validated(&self) -> Result<Vec<OrderLeg>, TicketError> {
        if self.legs.is_empty() {
            return Err(TicketError::NoLegs);
        }
        self.legs
            .iter()
            .enumerate()
            .map(|(i, leg)| {
                leg.validate(i + 1)?;
                Ok(OrderLeg {
                    instrument_token: leg.instrument_token.trim().to_string(),
                    transaction_type: leg.transaction_type,
                    quantity: leg.quantity,
                    price_type: leg.price_type,
                    price: effective_price(leg.price_type, leg.price),
                })
            })
            .collect()
    }
}

/// Multi-leg order from shared params and the leg book.
pub fn build_multi_leg(common: &CommonParams, book: &LegBook) -> Result<MultiLegOrder, TicketError> {
    Ok(MultiLegOrder {
        product_type: common.product_type,
        order_mode: common.order_mode,
        validity: common.validity,
        legs: book.validated()?,
    })
}

/// Multi-leg GTT order: common trigger and expiry, LIMIT legs.
pub fn build_multi_leg_gtt(
    common: &CommonParams,
    book: &LegBook,
    trigger_price: f64,
    expiry: NaiveDate,
    today: NaiveDate,
) -> Result<MultiLegGttOrder, TicketError> {
    let mut legs = book.validated()?;
    if !is_positive(trigger_price) {
        return Err(TicketError::TriggerPrice);
    }
    check_expiry(expiry, today)?;

    for (leg, draft) in legs.iter_mut().zip(book.legs()) {
        leg.price_type = PriceType::Limit;
        leg.price = draft.price;
    }

    Ok(MultiLegGttOrder {
        product_type: common.product_type,
        order_mode: common.order_mode,
        gtt_expiry_date: expiry,
        trigger_price,
        legs,
    })
}

/// Earliest acceptable GTT expiry: tomorrow.
pub fn earliest_gtt_expiry(today: NaiveDate) -> NaiveDate {
    today.checked_add_days(Days::new(1)).unwrap_or(today)
}

pub fn default_gtt_expiry(today: NaiveDate) -> NaiveDate {
    today
        .checked_add_days(Days::new(DEFAULT_GTT_DAYS))
        .unwrap_or(today)
}

fn check_expiry(expiry: NaiveDate, today: NaiveDate) -> Result<(), TicketError> {
    let earliest = earliest_gtt_expiry(today);
    if expiry < earliest {
        return Err(TicketError::ExpiryTooSoon { expiry, earliest });
    }
    Ok(())
}

fn effective_price(price_type: PriceType, price: f64) -> f64 {
    match price_type {
        PriceType::Limit => price,
        PriceType::Market => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 8, 25).unwrap()
    }

    fn leg(token: &str) -> LegDraft {
        LegDraft {
            instrument_token: token.to_string(),
            ..LegDraft::default()
        }
    }

    #[test]
    fn test_nan_prices_are_rejected() {
        let ticket = SingleLegTicket {
            common: CommonParams {
                instrument_token: "NSE_FO|45000".into(),
                ..CommonParams::default()
            },
            price: f64::NAN,
            ..SingleLegTicket::default()
        };
        assert_eq!(ticket.build(), Err(TicketError::NegativePrice));

        let mut gtt = GttTicket::new(ticket.common.clone(), today());
        gtt.price = 100.0;
        gtt.trigger_price = f64::NAN;
        assert_eq!(gtt.build(today()), Err(TicketError::TriggerPrice));

        let mut draft = leg("NSE_FO|1");
        draft.price = f64::INFINITY;
        let mut book = LegBook::new();
        book.set(1, draft);
        assert!(matches!(book.validated(), Err(TicketError::LegPrice(1))));
        let mut book = LegBook::new();
        book.set(1, leg("NSE_FO|1"));
        let expiry = earliest_gtt_expiry(today());
        assert_eq!(
            build_multi_leg_gtt(&CommonParams::default(), &book, f64::NAN, expiry, today()),
            Err(TicketError::TriggerPrice)
        );
    }

    #[test]
    fn test_placeholder_token_rejected() {
        let ticket = SingleLegTicket::default();
        assert_eq!(ticket.build(), Err(TicketError::MissingInstrument));
    }

    #[test]
    fn test_market_order_sends_zero_price() {
        let ticket = SingleLegTicket {
            common: CommonParams {
                instrument_token: "NSE_FO|45012".into(),
                ..CommonParams::default()
            },
            price_type: PriceType::Market,
            price: 101.5,
            trigger_price: 0.0,
        };
        let order = ticket.build().unwrap();
        assert!(order.price.abs() < f64::EPSILON);
        assert_eq!(order.quantity, 50);
    }

    #[test]
    fn test_gtt_requires_trigger_and_future_expiry() {
        let common = CommonParams {
            instrument_token: "NSE_FO|45012".into(),
            ..CommonParams::default()
        };
        let mut gtt = GttTicket::new(common, today());
        assert_eq!(gtt.expiry, NaiveDate::from_ymd_opt(2025, 9, 1).unwrap());
        assert_eq!(gtt.build(today()), Err(TicketError::TriggerPrice));

        gtt.trigger_price = 118.0;
        gtt.expiry = today();
        assert!(matches!(
            gtt.build(today()),
            Err(TicketError::ExpiryTooSoon { .. })
        ));

        gtt.expiry = earliest_gtt_expiry(today());
        let order = gtt.build(today()).unwrap();
        assert_eq!(order.price_type, PriceType::Limit);
    }

    #[test]
    fn test_multi_leg_names_offending_leg() {
        let mut book = LegBook::from_legs(vec![leg("NSE_FO|1"), leg(PLACEHOLDER_TOKEN)]);
        assert_eq!(
            build_multi_leg(&CommonParams::default(), &book),
            Err(TicketError::LegInstrument(2))
        );

        book.set(2, leg("NSE_FO|2"));
        let order = build_multi_leg(&CommonParams::default(), &book).unwrap();
        assert_eq!(order.legs.len(), 2);
    }

    #[test]
    fn test_leg_book_add_remove_reset() {
        let mut book = LegBook::new();
        assert_eq!(book.len(), 1);
        book.add(leg("A"));
        book.add(leg("B"));
        assert_eq!(book.remove(2).unwrap().instrument_token, "A");
        assert_eq!(book.legs()[1].instrument_token, "B");
        assert!(book.remove(0).is_none());
        assert!(book.remove(9).is_none());

        book.remove(1);
        book.remove(1);
        assert!(book.is_empty());
        assert!(book.remove(1).is_none());
        assert_eq!(
            build_multi_leg(&CommonParams::default(), &book),
            Err(TicketError::NoLegs)
        );

        book.reset();
        assert_eq!(book, LegBook::new());
    }

    #[test]
    fn test_multi_leg_gtt_forces_limit() {
        let mut l = leg("NSE_FO|1");
        l.price_type = PriceType::Market;
        l.price = 55.0;
        let book = LegBook::from_legs(vec![l]);
        let expiry = default_gtt_expiry(today());

        assert_eq!(
            build_multi_leg_gtt(&CommonParams::default(), &book, 0.0, expiry, today()),
            Err(TicketError::TriggerPrice)
        );
        let order =
            build_multi_leg_gtt(&CommonParams::default(), &book, 60.0, expiry, today()).unwrap();
        assert_eq!(order.legs[0].price_type, PriceType::Limit);
        assert!((order.legs[0].price - 55.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_leg_spec_parsing() {
        let l = LegDraft::parse("NSE_FO|45012:sell:75:limit:101.5").unwrap();
        assert_eq!(l.transaction_type, TransactionType::Sell);
        assert_eq!(l.quantity, 75);
        assert!((l.price - 101.5).abs() < f64::EPSILON);

        let short = LegDraft::parse("NSE_FO|45013:BUY:50").unwrap();
        assert_eq!(short.price_type, PriceType::Limit);

        assert!(LegDraft::parse("NSE_FO|45013:BUY").is_err());
        assert!(LegDraft::parse("NSE_FO|45013:HOLD:50").is_err());
        assert!(LegDraft::parse("NSE_FO|45013:BUY:-5").is_err());
    }
}
