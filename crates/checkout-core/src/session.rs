//! # Checkout Session Types
//!
//! Request, builder output and response types for hosted checkout sessions.

use crate::error::{PaymentError, PaymentResult};
use crate::provider::CheckoutUrls;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Metadata key correlating a provider payment with our order
pub const ORDER_ID_METADATA_KEY: &str = "orderId";

/// Convert a decimal major-unit price to integer minor units.
///
/// The amount is `price × 100` rounded half away from zero, for every
/// currency. Returns `None` when the result does not fit in an `i64`.
pub fn to_minor_units(price: Decimal) -> Option<i64> {
    price
        .checked_mul(Decimal::ONE_HUNDRED)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
}

/// A cart line as sent by the client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentLineItem {
    /// Product name shown on the hosted checkout page
    pub name: String,

    /// Unit price in major units (e.g. dollars), parsed from the JSON digits
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub price: Decimal,

    /// Quantity, must be positive
    pub quantity: u32,
}

impl PaymentLineItem {
    pub fn new(name: impl Into<String>, price: Decimal, quantity: u32) -> Self {
        Self {
            name: name.into(),
            price,
            quantity,
        }
    }

    /// Unit amount in minor units
    pub fn unit_amount(&self) -> PaymentResult<i64> {
        if self.price < Decimal::ZERO {
            return Err(PaymentError::InvalidRequest(format!(
                "Price for '{}' must not be negative",
                self.name
            )));
        }
        to_minor_units(self.price).ok_or_else(|| {
            PaymentError::InvalidRequest(format!("Price for '{}' is out of range", self.name))
        })
    }
}

/// Create-session request body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSessionRequest {
    /// ISO 4217 currency code
    pub currency: String,

    /// Items to charge, in display order
    pub items: Vec<PaymentLineItem>,

    /// Caller's order identifier, echoed back through webhook metadata
    pub order_id: String,
}

impl PaymentSessionRequest {
    /// Reject requests the provider would refuse or misprice
    pub fn validate(&self) -> PaymentResult<()> {
        if self.items.is_empty() {
            return Err(PaymentError::InvalidRequest(
                "Session request has no items".to_string(),
            ));
        }

        if self.order_id.trim().is_empty() {
            return Err(PaymentError::InvalidRequest(
                "orderId must not be empty".to_string(),
            ));
        }

        if self.currency.len() != 3 || !self.currency.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(PaymentError::InvalidRequest(format!(
                "Invalid currency code: {}",
                self.currency
            )));
        }

        if let Some(item) = self.items.iter().find(|item| item.quantity == 0) {
            return Err(PaymentError::InvalidRequest(format!(
                "Quantity for '{}' must be positive",
                item.name
            )));
        }

        Ok(())
    }
}

/// Checkout mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutMode {
    /// One-time payment
    #[default]
    Payment,
}

impl CheckoutMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckoutMode::Payment => "payment",
        }
    }
}

/// A priced line ready for the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionLineItem {
    pub name: String,
    /// Minor units (cents)
    pub unit_amount: i64,
    pub quantity: u32,
}

/// Provider-neutral session creation parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckoutSessionParams {
    pub mode: CheckoutMode,

    /// Lowercase ISO currency code
    pub currency: String,

    pub line_items: Vec<SessionLineItem>,

    /// Attached to the payment intent the session creates
    pub payment_intent_metadata: HashMap<String, String>,

    pub success_url: String,

    pub cancel_url: String,
}

impl CheckoutSessionParams {
    /// Build session params from a client request and the configured redirect URLs
    pub fn from_request(request: &PaymentSessionRequest, urls: &CheckoutUrls) -> PaymentResult<Self> {
        request.validate()?;

        let line_items = request
            .items
            .iter()
            .map(|item| {
                Ok(SessionLineItem {
                    name: item.name.clone(),
                    unit_amount: item.unit_amount()?,
                    quantity: item.quantity,
                })
            })
            .collect::<PaymentResult<Vec<_>>>()?;

        let mut payment_intent_metadata = HashMap::new();
        payment_intent_metadata.insert(
            ORDER_ID_METADATA_KEY.to_string(),
            request.order_id.clone(),
        );

        Ok(Self {
            mode: CheckoutMode::Payment,
            currency: request.currency.to_lowercase(),
            line_items,
            payment_intent_metadata,
            success_url: urls.success_url.clone(),
            cancel_url: urls.cancel_url.clone(),
        })
    }

    /// Order id carried in the payment intent metadata
    pub fn order_id(&self) -> Option<&str> {
        self.payment_intent_metadata
            .get(ORDER_ID_METADATA_KEY)
            .map(|s| s.as_str())
    }

    /// Sum of all lines in minor units
    pub fn total_amount(&self) -> i64 {
        self.line_items
            .iter()
            .map(|item| item.unit_amount.saturating_mul(item.quantity as i64))
            .fold(0i64, i64::saturating_add)
    }
}

/// Session object returned by the provider, passed through unmodified
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaymentSession(pub serde_json::Value);

impl PaymentSession {
    /// Provider session id
    pub fn id(&self) -> Option<&str> {
        self.0.get("id").and_then(|v| v.as_str())
    }

    /// Hosted checkout URL to redirect the customer to
    pub fn url(&self) -> Option<&str> {
        self.0.get("url").and_then(|v| v.as_str())
    }

    pub fn into_inner(self) -> serde_json::Value {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn urls() -> CheckoutUrls {
        CheckoutUrls::new("https://shop.test/ok", "https://shop.test/cancel")
    }

    #[test]
    fn test_minor_units_rounds_half_away_from_zero() {
        assert_eq!(to_minor_units(dec("10.00")), Some(1000));
        assert_eq!(to_minor_units(dec("19.995")), Some(2000));
        assert_eq!(to_minor_units(dec("19.994")), Some(1999));
        assert_eq!(to_minor_units(dec("0.005")), Some(1));
        assert_eq!(to_minor_units(dec("1.004")), Some(100));
        assert_eq!(to_minor_units(dec("2.675")), Some(268));
        assert_eq!(to_minor_units(dec("0")), Some(0));
    }

    #[test]
    fn test_minor_units_out_of_range() {
        assert_eq!(to_minor_units(Decimal::MAX), None);
    }

    #[test]
    fn test_price_deserializes_exactly_from_json_number() {
        let item: PaymentLineItem =
            serde_json::from_value(json!({"name": "A", "price": 19.995, "quantity": 1})).unwrap();
        assert_eq!(item.unit_amount().unwrap(), 2000);
    }

    #[test]
    fn test_long_price_is_not_rounded_through_f64() {
        // As an f64 this literal collapses to 19.995
        let item: PaymentLineItem =
            serde_json::from_str(r#"{"name": "A", "price": 19.99499999999999999, "quantity": 1}"#)
                .unwrap();

        assert_eq!(item.price, dec("19.99499999999999999"));
        assert_eq!(item.unit_amount().unwrap(), 1999);

        let request: PaymentSessionRequest = serde_json::from_slice(
            br#"{"currency": "usd", "items": [{"name": "A", "price": 0.00499999999999999999, "quantity": 1}], "orderId": "ord1"}"#,
        )
        .unwrap();
        assert_eq!(request.items[0].unit_amount().unwrap(), 0);
    }

    #[test]
    fn test_request_uses_camel_case_order_id() {
        let request: PaymentSessionRequest = serde_json::from_value(json!({
            "currency": "usd",
            "items": [{"name": "A", "price": 10.00, "quantity": 2}],
            "orderId": "ord1"
        }))
        .unwrap();

        assert_eq!(request.order_id, "ord1");
        assert_eq!(request.items.len(), 1);
    }

    #[test]
    fn test_build_params() {
        let request = PaymentSessionRequest {
            currency: "USD".into(),
            items: vec![PaymentLineItem::new("A", dec("10.00"), 2)],
            order_id: "ord1".into(),
        };

        let params = CheckoutSessionParams::from_request(&request, &urls()).unwrap();

        assert_eq!(params.mode, CheckoutMode::Payment);
        assert_eq!(params.currency, "usd");
        assert_eq!(
            params.line_items,
            vec![SessionLineItem {
                name: "A".into(),
                unit_amount: 1000,
                quantity: 2
            }]
        );
        assert_eq!(params.order_id(), Some("ord1"));
        assert_eq!(params.success_url, "https://shop.test/ok");
        assert_eq!(params.cancel_url, "https://shop.test/cancel");
        assert_eq!(params.total_amount(), 2000);
    }

    #[test]
    fn test_rejects_empty_items() {
        let request = PaymentSessionRequest {
            currency: "usd".into(),
            items: vec![],
            order_id: "ord1".into(),
        };
        let err = CheckoutSessionParams::from_request(&request, &urls()).unwrap_err();
        assert!(matches!(err, PaymentError::InvalidRequest(_)));
    }

    #[test]
    fn test_rejects_zero_quantity_and_negative_price() {
        let zero = PaymentSessionRequest {
            currency: "usd".into(),
            items: vec![PaymentLineItem::new("A", dec("1.00"), 0)],
            order_id: "ord1".into(),
        };
        assert!(zero.validate().is_err());

        let negative = PaymentSessionRequest {
            currency: "usd".into(),
            items: vec![PaymentLineItem::new("A", dec("-1.00"), 1)],
            order_id: "ord1".into(),
        };
        assert!(CheckoutSessionParams::from_request(&negative, &urls()).is_err());
    }

    #[test]
    fn test_rejects_bad_currency_and_blank_order() {
        let mut request = PaymentSessionRequest {
            currency: "dollars".into(),
            items: vec![PaymentLineItem::new("A", dec("1.00"), 1)],
            order_id: "ord1".into(),
        };
        assert!(request.validate().is_err());

        request.currency = "eur".into();
        request.order_id = "  ".into();
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_session_passthrough() {
        let raw = json!({
            "id": "cs_test_123",
            "object": "checkout.session",
            "url": "https://checkout.stripe.com/c/pay/cs_test_123",
            "livemode": false
        });
        let session: PaymentSession = serde_json::from_value(raw.clone()).unwrap();

        assert_eq!(session.id(), Some("cs_test_123"));
        assert_eq!(session.url(), Some("https://checkout.stripe.com/c/pay/cs_test_123"));
        assert_eq!(serde_json::to_value(&session).unwrap(), raw);
    }
}
