//! # Webhook Events
//!
//! Verified provider events and the closed set of event types we act on.

use crate::session::ORDER_ID_METADATA_KEY;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Webhook event types we care about
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WebhookEventType {
    /// `charge.succeeded`
    ChargeSucceeded,
    /// `payment_intent.payment_failed`
    PaymentFailed,
    /// `payment_intent.canceled`
    PaymentCanceled,
    /// Anything else (passthrough)
    Unknown(String),
}

impl WebhookEventType {
    /// Map a provider type tag to an event type
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "charge.succeeded" => WebhookEventType::ChargeSucceeded,
            "payment_intent.payment_failed" => WebhookEventType::PaymentFailed,
            "payment_intent.canceled" => WebhookEventType::PaymentCanceled,
            other => WebhookEventType::Unknown(other.to_string()),
        }
    }

    /// The provider type tag
    pub fn as_tag(&self) -> &str {
        match self {
            WebhookEventType::ChargeSucceeded => "charge.succeeded",
            WebhookEventType::PaymentFailed => "payment_intent.payment_failed",
            WebhookEventType::PaymentCanceled => "payment_intent.canceled",
            WebhookEventType::Unknown(tag) => tag,
        }
    }
}

impl std::fmt::Display for WebhookEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_tag())
    }
}

/// A verified webhook event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookEvent {
    /// Event ID from provider
    pub event_id: String,

    /// Event type
    pub event_type: WebhookEventType,

    /// When the provider created the event
    pub created: DateTime<Utc>,

    /// The event's `data.object`
    pub object: serde_json::Map<String, serde_json::Value>,
}

impl WebhookEvent {
    /// String-valued entries of `object.metadata`; other values are skipped
    pub fn metadata(&self) -> HashMap<String, String> {
        self.object
            .get("metadata")
            .and_then(|m| m.as_object())
            .map(|m| {
                m.iter()
                    .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Our order id, from `object.metadata.orderId`
    pub fn order_id(&self) -> Option<&str> {
        self.object
            .get("metadata")
            .and_then(|m| m.get(ORDER_ID_METADATA_KEY))
            .and_then(|v| v.as_str())
    }

    /// Provider id of the event's object (charge, payment intent, ...)
    pub fn object_id(&self) -> Option<&str> {
        self.object.get("id").and_then(|v| v.as_str())
    }
}
