//! # Stripe Webhook Handling
//!
//! Signature verification, event construction and dispatch for Stripe webhooks.
//!
//! Stripe signs every delivery with a `Stripe-Signature` header of the form
//! `t=<unix seconds>,v1=<hex hmac>[,v1=...]`, where each `v1` value is
//! `HMAC-SHA256(endpoint_secret, "<t>." ++ raw_body)`.

use checkout_core::{PaymentError, PaymentResult, WebhookEvent, WebhookEventType};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use tracing::{debug, info, warn};

type HmacSha256 = Hmac<Sha256>;

/// Request header carrying the signature
pub const SIGNATURE_HEADER: &str = "stripe-signature";

/// Event types this service subscribes to in the Stripe Dashboard
pub const HANDLED_WEBHOOK_EVENTS: &[&str] = &[
    "charge.succeeded",
    "payment_intent.payment_failed",
    "payment_intent.canceled",
];

// =============================================================================
// Signature Verification
// =============================================================================

#[derive(Debug)]
struct SignatureHeader {
    timestamp: i64,
    signatures: Vec<String>,
}

fn parse_signature_header(header: &str) -> PaymentResult<SignatureHeader> {
    let mut timestamp = None;
    let mut signatures = Vec::new();

    for part in header.split(',') {
        let Some((key, value)) = part.trim().split_once('=') else {
            continue;
        };
        match key {
            "t" => timestamp = value.parse().ok(),
            "v1" => signatures.push(value.to_string()),
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or_else(|| {
        PaymentError::WebhookVerificationFailed(
            "Unable to extract timestamp and signatures from header".to_string(),
        )
    })?;

    if signatures.is_empty() {
        return Err(PaymentError::WebhookVerificationFailed(
            "No signatures found with expected scheme".to_string(),
        ));
    }

    Ok(SignatureHeader {
        timestamp,
        signatures,
    })
}

fn signed_payload_mac(secret: &str, timestamp: i64, payload: &[u8]) -> PaymentResult<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| PaymentError::Configuration(format!("Invalid webhook secret: {}", e)))?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    Ok(mac)
}

/// Compute the `v1` signature Stripe would send for this payload
pub fn compute_signature(secret: &str, timestamp: i64, payload: &[u8]) -> PaymentResult<String> {
    let mac = signed_payload_mac(secret, timestamp, payload)?;
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Build a complete `Stripe-Signature` header value, as the Stripe CLI does for test events
pub fn generate_test_header(secret: &str, timestamp: i64, payload: &[u8]) -> PaymentResult<String> {
    Ok(format!(
        "t={},v1={}",
        timestamp,
        compute_signature(secret, timestamp, payload)?
    ))
}

/// Check the signature header against the raw payload.
///
/// Signatures are compared in constant time; the header timestamp must lie
/// within `tolerance_secs` of `now`.
pub fn verify_signature(
    payload: &[u8],
    header: &str,
    secret: &str,
    tolerance_secs: i64,
    now: DateTime<Utc>,
) -> PaymentResult<()> {
    let parsed = parse_signature_header(header)?;
    let mac = signed_payload_mac(secret, parsed.timestamp, payload)?;

    let matched = parsed.signatures.iter().any(|sig| match hex::decode(sig) {
        Ok(bytes) => mac.clone().verify_slice(&bytes).is_ok(),
        Err(_) => false,
    });

    if !matched {
        return Err(PaymentError::WebhookVerificationFailed(
            "No signatures found matching the expected signature for payload".to_string(),
        ));
    }

    if (now.timestamp() - parsed.timestamp).abs() > tolerance_secs {
        return Err(PaymentError::WebhookVerificationFailed(
            "Timestamp outside the tolerance zone".to_string(),
        ));
    }

    Ok(())
}

// =============================================================================
// Event Construction
// =============================================================================

#[derive(Debug, Deserialize)]
struct StripeWebhookEvent {
    id: String,
    #[serde(rename = "type")]
    event_type: String,
    created: i64,
    data: StripeEventData,
}

#[derive(Debug, Deserialize)]
struct StripeEventData {
    object: serde_json::Map<String, serde_json::Value>,
}

/// Verify the payload and parse it into a `WebhookEvent`
pub fn construct_event(
    payload: &[u8],
    header: &str,
    secret: &str,
    tolerance_secs: i64,
    now: DateTime<Utc>,
) -> PaymentResult<WebhookEvent> {
    verify_signature(payload, header, secret, tolerance_secs, now)?;

    let event: StripeWebhookEvent = serde_json::from_slice(payload).map_err(|e| {
        PaymentError::WebhookParseError(format!("Failed to parse webhook: {}", e))
    })?;

    debug!("Verified Stripe webhook: type={}", event.event_type);

    Ok(WebhookEvent {
        event_id: event.id,
        event_type: WebhookEventType::from_tag(&event.event_type),
        created: DateTime::from_timestamp(event.created, 0).unwrap_or(now),
        object: event.data.object,
    })
}

// =============================================================================
// Dispatch
// =============================================================================

/// Webhook event handler trait
///
/// Every method defaults to logging; none of them fail, so a verified event
/// is always acknowledged.
pub trait WebhookHandler: Send + Sync {
    /// Called for `charge.succeeded`
    fn on_charge_succeeded(&self, event: &WebhookEvent) {
        info!(event_id = %event.event_id, "Payment succeeded");
        info!(
            order_id = event.order_id().unwrap_or("unknown"),
            metadata = ?event.metadata(),
            "Charge metadata"
        );
    }

    /// Called for `payment_intent.payment_failed`
    fn on_payment_failed(&self, event: &WebhookEvent) {
        warn!(
            event_id = %event.event_id,
            payment_intent = ?event.object_id(),
            order_id = ?event.order_id(),
            "Payment failed"
        );
    }

    /// Called for `payment_intent.canceled`
    fn on_payment_canceled(&self, event: &WebhookEvent) {
        warn!(
            event_id = %event.event_id,
            payment_intent = ?event.object_id(),
            order_id = ?event.order_id(),
            "Payment canceled"
        );
    }

    /// Called for any other event type
    fn on_unknown_event(&self, event: &WebhookEvent) {
        warn!(event_id = %event.event_id, "Unhandled event type {}", event.event_type);
    }
}

/// Default handler (just logs events)
pub struct LoggingWebhookHandler;

impl WebhookHandler for LoggingWebhookHandler {}

/// Dispatch a verified event to the matching handler method
pub fn dispatch_webhook_event(handler: &dyn WebhookHandler, event: &WebhookEvent) {
    match &event.event_type {
        WebhookEventType::ChargeSucceeded => handler.on_charge_succeeded(event),
        WebhookEventType::PaymentFailed => handler.on_payment_failed(event),
        WebhookEventType::PaymentCanceled => handler.on_payment_canceled(event),
        WebhookEventType::Unknown(_) => handler.on_unknown_event(event),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io;
    use std::sync::{Arc, Mutex};

    const SECRET: &str = "whsec_test_secret";

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    fn payload(event_type: &str) -> Vec<u8> {
        serde_json::to_vec(&json!({
            "id": "evt_123",
            "object": "event",
            "type": event_type,
            "created": 1_700_000_000,
            "data": {
                "object": {
                    "id": "ch_456",
                    "object": "charge",
                    "metadata": { "orderId": "ord1" }
                }
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_parse_signature_header() {
        let parsed = parse_signature_header("t=1234567890,v1=abc123,v0=old,v1=def456").unwrap();

        assert_eq!(parsed.timestamp, 1234567890);
        assert_eq!(parsed.signatures, vec!["abc123", "def456"]);
    }

    #[test]
    fn test_parse_signature_header_missing_parts() {
        assert!(parse_signature_header("v1=abc").is_err());
        assert!(parse_signature_header("t=123").is_err());
        assert!(parse_signature_header("garbage").is_err());
    }

    #[test]
    fn test_compute_signature_is_hex_sha256() {
        let sig = compute_signature(SECRET, 1234567890, b"{}").unwrap();
        assert_eq!(sig.len(), 64);
        assert!(sig.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_construct_event_valid() {
        let body = payload("charge.succeeded");
        let header = generate_test_header(SECRET, now().timestamp(), &body).unwrap();

        let event = construct_event(&body, &header, SECRET, 300, now()).unwrap();

        assert_eq!(event.event_id, "evt_123");
        assert_eq!(event.event_type, WebhookEventType::ChargeSucceeded);
        assert_eq!(event.order_id(), Some("ord1"));
        assert_eq!(event.created, now());
    }

    #[test]
    fn test_any_matching_v1_signature_is_accepted() {
        let body = payload("charge.succeeded");
        let good = compute_signature(SECRET, now().timestamp(), &body).unwrap();
        let header = format!("t={},v1={},v1={}", now().timestamp(), "00".repeat(32), good);

        assert!(verify_signature(&body, &header, SECRET, 300, now()).is_ok());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let body = payload("charge.succeeded");
        let header = generate_test_header("whsec_other", now().timestamp(), &body).unwrap();

        let err = construct_event(&body, &header, SECRET, 300, now()).unwrap_err();
        assert!(matches!(err, PaymentError::WebhookVerificationFailed(_)));
    }

    #[test]
    fn test_modified_body_rejected() {
        let body = payload("charge.succeeded");
        let header = generate_test_header(SECRET, now().timestamp(), &body).unwrap();

        let mut tampered = body.clone();
        tampered.push(b' ');

        assert!(verify_signature(&tampered, &header, SECRET, 300, now()).is_err());
    }

    #[test]
    fn test_stale_timestamp_rejected() {
        let body = payload("charge.succeeded");
        let signed_at = now().timestamp() - 301;
        let header = generate_test_header(SECRET, signed_at, &body).unwrap();

        let err = verify_signature(&body, &header, SECRET, 300, now()).unwrap_err();
        assert!(err.to_string().contains("tolerance"));
    }

    #[test]
    fn test_signed_garbage_is_parse_error() {
        let body = b"not json".to_vec();
        let header = generate_test_header(SECRET, now().timestamp(), &body).unwrap();

        let err = construct_event(&body, &header, SECRET, 300, now()).unwrap_err();
        assert!(matches!(err, PaymentError::WebhookParseError(_)));
    }

    #[derive(Default)]
    struct RecordingHandler {
        calls: Mutex<Vec<&'static str>>,
    }

    impl WebhookHandler for RecordingHandler {
        fn on_charge_succeeded(&self, _event: &WebhookEvent) {
            self.calls.lock().unwrap().push("charge_succeeded");
        }
        fn on_payment_failed(&self, _event: &WebhookEvent) {
            self.calls.lock().unwrap().push("payment_failed");
        }
        fn on_payment_canceled(&self, _event: &WebhookEvent) {
            self.calls.lock().unwrap().push("payment_canceled");
        }
        fn on_unknown_event(&self, _event: &WebhookEvent) {
            self.calls.lock().unwrap().push("unknown");
        }
    }

    #[test]
    fn test_dispatch_routes_each_type() {
        let handler = RecordingHandler::default();

        for tag in [
            "charge.succeeded",
            "payment_intent.payment_failed",
            "payment_intent.canceled",
            "customer.created",
        ] {
            let body = payload(tag);
            let header = generate_test_header(SECRET, now().timestamp(), &body).unwrap();
            let event = construct_event(&body, &header, SECRET, 300, now()).unwrap();
            dispatch_webhook_event(&handler, &event);
        }

        assert_eq!(
            *handler.calls.lock().unwrap(),
            vec!["charge_succeeded", "payment_failed", "payment_canceled", "unknown"]
        );
    }

    /// Shared sink for formatted log lines
    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn capture_logs(f: impl FnOnce()) -> String {
        let buffer = LogBuffer::default();
        let writer = buffer.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::INFO)
            .finish();

        tracing::subscriber::with_default(subscriber, f);

        let bytes = buffer.0.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_logging_handler_logs_order_id_on_charge_succeeded() {
        let body = payload("charge.succeeded");
        let header = generate_test_header(SECRET, now().timestamp(), &body).unwrap();
        let event = construct_event(&body, &header, SECRET, 300, now()).unwrap();

        let logs = capture_logs(|| dispatch_webhook_event(&LoggingWebhookHandler, &event));

        assert!(logs.contains("Payment succeeded"));
        assert!(logs.contains("evt_123"));
        assert!(logs.contains("order_id=\"ord1\"") || logs.contains("order_id=ord1"));
        assert!(logs.contains("orderId"));
    }

    #[test]
    fn test_logging_handler_warns_with_unknown_tag() {
        let body = payload("invoice.created");
        let header = generate_test_header(SECRET, now().timestamp(), &body).unwrap();
        let mut event = construct_event(&body, &header, SECRET, 300, now()).unwrap();
        event.object.remove("metadata");

        let logs = capture_logs(|| dispatch_webhook_event(&LoggingWebhookHandler, &event));

        assert!(logs.contains("WARN"));
        assert!(logs.contains("Unhandled event type invoice.created"));
    }
}
