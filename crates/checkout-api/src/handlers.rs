//! # Request Handlers
//!
//! Axum request handlers for the payment API.

use crate::state::AppState;
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use checkout_core::{CheckoutSessionParams, PaymentError, PaymentSession, PaymentSessionRequest};
use checkout_stripe::{dispatch_webhook_event, SIGNATURE_HEADER};
use serde::Serialize;
use tracing::{error, info, instrument};

// =============================================================================
// Request/Response Types
// =============================================================================

/// Fixed acknowledgment for the redirect pages
#[derive(Debug, Serialize)]
pub struct RedirectAck {
    pub ok: bool,
    pub message: &'static str,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: u16) -> Self {
        Self {
            error: error.into(),
            code,
        }
    }
}

fn payment_error_to_response(err: PaymentError) -> (StatusCode, Json<ErrorResponse>) {
    let code = err.status_code();
    let response = ErrorResponse::new(err.to_string(), code);
    (StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR), Json(response))
}

// =============================================================================
// Handlers
// =============================================================================

/// Health check endpoint
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "checkout-relay",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Create a hosted checkout session
#[instrument(skip(state, request), fields(order_id = %request.order_id, items = request.items.len()))]
pub async fn create_payment_session(
    State(state): State<AppState>,
    Json(request): Json<PaymentSessionRequest>,
) -> Result<Json<PaymentSession>, (StatusCode, Json<ErrorResponse>)> {
    let params = CheckoutSessionParams::from_request(&request, &state.urls).map_err(|e| {
        info!("Rejected session request: {}", e);
        payment_error_to_response(e)
    })?;

    info!(
        "Creating checkout: {} lines, total={} {}, success_url={}",
        params.line_items.len(),
        params.total_amount(),
        params.currency,
        params.success_url
    );

    let session = state.provider.create_checkout(&params).await.map_err(|e| {
        error!("Failed to create checkout: {}", e);
        payment_error_to_response(e)
    })?;

    info!("Created checkout session: {}", session.id().unwrap_or("unknown"));

    Ok(Json(session))
}

/// Success redirect target
pub async fn payment_success() -> Json<RedirectAck> {
    Json(RedirectAck {
        ok: true,
        message: "Payments successfully",
    })
}

/// Cancel redirect target
pub async fn payment_cancel() -> Json<RedirectAck> {
    Json(RedirectAck {
        ok: false,
        message: "Payments canceled",
    })
}

/// Handle Stripe webhook
///
/// The body is taken as raw `Bytes`; the signature covers those exact bytes.
#[instrument(skip(state, headers, body))]
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, String) {
    let signature = match headers.get(SIGNATURE_HEADER).map(|v| v.to_str()) {
        Some(Ok(signature)) => signature,
        Some(Err(_)) => {
            error!("Webhook rejected: {} header is not visible ASCII", SIGNATURE_HEADER);
            return (
                StatusCode::BAD_REQUEST,
                format!("Webhook Error: Invalid {} header", SIGNATURE_HEADER),
            );
        }
        None => {
            error!("Webhook rejected: missing {} header", SIGNATURE_HEADER);
            return (
                StatusCode::BAD_REQUEST,
                format!("Webhook Error: Missing {} header", SIGNATURE_HEADER),
            );
        }
    };

    let event = match state.provider.verify_webhook(&body, signature).await {
        Ok(event) => event,
        Err(e) => {
            error!("Webhook verification failed: {}", e);
            let status = if e.is_webhook_rejection() {
                StatusCode::BAD_REQUEST
            } else {
                StatusCode::INTERNAL_SERVER_ERROR
            };
            return (status, format!("Webhook Error: {}", e));
        }
    };

    info!(
        "Received webhook: type={}, id={}",
        event.event_type, event.event_id
    );

    dispatch_webhook_event(state.webhook_handler.as_ref(), &event);

    (
        StatusCode::OK,
        format!("Webhook called with signature {}", signature),
    )
}
