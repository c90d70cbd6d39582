//! # Routes
//!
//! Axum router configuration for the payment API.

use crate::handlers;
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Create the main application router
///
/// Routes:
/// - POST /payments/create-payment-session - Create checkout session
/// - GET  /payments/success - Success redirect acknowledgment
/// - GET  /payments/cancel - Cancel redirect acknowledgment
/// - POST /payments/webhook - Stripe webhook handler (raw body)
/// - GET  /health - Health check
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Browser-facing routes
    let payment_routes = Router::new()
        .route(
            "/create-payment-session",
            post(handlers::create_payment_session),
        )
        .route("/success", get(handlers::payment_success))
        .route("/cancel", get(handlers::payment_cancel))
        .layer(cors);

    // Webhook route (no CORS, must accept raw body)
    let webhook_routes = Router::new().route("/webhook", post(handlers::stripe_webhook));

    Router::new()
        .route("/health", get(handlers::health))
        .nest("/payments", payment_routes.merge(webhook_routes))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}
