//! # checkout-api
//!
//! HTTP API layer for checkout-relay.
//!
//! This crate provides:
//! - Axum-based HTTP server
//! - Checkout session creation and redirect acknowledgments
//! - Stripe webhook endpoint
//!
//! ## Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/health` | Health check |
//! | POST | `/payments/create-payment-session` | Create checkout session |
//! | GET | `/payments/success` | Success redirect |
//! | GET | `/payments/cancel` | Cancel redirect |
//! | POST | `/payments/webhook` | Stripe webhook |

pub mod handlers;
pub mod routes;
pub mod state;

pub use routes::create_router;
pub use state::{AppConfig, AppState, LogFormat};
