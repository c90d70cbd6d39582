//! # checkout-core
//!
//! Core types and traits for the checkout-relay payment service.
//!
//! This crate provides:
//! - `PaymentProvider` trait for hosted-checkout providers
//! - `PaymentSessionRequest` and `CheckoutSessionParams` for session creation
//! - `WebhookEvent` and `WebhookEventType` for verified provider callbacks
//! - `PaymentError` for typed error handling
//!
//! ## Example
//!
//! ```rust,ignore
//! use checkout_core::{CheckoutSessionParams, CheckoutUrls, PaymentProvider};
//!
//! let urls = CheckoutUrls::from_base_url("https://pay.example.com");
//! let params = CheckoutSessionParams::from_request(&request, &urls)?;
//! let session = provider.create_checkout(&params).await?;
//!
//! // Redirect user to session.url()
//! ```

pub mod error;
pub mod event;
pub mod provider;
pub mod session;

// Re-exports for convenience
pub use error::{PaymentError, PaymentResult};
pub use event::{WebhookEvent, WebhookEventType};
pub use provider::{BoxedPaymentProvider, CheckoutUrls, PaymentProvider};
pub use session::{
    to_minor_units, CheckoutMode, CheckoutSessionParams, PaymentLineItem, PaymentSession,
    PaymentSessionRequest, SessionLineItem, ORDER_ID_METADATA_KEY,
};
