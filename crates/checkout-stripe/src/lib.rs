//! # checkout-stripe
//!
//! Stripe provider for checkout-relay.
//!
//! `StripeClient` implements `PaymentProvider` on top of the Checkout
//! Sessions API and verifies `Stripe-Signature` headers on webhooks.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use checkout_stripe::StripeClient;
//! use checkout_core::PaymentProvider;
//!
//! let client = StripeClient::from_env()?;
//! let session = client.create_checkout(&params).await?;
//! ```
//!
//! ## Webhook Handling
//!
//! ```rust,ignore
//! use checkout_stripe::{dispatch_webhook_event, LoggingWebhookHandler};
//!
//! let event = client.verify_webhook(&body, signature).await?;
//! dispatch_webhook_event(&LoggingWebhookHandler, &event);
//! ```

pub mod checkout;
pub mod config;
pub mod webhook;

// Re-exports
pub use checkout::{session_form_params, StripeClient};
pub use config::StripeConfig;
pub use webhook::{
    dispatch_webhook_event, LoggingWebhookHandler, WebhookHandler, HANDLED_WEBHOOK_EVENTS,
    SIGNATURE_HEADER,
};
