//! # Payment Provider Trait
//!
//! The seam between the HTTP surface and a hosted-checkout provider.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   PaymentProvider (trait)                   │
//! │  ├── create_checkout()                                      │
//! │  ├── verify_webhook()                                       │
//! │  └── provider_name()                                        │
//! └─────────────────────────────────────────────────────────────┘
//!                            ▲
//!                  ┌─────────┴─────────┐
//!                  │   StripeClient    │
//!                  └───────────────────┘
//! ```

use crate::error::PaymentResult;
use crate::event::WebhookEvent;
use crate::session::{CheckoutSessionParams, PaymentSession};
use async_trait::async_trait;
use std::sync::Arc;

/// Client for a hosted-checkout payment provider.
///
/// Constructed once from configuration and shared by every request.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Create a checkout session.
    ///
    /// # Returns
    /// The provider's session object, unmodified.
    async fn create_checkout(&self, params: &CheckoutSessionParams) -> PaymentResult<PaymentSession>;

    /// Verify a webhook signature and parse the event.
    ///
    /// # Arguments
    /// * `payload` - Raw webhook body bytes, exactly as received
    /// * `signature` - Signature header from the request
    async fn verify_webhook(&self, payload: &[u8], signature: &str) -> PaymentResult<WebhookEvent>;

    /// Get the provider name (for logging).
    fn provider_name(&self) -> &'static str;
}

/// Shared provider handle (dynamic dispatch)
pub type BoxedPaymentProvider = Arc<dyn PaymentProvider>;

/// Redirect URLs handed to the provider for every session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutUrls {
    pub success_url: String,
    pub cancel_url: String,
}

impl CheckoutUrls {
    pub const SUCCESS_PATH: &'static str = "/payments/success";
    pub const CANCEL_PATH: &'static str = "/payments/cancel";

    pub fn new(success_url: impl Into<String>, cancel_url: impl Into<String>) -> Self {
        Self {
            success_url: success_url.into(),
            cancel_url: cancel_url.into(),
        }
    }

    /// Point both redirects at this service's own success/cancel routes
    pub fn from_base_url(base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        Self::new(
            format!("{}{}", base, Self::SUCCESS_PATH),
            format!("{}{}", base, Self::CANCEL_PATH),
        )
    }
}
