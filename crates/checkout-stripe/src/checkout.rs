//! # Stripe Checkout Sessions
//!
//! `PaymentProvider` implementation over the Stripe REST API.

use crate::config::StripeConfig;
use crate::webhook;
use async_trait::async_trait;
use checkout_core::{
    CheckoutSessionParams, PaymentError, PaymentProvider, PaymentResult, PaymentSession,
    WebhookEvent,
};
use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, error, info, instrument};

const PROVIDER: &str = "stripe";

/// Stripe client for hosted Checkout Sessions and webhook verification
pub struct StripeClient {
    config: StripeConfig,
    client: Client,
}

impl StripeClient {
    /// Create a new Stripe client
    pub fn new(config: StripeConfig) -> PaymentResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| {
                PaymentError::Configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self { config, client })
    }

    /// Create from environment variables
    pub fn from_env() -> PaymentResult<Self> {
        let config = StripeConfig::from_env()?;
        Self::new(config)
    }
}

/// Encode session params in Stripe's bracketed form syntax
pub fn session_form_params(params: &CheckoutSessionParams) -> Vec<(String, String)> {
    let mut form_params: Vec<(String, String)> = vec![
        ("mode".to_string(), params.mode.as_str().to_string()),
        ("success_url".to_string(), params.success_url.clone()),
        ("cancel_url".to_string(), params.cancel_url.clone()),
    ];

    for (i, item) in params.line_items.iter().enumerate() {
        form_params.push((
            format!("line_items[{}][price_data][currency]", i),
            params.currency.clone(),
        ));
        form_params.push((
            format!("line_items[{}][price_data][product_data][name]", i),
            item.name.clone(),
        ));
        form_params.push((
            format!("line_items[{}][price_data][unit_amount]", i),
            item.unit_amount.to_string(),
        ));
        form_params.push((
            format!("line_items[{}][quantity]", i),
            item.quantity.to_string(),
        ));
    }

    // Sorted so the encoded body is deterministic
    let mut metadata: Vec<_> = params.payment_intent_metadata.iter().collect();
    metadata.sort();
    for (key, value) in metadata {
        form_params.push((
            format!("payment_intent_data[metadata][{}]", key),
            value.clone(),
        ));
    }

    form_params
}

#[async_trait]
impl PaymentProvider for StripeClient {
    #[instrument(skip(self, params), fields(order_id = ?params.order_id()))]
    async fn create_checkout(&self, params: &CheckoutSessionParams) -> PaymentResult<PaymentSession> {
        let form_params = session_form_params(params);

        debug!(
            "Creating Stripe checkout session: {} items, mode={}",
            params.line_items.len(),
            params.mode.as_str()
        );

        let url = format!("{}/v1/checkout/sessions", self.config.api_base_url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", self.config.auth_header())
            .header("Stripe-Version", &self.config.api_version)
            .form(&form_params)
            .send()
            .await
            .map_err(|e| PaymentError::NetworkError(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| PaymentError::NetworkError(e.to_string()))?;

        if !status.is_success() {
            error!("Stripe API error: status={}, body={}", status, body);

            if let Ok(error_response) = serde_json::from_str::<StripeErrorResponse>(&body) {
                return Err(PaymentError::ProviderError {
                    provider: PROVIDER.to_string(),
                    message: error_response.error.message,
                });
            }

            return Err(PaymentError::ProviderError {
                provider: PROVIDER.to_string(),
                message: format!("HTTP {}: {}", status, body),
            });
        }

        let session: PaymentSession = serde_json::from_str(&body).map_err(|e| {
            PaymentError::Serialization(format!("Failed to parse Stripe response: {}", e))
        })?;

        info!(
            "Created Stripe checkout session: id={}, url={}",
            session.id().unwrap_or("unknown"),
            session.url().unwrap_or("none")
        );

        Ok(session)
    }

    #[instrument(skip(self, payload, signature))]
    async fn verify_webhook(&self, payload: &[u8], signature: &str) -> PaymentResult<WebhookEvent> {
        webhook::construct_event(
            payload,
            signature,
            &self.config.webhook_secret,
            self.config.webhook_tolerance_secs,
            Utc::now(),
        )
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER
    }
}

// =============================================================================
// Stripe API Types
// =============================================================================

#[derive(Debug, Deserialize)]
struct StripeErrorResponse {
    error: StripeError,
}

#[derive(Debug, Deserialize)]
struct StripeError {
    message: String,
}
