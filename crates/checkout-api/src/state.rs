//! # Application State
//!
//! Shared state for the Axum application.
//! Built once at startup; every request gets a cheap clone.

use checkout_core::{BoxedPaymentProvider, CheckoutUrls};
use checkout_stripe::{LoggingWebhookHandler, StripeClient, StripeConfig, WebhookHandler};
use std::net::SocketAddr;
use std::sync::Arc;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl LogFormat {
    fn parse(raw: &str) -> Self {
        if raw.eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Pretty
        }
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Public base URL of this service
    pub base_url: String,
    /// Environment (development, staging, production)
    pub environment: String,
    /// Log line format
    pub log_format: LogFormat,
}

impl AppConfig {
    /// Load from environment variables
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            host: lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: lookup("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            base_url: lookup("BASE_URL").unwrap_or_else(|| "http://localhost:8080".to_string()),
            environment: lookup("ENVIRONMENT").unwrap_or_else(|| "development".to_string()),
            log_format: lookup("LOG_FORMAT")
                .map(|f| LogFormat::parse(&f))
                .unwrap_or_default(),
        }
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid socket address {}:{}: {}", self.host, self.port, e))
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Payment provider client
    pub provider: BoxedPaymentProvider,
    /// Receives verified webhook events
    pub webhook_handler: Arc<dyn WebhookHandler>,
    /// Redirect URLs for new sessions
    pub urls: CheckoutUrls,
    /// Application config
    pub config: AppConfig,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        provider: BoxedPaymentProvider,
        webhook_handler: Arc<dyn WebhookHandler>,
        urls: CheckoutUrls,
    ) -> Self {
        Self {
            provider,
            webhook_handler,
            urls,
            config,
        }
    }

    /// Create the production state: Stripe client plus logging webhook handler
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env`, reading settings through `lookup`
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = AppConfig::from_lookup(&lookup);
        let urls = checkout_urls(&lookup, &config.base_url);

        let stripe_config = StripeConfig::from_lookup(&lookup)
            .map_err(|e| anyhow::anyhow!("Failed to initialize Stripe: {}", e))?;
        let client = StripeClient::new(stripe_config)
            .map_err(|e| anyhow::anyhow!("Failed to initialize Stripe: {}", e))?;

        Ok(Self::new(
            config,
            Arc::new(client),
            Arc::new(LoggingWebhookHandler),
            urls,
        ))
    }
}

/// Redirect URLs: explicit settings win, otherwise this service's own routes
fn checkout_urls<F>(lookup: &F, base_url: &str) -> CheckoutUrls
where
    F: Fn(&str) -> Option<String>,
{
    let defaults = CheckoutUrls::from_base_url(base_url);
    CheckoutUrls::new(
        lookup("PAYMENT_SUCCESS_URL").unwrap_or(defaults.success_url),
        lookup("PAYMENT_CANCEL_URL").unwrap_or(defaults.cancel_url),
    )
}
