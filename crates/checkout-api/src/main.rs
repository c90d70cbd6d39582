//! # checkout-relay
//!
//! Hosted checkout sessions and Stripe webhooks.
//!
//! ## Usage
//!
//! ```bash
//! # Set environment variables
//! export STRIPE_SECRET_KEY=sk_test_...
//! export STRIPE_WEBHOOK_SECRET=whsec_...
//!
//! # Run the server
//! checkout-relay
//! ```

use checkout_api::{routes, AppConfig, AppState, LogFormat};
use checkout_stripe::HANDLED_WEBHOOK_EVENTS;
use tracing::{error, info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing(AppConfig::from_env().log_format);

    // Refuse to start without a usable Stripe configuration
    let state = AppState::from_env().map_err(|e| {
        error!("Startup failed: {:#}", e);
        e
    })?;

    let addr = state.config.socket_addr()?;
    let is_prod = state.config.is_production();

    info!("Environment: {}", state.config.environment);
    info!("Payment provider: {}", state.provider.provider_name());
    info!("Success URL: {}", state.urls.success_url);
    info!("Cancel URL: {}", state.urls.cancel_url);

    let app = routes::create_router(state);

    info!("checkout-relay starting on http://{}", addr);

    if !is_prod {
        info!("Checkout: POST http://{}/payments/create-payment-session", addr);
        info!(
            "Webhook: POST http://{}/payments/webhook (events: {})",
            addr,
            HANDLED_WEBHOOK_EVENTS.join(", ")
        );
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("checkout-relay stopped");
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::builder()
        .with_default_directive(Level::INFO.into())
        .from_env_lossy();
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry.with(fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(fmt::layer()).init(),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
