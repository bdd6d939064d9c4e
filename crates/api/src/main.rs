//! Order Desk API - Order management HTTP service.
//!
//! This binary serves the order API on port 8080.
//!
//! # Architecture
//!
//! - Axum web framework with JSON request and response bodies
//! - `PostgreSQL` for orders and order items (`orderdesk` schema)
//! - Every order is written together with its items in one transaction
//!
//! Migrations are NOT run on startup. Run them explicitly via:
//! `cargo run -p orderdesk-cli -- migrate`

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::borrow::Cow;
use std::process::ExitCode;

use orderdesk_api::config::{ApiConfig, LogFormat};
use orderdesk_api::db::{self, PgOrderRepository};
use orderdesk_api::routes;
use orderdesk_api::state::AppState;
use sentry::integrations::tracing::{self as sentry_tracing, EventFilter};
use tokio::signal;
use tracing::Level;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_LOG_FILTER: &str = "orderdesk_api=info,tower_http=debug";

#[tokio::main]
async fn main() -> ExitCode {
    let config = match ApiConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            report_config_error(&e);
            return ExitCode::FAILURE;
        }
    };

    // Sentry must be initialised before the tracing subscriber
    let sentry_guard = config.sentry_dsn.as_deref().map(|dsn| {
        sentry::init((
            dsn,
            sentry::ClientOptions {
                release: sentry::release_name!(),
                environment: config.sentry_environment.clone().map(Cow::Owned),
                sample_rate: config.sentry_sample_rate,
                traces_sample_rate: config.sentry_traces_sample_rate,
                attach_stacktrace: true,
                ..Default::default()
            },
        ))
    });

    init_tracing(config.log_format);
    if sentry_guard.is_some() {
        tracing::info!("Sentry initialized");
    }

    match serve(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "orderdesk-api stopped");
            ExitCode::FAILURE
        }
    }
}

/// No subscriber exists yet, so config errors go straight to stderr.
#[allow(clippy::print_stderr)]
fn report_config_error(err: &orderdesk_api::config::ConfigError) {
    eprintln!("orderdesk-api: {err}");
}

/// Connect to storage, build the router, and serve until a shutdown signal.
async fn serve(config: ApiConfig) -> Result<(), Box<dyn std::error::Error>> {
    let pool = db::create_pool(&config.database_url, config.db_max_connections).await?;
    tracing::info!("Database pool created");

    let state = AppState::new(config, PgOrderRepository::new(pool));
    let addr = state.config().socket_addr();

    let app = routes::router(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction());

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "orderdesk-api listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Install the global subscriber: `RUST_LOG` filter, a pretty or JSON `fmt`
/// layer, and the Sentry layer (warnings and errors as events, info and debug
/// as breadcrumbs).
fn init_tracing(format: LogFormat) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());

    let fmt_layer = match format {
        LogFormat::Pretty => tracing_subscriber::fmt::layer().boxed(),
        LogFormat::Json => tracing_subscriber::fmt::layer().json().boxed(),
    };

    let sentry_layer = sentry_tracing::layer().event_filter(|metadata| match *metadata.level() {
        Level::ERROR | Level::WARN => EventFilter::Event,
        Level::INFO | Level::DEBUG => EventFilter::Breadcrumb,
        Level::TRACE => EventFilter::Ignore,
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .with(sentry_layer)
        .init();
}

/// Resolve on Ctrl+C or, on Unix, SIGTERM.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        let mut terminate = match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(terminate) => terminate,
            Err(e) => {
                tracing::warn!(error = %e, "SIGTERM handler unavailable, waiting for Ctrl+C");
                let _ = signal::ctrl_c().await;
                return;
            }
        };
        tokio::select! {
            _ = signal::ctrl_c() => {},
            _ = terminate.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        let _ = signal::ctrl_c().await;
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
