//! Fest HTTP server.
//!
//! Multi-tenant event ticketing with a contention-safe booking engine.

use fest_auth::{Argon2Hasher, AuthConfig, JwtAuthenticator};
use fest_core::SystemClock;
use fest_postgres::PostgresStore;
use fest_server::Config;
use fest_web::{router, AppState};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use std::future::IntoFuture;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::Notify;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file (if present)
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fest=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Fest server");

    // Load configuration
    let config = Config::from_env();
    info!(postgres = ?config.postgres, server = ?config.server, "Configuration loaded");
    if config.auth.using_dev_secret {
        warn!("AUTH_JWT_SECRET is not set; using the development secret. Never do this in production");
    }

    fest_server::metrics::install(config.server.metrics_addr()?)?;

    // Setup store
    info!("Connecting to database...");
    let connect_options: PgConnectOptions = config.postgres.url.parse()?;
    let connect_options = connect_options.options([(
        "statement_timeout",
        config.postgres.statement_timeout.as_millis(),
    )]);
    let pool = PgPoolOptions::new()
        .max_connections(config.postgres.max_connections)
        .min_connections(config.postgres.min_connections)
        .acquire_timeout(config.postgres.connect_timeout)
        .connect_with(connect_options)
        .await?;
    let store = PostgresStore::from_pool(pool).with_lock_timeout(config.postgres.lock_timeout);
    store.migrate().await?;
    info!("Database ready");

    // Setup services
    let authenticator = JwtAuthenticator::new(
        AuthConfig::new(config.auth.jwt_secret.clone())
            .with_token_ttl(config.auth.token_ttl)
            .with_issuer(config.auth.issuer.clone()),
    )?;
    let state = AppState::new(
        store.clone(),
        Arc::new(Argon2Hasher::new()),
        Arc::new(authenticator),
        Arc::new(SystemClock),
    );

    // Build router
    let app = router(state).layer(TraceLayer::new_for_http());

    let addr = config.server.http_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(address = %addr, "Server listening");

    // Run server with graceful shutdown, bounded by the shutdown timeout
    let shutdown_started = Arc::new(Notify::new());
    let serve = axum::serve(listener, app)
        .with_graceful_shutdown({
            let shutdown_started = Arc::clone(&shutdown_started);
            async move {
                shutdown_signal().await;
                shutdown_started.notify_one();
            }
        })
        .into_future();

    let timeout = config.server.shutdown_timeout;
    tokio::select! {
        result = serve => result?,
        () = async {
            shutdown_started.notified().await;
            tokio::time::sleep(timeout).await;
        } => {
            warn!(?timeout, "Shutdown timeout elapsed, dropping open connections");
        }
    }

    store.pool().close().await;
    info!("Server stopped");
    Ok(())
}

/// Graceful shutdown signal handler.
///
/// Waits for:
/// - Ctrl+C (SIGINT)
/// - SIGTERM (in production environments)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            warn!(%error, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(error) => {
                warn!(%error, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C signal, shutting down gracefully...");
        },
        () = terminate => {
            info!("Received SIGTERM signal, shutting down gracefully...");
        },
    }
}
