//! Wallet Core - API Server Binary
//!
//! Starts the HTTP API server and the scheduled-payment sweep task.
//!
//! # Usage
//!
//! ```bash
//! # Run with default configuration
//! cargo run --bin wallet-api
//!
//! # Run with environment variables
//! API_HOST=0.0.0.0 API_PORT=8080 DATABASE_URL=postgres://... cargo run --bin wallet-api
//! ```
//!
//! # Environment Variables
//!
//! * `API_HOST` - Server host (default: 0.0.0.0)
//! * `API_PORT` - Server port (default: 8080)
//! * `API_JWT_SECRET` - JWT signing secret (required in production)
//! * `API_DATABASE_URL` - PostgreSQL connection string
//! * `API_PROVIDER_SECRET` - Shared secret for provider signatures
//! * `API_SWEEP_INTERVAL_MINS` - Minutes between sweeps (default: 60)
//! * `API_LOG_LEVEL` - Log level: trace, debug, info, warn, error (default: info)

use std::net::SocketAddr;
use std::time::Duration;

use chrono::Utc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use interface_api::{config::ApiConfig, router_with_state, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present (useful for local development)
    dotenvy::dotenv().ok();

    let config = load_config()?;
    init_tracing(&config.log_level);

    tracing::info!(
        host = %config.host,
        port = %config.port,
        "Starting Wallet Core API Server"
    );

    let pool = create_database_pool(&config.database_url).await?;
    infra_db::run_migrations(&pool).await?;

    let state = AppState::new(pool, config.clone());
    spawn_sweep_task(state.clone(), config.sweep_interval_mins);

    let app = router_with_state(state);
    let addr: SocketAddr = config.server_addr().parse()?;

    tracing::info!(%addr, "Server listening");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Loads API configuration from environment variables
fn load_config() -> Result<ApiConfig, Box<dyn std::error::Error>> {
    let config = ApiConfig::from_env().unwrap_or_else(|_| ApiConfig {
        host: std::env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
        port: std::env::var("API_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080),
        jwt_secret: std::env::var("API_JWT_SECRET")
            .unwrap_or_else(|_| "dev-secret-change-in-production".to_string()),
        jwt_expiration_secs: std::env::var("API_JWT_EXPIRATION_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(3600),
        database_url: std::env::var("DATABASE_URL")
            .or_else(|_| std::env::var("API_DATABASE_URL"))
            .unwrap_or_else(|_| "postgres://localhost/wallet".to_string()),
        provider_secret: std::env::var("API_PROVIDER_SECRET")
            .unwrap_or_else(|_| "dev-secret-change-in-production".to_string()),
        sweep_interval_mins: std::env::var("API_SWEEP_INTERVAL_MINS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(60),
        log_level: std::env::var("API_LOG_LEVEL")
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or_else(|_| "info".to_string()),
    });

    Ok(config)
}

/// Initializes the tracing subscriber for structured logging
fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

/// Creates a PostgreSQL connection pool
async fn create_database_pool(database_url: &str) -> Result<sqlx::PgPool, sqlx::Error> {
    tracing::info!("Connecting to database...");

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(30))
        .connect(database_url)
        .await?;

    tracing::info!("Database connection established");
    Ok(pool)
}

/// Spawns the periodic scheduled-payment sweep
///
/// Runs a catch-up sweep shortly after startup (the sweep query is keyed
/// by the persisted next-run time, so payments missed during downtime are
/// picked up), then fires on the configured interval.
fn spawn_sweep_task(state: AppState, interval_mins: u64) {
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(5)).await;
        let summary = state.runner.sweep(Utc::now()).await;
        tracing::info!(
            processed = summary.processed,
            failed = summary.failed,
            "Startup catch-up sweep finished"
        );

        let mut ticker =
            tokio::time::interval(Duration::from_secs(interval_mins.max(1) * 60));
        ticker.tick().await; // first tick fires immediately; already swept
        loop {
            ticker.tick().await;
            state.runner.sweep(Utc::now()).await;
        }
    });

    tracing::info!(interval_mins, "Scheduled-payment sweep task started");
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
