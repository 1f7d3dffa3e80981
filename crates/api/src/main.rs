use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::info;

mod app;
mod config;
mod error;
mod extractors;
mod jobs;
mod middleware;
mod routes;
mod services;

use jobs::{FulfillmentRetryJob, JobScheduler, PlaytimeRewardsJob, PoolMetricsJob};
use services::{CommandExecutor, FulfillmentService, RconExecutor, TelegramNotifier};
use shared::jwt::JwtConfig;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Load configuration
    let config = config::Config::load()?;

    // Initialize logging and metrics
    middleware::logging::init_logging(&config.logging);
    middleware::init_metrics();

    info!("Starting EmberCraft backend v{}", env!("CARGO_PKG_VERSION"));

    // Create database pool
    let pool = persistence::db::create_pool(&persistence::db::DatabaseConfig {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        min_connections: config.database.min_connections,
        connect_timeout_secs: config.database.connect_timeout_secs,
        idle_timeout_secs: config.database.idle_timeout_secs,
    })
    .await?;

    // Run migrations
    info!("Running database migrations...");
    sqlx::migrate!("../persistence/src/migrations")
        .run(&pool)
        .await?;
    info!("Migrations completed");

    // Wire up shared services
    let jwt = Arc::new(JwtConfig::with_leeway(
        &config.jwt.private_key,
        &config.jwt.public_key,
        config.jwt.access_token_expiry_secs,
        config.jwt.refresh_token_expiry_secs,
        config.jwt.leeway_secs,
    )?);

    let executor = Arc::new(RconExecutor::new(config.rcon.clone()));
    let fulfillment = Arc::new(FulfillmentService::new(
        pool.clone(),
        executor.clone() as Arc<dyn CommandExecutor>,
        Duration::from_millis(config.shop.command_delay_ms),
        config.shop.max_retries,
    ));
    let notifier = Arc::new(TelegramNotifier::new(config.telegram.clone()));

    // Background jobs
    let mut scheduler = JobScheduler::new();
    scheduler.register(FulfillmentRetryJob::new(
        fulfillment.clone(),
        config.shop.retry_batch_size,
        config.shop.retry_interval_minutes,
    ));
    if config.rewards.enabled {
        scheduler.register(PlaytimeRewardsJob::new(
            pool.clone(),
            notifier,
            config.rewards.coins_per_minute,
            config.rewards.interval_minutes,
        ));
    }
    scheduler.register(PoolMetricsJob::new(pool.clone()));
    scheduler.start();

    // Build application
    let addr = config.socket_addr();
    let app = app::create_app(config, pool, jwt, executor.clone(), fulfillment);

    // Start server
    info!("Server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Drain background work and close remote connections
    info!("Shutting down");
    scheduler.shutdown();
    scheduler.wait_for_shutdown(Duration::from_secs(10)).await;
    executor.shutdown().await;

    Ok(())
}

/// Resolves when SIGINT or SIGTERM arrives.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
