//! Equipment Server - rental catalog search API

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use equipment_server::{
    api,
    config::{AppConfig, LoggingConfig},
    db::{ConnectionManager, PgConnectionManager},
    repository::Repository,
    AppState,
};

/// Install the global tracing subscriber
fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("equipment_server={},tower_http=debug,sqlx=warn", logging.level).into()
    });

    let registry = tracing_subscriber::registry().with(filter);
    if logging.format == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;
    init_tracing(&config.logging);

    tracing::info!("Starting Equipment Server v{}", env!("CARGO_PKG_VERSION"));

    let manager = Arc::new(PgConnectionManager::new(config.database.clone()));

    // Run migrations
    {
        let mut conn = manager.acquire().await.context("Failed to connect to database")?;
        sqlx::migrate!("./migrations")
            .run(&mut *conn)
            .await
            .context("Failed to run database migrations")?;
    }
    tracing::info!(
        "Connected to database {} at {}:{}",
        config.database.name,
        config.database.host,
        config.database.port
    );

    let addr = SocketAddr::new(
        config.server.host.parse().context("Invalid host address")?,
        config.server.port,
    );

    let repository = Arc::new(Repository::new(manager));
    let state = AppState {
        config: Arc::new(config),
        repository: repository.clone(),
    };

    let app = api::create_router(state);

    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    repository.shutdown().await;
    tracing::info!("Server stopped");

    Ok(())
}
