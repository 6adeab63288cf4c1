//! Pooled PostgreSQL connection manager for async callers

use async_trait::async_trait;
use sqlx::{
    pool::PoolConnection,
    postgres::{PgPool, PgPoolOptions},
    Postgres, Transaction,
};
use tokio::sync::OnceCell;

use super::{ConnectionManager, PoolStatus};
use crate::{
    config::DatabaseConfig,
    error::{AppError, AppResult},
};

/// Connection manager over a lazily created `sqlx` pool.
///
/// Construction never touches the network; the pool is opened by the first
/// `acquire`, `begin` or `health_check`.
pub struct PgConnectionManager {
    config: DatabaseConfig,
    pool: OnceCell<PgPool>,
}

impl PgConnectionManager {
    pub fn new(config: DatabaseConfig) -> Self {
        Self {
            config,
            pool: OnceCell::new(),
        }
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    /// The underlying pool, opening it if needed
    pub async fn pool(&self) -> AppResult<&PgPool> {
        self.pool
            .get_or_try_init(|| async {
                let pool = PgPoolOptions::new()
                    .min_connections(self.config.min_connections)
                    .max_connections(self.config.max_connections)
                    .acquire_timeout(self.config.acquire_timeout())
                    .connect_with(self.config.connect_options())
                    .await
                    .map_err(|e| {
                        tracing::error!("Failed to initialize database connection pool: {}", e);
                        AppError::ConnectionFailure(e.to_string())
                    })?;
                tracing::info!(
                    "Database connection pool initialized ({}:{}/{}, max {} connections)",
                    self.config.host,
                    self.config.port,
                    self.config.name,
                    self.config.max_connections
                );
                Ok::<_, AppError>(pool)
            })
            .await
    }
}

#[async_trait]
impl ConnectionManager for PgConnectionManager {
    async fn acquire(&self) -> AppResult<PoolConnection<Postgres>> {
        self.pool()
            .await?
            .acquire()
            .await
            .map_err(AppError::from_acquire)
    }

    async fn release(&self, conn: PoolConnection<Postgres>) {
        // Dropping a PoolConnection hands it back to its pool.
        drop(conn);
    }

    async fn begin(&self) -> AppResult<Transaction<'static, Postgres>> {
        self.pool()
            .await?
            .begin()
            .await
            .map_err(AppError::from_acquire)
    }

    async fn health_check(&self) -> bool {
        let pool = match self.pool().await {
            Ok(pool) => pool,
            Err(e) => {
                tracing::error!("Database health check failed: {}", e);
                return false;
            }
        };
        match sqlx::query_scalar::<_, i32>("SELECT 1").fetch_one(pool).await {
            Ok(_) => true,
            Err(e) => {
                tracing::error!("Database health check failed: {}", e);
                false
            }
        }
    }

    async fn close_all(&self) {
        if let Some(pool) = self.pool.get() {
            pool.close().await;
            tracing::info!("Database connection pool closed");
        }
    }

    fn status(&self) -> PoolStatus {
        match self.pool.get() {
            Some(pool) => {
                let size = pool.size();
                let idle = pool.num_idle() as u32;
                PoolStatus {
                    size,
                    idle,
                    in_use: size.saturating_sub(idle),
                }
            }
            None => PoolStatus::default(),
        }
    }
}
