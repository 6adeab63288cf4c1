//! Connection manager for callers on plain (non-async) threads

use std::future::Future;
use std::mem::ManuallyDrop;
use std::ops::{Deref, DerefMut};

use async_trait::async_trait;
use sqlx::{pool::PoolConnection, PgConnection, Postgres, Transaction};
use tokio::runtime::{Builder, Handle, Runtime};

use super::{executor::run_batch, ConnectionManager, PgConnectionManager, PoolStatus, Statement};
use crate::{
    config::DatabaseConfig,
    error::{AppError, AppResult},
};

/// A pooled connection checked out from a plain thread.
///
/// sqlx hands a connection back to its pool from a spawned task, which needs a
/// runtime context. Dropping this guard enters the owning manager's runtime
/// first, so the connection is returned on every exit path.
pub struct BlockingConnection {
    conn: ManuallyDrop<PoolConnection<Postgres>>,
    handle: Handle,
}

impl Deref for BlockingConnection {
    type Target = PgConnection;

    fn deref(&self) -> &PgConnection {
        &self.conn
    }
}

impl DerefMut for BlockingConnection {
    fn deref_mut(&mut self) -> &mut PgConnection {
        &mut self.conn
    }
}

impl Drop for BlockingConnection {
    fn drop(&mut self) {
        let _runtime = self.handle.enter();
        // SAFETY: `conn` is never used again after this point.
        unsafe { ManuallyDrop::drop(&mut self.conn) };
    }
}

/// Blocking facade over a [`PgConnectionManager`].
///
/// The pool and its I/O live on a small runtime owned by this manager, so the
/// `*_blocking` methods may be called from any thread that is not itself
/// driving a Tokio runtime. The [`ConnectionManager`] impl delegates to the
/// same pool, which lets repository code run unchanged through [`Self::block_on`].
pub struct BlockingConnectionManager {
    runtime: Runtime,
    inner: PgConnectionManager,
}

impl BlockingConnectionManager {
    pub fn new(config: DatabaseConfig) -> AppResult<Self> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("db-blocking")
            .enable_all()
            .build()
            .map_err(|e| AppError::ConnectionFailure(format!("failed to start database runtime: {}", e)))?;

        Ok(Self {
            runtime,
            inner: PgConnectionManager::new(config),
        })
    }

    pub fn config(&self) -> &DatabaseConfig {
        self.inner.config()
    }

    /// Run a future to completion on the manager's runtime.
    ///
    /// Panics if called from within an async context.
    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }

    /// Check out a connection; it goes back to the pool when passed to
    /// [`Self::release_blocking`] or dropped.
    pub fn acquire_blocking(&self) -> AppResult<BlockingConnection> {
        let conn = self.block_on(self.inner.acquire())?;
        Ok(BlockingConnection {
            conn: ManuallyDrop::new(conn),
            handle: self.runtime.handle().clone(),
        })
    }

    pub fn release_blocking(&self, conn: BlockingConnection) {
        drop(conn);
    }

    pub fn health_check_blocking(&self) -> bool {
        self.block_on(self.inner.health_check())
    }

    /// Execute a batch on one connection, committing once; any failure rolls
    /// back the whole batch and the connection is returned either way.
    pub fn transaction_blocking(&self, statements: &[Statement]) -> AppResult<u64> {
        self.block_on(run_batch(&self.inner, statements))
    }

    pub fn close_all_blocking(&self) {
        self.block_on(self.inner.close_all())
    }
}

#[async_trait]
impl ConnectionManager for BlockingConnectionManager {
    async fn acquire(&self) -> AppResult<PoolConnection<Postgres>> {
        self.inner.acquire().await
    }

    async fn release(&self, conn: PoolConnection<Postgres>) {
        self.inner.release(conn).await
    }

    async fn begin(&self) -> AppResult<Transaction<'static, Postgres>> {
        self.inner.begin().await
    }

    async fn health_check(&self) -> bool {
        self.inner.health_check().await
    }

    async fn close_all(&self) {
        self.inner.close_all().await
    }

    fn status(&self) -> PoolStatus {
        self.inner.status()
    }
}
