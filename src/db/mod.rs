//! Database access: connection managers, query execution and input validation.
//!
//! Two connection managers implement [`ConnectionManager`]:
//! [`pool::PgConnectionManager`] for async callers and
//! [`blocking::BlockingConnectionManager`] for plain threads. Business logic
//! only sees the trait, through [`executor::Executor`].

pub mod blocking;
pub mod executor;
pub mod pool;
pub mod statement;
pub mod validate;

use async_trait::async_trait;
use serde::Serialize;
use sqlx::{pool::PoolConnection, Postgres, Transaction};
use utoipa::ToSchema;

use crate::error::AppResult;

pub use blocking::{BlockingConnection, BlockingConnectionManager};
pub use executor::{AffectedRows, Executor, Fetch, QueryOutcome, Row};
pub use pool::PgConnectionManager;
pub use statement::{ColumnKind, SqlValue, Statement};

/// Snapshot of pool occupancy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct PoolStatus {
    /// Open connections (idle + checked out)
    pub size: u32,
    pub idle: u32,
    pub in_use: u32,
}

/// Hands out and reclaims pooled connections.
///
/// A connection returned by `acquire` belongs to the caller until it is passed
/// back to `release` or dropped; either way it goes back to the pool. A
/// transaction returned by `begin` owns its connection and rolls back when
/// dropped without a commit.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ConnectionManager: Send + Sync {
    /// Check out a connection, initialising the pool on first use.
    /// Waits at most the configured connection timeout.
    async fn acquire(&self) -> AppResult<PoolConnection<Postgres>>;

    async fn release(&self, conn: PoolConnection<Postgres>);

    /// Open a transactional scope on a freshly acquired connection
    async fn begin(&self) -> AppResult<Transaction<'static, Postgres>>;

    /// Run a trivial query; any failure yields `false`
    async fn health_check(&self) -> bool;

    async fn close_all(&self);

    fn status(&self) -> PoolStatus;
}
