//! Scoped query execution over a [`ConnectionManager`]

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use indexmap::IndexMap;
use rust_decimal::{prelude::ToPrimitive, Decimal};
use serde_json::Value;
use sqlx::{
    postgres::{PgRow, Postgres},
    Column, FromRow, Row as _, TypeInfo,
};

use super::{statement::bind_params, ConnectionManager, SqlValue, Statement};
use crate::error::AppResult;

/// Execute a statement batch in one transaction on a connection from `manager`,
/// returning the total rows affected. The transaction is dropped, and so rolled
/// back, on the first failure.
pub(crate) async fn run_batch<M>(manager: &M, statements: &[Statement]) -> AppResult<u64>
where
    M: ConnectionManager + ?Sized,
{
    let mut tx = manager.begin().await?;
    let mut affected = 0;
    for statement in statements {
        affected += bind_params!(sqlx::query(&statement.sql), &statement.params)
            .execute(&mut *tx)
            .await?
            .rows_affected();
    }
    tx.commit().await?;
    Ok(affected)
}

/// A result row as an ordered column-name to value mapping
pub type Row = IndexMap<String, Value>;

/// How many rows a generic [`Executor::query`] call should return
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fetch {
    All,
    One,
    None,
}

/// Result of a generic [`Executor::query`] call
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    Rows(Vec<Row>),
    Row(Option<Row>),
    Affected(u64),
}

/// Collapse a rows-affected count into "did anything change"
pub trait AffectedRows {
    fn affected_any(self) -> AppResult<bool>;
}

impl AffectedRows for AppResult<u64> {
    fn affected_any(self) -> AppResult<bool> {
        self.map(|affected| affected > 0)
    }
}

/// Runs statements on connections borrowed from a [`ConnectionManager`].
///
/// Every call acquires exactly one connection and hands it back before
/// returning, whatever the outcome. Writes run inside a transaction that is
/// committed on success and rolled back otherwise.
#[derive(Clone)]
pub struct Executor {
    manager: Arc<dyn ConnectionManager>,
}

impl Executor {
    pub fn new(manager: Arc<dyn ConnectionManager>) -> Self {
        Self { manager }
    }

    pub fn manager(&self) -> &Arc<dyn ConnectionManager> {
        &self.manager
    }

    /// Fetch all rows as `T`, in the order the engine returns them
    pub async fn fetch_all<T>(&self, sql: &str, params: &[SqlValue]) -> AppResult<Vec<T>>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        let mut conn = self.manager.acquire().await?;
        let result = bind_params!(sqlx::query_as::<Postgres, T>(sql), params)
            .fetch_all(&mut *conn)
            .await;
        self.manager.release(conn).await;
        Ok(result?)
    }

    pub async fn fetch_optional<T>(&self, sql: &str, params: &[SqlValue]) -> AppResult<Option<T>>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        let mut conn = self.manager.acquire().await?;
        let result = bind_params!(sqlx::query_as::<Postgres, T>(sql), params)
            .fetch_optional(&mut *conn)
            .await;
        self.manager.release(conn).await;
        Ok(result?)
    }

    /// Fetch all rows as ordered column maps
    pub async fn fetch_rows(&self, sql: &str, params: &[SqlValue]) -> AppResult<Vec<Row>> {
        let mut conn = self.manager.acquire().await?;
        let result = bind_params!(sqlx::query(sql), params)
            .fetch_all(&mut *conn)
            .await;
        self.manager.release(conn).await;
        Ok(result?.iter().map(row_to_map).collect())
    }

    pub async fn fetch_row(&self, sql: &str, params: &[SqlValue]) -> AppResult<Option<Row>> {
        let mut conn = self.manager.acquire().await?;
        let result = bind_params!(sqlx::query(sql), params)
            .fetch_optional(&mut *conn)
            .await;
        self.manager.release(conn).await;
        Ok(result?.as_ref().map(row_to_map))
    }

    /// Execute and commit one statement, returning the number of affected rows
    pub async fn execute(&self, sql: &str, params: &[SqlValue]) -> AppResult<u64> {
        let mut tx = self.manager.begin().await?;
        let affected = bind_params!(sqlx::query(sql), params)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        tx.commit().await?;
        Ok(affected)
    }

    /// Execute and commit one statement that returns a row (`... RETURNING *`)
    pub async fn execute_returning<T>(&self, sql: &str, params: &[SqlValue]) -> AppResult<Option<T>>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        let mut tx = self.manager.begin().await?;
        let row = bind_params!(sqlx::query_as::<Postgres, T>(sql), params)
            .fetch_optional(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(row)
    }

    /// Run every statement on one connection and commit once.
    ///
    /// Any failure rolls back the whole batch.
    pub async fn execute_transaction(&self, statements: &[Statement]) -> AppResult<u64> {
        run_batch(self.manager.as_ref(), statements).await
    }

    /// Generic entry point: fetch all rows, one row, or execute a write.
    ///
    /// With `commit` set the statement runs in its own committed transaction;
    /// rows it returns are honoured according to `fetch`.
    pub async fn query(
        &self,
        sql: &str,
        params: &[SqlValue],
        fetch: Fetch,
        commit: bool,
    ) -> AppResult<QueryOutcome> {
        if !commit {
            return match fetch {
                Fetch::All => self.fetch_rows(sql, params).await.map(QueryOutcome::Rows),
                Fetch::One => self.fetch_row(sql, params).await.map(QueryOutcome::Row),
                Fetch::None => {
                    let mut conn = self.manager.acquire().await?;
                    let result = bind_params!(sqlx::query(sql), params)
                        .execute(&mut *conn)
                        .await;
                    self.manager.release(conn).await;
                    Ok(QueryOutcome::Affected(result?.rows_affected()))
                }
            };
        }

        let mut tx = self.manager.begin().await?;
        let outcome = match fetch {
            Fetch::All => QueryOutcome::Rows(
                bind_params!(sqlx::query(sql), params)
                    .fetch_all(&mut *tx)
                    .await?
                    .iter()
                    .map(row_to_map)
                    .collect(),
            ),
            Fetch::One => QueryOutcome::Row(
                bind_params!(sqlx::query(sql), params)
                    .fetch_optional(&mut *tx)
                    .await?
                    .as_ref()
                    .map(row_to_map),
            ),
            Fetch::None => QueryOutcome::Affected(
                bind_params!(sqlx::query(sql), params)
                    .execute(&mut *tx)
                    .await?
                    .rows_affected(),
            ),
        };
        tx.commit().await?;
        Ok(outcome)
    }
}

/// Decode a row into a JSON map, keeping column order
pub fn row_to_map(row: &PgRow) -> Row {
    row.columns()
        .iter()
        .map(|column| {
            let idx = column.ordinal();
            (column.name().to_string(), decode_column(row, idx, column.type_info().name()))
        })
        .collect()
}

fn decode_column(row: &PgRow, idx: usize, type_name: &str) -> Value {
    fn get<'r, T>(row: &'r PgRow, idx: usize) -> Option<T>
    where
        T: sqlx::Decode<'r, Postgres> + sqlx::Type<Postgres>,
    {
        row.try_get::<Option<T>, _>(idx).ok().flatten()
    }

    let value = match type_name {
        "BOOL" => get::<bool>(row, idx).map(Value::from),
        "INT2" => get::<i16>(row, idx).map(Value::from),
        "INT4" => get::<i32>(row, idx).map(Value::from),
        "INT8" => get::<i64>(row, idx).map(Value::from),
        "FLOAT4" => get::<f32>(row, idx).map(Value::from),
        "FLOAT8" => get::<f64>(row, idx).map(Value::from),
        "NUMERIC" => get::<Decimal>(row, idx).and_then(|d| d.to_f64()).map(Value::from),
        "TIMESTAMPTZ" => get::<DateTime<Utc>>(row, idx).map(|t| Value::from(t.to_rfc3339())),
        "TIMESTAMP" => get::<NaiveDateTime>(row, idx).map(|t| Value::from(t.to_string())),
        "DATE" => get::<NaiveDate>(row, idx).map(|d| Value::from(d.to_string())),
        "JSON" | "JSONB" => get::<Value>(row, idx),
        _ => get::<String>(row, idx).map(Value::from),
    };
    value.unwrap_or(Value::Null)
}
