//! SQL statements with dynamically typed parameters

use std::str::FromStr;

use rust_decimal::Decimal;
use serde_json::Value;

use super::validate::Payload;
use crate::error::{AppError, AppResult};

/// Storage type of a column, used to convert JSON input and to type NULLs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Integer,
    Decimal,
    Boolean,
}

/// A bind parameter
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Text(String),
    Int(i32),
    BigInt(i64),
    Decimal(Decimal),
    Bool(bool),
    /// NULL bound with the type of the target column
    Null(ColumnKind),
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(v.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::Text(v)
    }
}

impl From<i32> for SqlValue {
    fn from(v: i32) -> Self {
        SqlValue::Int(v)
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        SqlValue::BigInt(v)
    }
}

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        SqlValue::Bool(v)
    }
}

impl From<Decimal> for SqlValue {
    fn from(v: Decimal) -> Self {
        SqlValue::Decimal(v)
    }
}

impl From<Option<String>> for SqlValue {
    fn from(v: Option<String>) -> Self {
        v.map(SqlValue::Text).unwrap_or(SqlValue::Null(ColumnKind::Text))
    }
}

impl SqlValue {
    /// Convert a JSON value into a parameter for a column of the given kind
    pub fn from_json(field: &str, value: &Value, kind: ColumnKind) -> AppResult<Self> {
        let invalid = || AppError::Validation(format!("{} has an invalid value: {}", field, value));

        if value.is_null() {
            return Ok(SqlValue::Null(kind));
        }

        match kind {
            ColumnKind::Text => match value {
                Value::String(s) => Ok(SqlValue::Text(s.clone())),
                Value::Number(_) | Value::Bool(_) => Ok(SqlValue::Text(value.to_string())),
                _ => Err(invalid()),
            },
            ColumnKind::Integer => value
                .as_i64()
                .and_then(|v| i32::try_from(v).ok())
                .map(SqlValue::Int)
                .ok_or_else(invalid),
            ColumnKind::Decimal => match value {
                Value::Number(n) => Decimal::from_str(&n.to_string())
                    .or_else(|_| Decimal::from_scientific(&n.to_string()))
                    .map(SqlValue::Decimal)
                    .map_err(|_| invalid()),
                Value::String(s) => Decimal::from_str(s.trim())
                    .map(SqlValue::Decimal)
                    .map_err(|_| invalid()),
                _ => Err(invalid()),
            },
            ColumnKind::Boolean => value.as_bool().map(SqlValue::Bool).ok_or_else(invalid),
        }
    }

    /// Parameter for `field` of `data`, NULL when absent
    pub fn field(data: &Payload, field: &str, kind: ColumnKind) -> AppResult<Self> {
        match data.get(field) {
            Some(value) => Self::from_json(field, value, kind),
            None => Ok(SqlValue::Null(kind)),
        }
    }
}

/// One SQL statement and its parameters
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

impl Statement {
    pub fn new(sql: impl Into<String>, params: Vec<SqlValue>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }
}

/// Build `UPDATE <table> SET ... WHERE id = $n` from a partial payload.
///
/// Only fields named in `columns` are written, in `columns` order; anything
/// else in the payload (including `id`) is ignored. `updated_at` is always
/// refreshed. Returns `None` when the payload names no updatable field.
pub fn build_update(
    table: &str,
    columns: &[(&str, ColumnKind)],
    id: i32,
    data: &Payload,
) -> AppResult<Option<Statement>> {
    let mut sets = Vec::new();
    let mut params = Vec::new();

    for (column, kind) in columns {
        if *column == "id" {
            continue;
        }
        if let Some(value) = data.get(*column) {
            params.push(SqlValue::from_json(column, value, *kind)?);
            sets.push(format!("{} = ${}", column, params.len()));
        }
    }

    if sets.is_empty() {
        return Ok(None);
    }

    params.push(SqlValue::Int(id));
    let sql = format!(
        "UPDATE {} SET {}, updated_at = NOW() WHERE id = ${}",
        table,
        sets.join(", "),
        params.len()
    );
    Ok(Some(Statement::new(sql, params)))
}

/// Bind every `SqlValue` of a slice onto a `sqlx` query or query_as builder.
macro_rules! bind_params {
    ($query:expr, $params:expr) => {{
        let mut query = $query;
        for param in $params {
            query = match param {
                $crate::db::SqlValue::Text(v) => query.bind(v.clone()),
                $crate::db::SqlValue::Int(v) => query.bind(*v),
                $crate::db::SqlValue::BigInt(v) => query.bind(*v),
                $crate::db::SqlValue::Decimal(v) => query.bind(*v),
                $crate::db::SqlValue::Bool(v) => query.bind(*v),
                $crate::db::SqlValue::Null(kind) => match kind {
                    $crate::db::ColumnKind::Text => query.bind(None::<String>),
                    $crate::db::ColumnKind::Integer => query.bind(None::<i32>),
                    $crate::db::ColumnKind::Decimal => query.bind(None::<rust_decimal::Decimal>),
                    $crate::db::ColumnKind::Boolean => query.bind(None::<bool>),
                },
            };
        }
        query
    }};
}

pub(crate) use bind_params;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const COLUMNS: &[(&str, ColumnKind)] = &[
        ("name", ColumnKind::Text),
        ("weight", ColumnKind::Decimal),
        ("quantity", ColumnKind::Integer),
    ];

    fn payload(value: Value) -> Payload {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_build_update_uses_allow_list() {
        let data = payload(json!({
            "id": 99,
            "weight": 12.5,
            "unknown_column": "dropped",
            "name": "Subwoofer",
        }));

        let stmt = build_update("equipment", COLUMNS, 7, &data).unwrap().unwrap();
        assert_eq!(
            stmt.sql,
            "UPDATE equipment SET name = $1, weight = $2, updated_at = NOW() WHERE id = $3"
        );
        assert_eq!(
            stmt.params,
            vec![
                SqlValue::Text("Subwoofer".into()),
                SqlValue::Decimal(Decimal::new(125, 1)),
                SqlValue::Int(7),
            ]
        );
    }

    #[test]
    fn test_build_update_without_known_fields() {
        let data = payload(json!({ "id": 1, "color": "red" }));
        assert!(build_update("equipment", COLUMNS, 1, &data).unwrap().is_none());
    }

    #[test]
    fn test_build_update_rejects_bad_types() {
        let data = payload(json!({ "quantity": "many" }));
        tokio_test::assert_err!(build_update("equipment", COLUMNS, 1, &data));
    }

    #[test]
    fn test_null_is_typed() {
        let v = SqlValue::from_json("weight", &Value::Null, ColumnKind::Decimal).unwrap();
        assert_eq!(v, SqlValue::Null(ColumnKind::Decimal));
    }

    #[test]
    fn test_decimal_from_string_and_number() {
        assert_eq!(
            SqlValue::from_json("price", &json!("49.99"), ColumnKind::Decimal).unwrap(),
            SqlValue::Decimal(Decimal::new(4999, 2))
        );
        assert_eq!(
            SqlValue::from_json("price", &json!(20), ColumnKind::Decimal).unwrap(),
            SqlValue::Decimal(Decimal::new(20, 0))
        );
    }

    #[test]
    fn test_missing_field_is_null() {
        let data = payload(json!({}));
        assert_eq!(
            SqlValue::field(&data, "brand", ColumnKind::Text).unwrap(),
            SqlValue::Null(ColumnKind::Text)
        );
    }
}
