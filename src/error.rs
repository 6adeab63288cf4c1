//! Error types for the equipment server

use std::fmt::Display;

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Pool initialisation or acquisition failed (includes acquire timeouts)
    #[error("Connection failure: {0}")]
    ConnectionFailure(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// Classify a driver error raised while obtaining a connection.
    pub fn from_acquire(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut => {
                AppError::ConnectionFailure("timed out waiting for a pooled connection".into())
            }
            sqlx::Error::PoolClosed => AppError::ConnectionFailure("connection pool is closed".into()),
            other => AppError::ConnectionFailure(other.to_string()),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Validation(msg) | AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, msg.clone())
            }
            AppError::ConnectionFailure(msg) => {
                tracing::error!("Connection failure: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
            AppError::Config(e) => {
                tracing::error!("Configuration error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;

/// Collapse a failed operation into its neutral value (empty list, `None`,
/// `false`, empty map) after logging it.
pub trait LogNeutral<T> {
    fn or_neutral<C: Display>(self, context: C) -> T;
}

impl<T: Default> LogNeutral<T> for AppResult<T> {
    fn or_neutral<C: Display>(self, context: C) -> T {
        match self {
            Ok(value) => value,
            Err(AppError::Validation(msg)) => {
                tracing::warn!("{}: {}", context, msg);
                T::default()
            }
            Err(e) => {
                tracing::error!("{}: {}", context, e);
                T::default()
            }
        }
    }
}
