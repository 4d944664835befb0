//! Error handling module.
//!
//! This module provides unified error handling with proper HTTP status code mapping
//! and standardized API error responses.

pub mod codes;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::{Value, json};

pub use codes::ErrorCode;

use crate::domain::SlotKey;

/// Application-level error type.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Participant name is empty or blank.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Slot number is not one of `00`..`99`.
    #[error("Invalid slot: {0}")]
    InvalidSlot(String),

    /// The slot is held by someone else.
    #[error("Number {slot} was already taken by {name}")]
    AlreadyReserved {
        /// Contested slot.
        slot: SlotKey,
        /// Name of the current holder.
        name: String,
    },

    /// Reset requested without confirmation.
    #[error("Reset must be confirmed")]
    ResetNotConfirmed,

    /// Admin passphrase missing or wrong.
    #[error("Authentication failed")]
    Unauthorized,

    /// Invalid request parameters.
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Storage backend failed to initialize or to run an operation.
    #[error("Storage backend unavailable: {0}")]
    BackendUnavailable(#[from] StorageError),
}

impl AppError {
    /// Get the error code for this error.
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::InvalidInput(_) => ErrorCode::INVALID_NAME,
            Self::InvalidSlot(_) => ErrorCode::INVALID_SLOT,
            Self::AlreadyReserved { .. } => ErrorCode::ALREADY_RESERVED,
            Self::ResetNotConfirmed => ErrorCode::RESET_NOT_CONFIRMED,
            Self::Unauthorized => ErrorCode::UNAUTHORIZED,
            Self::BadRequest(_) => ErrorCode::BAD_REQUEST,
            Self::BackendUnavailable(_) => ErrorCode::STORAGE_ERROR,
        }
    }

    /// Get the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidInput(_)
            | Self::InvalidSlot(_)
            | Self::BadRequest(_)
            | Self::ResetNotConfirmed => StatusCode::BAD_REQUEST,
            Self::AlreadyReserved { .. } => StatusCode::CONFLICT,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::BackendUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Structured details carried in the response `data` field.
    fn details(&self) -> Value {
        match self {
            Self::AlreadyReserved { slot, name } => json!({
                "number": slot,
                "name": name,
            }),
            _ => Value::Null,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code();
        let code = error_code.as_i32();
        let category = error_code.category();
        let message = self.to_string();

        if status.is_server_error() {
            tracing::error!(
                error_code = code,
                category = %category,
                status = %status,
                message = %message,
                "Request failed"
            );
        } else {
            tracing::info!(
                error_code = code,
                category = %category,
                status = %status,
                message = %message,
                "Request rejected"
            );
        }

        let body = Json(json!({
            "code": code,
            "message": message,
            "data": self.details()
        }));

        (status, body).into_response()
    }
}

/// Storage-specific error type.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Connection error.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Query execution error.
    #[error("Query failed: {0}")]
    Query(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Transaction kept losing to concurrent writers.
    #[error("Concurrent modification detected on {0}")]
    ConcurrentModification(String),

    /// Lock acquisition failed.
    #[error("Failed to acquire lock: {0}")]
    LockFailed(String),

    /// File I/O error.
    #[error("File I/O error: {0}")]
    FileIO(String),

    /// Backend not available.
    #[error("Storage backend unavailable")]
    Unavailable,
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        Self::FileIO(err.to_string())
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<deadpool_redis::redis::RedisError> for StorageError {
    fn from(err: deadpool_redis::redis::RedisError) -> Self {
        if err.is_io_error() {
            Self::Connection(err.to_string())
        } else {
            Self::Query(err.to_string())
        }
    }
}

impl From<deadpool_redis::PoolError> for StorageError {
    fn from(err: deadpool_redis::PoolError) -> Self {
        Self::Connection(err.to_string())
    }
}

/// Result type alias using `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Result type alias using `StorageError`.
pub type StorageResult<T> = std::result::Result<T, StorageError>;
