//! Error types for the store boundary and structured API errors.

use crate::types::TaskId;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Errors returned by task store operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// No task with this id exists in the store.
    #[error("task not found: {0}")]
    NotFound(TaskId),

    /// Input rejected by validation.
    #[error("invalid value for {field}: {message}")]
    Validation { field: String, message: String },

    /// The backing database failed.
    #[error("database error: {0}")]
    Database(String),

    /// The store could not be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}

// Allow using ? with anyhow errors from the database layer
impl From<anyhow::Error> for StoreError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<StoreError>() {
            Ok(store_err) => store_err,
            Err(err) => StoreError::Database(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::Database(err.to_string())
    }
}

/// Result type for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InvalidFieldValue,
    TaskNotFound,
    DatabaseError,
    StoreUnavailable,
}

/// Structured error for API responses.
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            field: None,
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ApiError {}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        let message = err.to_string();
        match err {
            StoreError::NotFound(_) => ApiError::new(ErrorCode::TaskNotFound, message),
            StoreError::Validation { field, .. } => {
                ApiError::new(ErrorCode::InvalidFieldValue, message).with_field(field)
            }
            StoreError::Database(_) => ApiError::new(ErrorCode::DatabaseError, message),
            StoreError::Unavailable(_) => ApiError::new(ErrorCode::StoreUnavailable, message),
        }
    }
}
