//! Error types for todo
//!
//! Exit codes:
//! - 0: Success
//! - 2: User error (invalid input, unknown task, duplicate attachment)
//! - 4: Operation failed (I/O, serialization, lock contention)

use std::path::PathBuf;
use thiserror::Error;

use crate::validate::ValidationErrors;

/// Exit codes for the todo CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const USER_ERROR: i32 = 2;
    pub const OPERATION_FAILED: i32 = 4;
}

/// Main error type for todo operations
#[derive(Error, Debug)]
pub enum Error {
    // User errors (exit code 2)
    #[error("Invalid task: {0}")]
    Validation(ValidationErrors),

    #[error("Attachment already added: {name} ({size} bytes)")]
    DuplicateAttachment { name: String, size: u64 },

    #[error("Position {index} out of range (collection has {len} entries)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Task not found: #{0}")]
    TaskNotFound(u64),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // Operation failures (exit code 4)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Lock acquisition failed: {0}")]
    LockFailed(PathBuf),

    #[error("Operation failed: {0}")]
    OperationFailed(String),
}

impl Error {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Validation(_)
            | Error::DuplicateAttachment { .. }
            | Error::IndexOutOfRange { .. }
            | Error::TaskNotFound(_)
            | Error::InvalidArgument(_)
            | Error::InvalidConfig(_) => exit_codes::USER_ERROR,

            Error::Io(_)
            | Error::Json(_)
            | Error::TomlParse(_)
            | Error::LockFailed(_)
            | Error::OperationFailed(_) => exit_codes::OPERATION_FAILED,
        }
    }

    /// Short machine-readable category for JSON output
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Validation(_) => "validation",
            Error::DuplicateAttachment { .. } => "duplicate_attachment",
            Error::TaskNotFound(_) | Error::IndexOutOfRange { .. } => "not_found",
            Error::LockFailed(_) => "lock_failed",
            _ if self.exit_code() == exit_codes::USER_ERROR => "user_error",
            _ => "operation_failed",
        }
    }

    /// Structured details for the JSON error envelope
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            Error::Validation(errors) => serde_json::to_value(errors).ok(),
            Error::DuplicateAttachment { name, size } => {
                Some(serde_json::json!({ "name": name, "size": size }))
            }
            Error::IndexOutOfRange { index, len } => {
                Some(serde_json::json!({ "index": index, "len": len }))
            }
            Error::TaskNotFound(id) => Some(serde_json::json!({ "id": id })),
            _ => None,
        }
    }
}

impl From<ValidationErrors> for Error {
    fn from(errors: ValidationErrors) -> Self {
        Error::Validation(errors)
    }
}

/// Result type alias for todo operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error body of the JSON envelope
#[derive(Debug, serde::Serialize)]
pub struct JsonError {
    pub message: String,
    pub code: i32,
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl From<&Error> for JsonError {
    fn from(err: &Error) -> Self {
        JsonError {
            message: err.to_string(),
            code: err.exit_code(),
            kind: err.kind(),
            details: err.details(),
        }
    }
}
