//! Error taxonomy shared by every Rollboard interface.
//!
//! Read-time problems (missing file, unreadable file, malformed JSON) are never
//! errors: they degrade to a default document. Only writes and request
//! validation produce the errors below.

use thiserror::Error;

/// Failure while writing a document to disk.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Domain error returned by Rollboard operations.
#[derive(Error, Debug)]
pub enum DashboardError {
    /// Malformed request body: missing required fields or wrong shape.
    #[error("{0}")]
    Validation(String),

    /// Referenced user, file or entry does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Duplicate username or timestamp.
    #[error("{0}")]
    Conflict(String),

    /// Operation refused on a protected resource.
    #[error("{0}")]
    Forbidden(String),

    /// Upload exceeds the configured size limit.
    #[error("{0}")]
    PayloadTooLarge(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),
}

impl DashboardError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    /// Short machine-readable tag for error payloads.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::NotFound(_) => "not_found",
            Self::Conflict(_) => "conflict",
            Self::Forbidden(_) => "forbidden",
            Self::PayloadTooLarge(_) => "payload_too_large",
            Self::Storage(_) => "storage_error",
        }
    }
}

impl From<std::io::Error> for DashboardError {
    fn from(e: std::io::Error) -> Self {
        Self::Storage(StoreError::Io(e))
    }
}

pub type Result<T> = std::result::Result<T, DashboardError>;
