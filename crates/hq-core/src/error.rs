//! # AppError
//!
//! Centralized error handling for the HOYO HQ ecosystem.
//! `StoreError` is what remote document stores report; `AppError` is what
//! repository callers see.

use serde::Serialize;
use thiserror::Error;

/// The primary error type for all repository operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    /// Resource not found (e.g., Profile, Post, Reply)
    #[error("{0} not found with ID {1}")]
    NotFound(String, String),

    /// Rejected before any I/O (e.g., blank name, constellation out of range)
    #[error("validation error: {0}")]
    ValidationError(String),

    /// The remote store refused the operation under its access rules
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Network or other remote failure; retrying may succeed
    #[error("remote unavailable: {0}")]
    Transient(String),

    /// Forum authorship check failed (only the author may edit or delete)
    #[error("unauthorized: {0}")]
    Unauthorized(String),
}

impl AppError {
    pub fn class(&self) -> ErrorClass {
        match self {
            AppError::PermissionDenied(_) => ErrorClass::Permission,
            _ => ErrorClass::Other,
        }
    }
}

/// A specialized Result type for HOYO HQ logic.
pub type Result<T> = std::result::Result<T, AppError>;

/// Failures reported by a `DocumentStore` implementation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("document {collection}/{id} does not exist")]
    NotFound { collection: String, id: String },

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("malformed document: {0}")]
    Malformed(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Malformed(err.to_string())
    }
}

/// Coarse classification used to pick user-facing messaging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorClass {
    Permission,
    Other,
}

const PERMISSION_KEYWORD: &str = "permission";

impl StoreError {
    /// `Permission` for an explicit denial or any message mentioning
    /// permissions (some backends only signal it in the text).
    pub fn class(&self) -> ErrorClass {
        match self {
            StoreError::PermissionDenied(_) => ErrorClass::Permission,
            other if other.to_string().to_lowercase().contains(PERMISSION_KEYWORD) => {
                ErrorClass::Permission
            }
            _ => ErrorClass::Other,
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        let class = err.class();
        match err {
            StoreError::NotFound { collection, id } => AppError::NotFound(collection, id),
            other if class == ErrorClass::Permission => AppError::PermissionDenied(other.to_string()),
            other => AppError::Transient(other.to_string()),
        }
    }
}
