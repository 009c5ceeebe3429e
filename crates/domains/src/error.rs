//! # AppError
//!
//! Centralized error handling for the Chillspot engine.
//! Every port and service returns one of these kinds; the HTTP layer maps
//! each kind to a stable status code.

use thiserror::Error;

/// The primary error type for all domain operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    /// Malformed IDs, missing fields, self-referential requests
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Missing or invalid caller identity
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Caller is known but not allowed to do this (e.g. review before visit)
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Resource not found (e.g., User, Spot, FriendRequest)
    #[error("{0} not found with ID {1}")]
    NotFound(String, String),

    /// Duplicate request, friendship, visit, review or badge
    #[error("conflict: {0}")]
    Conflict(String),

    /// Infrastructure failure (e.g., DB down, transaction aborted)
    #[error("internal service error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn not_found(entity: &str, id: impl ToString) -> Self {
        AppError::NotFound(entity.to_string(), id.to_string())
    }

    /// Short machine-readable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::InvalidArgument(_) => "invalid_argument",
            AppError::Unauthorized(_) => "unauthorized",
            AppError::Forbidden(_) => "forbidden",
            AppError::NotFound(..) => "not_found",
            AppError::Conflict(_) => "conflict",
            AppError::Internal(_) => "internal",
        }
    }
}

/// A specialized Result type for Chillspot logic.
pub type Result<T> = std::result::Result<T, AppError>;
