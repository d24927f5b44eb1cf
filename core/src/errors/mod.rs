//! Domain-specific error types and error handling.

mod types;

pub use types::{DeliveryError, OtpError};

use thiserror::Error;
use uuid::Uuid;

/// Core domain errors
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Resource not found: {resource}")]
    NotFound { resource: String },

    /// Preferences refuse the notification
    #[error("Notification blocked by preferences: {reason}")]
    PolicyDenied { reason: String },

    #[error("Storage error: {message}")]
    Storage { message: String },

    /// The code was stored but could not be delivered
    #[error("OTP {otp_id} was created but could not be delivered: {source}")]
    OtpDispatch {
        otp_id: Uuid,
        #[source]
        source: Box<DomainError>,
    },

    // Bridge to specific error types
    #[error(transparent)]
    Delivery(#[from] DeliveryError),

    #[error(transparent)]
    Otp(#[from] OtpError),
}

impl DomainError {
    pub fn validation(message: impl Into<String>) -> Self {
        DomainError::Validation { message: message.into() }
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        DomainError::NotFound { resource: resource.into() }
    }

    pub fn storage(message: impl ToString) -> Self {
        DomainError::Storage { message: message.to_string() }
    }

    /// Stable error code for callers that translate errors to responses
    pub fn code(&self) -> &'static str {
        match self {
            DomainError::Validation { .. } => "VALIDATION_ERROR",
            DomainError::NotFound { .. } => "NOT_FOUND",
            DomainError::PolicyDenied { .. } => "POLICY_DENIED",
            DomainError::Storage { .. } => "STORAGE_ERROR",
            DomainError::OtpDispatch { .. } => "OTP_DISPATCH_FAILED",
            DomainError::Delivery(err) => err.code(),
            DomainError::Otp(err) => err.code(),
        }
    }
}

pub type DomainResult<T> = Result<T, DomainError>;

#[cfg(test)]
mod tests;
