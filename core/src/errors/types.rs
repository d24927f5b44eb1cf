//! Specific error types for code verification and message delivery

use thiserror::Error;

/// Verification outcomes that reject a submitted code
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OtpError {
    /// No code matched; deliberately says nothing about why
    #[error("Invalid or expired code")]
    InvalidOrExpired,

    #[error("Invalid code, {remaining} attempt(s) remaining")]
    InvalidCode { remaining: i32 },

    #[error("Code has expired")]
    Expired,

    #[error("Maximum verification attempts exceeded")]
    AttemptsExhausted,

    #[error("Code has already been verified")]
    AlreadyVerified,

    #[error("Reference ID mismatch")]
    ReferenceMismatch,
}

impl OtpError {
    pub fn code(&self) -> &'static str {
        match self {
            OtpError::InvalidOrExpired => "OTP_INVALID_OR_EXPIRED",
            OtpError::InvalidCode { .. } => "OTP_INVALID_CODE",
            OtpError::Expired => "OTP_EXPIRED",
            OtpError::AttemptsExhausted => "OTP_ATTEMPTS_EXHAUSTED",
            OtpError::AlreadyVerified => "OTP_ALREADY_VERIFIED",
            OtpError::ReferenceMismatch => "OTP_REFERENCE_MISMATCH",
        }
    }

    /// Form to show a caller who must not learn whether a live code exists
    ///
    /// `InvalidCode` carries the remaining attempts of the code on file, so it
    /// becomes `InvalidOrExpired`; every other variant is returned as is.
    pub fn concealed(&self) -> OtpError {
        match self {
            OtpError::InvalidCode { .. } => OtpError::InvalidOrExpired,
            other => other.clone(),
        }
    }
}

/// Failures reported by a delivery gateway
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    /// Worth retrying later (rate limits, provider outages, network errors)
    #[error("Transient delivery failure: {message}")]
    Transient { message: String },

    /// Retrying will not help (bad recipient, rejected content, no route)
    #[error("Permanent delivery failure: {message}")]
    Permanent { message: String },

    #[error("Delivery timed out after {timeout_ms} ms")]
    TimedOut { timeout_ms: u64 },
}

impl DeliveryError {
    pub fn transient(message: impl Into<String>) -> Self {
        DeliveryError::Transient { message: message.into() }
    }

    pub fn permanent(message: impl Into<String>) -> Self {
        DeliveryError::Permanent { message: message.into() }
    }

    /// Whether a later redelivery attempt may succeed
    pub fn is_transient(&self) -> bool {
        !matches!(self, DeliveryError::Permanent { .. })
    }

    pub fn code(&self) -> &'static str {
        match self {
            DeliveryError::Transient { .. } => "DELIVERY_TRANSIENT",
            DeliveryError::Permanent { .. } => "DELIVERY_PERMANENT",
            DeliveryError::TimedOut { .. } => "DELIVERY_TIMED_OUT",
        }
    }
}
