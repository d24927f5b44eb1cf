//! Unit tests for domain error types

use std::error::Error;

use uuid::Uuid;

use crate::errors::{DeliveryError, DomainError, OtpError};

#[test]
fn test_otp_error_messages() {
    let error = OtpError::InvalidCode { remaining: 2 };
    assert_eq!(error.to_string(), "Invalid code, 2 attempt(s) remaining");
    assert_eq!(OtpError::InvalidOrExpired.to_string(), "Invalid or expired code");
}

#[test]
fn test_concealed_hides_remaining_attempts() {
    let concealed = OtpError::InvalidCode { remaining: 1 }.concealed();
    assert_eq!(concealed, OtpError::InvalidOrExpired);
    assert_eq!(concealed.code(), OtpError::InvalidOrExpired.code());
    assert_eq!(OtpError::Expired.concealed(), OtpError::Expired);
    assert_eq!(OtpError::InvalidOrExpired.concealed(), OtpError::InvalidOrExpired);
}

#[test]
fn test_bridged_errors_keep_message_and_code() {
    let error: DomainError = OtpError::AttemptsExhausted.into();
    assert_eq!(error.to_string(), "Maximum verification attempts exceeded");
    assert_eq!(error.code(), "OTP_ATTEMPTS_EXHAUSTED");

    let error: DomainError = DeliveryError::TimedOut { timeout_ms: 250 }.into();
    assert_eq!(error.to_string(), "Delivery timed out after 250 ms");
    assert_eq!(error.code(), "DELIVERY_TIMED_OUT");
}

#[test]
fn test_delivery_error_classification() {
    assert!(DeliveryError::transient("429").is_transient());
    assert!(DeliveryError::TimedOut { timeout_ms: 10 }.is_transient());
    assert!(!DeliveryError::permanent("invalid number").is_transient());
}

#[test]
fn test_otp_dispatch_exposes_cause() {
    let otp_id = Uuid::new_v4();
    let error = DomainError::OtpDispatch {
        otp_id,
        source: Box::new(DeliveryError::permanent("unreachable").into()),
    };

    assert_eq!(error.code(), "OTP_DISPATCH_FAILED");
    assert!(error.to_string().contains(&otp_id.to_string()));
    let cause = error.source().map(|e| e.to_string()).unwrap_or_default();
    assert_eq!(cause, "Permanent delivery failure: unreachable");
}

#[test]
fn test_plain_domain_error_codes() {
    assert_eq!(DomainError::validation("x").code(), "VALIDATION_ERROR");
    assert_eq!(DomainError::not_found("notification").code(), "NOT_FOUND");
    assert_eq!(DomainError::storage("down").code(), "STORAGE_ERROR");
    assert_eq!(
        DomainError::PolicyDenied { reason: "off".into() }.code(),
        "POLICY_DENIED"
    );
}
