//! Request and result types for the OTP service

use serde::{Deserialize, Serialize};

use crate::domain::entities::{DeliveryMethod, Otp, OtpPurpose, OtpStatus};

/// Request to issue (or re-issue) a code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateOtpRequest {
    pub merchant_id: String,
    pub user_id: Option<String>,
    pub purpose: OtpPurpose,
    pub recipient: String,
    pub delivery_method: DeliveryMethod,
    /// Falls back to the configured default when absent
    pub expiry_minutes: Option<i64>,
    /// Falls back to the configured default when absent
    pub max_attempts: Option<i32>,
    pub reference_id: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

impl GenerateOtpRequest {
    pub fn new(
        merchant_id: impl Into<String>,
        purpose: OtpPurpose,
        recipient: impl Into<String>,
        delivery_method: DeliveryMethod,
    ) -> Self {
        Self {
            merchant_id: merchant_id.into(),
            user_id: None,
            purpose,
            recipient: recipient.into(),
            delivery_method,
            expiry_minutes: None,
            max_attempts: None,
            reference_id: None,
            metadata: None,
        }
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_reference(mut self, reference_id: impl Into<String>) -> Self {
        self.reference_id = Some(reference_id.into());
        self
    }

    pub fn with_expiry_minutes(mut self, minutes: i64) -> Self {
        self.expiry_minutes = Some(minutes);
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: i32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// Request to check a submitted code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyOtpRequest {
    pub merchant_id: String,
    pub purpose: OtpPurpose,
    pub code: String,
    pub reference_id: Option<String>,
}

impl VerifyOtpRequest {
    pub fn new(merchant_id: impl Into<String>, purpose: OtpPurpose, code: impl Into<String>) -> Self {
        Self {
            merchant_id: merchant_id.into(),
            purpose,
            code: code.into(),
            reference_id: None,
        }
    }

    pub fn with_reference(mut self, reference_id: impl Into<String>) -> Self {
        self.reference_id = Some(reference_id.into());
        self
    }
}

/// Result of a successful verification
#[derive(Debug, Clone)]
pub struct OtpVerification {
    /// The verified code, masked
    pub otp: Otp,
    /// False when the verified flag could not be written; the code matched
    /// but the store may still treat it as unverified
    pub persisted: bool,
}

/// Snapshot of the latest code for a reference
#[derive(Debug, Clone)]
pub struct OtpInspection {
    /// The code, masked
    pub otp: Otp,
    pub status: OtpStatus,
    pub remaining_attempts: i32,
}
