//! One-time code entity and its lazily derived lifecycle state.

use chrono::{DateTime, Duration, Utc};
use constant_time_eq::constant_time_eq;
use rand::distributions::{Distribution, Uniform};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::notification::NotificationType;
use crate::errors::OtpError;

/// Default number of digits in a generated code
pub const DEFAULT_CODE_LENGTH: usize = 6;

/// Default minutes before a code expires
pub const DEFAULT_EXPIRY_MINUTES: i64 = 10;

/// Default number of verification attempts allowed
pub const DEFAULT_MAX_ATTEMPTS: i32 = 3;

/// Business action a code authorizes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OtpPurpose {
    Payout,
    Withdrawal,
    SettingsChange,
    Login,
    #[serde(rename = "2fa")]
    TwoFactor,
}

impl OtpPurpose {
    /// Stable storage name
    pub fn as_str(&self) -> &'static str {
        match self {
            OtpPurpose::Payout => "payout",
            OtpPurpose::Withdrawal => "withdrawal",
            OtpPurpose::SettingsChange => "settings_change",
            OtpPurpose::Login => "login",
            OtpPurpose::TwoFactor => "2fa",
        }
    }
}

impl std::fmt::Display for OtpPurpose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OtpPurpose {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "payout" => Ok(OtpPurpose::Payout),
            "withdrawal" => Ok(OtpPurpose::Withdrawal),
            "settings_change" => Ok(OtpPurpose::SettingsChange),
            "login" => Ok(OtpPurpose::Login),
            "2fa" => Ok(OtpPurpose::TwoFactor),
            other => Err(format!("unknown OTP purpose: {}", other)),
        }
    }
}

/// Channel a code is delivered over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryMethod {
    Email,
    Sms,
}

impl DeliveryMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryMethod::Email => "email",
            DeliveryMethod::Sms => "sms",
        }
    }

    /// Notification type used to deliver a code over this method
    pub fn notification_type(&self) -> NotificationType {
        match self {
            DeliveryMethod::Email => NotificationType::Email,
            DeliveryMethod::Sms => NotificationType::Sms,
        }
    }
}

impl std::fmt::Display for DeliveryMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DeliveryMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "email" => Ok(DeliveryMethod::Email),
            "sms" => Ok(DeliveryMethod::Sms),
            other => Err(format!("unsupported delivery method: {}", other)),
        }
    }
}

/// Lifecycle state of a code, derived on read and never stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OtpStatus {
    Pending,
    Verified,
    Expired,
    Exhausted,
}

/// A one-time code issued to a merchant (and optionally a user)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Otp {
    /// Unique identifier
    pub id: Uuid,

    /// Merchant the code was issued for
    pub merchant_id: String,

    /// User within the merchant, if any
    pub user_id: Option<String>,

    /// Action the code authorizes
    pub purpose: OtpPurpose,

    /// Fixed-length decimal digit string
    pub code: String,

    /// Phone number or email address the code was sent to
    pub recipient: String,

    /// Channel the code was sent over
    pub delivery_method: DeliveryMethod,

    /// After this instant the code can no longer be verified
    pub expires_at: DateTime<Utc>,

    /// Set exactly once, on successful verification
    pub verified_at: Option<DateTime<Utc>>,

    /// Verification attempts consumed so far
    pub attempts: i32,

    /// Upper bound on `attempts`
    pub max_attempts: i32,

    /// Caller correlation token linking generate/resend/verify calls
    pub reference_id: Option<String>,

    /// Free-form caller metadata
    pub metadata: Option<serde_json::Value>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Otp {
    /// Creates a pending code that expires `expiry` from now
    pub fn new(
        merchant_id: impl Into<String>,
        purpose: OtpPurpose,
        code: String,
        recipient: impl Into<String>,
        delivery_method: DeliveryMethod,
        expiry: Duration,
        max_attempts: i32,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            merchant_id: merchant_id.into(),
            user_id: None,
            purpose,
            code,
            recipient: recipient.into(),
            delivery_method,
            expires_at: now + expiry,
            verified_at: None,
            attempts: 0,
            max_attempts,
            reference_id: None,
            metadata: None,
            created_at: now,
        }
    }

    /// Generates a code of `length` decimal digits from the OS random source.
    ///
    /// Each digit is drawn independently and uniformly, so leading zeros are
    /// as likely as any other digit.
    pub fn generate_code(length: usize) -> String {
        let digits = Uniform::from(0u8..10);
        let mut rng = OsRng;
        (0..length)
            .map(|_| char::from(b'0' + digits.sample(&mut rng)))
            .collect()
    }

    pub fn with_user(mut self, user_id: Option<String>) -> Self {
        self.user_id = user_id;
        self
    }

    pub fn with_reference(mut self, reference_id: Option<String>) -> Self {
        self.reference_id = reference_id;
        self
    }

    pub fn with_metadata(mut self, metadata: Option<serde_json::Value>) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn is_verified(&self) -> bool {
        self.verified_at.is_some()
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    pub fn can_attempt(&self) -> bool {
        self.attempts < self.max_attempts
    }

    /// Attempts left before the code is exhausted
    pub fn remaining_attempts(&self) -> i32 {
        (self.max_attempts - self.attempts).max(0)
    }

    /// Minutes between creation and expiry, as shown in delivery messages
    pub fn validity_minutes(&self) -> i64 {
        (self.expires_at - self.created_at).num_minutes()
    }

    /// Derives the lifecycle state at `now`.
    ///
    /// Precedence is verified, then expired, then exhausted.
    pub fn status_at(&self, now: DateTime<Utc>) -> OtpStatus {
        if self.is_verified() {
            OtpStatus::Verified
        } else if self.is_expired_at(now) {
            OtpStatus::Expired
        } else if !self.can_attempt() {
            OtpStatus::Exhausted
        } else {
            OtpStatus::Pending
        }
    }

    /// Rejects codes that may no longer be compared, without consuming an attempt
    pub fn check_verifiable(&self, now: DateTime<Utc>) -> Result<(), OtpError> {
        match self.status_at(now) {
            OtpStatus::Pending => Ok(()),
            OtpStatus::Verified => Err(OtpError::AlreadyVerified),
            OtpStatus::Expired => Err(OtpError::Expired),
            OtpStatus::Exhausted => Err(OtpError::AttemptsExhausted),
        }
    }

    /// Applies one verification attempt in memory.
    ///
    /// The attempt is counted before the comparison, so a matching code also
    /// consumes an attempt. A mismatch that uses up the last attempt reports
    /// exhaustion rather than a plain invalid code.
    pub fn verify(&mut self, input_code: &str, now: DateTime<Utc>) -> Result<(), OtpError> {
        self.check_verifiable(now)?;

        self.attempts += 1;

        if self.matches(input_code) {
            self.verified_at = Some(now);
            return Ok(());
        }

        Err(self.mismatch_error())
    }

    /// Error for a wrong code given the current attempt count
    pub fn mismatch_error(&self) -> OtpError {
        match self.remaining_attempts() {
            0 => OtpError::AttemptsExhausted,
            remaining => OtpError::InvalidCode { remaining },
        }
    }

    fn matches(&self, input_code: &str) -> bool {
        self.code.len() == input_code.len()
            && constant_time_eq(self.code.as_bytes(), input_code.as_bytes())
    }

    /// Copy safe to hand back to callers, with every code digit replaced by `*`
    pub fn masked(&self) -> Self {
        Self {
            code: pn_shared::masking::mask_code(&self.code),
            ..self.clone()
        }
    }
}
