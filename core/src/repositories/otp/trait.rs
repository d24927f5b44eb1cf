//! OTP repository trait defining the interface for one-time code persistence.

use async_trait::async_trait;
use chrono::Duration;
use uuid::Uuid;

use crate::domain::entities::{Otp, OtpPurpose};
use crate::errors::DomainError;

/// Repository trait for one-time code persistence
///
/// Attempt counting and verification are conditional single-row updates so
/// that concurrent verifiers can never push `attempts` past `max_attempts` or
/// verify the same code twice.
#[async_trait]
pub trait OtpRepository: Send + Sync {
    /// Persist a new code
    async fn create(&self, otp: Otp) -> Result<Otp, DomainError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Otp>, DomainError>;

    /// Most recent unverified code for (merchant, purpose) with exactly this code
    async fn find_unverified_by_code(
        &self,
        merchant_id: &str,
        purpose: OtpPurpose,
        code: &str,
    ) -> Result<Option<Otp>, DomainError>;

    /// Most recent code for (merchant, purpose, reference), verified or not
    async fn find_latest_by_reference(
        &self,
        merchant_id: &str,
        purpose: OtpPurpose,
        reference_id: &str,
    ) -> Result<Option<Otp>, DomainError>;

    /// Most recent code for (merchant, purpose), verified or not
    async fn find_latest(
        &self,
        merchant_id: &str,
        purpose: OtpPurpose,
    ) -> Result<Option<Otp>, DomainError>;

    /// Atomically consume one attempt
    ///
    /// Only applies while the code is unverified and below its attempt limit.
    /// Returns the new attempt count, or `None` when the update did not apply.
    async fn record_attempt(&self, id: Uuid) -> Result<Option<i32>, DomainError>;

    /// Set `verified_at` if it is still unset; returns whether this call set it
    async fn mark_verified(&self, id: Uuid) -> Result<bool, DomainError>;

    /// Force unverified codes for (merchant, purpose, reference) into the past
    ///
    /// Returns the number of codes invalidated.
    async fn soft_invalidate_by_reference(
        &self,
        merchant_id: &str,
        purpose: OtpPurpose,
        reference_id: &str,
    ) -> Result<u64, DomainError>;

    /// Delete codes whose expiry lies more than `retention` in the past
    async fn delete_expired_older_than(&self, retention: Duration) -> Result<u64, DomainError>;
}
