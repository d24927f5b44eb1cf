//! One-time code lifecycle: generation, verification, resend and cleanup

use chrono::{Duration, Utc};
use std::sync::Arc;
use uuid::Uuid;

use pn_shared::config::OtpConfig;
use pn_shared::masking::mask_recipient;

use crate::domain::entities::{Notification, NotificationChannel, Otp, OtpPurpose};
use crate::errors::{DomainError, DomainResult, OtpError};
use crate::repositories::OtpRepository;
use crate::services::notification::NotificationSender;

use super::cleanup::OtpCleanupTask;
use super::templates::{otp_message, otp_subject};
use super::types::{GenerateOtpRequest, OtpInspection, OtpVerification, VerifyOtpRequest};

/// OTP service issuing codes and checking them against the record store
pub struct OtpService<R: OtpRepository, D: NotificationSender> {
    /// Code record store
    repository: Arc<R>,
    /// Dispatcher used to deliver codes
    sender: Arc<D>,
    config: OtpConfig,
}

impl<R: OtpRepository, D: NotificationSender> OtpService<R, D> {
    pub fn new(repository: Arc<R>, sender: Arc<D>, config: OtpConfig) -> Self {
        Self {
            repository,
            sender,
            config,
        }
    }

    /// Issue a new code and deliver it
    ///
    /// This method:
    /// 1. Validates the request
    /// 2. Draws a fresh code from the OS random source
    /// 3. Stores it with zero attempts
    /// 4. Sends it through the dispatcher on the security channel
    ///
    /// The stored code survives a failed delivery; that case is reported as
    /// `DomainError::OtpDispatch` carrying the code's id. The returned copy
    /// always has its code masked.
    pub async fn generate(&self, request: GenerateOtpRequest) -> DomainResult<Otp> {
        self.validate_generate(&request)?;

        let expiry_minutes = request
            .expiry_minutes
            .unwrap_or(self.config.default_expiry_minutes);
        let max_attempts = request
            .max_attempts
            .unwrap_or(self.config.default_max_attempts);
        let merchant_id = request.merchant_id.clone();

        let otp = Otp::new(
            request.merchant_id,
            request.purpose,
            Otp::generate_code(self.config.code_length),
            request.recipient,
            request.delivery_method,
            Duration::minutes(expiry_minutes),
            max_attempts,
        )
        .with_user(request.user_id)
        .with_reference(request.reference_id)
        .with_metadata(request.metadata);

        let otp = self.repository.create(otp).await.map_err(|e| {
            tracing::error!(
                merchant_id = %merchant_id,
                error = %e,
                event = "otp_storage_failed",
                "Failed to store one-time code"
            );
            e
        })?;

        tracing::info!(
            otp_id = %otp.id,
            merchant_id = %otp.merchant_id,
            purpose = %otp.purpose,
            recipient = %mask_recipient(&otp.recipient),
            delivery_method = %otp.delivery_method,
            event = "otp_generated",
            "Generated one-time code"
        );

        if let Err(e) = self.sender.send(self.build_notification(&otp)).await {
            tracing::error!(
                otp_id = %otp.id,
                recipient = %mask_recipient(&otp.recipient),
                error = %e,
                event = "otp_dispatch_failed",
                "One-time code stored but not delivered"
            );
            return Err(DomainError::OtpDispatch {
                otp_id: otp.id,
                source: Box::new(e),
            });
        }

        Ok(otp.masked())
    }

    /// Check a submitted code
    ///
    /// Every comparison consumes an attempt, recorded with an atomic
    /// conditional update before the verified flag is written. A failure to
    /// write the verified flag after a match is logged and reported through
    /// `OtpVerification::persisted`; the caller still gets a success.
    ///
    /// A wrong code is charged to the latest code on file and answered with
    /// `OtpError::InvalidCode { remaining }`, while a merchant with no code
    /// gets `InvalidOrExpired`. The two differ, so an edge that must not
    /// reveal whether a code is outstanding should answer with
    /// `OtpError::concealed()`.
    pub async fn verify(&self, request: VerifyOtpRequest) -> DomainResult<OtpVerification> {
        if request.merchant_id.trim().is_empty() || request.code.trim().is_empty() {
            return Err(OtpError::InvalidOrExpired.into());
        }

        let now = Utc::now();
        let mut otp = match self.find_for_verification(&request).await? {
            Some(otp) => otp,
            None => {
                tracing::warn!(
                    merchant_id = %request.merchant_id,
                    purpose = %request.purpose,
                    event = "otp_not_found",
                    "No code found for verification"
                );
                return Err(OtpError::InvalidOrExpired.into());
            }
        };

        if let (Some(expected), Some(given)) = (&otp.reference_id, &request.reference_id) {
            if expected != given {
                tracing::warn!(
                    otp_id = %otp.id,
                    event = "otp_reference_mismatch",
                    "Verification reference does not match the code's reference"
                );
                return Err(OtpError::ReferenceMismatch.into());
            }
        }

        if let Err(e) = otp.check_verifiable(now) {
            tracing::warn!(
                otp_id = %otp.id,
                reason = %e,
                event = "otp_verification_rejected",
                "Code can no longer be verified"
            );
            return Err(e.into());
        }

        let outcome = otp.verify(&request.code, now);

        match self.repository.record_attempt(otp.id).await? {
            Some(attempts) => otp.attempts = attempts,
            None => return Err(self.concurrent_change(otp.id).await),
        }

        if outcome.is_err() {
            let err = otp.mismatch_error();
            tracing::warn!(
                otp_id = %otp.id,
                attempts = otp.attempts,
                remaining_attempts = otp.remaining_attempts(),
                event = "otp_verification_failed",
                "Invalid code submitted"
            );
            return Err(err.into());
        }

        let persisted = match self.repository.mark_verified(otp.id).await {
            Ok(true) => true,
            Ok(false) => {
                tracing::warn!(
                    otp_id = %otp.id,
                    event = "otp_already_verified",
                    "Code was verified by a concurrent request"
                );
                return Err(OtpError::AlreadyVerified.into());
            }
            Err(e) => {
                tracing::error!(
                    otp_id = %otp.id,
                    error = %e,
                    event = "otp_verified_flag_not_persisted",
                    "Code matched but the verified flag could not be stored"
                );
                false
            }
        };

        tracing::info!(
            otp_id = %otp.id,
            merchant_id = %otp.merchant_id,
            purpose = %otp.purpose,
            event = "otp_verified",
            "One-time code verified"
        );

        Ok(OtpVerification {
            otp: otp.masked(),
            persisted,
        })
    }

    /// Invalidate outstanding codes for the request's reference and issue a new one
    pub async fn resend(&self, request: GenerateOtpRequest) -> DomainResult<Otp> {
        match request.reference_id.as_deref() {
            Some(reference_id) => {
                match self
                    .repository
                    .soft_invalidate_by_reference(&request.merchant_id, request.purpose, reference_id)
                    .await
                {
                    Ok(count) => tracing::debug!(
                        merchant_id = %request.merchant_id,
                        purpose = %request.purpose,
                        invalidated = count,
                        event = "otp_invalidated",
                        "Invalidated outstanding codes before resend"
                    ),
                    Err(e) => tracing::warn!(
                        merchant_id = %request.merchant_id,
                        error = %e,
                        event = "otp_invalidation_failed",
                        "Failed to invalidate outstanding codes, resending anyway"
                    ),
                }
            }
            None => tracing::debug!(
                merchant_id = %request.merchant_id,
                purpose = %request.purpose,
                "No reference on resend, skipping invalidation"
            ),
        }

        self.generate(request).await
    }

    /// Delete codes that expired more than the retention window ago
    pub async fn cleanup_expired(&self) -> DomainResult<u64> {
        OtpCleanupTask::new(self.repository.clone(), &self.config)
            .run_cleanup()
            .await
    }

    /// Latest code for a reference with its derived status
    pub async fn latest_by_reference(
        &self,
        merchant_id: &str,
        purpose: OtpPurpose,
        reference_id: &str,
    ) -> DomainResult<OtpInspection> {
        let otp = self
            .repository
            .find_latest_by_reference(merchant_id, purpose, reference_id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("OTP for reference {}", reference_id)))?;

        Ok(OtpInspection {
            status: otp.status_at(Utc::now()),
            remaining_attempts: otp.remaining_attempts(),
            otp: otp.masked(),
        })
    }

    fn validate_generate(&self, request: &GenerateOtpRequest) -> DomainResult<()> {
        if request.merchant_id.trim().is_empty() {
            return Err(DomainError::validation("merchant_id is required"));
        }
        if request.recipient.trim().is_empty() {
            return Err(DomainError::validation("recipient is required"));
        }
        if matches!(request.expiry_minutes, Some(minutes) if minutes < 1) {
            return Err(DomainError::validation("expiry_minutes must be at least 1"));
        }
        if matches!(request.max_attempts, Some(attempts) if attempts < 1) {
            return Err(DomainError::validation("max_attempts must be at least 1"));
        }
        Ok(())
    }

    /// Code the submission is checked against
    ///
    /// Prefers an unverified code with the submitted digits; otherwise the
    /// latest code for the reference (or for the purpose), so wrong guesses
    /// still count against the live code.
    async fn find_for_verification(&self, request: &VerifyOtpRequest) -> DomainResult<Option<Otp>> {
        if let Some(otp) = self
            .repository
            .find_unverified_by_code(&request.merchant_id, request.purpose, &request.code)
            .await?
        {
            return Ok(Some(otp));
        }

        match request.reference_id.as_deref() {
            Some(reference_id) => {
                self.repository
                    .find_latest_by_reference(&request.merchant_id, request.purpose, reference_id)
                    .await
            }
            None => {
                self.repository
                    .find_latest(&request.merchant_id, request.purpose)
                    .await
            }
        }
    }

    /// Error for an attempt the store refused because another request got there first
    async fn concurrent_change(&self, id: Uuid) -> DomainError {
        match self.repository.find_by_id(id).await {
            Ok(Some(current)) => current
                .check_verifiable(Utc::now())
                .err()
                .unwrap_or(OtpError::AttemptsExhausted)
                .into(),
            Ok(None) => OtpError::InvalidOrExpired.into(),
            Err(e) => e,
        }
    }

    fn build_notification(&self, otp: &Otp) -> Notification {
        let message = otp_message(
            &self.config.brand_name,
            otp.purpose,
            &otp.code,
            otp.validity_minutes(),
        );

        Notification::new(
            otp.delivery_method.notification_type(),
            NotificationChannel::Security,
            otp.recipient.clone(),
            message,
        )
        .with_merchant(otp.merchant_id.clone())
        .with_user(otp.user_id.clone())
        .with_subject(otp_subject(&self.config.brand_name))
        .with_metadata(serde_json::json!({
            "otp_id": otp.id,
            "purpose": otp.purpose,
        }))
    }
}
