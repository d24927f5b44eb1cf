//! Mock implementation of OtpRepository for testing

use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::entities::{Otp, OtpPurpose};
use crate::errors::DomainError;

use super::r#trait::OtpRepository;

/// In-memory OTP repository with switchable failures
pub struct MockOtpRepository {
    otps: Arc<RwLock<HashMap<Uuid, Otp>>>,
    fail_create: AtomicBool,
    fail_mark_verified: AtomicBool,
    fail_invalidate: AtomicBool,
}

impl MockOtpRepository {
    pub fn new() -> Self {
        Self {
            otps: Arc::new(RwLock::new(HashMap::new())),
            fail_create: AtomicBool::new(false),
            fail_mark_verified: AtomicBool::new(false),
            fail_invalidate: AtomicBool::new(false),
        }
    }

    pub fn set_fail_create(&self, fail: bool) {
        self.fail_create.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_mark_verified(&self, fail: bool) {
        self.fail_mark_verified.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_invalidate(&self, fail: bool) {
        self.fail_invalidate.store(fail, Ordering::SeqCst);
    }

    /// Stored row, including the clear-text code
    pub async fn get(&self, id: Uuid) -> Option<Otp> {
        self.otps.read().await.get(&id).cloned()
    }

    /// Insert a row directly, bypassing `create`
    pub async fn insert(&self, otp: Otp) {
        self.otps.write().await.insert(otp.id, otp);
    }

    pub async fn count(&self) -> usize {
        self.otps.read().await.len()
    }

    fn latest<'a>(rows: impl Iterator<Item = &'a Otp>) -> Option<Otp> {
        rows.max_by_key(|otp| otp.created_at).cloned()
    }
}

impl Default for MockOtpRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OtpRepository for MockOtpRepository {
    async fn create(&self, otp: Otp) -> Result<Otp, DomainError> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(DomainError::storage("Simulated insert failure"));
        }
        self.otps.write().await.insert(otp.id, otp.clone());
        Ok(otp)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Otp>, DomainError> {
        Ok(self.otps.read().await.get(&id).cloned())
    }

    async fn find_unverified_by_code(
        &self,
        merchant_id: &str,
        purpose: OtpPurpose,
        code: &str,
    ) -> Result<Option<Otp>, DomainError> {
        let otps = self.otps.read().await;
        Ok(Self::latest(otps.values().filter(|otp| {
            otp.merchant_id == merchant_id
                && otp.purpose == purpose
                && otp.code == code
                && otp.verified_at.is_none()
        })))
    }

    async fn find_latest_by_reference(
        &self,
        merchant_id: &str,
        purpose: OtpPurpose,
        reference_id: &str,
    ) -> Result<Option<Otp>, DomainError> {
        let otps = self.otps.read().await;
        Ok(Self::latest(otps.values().filter(|otp| {
            otp.merchant_id == merchant_id
                && otp.purpose == purpose
                && otp.reference_id.as_deref() == Some(reference_id)
        })))
    }

    async fn find_latest(
        &self,
        merchant_id: &str,
        purpose: OtpPurpose,
    ) -> Result<Option<Otp>, DomainError> {
        let otps = self.otps.read().await;
        Ok(Self::latest(
            otps.values()
                .filter(|otp| otp.merchant_id == merchant_id && otp.purpose == purpose),
        ))
    }

    async fn record_attempt(&self, id: Uuid) -> Result<Option<i32>, DomainError> {
        let mut otps = self.otps.write().await;
        match otps.get_mut(&id) {
            Some(otp) if otp.verified_at.is_none() && otp.attempts < otp.max_attempts => {
                otp.attempts += 1;
                Ok(Some(otp.attempts))
            }
            _ => Ok(None),
        }
    }

    async fn mark_verified(&self, id: Uuid) -> Result<bool, DomainError> {
        if self.fail_mark_verified.load(Ordering::SeqCst) {
            return Err(DomainError::storage("Simulated update failure"));
        }
        let mut otps = self.otps.write().await;
        match otps.get_mut(&id) {
            Some(otp) if otp.verified_at.is_none() => {
                otp.verified_at = Some(Utc::now());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn soft_invalidate_by_reference(
        &self,
        merchant_id: &str,
        purpose: OtpPurpose,
        reference_id: &str,
    ) -> Result<u64, DomainError> {
        if self.fail_invalidate.load(Ordering::SeqCst) {
            return Err(DomainError::storage("Simulated update failure"));
        }
        let past = Utc::now() - Duration::hours(1);
        let mut otps = self.otps.write().await;
        let mut count = 0;
        for otp in otps.values_mut().filter(|otp| {
            otp.merchant_id == merchant_id
                && otp.purpose == purpose
                && otp.reference_id.as_deref() == Some(reference_id)
                && otp.verified_at.is_none()
        }) {
            otp.expires_at = past;
            count += 1;
        }
        Ok(count)
    }

    async fn delete_expired_older_than(&self, retention: Duration) -> Result<u64, DomainError> {
        let cutoff = Utc::now() - retention;
        let mut otps = self.otps.write().await;
        let before = otps.len();
        otps.retain(|_, otp| otp.expires_at >= cutoff);
        Ok((before - otps.len()) as u64)
    }
}
