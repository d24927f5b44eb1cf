//! MySQL implementation of the OtpRepository trait.
//!
//! Attempt counting and verification are single conditional UPDATEs, so two
//! concurrent submissions can never push `attempts` past `max_attempts` or
//! set `verified_at` twice.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use sqlx::mysql::MySqlRow;
use sqlx::MySqlPool;
use uuid::Uuid;

use pn_core::domain::entities::{Otp, OtpPurpose};
use pn_core::errors::DomainError;
use pn_core::repositories::OtpRepository;

use super::{column, enum_column, json_column, json_text, query_error, uuid_column};

const OTP_COLUMNS: &str = r#"
    id, merchant_id, user_id, purpose, code, recipient, delivery_method,
    expires_at, verified_at, attempts, max_attempts, reference_id, metadata, created_at
"#;

/// MySQL implementation of OtpRepository
pub struct MySqlOtpRepository {
    pool: MySqlPool,
}

impl MySqlOtpRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    fn row_to_otp(row: &MySqlRow) -> Result<Otp, DomainError> {
        Ok(Otp {
            id: uuid_column(row, "id")?,
            merchant_id: column(row, "merchant_id")?,
            user_id: column(row, "user_id")?,
            purpose: enum_column(row, "purpose")?,
            code: column(row, "code")?,
            recipient: column(row, "recipient")?,
            delivery_method: enum_column(row, "delivery_method")?,
            expires_at: column(row, "expires_at")?,
            verified_at: column(row, "verified_at")?,
            attempts: column(row, "attempts")?,
            max_attempts: column(row, "max_attempts")?,
            reference_id: column(row, "reference_id")?,
            metadata: json_column(row, "metadata")?,
            created_at: column(row, "created_at")?,
        })
    }

    async fn fetch_one_where(
        &self,
        condition: &str,
        binds: &[&str],
        context: &'static str,
    ) -> Result<Option<Otp>, DomainError> {
        let sql = format!(
            "SELECT {} FROM otps WHERE {} ORDER BY created_at DESC LIMIT 1",
            OTP_COLUMNS, condition
        );
        let mut query = sqlx::query(&sql);
        for value in binds {
            query = query.bind(*value);
        }

        query
            .fetch_optional(&self.pool)
            .await
            .map_err(query_error(context))?
            .map(|row| Self::row_to_otp(&row))
            .transpose()
    }
}

#[async_trait]
impl OtpRepository for MySqlOtpRepository {
    async fn create(&self, otp: Otp) -> Result<Otp, DomainError> {
        let query = r#"
            INSERT INTO otps (
                id, merchant_id, user_id, purpose, code, recipient, delivery_method,
                expires_at, verified_at, attempts, max_attempts, reference_id, metadata, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#;

        sqlx::query(query)
            .bind(otp.id.to_string())
            .bind(&otp.merchant_id)
            .bind(&otp.user_id)
            .bind(otp.purpose.as_str())
            .bind(&otp.code)
            .bind(&otp.recipient)
            .bind(otp.delivery_method.as_str())
            .bind(otp.expires_at)
            .bind(otp.verified_at)
            .bind(otp.attempts)
            .bind(otp.max_attempts)
            .bind(&otp.reference_id)
            .bind(json_text(&otp.metadata))
            .bind(otp.created_at)
            .execute(&self.pool)
            .await
            .map_err(query_error("Failed to save OTP"))?;

        Ok(otp)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Otp>, DomainError> {
        let id = id.to_string();
        self.fetch_one_where("id = ?", &[id.as_str()], "Failed to find OTP by id")
            .await
    }

    async fn find_unverified_by_code(
        &self,
        merchant_id: &str,
        purpose: OtpPurpose,
        code: &str,
    ) -> Result<Option<Otp>, DomainError> {
        self.fetch_one_where(
            "merchant_id = ? AND purpose = ? AND code = ? AND verified_at IS NULL",
            &[merchant_id, purpose.as_str(), code],
            "Failed to find OTP by code",
        )
        .await
    }

    async fn find_latest_by_reference(
        &self,
        merchant_id: &str,
        purpose: OtpPurpose,
        reference_id: &str,
    ) -> Result<Option<Otp>, DomainError> {
        self.fetch_one_where(
            "merchant_id = ? AND purpose = ? AND reference_id = ?",
            &[merchant_id, purpose.as_str(), reference_id],
            "Failed to find OTP by reference",
        )
        .await
    }

    async fn find_latest(
        &self,
        merchant_id: &str,
        purpose: OtpPurpose,
    ) -> Result<Option<Otp>, DomainError> {
        self.fetch_one_where(
            "merchant_id = ? AND purpose = ?",
            &[merchant_id, purpose.as_str()],
            "Failed to find latest OTP",
        )
        .await
    }

    async fn record_attempt(&self, id: Uuid) -> Result<Option<i32>, DomainError> {
        let id = id.to_string();
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(query_error("Failed to begin attempt transaction"))?;

        let updated = sqlx::query(
            r#"
            UPDATE otps SET attempts = attempts + 1
            WHERE id = ? AND verified_at IS NULL AND attempts < max_attempts
            "#,
        )
        .bind(&id)
        .execute(&mut *tx)
        .await
        .map_err(query_error("Failed to record OTP attempt"))?;

        if updated.rows_affected() == 0 {
            tx.rollback()
                .await
                .map_err(query_error("Failed to roll back attempt transaction"))?;
            return Ok(None);
        }

        let row = sqlx::query("SELECT attempts FROM otps WHERE id = ?")
            .bind(&id)
            .fetch_one(&mut *tx)
            .await
            .map_err(query_error("Failed to read OTP attempts"))?;
        let attempts: i32 = column(&row, "attempts")?;

        tx.commit()
            .await
            .map_err(query_error("Failed to commit attempt transaction"))?;

        Ok(Some(attempts))
    }

    async fn mark_verified(&self, id: Uuid) -> Result<bool, DomainError> {
        let result = sqlx::query("UPDATE otps SET verified_at = ? WHERE id = ? AND verified_at IS NULL")
            .bind(Utc::now())
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(query_error("Failed to mark OTP as verified"))?;

        Ok(result.rows_affected() == 1)
    }

    async fn soft_invalidate_by_reference(
        &self,
        merchant_id: &str,
        purpose: OtpPurpose,
        reference_id: &str,
    ) -> Result<u64, DomainError> {
        let query = r#"
            UPDATE otps SET expires_at = ?
            WHERE merchant_id = ?
              AND purpose = ?
              AND reference_id = ?
              AND verified_at IS NULL
        "#;

        let result = sqlx::query(query)
            .bind(Utc::now() - Duration::hours(1))
            .bind(merchant_id)
            .bind(purpose.as_str())
            .bind(reference_id)
            .execute(&self.pool)
            .await
            .map_err(query_error("Failed to invalidate OTPs"))?;

        Ok(result.rows_affected())
    }

    async fn delete_expired_older_than(&self, retention: Duration) -> Result<u64, DomainError> {
        let result = sqlx::query("DELETE FROM otps WHERE expires_at < ?")
            .bind(Utc::now() - retention)
            .execute(&self.pool)
            .await
            .map_err(query_error("Failed to clean up expired OTPs"))?;

        Ok(result.rows_affected())
    }
}
