//! MySQL implementation of the PreferencesRepository trait.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::mysql::MySqlRow;
use sqlx::MySqlPool;

use pn_core::domain::entities::NotificationPreferences;
use pn_core::errors::DomainError;
use pn_core::repositories::PreferencesRepository;

use super::{column, query_error, uuid_column};

const PREFERENCE_COLUMNS: &str = r#"
    id, merchant_id, email_enabled, sms_enabled, push_enabled,
    transaction_notifications, payout_notifications, settlement_notifications,
    security_notifications, marketing_notifications,
    email_address, phone_number, created_at, updated_at
"#;

/// MySQL implementation of PreferencesRepository
pub struct MySqlPreferencesRepository {
    pool: MySqlPool,
}

impl MySqlPreferencesRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    fn row_to_preferences(row: &MySqlRow) -> Result<NotificationPreferences, DomainError> {
        Ok(NotificationPreferences {
            id: uuid_column(row, "id")?,
            merchant_id: column(row, "merchant_id")?,
            email_enabled: column(row, "email_enabled")?,
            sms_enabled: column(row, "sms_enabled")?,
            push_enabled: column(row, "push_enabled")?,
            transaction_notifications: column(row, "transaction_notifications")?,
            payout_notifications: column(row, "payout_notifications")?,
            settlement_notifications: column(row, "settlement_notifications")?,
            security_notifications: column(row, "security_notifications")?,
            marketing_notifications: column(row, "marketing_notifications")?,
            email_address: column(row, "email_address")?,
            phone_number: column(row, "phone_number")?,
            created_at: column(row, "created_at")?,
            updated_at: column(row, "updated_at")?,
        })
    }

    async fn find_by_merchant(
        &self,
        merchant_id: &str,
    ) -> Result<Option<NotificationPreferences>, DomainError> {
        let sql = format!(
            "SELECT {} FROM notification_preferences WHERE merchant_id = ?",
            PREFERENCE_COLUMNS
        );

        sqlx::query(&sql)
            .bind(merchant_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(query_error("Failed to load notification preferences"))?
            .map(|row| Self::row_to_preferences(&row))
            .transpose()
    }

    /// Insert the default row; a concurrent insert for the same merchant wins silently
    async fn insert_defaults(&self, defaults: &NotificationPreferences) -> Result<(), DomainError> {
        let query = r#"
            INSERT IGNORE INTO notification_preferences (
                id, merchant_id, email_enabled, sms_enabled, push_enabled,
                transaction_notifications, payout_notifications, settlement_notifications,
                security_notifications, marketing_notifications,
                email_address, phone_number, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#;

        sqlx::query(query)
            .bind(defaults.id.to_string())
            .bind(&defaults.merchant_id)
            .bind(defaults.email_enabled)
            .bind(defaults.sms_enabled)
            .bind(defaults.push_enabled)
            .bind(defaults.transaction_notifications)
            .bind(defaults.payout_notifications)
            .bind(defaults.settlement_notifications)
            .bind(defaults.security_notifications)
            .bind(defaults.marketing_notifications)
            .bind(&defaults.email_address)
            .bind(&defaults.phone_number)
            .bind(defaults.created_at)
            .bind(defaults.updated_at)
            .execute(&self.pool)
            .await
            .map_err(query_error("Failed to create default notification preferences"))?;

        Ok(())
    }
}

#[async_trait]
impl PreferencesRepository for MySqlPreferencesRepository {
    async fn get_or_create_defaults(
        &self,
        merchant_id: &str,
    ) -> Result<NotificationPreferences, DomainError> {
        if let Some(existing) = self.find_by_merchant(merchant_id).await? {
            return Ok(existing);
        }

        self.insert_defaults(&NotificationPreferences::defaults_for(merchant_id))
            .await?;
        tracing::info!(
            merchant_id = %merchant_id,
            event = "preferences_created",
            "Created default notification preferences"
        );

        self.find_by_merchant(merchant_id)
            .await?
            .ok_or_else(|| DomainError::storage("Default notification preferences were not stored"))
    }

    async fn update(&self, preferences: &NotificationPreferences) -> Result<bool, DomainError> {
        let query = r#"
            UPDATE notification_preferences SET
                email_enabled = ?,
                sms_enabled = ?,
                push_enabled = ?,
                transaction_notifications = ?,
                payout_notifications = ?,
                settlement_notifications = ?,
                security_notifications = ?,
                marketing_notifications = ?,
                email_address = ?,
                phone_number = ?,
                updated_at = ?
            WHERE merchant_id = ?
        "#;

        let result = sqlx::query(query)
            .bind(preferences.email_enabled)
            .bind(preferences.sms_enabled)
            .bind(preferences.push_enabled)
            .bind(preferences.transaction_notifications)
            .bind(preferences.payout_notifications)
            .bind(preferences.settlement_notifications)
            .bind(preferences.security_notifications)
            .bind(preferences.marketing_notifications)
            .bind(&preferences.email_address)
            .bind(&preferences.phone_number)
            .bind(Utc::now())
            .bind(&preferences.merchant_id)
            .execute(&self.pool)
            .await
            .map_err(query_error("Failed to update notification preferences"))?;

        Ok(result.rows_affected() > 0)
    }
}
