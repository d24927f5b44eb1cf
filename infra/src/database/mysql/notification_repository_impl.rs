//! MySQL implementation of the NotificationRepository trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::mysql::MySqlRow;
use sqlx::MySqlPool;
use uuid::Uuid;

use pn_core::domain::entities::{Notification, NotificationStatus};
use pn_core::errors::DomainError;
use pn_core::repositories::NotificationRepository;

use super::{column, enum_column, json_column, json_text, query_error, uuid_column};

const NOTIFICATION_COLUMNS: &str = r#"
    id, merchant_id, user_id, type, channel, recipient, subject, message, status,
    sent_at, delivered_at, error_message, retry_count, metadata, created_at
"#;

/// MySQL implementation of NotificationRepository
pub struct MySqlNotificationRepository {
    pool: MySqlPool,
}

impl MySqlNotificationRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    fn row_to_notification(row: &MySqlRow) -> Result<Notification, DomainError> {
        Ok(Notification {
            id: uuid_column(row, "id")?,
            merchant_id: column(row, "merchant_id")?,
            user_id: column(row, "user_id")?,
            notification_type: enum_column(row, "type")?,
            channel: enum_column(row, "channel")?,
            recipient: column(row, "recipient")?,
            subject: column(row, "subject")?,
            message: column(row, "message")?,
            status: enum_column(row, "status")?,
            sent_at: column(row, "sent_at")?,
            delivered_at: column(row, "delivered_at")?,
            error_message: column(row, "error_message")?,
            retry_count: column(row, "retry_count")?,
            metadata: json_column(row, "metadata")?,
            created_at: column(row, "created_at")?,
        })
    }

    fn rows_to_notifications(rows: Vec<MySqlRow>) -> Result<Vec<Notification>, DomainError> {
        rows.iter().map(Self::row_to_notification).collect()
    }

    /// Newest first, filtered on a single owner column
    async fn list_by_owner(
        &self,
        owner_column: &'static str,
        owner: &str,
        limit: usize,
        context: &'static str,
    ) -> Result<Vec<Notification>, DomainError> {
        let sql = format!(
            "SELECT {} FROM notifications WHERE {} = ? ORDER BY created_at DESC LIMIT ?",
            NOTIFICATION_COLUMNS, owner_column
        );

        let rows = sqlx::query(&sql)
            .bind(owner)
            .bind(limit as u64)
            .fetch_all(&self.pool)
            .await
            .map_err(query_error(context))?;

        Self::rows_to_notifications(rows)
    }
}

#[async_trait]
impl NotificationRepository for MySqlNotificationRepository {
    async fn create(&self, notification: Notification) -> Result<Notification, DomainError> {
        let query = r#"
            INSERT INTO notifications (
                id, merchant_id, user_id, type, channel, recipient, subject, message, status,
                sent_at, delivered_at, error_message, retry_count, metadata, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#;

        sqlx::query(query)
            .bind(notification.id.to_string())
            .bind(&notification.merchant_id)
            .bind(&notification.user_id)
            .bind(notification.notification_type.as_str())
            .bind(notification.channel.as_str())
            .bind(&notification.recipient)
            .bind(&notification.subject)
            .bind(&notification.message)
            .bind(notification.status.as_str())
            .bind(notification.sent_at)
            .bind(notification.delivered_at)
            .bind(&notification.error_message)
            .bind(notification.retry_count)
            .bind(json_text(&notification.metadata))
            .bind(notification.created_at)
            .execute(&self.pool)
            .await
            .map_err(query_error("Failed to save notification"))?;

        Ok(notification)
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: NotificationStatus,
        error_message: Option<String>,
    ) -> Result<bool, DomainError> {
        let allowed = status.predecessors();
        let placeholders = vec!["?"; allowed.len()].join(", ");
        let sql = format!(
            r#"
            UPDATE notifications SET
                status = ?,
                error_message = ?,
                sent_at = CASE WHEN ? THEN COALESCE(sent_at, ?) ELSE sent_at END,
                delivered_at = CASE WHEN ? THEN ? ELSE delivered_at END,
                retry_count = retry_count + 1
            WHERE id = ? AND status IN ({})
            "#,
            placeholders
        );

        let now = Utc::now();
        let mut query = sqlx::query(&sql)
            .bind(status.as_str())
            .bind(error_message)
            .bind(status.implies_sent())
            .bind(now)
            .bind(status == NotificationStatus::Delivered)
            .bind(now)
            .bind(id.to_string());
        for previous in allowed {
            query = query.bind(previous.as_str());
        }

        let result = query
            .execute(&self.pool)
            .await
            .map_err(query_error("Failed to update notification status"))?;

        Ok(result.rows_affected() > 0)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Notification>, DomainError> {
        let sql = format!("SELECT {} FROM notifications WHERE id = ?", NOTIFICATION_COLUMNS);

        sqlx::query(&sql)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(query_error("Failed to find notification"))?
            .map(|row| Self::row_to_notification(&row))
            .transpose()
    }

    async fn list_pending(
        &self,
        limit: usize,
        max_retries: i32,
        created_before: DateTime<Utc>,
    ) -> Result<Vec<Notification>, DomainError> {
        let sql = format!(
            r#"
            SELECT {} FROM notifications
            WHERE status = 'pending' AND retry_count < ? AND created_at < ?
            ORDER BY created_at ASC
            LIMIT ?
            "#,
            NOTIFICATION_COLUMNS
        );

        let rows = sqlx::query(&sql)
            .bind(max_retries)
            .bind(created_before)
            .bind(limit as u64)
            .fetch_all(&self.pool)
            .await
            .map_err(query_error("Failed to list pending notifications"))?;

        Self::rows_to_notifications(rows)
    }

    async fn list_by_merchant(
        &self,
        merchant_id: &str,
        limit: usize,
    ) -> Result<Vec<Notification>, DomainError> {
        self.list_by_owner(
            "merchant_id",
            merchant_id,
            limit,
            "Failed to list merchant notifications",
        )
        .await
    }

    async fn list_by_user(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<Notification>, DomainError> {
        self.list_by_owner("user_id", user_id, limit, "Failed to list user notifications")
            .await
    }
}
