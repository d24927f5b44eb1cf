//! Notification record repository trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::entities::{Notification, NotificationStatus};
use crate::errors::DomainError;

/// Repository trait for notification records
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    /// Persist a new record, returning it as stored
    async fn create(&self, notification: Notification) -> Result<Notification, DomainError>;

    /// Record a status change
    ///
    /// Only applies when the stored status is one of `status.predecessors()`.
    /// Stamps `sent_at` when the status is sent or delivered, `delivered_at`
    /// when it is delivered, and increments `retry_count` on every call.
    /// Returns whether a row was updated; `false` covers both an unknown id
    /// and a refused transition.
    async fn update_status(
        &self,
        id: Uuid,
        status: NotificationStatus,
        error_message: Option<String>,
    ) -> Result<bool, DomainError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Notification>, DomainError>;

    /// Oldest pending records with `retry_count < max_retries` created before `created_before`
    async fn list_pending(
        &self,
        limit: usize,
        max_retries: i32,
        created_before: DateTime<Utc>,
    ) -> Result<Vec<Notification>, DomainError>;

    /// Newest first
    async fn list_by_merchant(
        &self,
        merchant_id: &str,
        limit: usize,
    ) -> Result<Vec<Notification>, DomainError>;

    /// Newest first
    async fn list_by_user(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<Notification>, DomainError>;
}
