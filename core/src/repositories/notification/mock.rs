//! Mock implementation of NotificationRepository for testing

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::entities::{Notification, NotificationStatus};
use crate::errors::DomainError;

use super::r#trait::NotificationRepository;

/// In-memory notification store
pub struct MockNotificationRepository {
    notifications: Arc<RwLock<HashMap<Uuid, Notification>>>,
    fail_create: AtomicBool,
    fail_update: AtomicBool,
}

impl MockNotificationRepository {
    pub fn new() -> Self {
        Self {
            notifications: Arc::new(RwLock::new(HashMap::new())),
            fail_create: AtomicBool::new(false),
            fail_update: AtomicBool::new(false),
        }
    }

    pub fn set_fail_create(&self, fail: bool) {
        self.fail_create.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_update(&self, fail: bool) {
        self.fail_update.store(fail, Ordering::SeqCst);
    }

    pub async fn all(&self) -> Vec<Notification> {
        let mut rows: Vec<Notification> =
            self.notifications.read().await.values().cloned().collect();
        rows.sort_by_key(|n| n.created_at);
        rows
    }

    pub async fn count(&self) -> usize {
        self.notifications.read().await.len()
    }

    /// Insert a row directly, bypassing `create`
    pub async fn insert(&self, notification: Notification) {
        self.notifications
            .write()
            .await
            .insert(notification.id, notification);
    }

    fn newest_first(mut rows: Vec<Notification>, limit: usize) -> Vec<Notification> {
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        rows.truncate(limit);
        rows
    }
}

impl Default for MockNotificationRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NotificationRepository for MockNotificationRepository {
    async fn create(&self, notification: Notification) -> Result<Notification, DomainError> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(DomainError::storage("Simulated insert failure"));
        }
        self.notifications
            .write()
            .await
            .insert(notification.id, notification.clone());
        Ok(notification)
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: NotificationStatus,
        error_message: Option<String>,
    ) -> Result<bool, DomainError> {
        if self.fail_update.load(Ordering::SeqCst) {
            return Err(DomainError::storage("Simulated update failure"));
        }
        let mut notifications = self.notifications.write().await;
        match notifications.get_mut(&id) {
            Some(notification) => Ok(notification.apply_status(status, error_message, Utc::now())),
            None => Ok(false),
        }
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Notification>, DomainError> {
        Ok(self.notifications.read().await.get(&id).cloned())
    }

    async fn list_pending(
        &self,
        limit: usize,
        max_retries: i32,
        created_before: DateTime<Utc>,
    ) -> Result<Vec<Notification>, DomainError> {
        let mut pending: Vec<Notification> = self
            .notifications
            .read()
            .await
            .values()
            .filter(|n| {
                n.status == NotificationStatus::Pending
                    && n.retry_count < max_retries
                    && n.created_at < created_before
            })
            .cloned()
            .collect();
        pending.sort_by_key(|n| n.created_at);
        pending.truncate(limit);
        Ok(pending)
    }

    async fn list_by_merchant(
        &self,
        merchant_id: &str,
        limit: usize,
    ) -> Result<Vec<Notification>, DomainError> {
        let rows = self
            .notifications
            .read()
            .await
            .values()
            .filter(|n| n.merchant_id.as_deref() == Some(merchant_id))
            .cloned()
            .collect();
        Ok(Self::newest_first(rows, limit))
    }

    async fn list_by_user(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<Notification>, DomainError> {
        let rows = self
            .notifications
            .read()
            .await
            .values()
            .filter(|n| n.user_id.as_deref() == Some(user_id))
            .cloned()
            .collect();
        Ok(Self::newest_first(rows, limit))
    }
}
