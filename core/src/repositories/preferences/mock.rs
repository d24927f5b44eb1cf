//! Mock implementation of PreferencesRepository for testing

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::entities::NotificationPreferences;
use crate::errors::DomainError;

use super::r#trait::PreferencesRepository;

/// In-memory preferences store keyed by merchant
pub struct MockPreferencesRepository {
    preferences: Arc<RwLock<HashMap<String, NotificationPreferences>>>,
    unavailable: AtomicBool,
}

impl MockPreferencesRepository {
    pub fn new() -> Self {
        Self {
            preferences: Arc::new(RwLock::new(HashMap::new())),
            unavailable: AtomicBool::new(false),
        }
    }

    /// Make every call fail with a storage error
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Seed a row directly
    pub async fn insert(&self, preferences: NotificationPreferences) {
        self.preferences
            .write()
            .await
            .insert(preferences.merchant_id.clone(), preferences);
    }

    pub async fn get(&self, merchant_id: &str) -> Option<NotificationPreferences> {
        self.preferences.read().await.get(merchant_id).cloned()
    }

    fn check_available(&self) -> Result<(), DomainError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(DomainError::storage("Simulated preferences store outage"));
        }
        Ok(())
    }
}

impl Default for MockPreferencesRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PreferencesRepository for MockPreferencesRepository {
    async fn get_or_create_defaults(
        &self,
        merchant_id: &str,
    ) -> Result<NotificationPreferences, DomainError> {
        self.check_available()?;
        let mut preferences = self.preferences.write().await;
        Ok(preferences
            .entry(merchant_id.to_string())
            .or_insert_with(|| NotificationPreferences::defaults_for(merchant_id))
            .clone())
    }

    async fn update(&self, preferences: &NotificationPreferences) -> Result<bool, DomainError> {
        self.check_available()?;
        let mut stored = self.preferences.write().await;
        match stored.get_mut(&preferences.merchant_id) {
            Some(existing) => {
                let id = existing.id;
                let created_at = existing.created_at;
                *existing = NotificationPreferences {
                    id,
                    created_at,
                    updated_at: Utc::now(),
                    ..preferences.clone()
                };
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
