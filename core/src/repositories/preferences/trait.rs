//! Notification preferences repository trait.

use async_trait::async_trait;

use crate::domain::entities::NotificationPreferences;
use crate::errors::DomainError;

/// Repository trait for per-merchant notification preferences
#[async_trait]
pub trait PreferencesRepository: Send + Sync {
    /// Stored preferences for a merchant, creating the default row on first access
    async fn get_or_create_defaults(
        &self,
        merchant_id: &str,
    ) -> Result<NotificationPreferences, DomainError>;

    /// Overwrite the toggles and contact points; returns false if the merchant has no row
    async fn update(&self, preferences: &NotificationPreferences) -> Result<bool, DomainError>;
}
