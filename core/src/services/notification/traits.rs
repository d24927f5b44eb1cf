//! Seams between the dispatcher, delivery providers and other services

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::entities::{Notification, NotificationType};
use crate::errors::{DeliveryError, DomainResult};

/// Provider acknowledgement of an accepted message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryReceipt {
    /// Provider that accepted the message
    pub provider: String,
    /// Provider-side message id, when it returns one
    pub message_id: Option<String>,
}

impl DeliveryReceipt {
    pub fn new(provider: impl Into<String>, message_id: Option<String>) -> Self {
        Self {
            provider: provider.into(),
            message_id,
        }
    }
}

/// Trait for delivery provider integration
#[async_trait]
pub trait DeliveryGateway: Send + Sync {
    /// Hand one message to the provider for `notification_type`
    async fn deliver(
        &self,
        notification_type: NotificationType,
        recipient: &str,
        subject: Option<&str>,
        body: &str,
    ) -> Result<DeliveryReceipt, DeliveryError>;
}

/// Anything that can send a notification on behalf of another service
#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn send(&self, notification: Notification) -> DomainResult<Notification>;
}
