//! Per-type routing across delivery providers

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

use pn_core::domain::entities::NotificationType;
use pn_core::errors::DeliveryError;
use pn_core::services::{DeliveryGateway, DeliveryReceipt};

/// Gateway that forwards each delivery to the provider registered for its type
#[derive(Default, Clone)]
pub struct RoutingDeliveryGateway {
    routes: HashMap<NotificationType, Arc<dyn DeliveryGateway>>,
}

impl RoutingDeliveryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the provider for a notification type
    pub fn route(mut self, notification_type: NotificationType, gateway: Arc<dyn DeliveryGateway>) -> Self {
        self.routes.insert(notification_type, gateway);
        self
    }

    pub fn has_route(&self, notification_type: NotificationType) -> bool {
        self.routes.contains_key(&notification_type)
    }
}

impl std::fmt::Debug for RoutingDeliveryGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut types: Vec<&str> = self.routes.keys().map(|t| t.as_str()).collect();
        types.sort_unstable();
        f.debug_struct("RoutingDeliveryGateway")
            .field("routes", &types)
            .finish()
    }
}

#[async_trait]
impl DeliveryGateway for RoutingDeliveryGateway {
    async fn deliver(
        &self,
        notification_type: NotificationType,
        recipient: &str,
        subject: Option<&str>,
        body: &str,
    ) -> Result<DeliveryReceipt, DeliveryError> {
        match self.routes.get(&notification_type) {
            Some(gateway) => gateway.deliver(notification_type, recipient, subject, body).await,
            None => {
                tracing::warn!(
                    notification_type = %notification_type,
                    event = "delivery_unrouted",
                    "No delivery provider configured for notification type"
                );
                Err(DeliveryError::permanent(format!(
                    "no delivery provider configured for {}",
                    notification_type
                )))
            }
        }
    }
}
