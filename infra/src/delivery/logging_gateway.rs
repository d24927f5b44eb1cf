//! Development gateway that records deliveries in the log instead of sending them

use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};

use pn_core::domain::entities::NotificationType;
use pn_core::errors::DeliveryError;
use pn_core::services::{DeliveryGateway, DeliveryReceipt};
use pn_shared::masking::mask_recipient;

pub const PROVIDER_NAME: &str = "log";

/// Gateway that accepts every delivery and logs it with a masked recipient.
///
/// Message bodies are never logged, only their length, since they carry
/// one-time codes.
#[derive(Debug, Default)]
pub struct LoggingDeliveryGateway {
    delivered: AtomicU64,
}

impl LoggingDeliveryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of deliveries accepted so far
    pub fn delivered_count(&self) -> u64 {
        self.delivered.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DeliveryGateway for LoggingDeliveryGateway {
    async fn deliver(
        &self,
        notification_type: NotificationType,
        recipient: &str,
        subject: Option<&str>,
        body: &str,
    ) -> Result<DeliveryReceipt, DeliveryError> {
        let sequence = self.delivered.fetch_add(1, Ordering::SeqCst) + 1;

        tracing::info!(
            notification_type = %notification_type,
            recipient = %mask_recipient(recipient),
            subject = subject.unwrap_or(""),
            body_length = body.len(),
            sequence,
            event = "delivery_logged",
            "Delivery recorded by logging gateway"
        );

        Ok(DeliveryReceipt::new(
            PROVIDER_NAME,
            Some(format!("log-{}", sequence)),
        ))
    }
}
