//! Delivery providers
//!
//! - **Logging gateway**: records deliveries in the log, for development
//! - **Twilio**: production SMS over the Twilio REST API
//! - **Router**: picks the provider for each notification type

use std::sync::Arc;

use pn_core::domain::entities::NotificationType;
use pn_core::services::DeliveryGateway;
use pn_shared::config::{DeliveryConfig, SmsProvider};

use crate::InfrastructureError;

pub mod logging_gateway;
pub mod router;
pub mod twilio;

// Re-export commonly used types
pub use logging_gateway::LoggingDeliveryGateway;
pub use router::RoutingDeliveryGateway;
pub use twilio::TwilioSmsGateway;

/// Build the delivery gateway described by the configuration
///
/// Email and push go to the logging gateway; SMS goes to the configured
/// provider. Twilio with unusable settings is an error, never a fallback
/// to the logging gateway.
pub fn create_delivery_gateway(
    config: &DeliveryConfig,
) -> Result<RoutingDeliveryGateway, InfrastructureError> {
    let fallback = Arc::new(LoggingDeliveryGateway::new());

    let sms: Arc<dyn DeliveryGateway> = match config.sms_provider {
        SmsProvider::Log => {
            tracing::warn!("SMS deliveries will only be logged");
            fallback.clone()
        }
        SmsProvider::Twilio => Arc::new(TwilioSmsGateway::new(config.twilio.clone()).map_err(
            |e| {
                tracing::error!(error = %e, "Failed to initialize Twilio SMS gateway");
                e
            },
        )?),
    };

    tracing::info!(sms_provider = ?config.sms_provider, "Delivery gateway configured");

    Ok(RoutingDeliveryGateway::new()
        .route(NotificationType::Email, fallback.clone())
        .route(NotificationType::Push, fallback)
        .route(NotificationType::Sms, sms))
}
