//! # Infrastructure Layer
//!
//! Concrete adapters behind the `pn_core` traits:
//! - **Database**: MySQL record stores for codes, notifications and preferences (SQLx)
//! - **Delivery**: SMS over the Twilio REST API, plus a logging gateway for development
//! - **Config / Logging**: layered configuration loading and tracing subscriber setup
//!
//! The `pn_worker` binary wires these together and runs the periodic code
//! cleanup and notification redelivery loops.

// Re-export core types for convenience
pub use pn_core::errors::*;

/// Database module - MySQL implementations using SQLx
pub mod database;

/// Delivery providers and the per-type router
pub mod delivery;

pub mod logging;
pub mod settings;

pub use database::{
    DatabasePool, MySqlNotificationRepository, MySqlOtpRepository, MySqlPreferencesRepository,
    PoolStatistics,
};
pub use delivery::{
    create_delivery_gateway, LoggingDeliveryGateway, RoutingDeliveryGateway, TwilioSmsGateway,
};
pub use logging::init_tracing;
pub use settings::load_config;

/// Infrastructure-specific error types
#[derive(Debug, thiserror::Error)]
pub enum InfrastructureError {
    /// Database connection error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// HTTP request error for external services
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Delivery provider error
    #[error("Delivery provider error: {0}")]
    Delivery(String),

    /// General infrastructure error
    #[error("Infrastructure error: {0}")]
    General(String),
}

impl From<::config::ConfigError> for InfrastructureError {
    fn from(err: ::config::ConfigError) -> Self {
        InfrastructureError::Config(err.to_string())
    }
}
