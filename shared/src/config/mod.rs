//! Configuration module with business-specific sub-modules
//!
//! This module organizes configuration into logical areas:
//! - `database` - Database connection and pool configuration
//! - `delivery` - Delivery provider selection and credentials
//! - `dispatch` - Notification dispatch policy (timeouts, redelivery)
//! - `environment` - Environment detection and logging configuration
//! - `otp` - One-time code generation, expiry and cleanup

pub mod database;
pub mod delivery;
pub mod dispatch;
pub mod environment;
pub mod otp;

use serde::{Deserialize, Serialize};

// Re-export commonly used types
pub use database::DatabaseConfig;
pub use delivery::{DeliveryConfig, SmsProvider, TwilioSettings};
pub use dispatch::DispatchConfig;
pub use environment::{Environment, LogFormat, LoggingConfig};
pub use otp::OtpConfig;

/// Complete application configuration combining all sub-configurations
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Environment configuration
    #[serde(default)]
    pub environment: Environment,

    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// One-time code configuration
    #[serde(default)]
    pub otp: OtpConfig,

    /// Notification dispatch configuration
    #[serde(default)]
    pub dispatch: DispatchConfig,

    /// Delivery provider configuration
    #[serde(default)]
    pub delivery: DeliveryConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        let env = Environment::default();
        Self {
            environment: env,
            database: DatabaseConfig::default(),
            otp: OtpConfig::default(),
            dispatch: DispatchConfig::default(),
            delivery: DeliveryConfig::default(),
            logging: LoggingConfig::for_environment(env),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        let environment = Environment::from_env();
        let mut logging = LoggingConfig::for_environment(environment);
        if let Ok(level) = std::env::var("LOG_LEVEL") {
            logging.level = level;
        }

        Self {
            environment,
            database: DatabaseConfig::from_env(),
            otp: OtpConfig::from_env(),
            dispatch: DispatchConfig::from_env(),
            delivery: DeliveryConfig::from_env(),
            logging,
        }
    }
}

/// Read and parse an environment variable, returning `None` when unset or unparsable
pub(crate) fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}
