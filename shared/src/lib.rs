//! Shared utilities and common types for the PayNotify services
//!
//! This crate provides functionality used by both the core and infra crates:
//! - Configuration types for every service area
//! - Recipient masking for logs
//! - Contact point validation (phone numbers, email addresses)

pub mod config;
pub mod utils;

// Re-export commonly used items at crate root
pub use config::{
    AppConfig, DatabaseConfig, DeliveryConfig, DispatchConfig, Environment, LogFormat,
    LoggingConfig, OtpConfig, SmsProvider, TwilioSettings,
};
pub use utils::{masking, validation};
