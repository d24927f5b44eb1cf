//! One-time code configuration

use serde::{Deserialize, Serialize};

use super::env_parse;

/// Configuration for code generation, verification bounds and cleanup
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OtpConfig {
    /// Number of decimal digits in a generated code
    pub code_length: usize,
    /// Minutes before a code expires when the request does not say
    pub default_expiry_minutes: i64,
    /// Verification attempts allowed when the request does not say
    pub default_max_attempts: i32,
    /// Hours an expired code is kept before cleanup purges it
    pub retention_hours: i64,
    /// Seconds between background cleanup runs
    pub cleanup_interval_seconds: u64,
    /// Brand name used in code messages
    pub brand_name: String,
}

impl Default for OtpConfig {
    fn default() -> Self {
        Self {
            code_length: 6,
            default_expiry_minutes: 10,
            default_max_attempts: 3,
            retention_hours: 24,
            cleanup_interval_seconds: 3600,
            brand_name: String::from("PayNotify"),
        }
    }
}

impl OtpConfig {
    /// Create from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            code_length: env_parse("OTP_CODE_LENGTH").unwrap_or(defaults.code_length),
            default_expiry_minutes: env_parse("OTP_EXPIRY_MINUTES")
                .unwrap_or(defaults.default_expiry_minutes),
            default_max_attempts: env_parse("OTP_MAX_ATTEMPTS")
                .unwrap_or(defaults.default_max_attempts),
            retention_hours: env_parse("OTP_RETENTION_HOURS").unwrap_or(defaults.retention_hours),
            cleanup_interval_seconds: env_parse("OTP_CLEANUP_INTERVAL_SECONDS")
                .unwrap_or(defaults.cleanup_interval_seconds),
            brand_name: std::env::var("OTP_BRAND_NAME").unwrap_or(defaults.brand_name),
        }
    }
}
