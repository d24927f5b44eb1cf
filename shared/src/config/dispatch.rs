//! Notification dispatch configuration

use serde::{Deserialize, Serialize};

use super::env_parse;

/// Configuration for the notification dispatcher
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Upper bound on a single gateway call, in milliseconds
    pub delivery_timeout_ms: u64,
    /// Pending notifications with this many status updates are no longer redelivered
    pub max_redeliveries: i32,
    /// Number of pending notifications picked up per redelivery pass
    pub redelivery_batch_size: usize,
    /// Seconds between background redelivery passes
    pub redelivery_interval_seconds: u64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            delivery_timeout_ms: 10_000,
            max_redeliveries: 3,
            redelivery_batch_size: 100,
            redelivery_interval_seconds: 60,
        }
    }
}

impl DispatchConfig {
    /// Create from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            delivery_timeout_ms: env_parse("DISPATCH_DELIVERY_TIMEOUT_MS")
                .unwrap_or(defaults.delivery_timeout_ms),
            max_redeliveries: env_parse("DISPATCH_MAX_REDELIVERIES")
                .unwrap_or(defaults.max_redeliveries),
            redelivery_batch_size: env_parse("DISPATCH_REDELIVERY_BATCH_SIZE")
                .unwrap_or(defaults.redelivery_batch_size),
            redelivery_interval_seconds: env_parse("DISPATCH_REDELIVERY_INTERVAL_SECONDS")
                .unwrap_or(defaults.redelivery_interval_seconds),
        }
    }

    /// Gateway timeout as a `Duration`
    pub fn delivery_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.delivery_timeout_ms)
    }
}
