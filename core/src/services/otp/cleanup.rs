//! Periodic purge of long-expired one-time codes

use chrono::Duration;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use pn_shared::config::OtpConfig;

use crate::errors::DomainResult;
use crate::repositories::OtpRepository;

/// Background task deleting codes whose expiry is older than the retention window
pub struct OtpCleanupTask<R: OtpRepository> {
    repository: Arc<R>,
    interval_seconds: u64,
    retention_hours: i64,
}

impl<R: OtpRepository> OtpCleanupTask<R> {
    pub fn new(repository: Arc<R>, config: &OtpConfig) -> Self {
        Self {
            repository,
            interval_seconds: config.cleanup_interval_seconds,
            retention_hours: config.retention_hours,
        }
    }

    /// Run a single cleanup cycle, returning the number of codes deleted
    pub async fn run_cleanup(&self) -> DomainResult<u64> {
        let deleted = self
            .repository
            .delete_expired_older_than(Duration::hours(self.retention_hours))
            .await?;

        if deleted > 0 {
            info!(deleted = deleted, event = "otp_cleanup", "Deleted expired one-time codes");
        }
        Ok(deleted)
    }

    /// Spawn the cleanup loop; an interval of zero disables it
    pub fn start_background_task(self: Arc<Self>) -> Option<JoinHandle<()>>
    where
        R: 'static,
    {
        if self.interval_seconds == 0 {
            warn!("OTP cleanup task is disabled");
            return None;
        }

        let interval = std::time::Duration::from_secs(self.interval_seconds);

        Some(tokio::spawn(async move {
            info!(
                interval_seconds = self.interval_seconds,
                retention_hours = self.retention_hours,
                "OTP cleanup task started"
            );

            let mut interval_timer = tokio::time::interval(interval);

            loop {
                interval_timer.tick().await;

                if let Err(e) = self.run_cleanup().await {
                    error!(error = %e, event = "otp_cleanup_failed", "OTP cleanup cycle failed");
                }
            }
        }))
    }
}
