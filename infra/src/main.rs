//! PayNotify background worker
//!
//! Purges long-expired one-time codes and retries pending notifications
//! until interrupted.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::task::JoinHandle;
use tracing::{error, info};

use pn_core::repositories::{NotificationRepository, PreferencesRepository};
use pn_core::services::{DeliveryGateway, NotificationDispatcher, OtpCleanupTask};
use pn_infra::{
    create_delivery_gateway, init_tracing, load_config, DatabasePool, MySqlNotificationRepository,
    MySqlOtpRepository, MySqlPreferencesRepository,
};
use pn_shared::config::DispatchConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = load_config().context("Failed to load configuration")?;
    init_tracing(&config.logging)?;

    info!(environment = %config.environment, "Starting PayNotify worker");

    let database = DatabasePool::new(config.database.clone())
        .await
        .context("Failed to connect to the database")?;
    if !database.health_check().await? {
        anyhow::bail!("Database health check failed");
    }
    info!(stats = %database.get_statistics(), "Database ready");

    let pool = database.get_pool().clone();
    let otps = Arc::new(MySqlOtpRepository::new(pool.clone()));
    let notifications = Arc::new(MySqlNotificationRepository::new(pool.clone()));
    let preferences = Arc::new(MySqlPreferencesRepository::new(pool));
    let gateway = Arc::new(create_delivery_gateway(&config.delivery)?);

    let dispatcher = Arc::new(NotificationDispatcher::new(
        notifications,
        preferences,
        gateway,
        config.dispatch.clone(),
    ));

    let cleanup = Arc::new(OtpCleanupTask::new(otps, &config.otp)).start_background_task();
    let redelivery = start_redelivery_task(dispatcher, &config.dispatch);

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    info!("Shutdown signal received");

    for handle in [cleanup, redelivery].into_iter().flatten() {
        handle.abort();
    }
    database.close().await;

    info!("PayNotify worker stopped");
    Ok(())
}

/// Spawn the redelivery loop; an interval of zero disables it
fn start_redelivery_task<N, P, G>(
    dispatcher: Arc<NotificationDispatcher<N, P, G>>,
    config: &DispatchConfig,
) -> Option<JoinHandle<()>>
where
    N: NotificationRepository + 'static,
    P: PreferencesRepository + 'static,
    G: DeliveryGateway + 'static,
{
    if config.redelivery_interval_seconds == 0 {
        info!("Notification redelivery is disabled");
        return None;
    }

    let interval = Duration::from_secs(config.redelivery_interval_seconds);
    let batch_size = config.redelivery_batch_size;

    Some(tokio::spawn(async move {
        info!(
            interval_seconds = interval.as_secs(),
            batch_size,
            "Notification redelivery task started"
        );

        let mut timer = tokio::time::interval(interval);
        loop {
            timer.tick().await;

            if let Err(e) = dispatcher.redeliver_pending(batch_size).await {
                error!(error = %e, event = "redelivery_cycle_failed", "Redelivery cycle failed");
            }
        }
    }))
}
