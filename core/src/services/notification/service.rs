//! Notification dispatcher implementation

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use pn_shared::config::DispatchConfig;
use pn_shared::masking::mask_recipient;
use pn_shared::validation::{is_valid_email, is_valid_phone_number};

use crate::domain::entities::{
    Notification, NotificationChannel, NotificationPreferences, NotificationStatus,
    NotificationType,
};
use crate::errors::{DeliveryError, DomainError, DomainResult};
use crate::repositories::{NotificationRepository, PreferencesRepository};

use super::traits::{DeliveryGateway, DeliveryReceipt, NotificationSender};
use super::types::{PreferenceLookup, RedeliveryReport};

const SECURITY_NOT_REDELIVERED: &str = "security notifications are not redelivered";

/// Dispatcher that gates, records and delivers notifications
pub struct NotificationDispatcher<N, P, G>
where
    N: NotificationRepository,
    P: PreferencesRepository,
    G: DeliveryGateway,
{
    /// Notification record store
    notifications: Arc<N>,
    /// Merchant preference store
    preferences: Arc<P>,
    /// Provider gateway for every notification type
    gateway: Arc<G>,
    config: DispatchConfig,
}

impl<N, P, G> NotificationDispatcher<N, P, G>
where
    N: NotificationRepository,
    P: PreferencesRepository,
    G: DeliveryGateway,
{
    pub fn new(
        notifications: Arc<N>,
        preferences: Arc<P>,
        gateway: Arc<G>,
        config: DispatchConfig,
    ) -> Self {
        Self {
            notifications,
            preferences,
            gateway,
            config,
        }
    }

    /// Send a notification with the configured delivery timeout
    pub async fn send(&self, notification: Notification) -> DomainResult<Notification> {
        self.send_with_deadline(notification, self.config.delivery_timeout())
            .await
    }

    /// Send a notification, giving the gateway at most `deadline`
    ///
    /// This method:
    /// 1. Checks the merchant's preferences (a failed lookup allows the send)
    /// 2. Fills an empty recipient from the stored contact points
    /// 3. Records the notification as pending
    /// 4. Delivers it and records the outcome
    ///
    /// A refused notification is never recorded. A delivery that times out
    /// leaves the record pending so a later redelivery pass can pick it up.
    pub async fn send_with_deadline(
        &self,
        mut notification: Notification,
        deadline: Duration,
    ) -> DomainResult<Notification> {
        if let Some(merchant_id) = notification.merchant_id.clone() {
            let lookup = self.lookup_preferences(&merchant_id).await;

            let eligibility =
                lookup.evaluate(notification.notification_type, notification.channel);
            if let Some(reason) = eligibility.reason() {
                tracing::info!(
                    merchant_id = %merchant_id,
                    notification_type = %notification.notification_type,
                    channel = %notification.channel,
                    event = "notification_suppressed",
                    "Notification blocked by merchant preferences"
                );
                return Err(DomainError::PolicyDenied { reason });
            }

            if !notification.has_recipient() {
                if let Some(contact) = lookup.contact_for(notification.notification_type) {
                    notification.recipient = contact.to_string();
                }
            }
        }

        if !notification.has_recipient() {
            return Err(DomainError::validation(format!(
                "No recipient for {} notification",
                notification.notification_type
            )));
        }

        let mut notification = self.notifications.create(notification).await?;

        match self.deliver(&notification, deadline).await {
            Ok(receipt) => {
                self.record_status(&mut notification, NotificationStatus::Sent, None)
                    .await;
                tracing::info!(
                    notification_id = %notification.id,
                    recipient = %mask_recipient(&notification.recipient),
                    provider = %receipt.provider,
                    event = "notification_sent",
                    "Notification delivered to provider"
                );
                Ok(notification)
            }
            Err(err @ DeliveryError::TimedOut { .. }) => {
                tracing::warn!(
                    notification_id = %notification.id,
                    recipient = %mask_recipient(&notification.recipient),
                    event = "notification_timed_out",
                    "Delivery timed out, notification left pending"
                );
                Err(err.into())
            }
            Err(err) => {
                self.record_status(
                    &mut notification,
                    NotificationStatus::Failed,
                    Some(err.to_string()),
                )
                .await;
                tracing::warn!(
                    notification_id = %notification.id,
                    recipient = %mask_recipient(&notification.recipient),
                    error = %err,
                    event = "notification_failed",
                    "Notification delivery failed"
                );
                Err(err.into())
            }
        }
    }

    /// Email a merchant about a transaction status change
    pub async fn send_transaction_notification(
        &self,
        merchant_id: &str,
        recipient: &str,
        amount_minor: i64,
        currency: &str,
        status: &str,
    ) -> DomainResult<Notification> {
        let message = format!(
            "Transaction of {} {} has been {}",
            currency,
            format_minor_amount(amount_minor),
            status
        );
        self.send_business_email(
            merchant_id,
            recipient,
            NotificationChannel::Transaction,
            "Transaction Notification",
            message,
        )
        .await
    }

    /// Email a merchant about a payout status change
    pub async fn send_payout_notification(
        &self,
        merchant_id: &str,
        recipient: &str,
        amount_minor: i64,
        currency: &str,
        status: &str,
    ) -> DomainResult<Notification> {
        let message = format!(
            "Payout of {} {} has been {}",
            currency,
            format_minor_amount(amount_minor),
            status
        );
        self.send_business_email(
            merchant_id,
            recipient,
            NotificationChannel::Payout,
            "Payout Notification",
            message,
        )
        .await
    }

    /// Email a merchant about a settlement status change
    pub async fn send_settlement_notification(
        &self,
        merchant_id: &str,
        recipient: &str,
        amount_minor: i64,
        currency: &str,
        status: &str,
    ) -> DomainResult<Notification> {
        let message = format!(
            "Settlement of {} {} has been {}",
            currency,
            format_minor_amount(amount_minor),
            status
        );
        self.send_business_email(
            merchant_id,
            recipient,
            NotificationChannel::Settlement,
            "Settlement Notification",
            message,
        )
        .await
    }

    async fn send_business_email(
        &self,
        merchant_id: &str,
        recipient: &str,
        channel: NotificationChannel,
        subject: &str,
        message: String,
    ) -> DomainResult<Notification> {
        let notification = Notification::new(NotificationType::Email, channel, recipient, message)
            .with_merchant(merchant_id)
            .with_subject(subject);
        self.send(notification).await
    }

    pub async fn get(&self, id: Uuid) -> DomainResult<Notification> {
        self.notifications
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("notification {}", id)))
    }

    pub async fn list_for_merchant(
        &self,
        merchant_id: &str,
        limit: usize,
    ) -> DomainResult<Vec<Notification>> {
        self.notifications.list_by_merchant(merchant_id, limit).await
    }

    pub async fn list_for_user(&self, user_id: &str, limit: usize) -> DomainResult<Vec<Notification>> {
        self.notifications.list_by_user(user_id, limit).await
    }

    /// Record the provider's confirmation that a sent notification arrived
    pub async fn mark_delivered(&self, id: Uuid) -> DomainResult<Notification> {
        let mut notification = self.get(id).await?;

        if !notification
            .status
            .can_transition_to(NotificationStatus::Delivered)
        {
            return Err(DomainError::validation(format!(
                "Notification {} is {}, only sent notifications can be marked delivered",
                id, notification.status
            )));
        }

        if !self
            .notifications
            .update_status(id, NotificationStatus::Delivered, None)
            .await?
        {
            let current = self.get(id).await?;
            return Err(DomainError::validation(format!(
                "Notification {} is {}, only sent notifications can be marked delivered",
                id, current.status
            )));
        }
        notification.apply_status(NotificationStatus::Delivered, None, chrono::Utc::now());

        tracing::debug!(notification_id = %id, event = "notification_delivered", "Delivery confirmed");
        Ok(notification)
    }

    /// Retry pending notifications, oldest first
    ///
    /// Only records older than the delivery timeout are picked up, so a send
    /// still waiting on the gateway is left alone. Preferences are not checked
    /// again. Security notifications carry one-time codes that may have been
    /// replaced or expired since, so they are marked failed instead of resent.
    /// A transient failure keeps the record pending (each update bumps
    /// `retry_count`) until its last allowed attempt, after which it is marked
    /// failed. Permanent failures are marked failed straight away.
    pub async fn redeliver_pending(&self, limit: usize) -> DomainResult<RedeliveryReport> {
        let max_redeliveries = self.config.max_redeliveries;
        let created_before = chrono::Utc::now()
            - chrono::Duration::milliseconds(self.config.delivery_timeout_ms as i64);
        let pending = self
            .notifications
            .list_pending(limit, max_redeliveries, created_before)
            .await?;

        let mut report = RedeliveryReport {
            attempted: pending.len(),
            ..RedeliveryReport::default()
        };

        for mut notification in pending {
            if notification.channel == NotificationChannel::Security {
                tracing::info!(
                    notification_id = %notification.id,
                    recipient = %mask_recipient(&notification.recipient),
                    event = "redelivery_skipped",
                    "Security notification is not redelivered"
                );
                self.record_status(
                    &mut notification,
                    NotificationStatus::Failed,
                    Some(SECURITY_NOT_REDELIVERED.to_string()),
                )
                .await;
                report.skipped += 1;
                continue;
            }

            match self
                .deliver(&notification, self.config.delivery_timeout())
                .await
            {
                Ok(_) => {
                    self.record_status(&mut notification, NotificationStatus::Sent, None)
                        .await;
                    report.sent += 1;
                }
                Err(err) => {
                    let last_attempt = notification.retry_count + 1 >= max_redeliveries;
                    let status = if err.is_transient() && !last_attempt {
                        NotificationStatus::Pending
                    } else {
                        NotificationStatus::Failed
                    };
                    tracing::warn!(
                        notification_id = %notification.id,
                        retry_count = notification.retry_count,
                        next_status = %status,
                        error = %err,
                        event = "redelivery_failed",
                        "Redelivery attempt failed"
                    );
                    self.record_status(&mut notification, status, Some(err.to_string()))
                        .await;
                    report.failed += 1;
                }
            }
        }

        if !report.is_empty() {
            tracing::info!(
                attempted = report.attempted,
                sent = report.sent,
                failed = report.failed,
                skipped = report.skipped,
                event = "redelivery_completed",
                "Redelivery pass completed"
            );
        }

        Ok(report)
    }

    /// Merchant preferences, created with defaults on first access
    pub async fn preferences(&self, merchant_id: &str) -> DomainResult<NotificationPreferences> {
        if merchant_id.trim().is_empty() {
            return Err(DomainError::validation("merchant_id is required"));
        }
        self.preferences.get_or_create_defaults(merchant_id).await
    }

    /// Replace a merchant's toggles and contact points
    pub async fn update_preferences(
        &self,
        preferences: NotificationPreferences,
    ) -> DomainResult<NotificationPreferences> {
        if let Some(email) = preferences.email_address.as_deref() {
            if !is_valid_email(email) {
                return Err(DomainError::validation("Invalid email address"));
            }
        }
        if let Some(phone) = preferences.phone_number.as_deref() {
            if !is_valid_phone_number(phone) {
                return Err(DomainError::validation("Invalid phone number format"));
            }
        }

        if !self.preferences.update(&preferences).await? {
            return Err(DomainError::not_found(format!(
                "notification preferences for merchant {}",
                preferences.merchant_id
            )));
        }

        tracing::info!(
            merchant_id = %preferences.merchant_id,
            event = "preferences_updated",
            "Notification preferences updated"
        );
        Ok(preferences)
    }

    async fn lookup_preferences(&self, merchant_id: &str) -> PreferenceLookup {
        match self.preferences.get_or_create_defaults(merchant_id).await {
            Ok(prefs) => PreferenceLookup::Found(prefs),
            Err(e) => {
                tracing::warn!(
                    merchant_id = %merchant_id,
                    error = %e,
                    event = "preferences_unavailable",
                    "Preference lookup failed, sending without preference checks"
                );
                PreferenceLookup::Unavailable
            }
        }
    }

    async fn deliver(
        &self,
        notification: &Notification,
        deadline: Duration,
    ) -> Result<DeliveryReceipt, DeliveryError> {
        let delivery = self.gateway.deliver(
            notification.notification_type,
            &notification.recipient,
            notification.subject.as_deref(),
            &notification.message,
        );

        match tokio::time::timeout(deadline, delivery).await {
            Ok(result) => result,
            Err(_) => Err(DeliveryError::TimedOut {
                timeout_ms: deadline.as_millis() as u64,
            }),
        }
    }

    /// Persist a status change; a store failure here is logged, not returned
    ///
    /// When the store refuses the transition the record is reloaded so the
    /// caller sees the stored status.
    async fn record_status(
        &self,
        notification: &mut Notification,
        status: NotificationStatus,
        error_message: Option<String>,
    ) {
        match self
            .notifications
            .update_status(notification.id, status, error_message.clone())
            .await
        {
            Ok(true) => {
                notification.apply_status(status, error_message, chrono::Utc::now());
            }
            Ok(false) => {
                tracing::warn!(
                    notification_id = %notification.id,
                    from = %notification.status,
                    to = %status,
                    event = "notification_status_conflict",
                    "Notification status changed concurrently, update not applied"
                );
                if let Ok(Some(current)) = self.notifications.find_by_id(notification.id).await {
                    *notification = current;
                }
            }
            Err(e) => {
                tracing::error!(
                    notification_id = %notification.id,
                    status = %status,
                    error = %e,
                    event = "notification_status_update_failed",
                    "Failed to record notification status"
                );
                notification.apply_status(status, error_message, chrono::Utc::now());
            }
        }
    }
}

#[async_trait]
impl<N, P, G> NotificationSender for NotificationDispatcher<N, P, G>
where
    N: NotificationRepository,
    P: PreferencesRepository,
    G: DeliveryGateway,
{
    async fn send(&self, notification: Notification) -> DomainResult<Notification> {
        NotificationDispatcher::send(self, notification).await
    }
}

/// Formats an amount in minor units with two decimal places (`1234` as `12.34`)
pub fn format_minor_amount(amount_minor: i64) -> String {
    let sign = if amount_minor < 0 { "-" } else { "" };
    let abs = amount_minor.unsigned_abs();
    format!("{}{}.{:02}", sign, abs / 100, abs % 100)
}
