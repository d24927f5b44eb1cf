//! Unit tests for the notification dispatcher

use std::sync::Arc;
use std::time::Duration;

use pn_shared::config::DispatchConfig;
use uuid::Uuid;

use crate::domain::entities::{
    Notification, NotificationChannel, NotificationPreferences, NotificationStatus,
    NotificationType,
};
use crate::errors::{DeliveryError, DomainError};
use crate::repositories::{
    MockNotificationRepository, MockPreferencesRepository, NotificationRepository,
};
use crate::services::notification::{format_minor_amount, NotificationDispatcher};

use super::mocks::{GatewayMode, MockDeliveryGateway};

type TestDispatcher =
    NotificationDispatcher<MockNotificationRepository, MockPreferencesRepository, MockDeliveryGateway>;

struct Fixture {
    dispatcher: TestDispatcher,
    notifications: Arc<MockNotificationRepository>,
    preferences: Arc<MockPreferencesRepository>,
    gateway: Arc<MockDeliveryGateway>,
}

fn fixture() -> Fixture {
    let config = DispatchConfig {
        delivery_timeout_ms: 200,
        ..DispatchConfig::default()
    };
    fixture_with_config(config)
}

fn fixture_with_config(config: DispatchConfig) -> Fixture {
    let notifications = Arc::new(MockNotificationRepository::new());
    let preferences = Arc::new(MockPreferencesRepository::new());
    let gateway = Arc::new(MockDeliveryGateway::new());
    let dispatcher = NotificationDispatcher::new(
        notifications.clone(),
        preferences.clone(),
        gateway.clone(),
        config,
    );
    Fixture {
        dispatcher,
        notifications,
        preferences,
        gateway,
    }
}

/// A pending record created well before any delivery timeout used in these tests
fn stale(notification: Notification) -> Notification {
    Notification {
        created_at: chrono::Utc::now() - chrono::Duration::minutes(5),
        ..notification
    }
}

fn email(channel: NotificationChannel, recipient: &str) -> Notification {
    Notification::new(NotificationType::Email, channel, recipient, "Hello")
        .with_merchant("m_1")
        .with_subject("Subject")
}

#[tokio::test]
async fn test_send_allowed_notification() {
    let f = fixture();

    let sent = f
        .dispatcher
        .send(email(NotificationChannel::Transaction, "ops@merchant.io"))
        .await
        .unwrap();

    assert_eq!(sent.status, NotificationStatus::Sent);
    assert!(sent.sent_at.is_some());
    assert_eq!(f.gateway.call_count(), 1);

    let stored = f.notifications.all().await;
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].status, NotificationStatus::Sent);
    assert!(stored[0].sent_at.is_some());
    assert!(stored[0].delivered_at.is_none());
    assert_eq!(stored[0].retry_count, 1);

    let message = f.gateway.last_message().unwrap();
    assert_eq!(message.recipient, "ops@merchant.io");
    assert_eq!(message.subject.as_deref(), Some("Subject"));
}

#[tokio::test]
async fn test_security_channel_disabled_is_denied() {
    let f = fixture();
    let mut prefs = NotificationPreferences::defaults_for("m_1");
    prefs.security_notifications = false;
    f.preferences.insert(prefs).await;

    let result = f
        .dispatcher
        .send(email(NotificationChannel::Security, "ops@merchant.io"))
        .await;

    assert!(matches!(result, Err(DomainError::PolicyDenied { .. })));
    assert_eq!(f.notifications.count().await, 0);
    assert_eq!(f.gateway.call_count(), 0);
}

#[tokio::test]
async fn test_security_sms_allowed_with_default_preferences() {
    let f = fixture();
    let notification = Notification::new(
        NotificationType::Sms,
        NotificationChannel::Security,
        "+15550001111",
        "Your code",
    )
    .with_merchant("m_1");

    let sent = f.dispatcher.send(notification).await.unwrap();

    assert_eq!(sent.status, NotificationStatus::Sent);
    assert_eq!(
        f.gateway.last_message().unwrap().notification_type,
        NotificationType::Sms
    );
}

#[tokio::test]
async fn test_sms_payout_denied_with_default_preferences() {
    let f = fixture();
    let notification = Notification::new(
        NotificationType::Sms,
        NotificationChannel::Payout,
        "+15550001111",
        "Payout done",
    )
    .with_merchant("m_1");

    match f.dispatcher.send(notification).await {
        Err(DomainError::PolicyDenied { reason }) => {
            assert_eq!(reason, "sms delivery is disabled");
        }
        other => panic!("Expected PolicyDenied, got {:?}", other),
    }
    assert_eq!(f.notifications.count().await, 0);
}

#[tokio::test]
async fn test_system_channel_always_sent() {
    let f = fixture();
    let mut prefs = NotificationPreferences::defaults_for("m_1");
    prefs.email_enabled = false;
    prefs.sms_enabled = false;
    prefs.push_enabled = false;
    prefs.security_notifications = false;
    prefs.transaction_notifications = false;
    f.preferences.insert(prefs).await;

    let sent = f
        .dispatcher
        .send(email(NotificationChannel::System, "ops@merchant.io"))
        .await
        .unwrap();
    assert_eq!(sent.status, NotificationStatus::Sent);
}

#[tokio::test]
async fn test_empty_recipient_backfilled_from_preferences() {
    let f = fixture();
    let mut prefs = NotificationPreferences::defaults_for("m_1");
    prefs.email_address = Some("billing@merchant.io".to_string());
    f.preferences.insert(prefs).await;

    let sent = f
        .dispatcher
        .send(email(NotificationChannel::Settlement, ""))
        .await
        .unwrap();

    assert_eq!(sent.recipient, "billing@merchant.io");
    assert_eq!(f.gateway.last_message().unwrap().recipient, "billing@merchant.io");
}

#[tokio::test]
async fn test_empty_recipient_without_stored_contact_is_rejected() {
    let f = fixture();

    let result = f
        .dispatcher
        .send(email(NotificationChannel::Transaction, "  "))
        .await;

    assert!(matches!(result, Err(DomainError::Validation { .. })));
    assert_eq!(f.notifications.count().await, 0);
    assert_eq!(f.gateway.call_count(), 0);
}

#[tokio::test]
async fn test_preference_outage_fails_open() {
    let f = fixture();
    f.preferences.set_unavailable(true);
    let notification = Notification::new(
        NotificationType::Sms,
        NotificationChannel::Payout,
        "+15550001111",
        "Payout done",
    )
    .with_merchant("m_1");

    let sent = f.dispatcher.send(notification).await.unwrap();
    assert_eq!(sent.status, NotificationStatus::Sent);
}

#[tokio::test]
async fn test_notification_without_merchant_skips_preferences() {
    let f = fixture();
    let notification = Notification::new(
        NotificationType::Push,
        NotificationChannel::Transaction,
        "device-token",
        "Hi",
    );

    let sent = f.dispatcher.send(notification).await.unwrap();
    assert_eq!(sent.status, NotificationStatus::Sent);
    assert!(f.preferences.get("m_1").await.is_none());
}

#[tokio::test]
async fn test_gateway_failure_marks_failed() {
    let f = fixture();
    f.gateway.set_mode(GatewayMode::FailPermanent);

    let result = f
        .dispatcher
        .send(email(NotificationChannel::Transaction, "ops@merchant.io"))
        .await;

    assert!(matches!(
        result,
        Err(DomainError::Delivery(DeliveryError::Permanent { .. }))
    ));
    let stored = f.notifications.all().await;
    assert_eq!(stored[0].status, NotificationStatus::Failed);
    assert!(stored[0].sent_at.is_none());
    assert!(stored[0]
        .error_message
        .as_deref()
        .unwrap()
        .contains("recipient rejected"));
}

#[tokio::test]
async fn test_delivery_timeout_leaves_pending() {
    let f = fixture();
    f.gateway.set_mode(GatewayMode::Hang);

    let result = f
        .dispatcher
        .send_with_deadline(
            email(NotificationChannel::Transaction, "ops@merchant.io"),
            Duration::from_millis(20),
        )
        .await;

    assert!(matches!(
        result,
        Err(DomainError::Delivery(DeliveryError::TimedOut { timeout_ms: 20 }))
    ));
    let stored = f.notifications.all().await;
    assert_eq!(stored[0].status, NotificationStatus::Pending);
    assert_eq!(stored[0].retry_count, 0);
}

#[tokio::test]
async fn test_status_update_failure_after_delivery_is_not_an_error() {
    let f = fixture();
    f.notifications.set_fail_update(true);

    let result = f
        .dispatcher
        .send(email(NotificationChannel::Transaction, "ops@merchant.io"))
        .await;

    assert!(result.is_ok());
    assert_eq!(f.gateway.call_count(), 1);
    assert_eq!(
        f.notifications.all().await[0].status,
        NotificationStatus::Pending
    );
}

#[tokio::test]
async fn test_storage_failure_on_create_is_returned() {
    let f = fixture();
    f.notifications.set_fail_create(true);

    let result = f
        .dispatcher
        .send(email(NotificationChannel::Transaction, "ops@merchant.io"))
        .await;

    assert!(matches!(result, Err(DomainError::Storage { .. })));
    assert_eq!(f.gateway.call_count(), 0);
}

#[tokio::test]
async fn test_transaction_wrapper() {
    let f = fixture();

    let sent = f
        .dispatcher
        .send_transaction_notification("m_1", "ops@merchant.io", 1234, "USD", "completed")
        .await
        .unwrap();

    assert_eq!(sent.message, "Transaction of USD 12.34 has been completed");
    assert_eq!(sent.subject.as_deref(), Some("Transaction Notification"));
    assert_eq!(sent.channel, NotificationChannel::Transaction);
    assert_eq!(sent.notification_type, NotificationType::Email);
    assert_eq!(sent.merchant_id.as_deref(), Some("m_1"));
}

#[tokio::test]
async fn test_payout_wrapper_respects_payout_toggle() {
    let f = fixture();
    let mut prefs = NotificationPreferences::defaults_for("m_1");
    prefs.payout_notifications = false;
    f.preferences.insert(prefs).await;

    let result = f
        .dispatcher
        .send_payout_notification("m_1", "ops@merchant.io", 50_000, "EUR", "paid")
        .await;
    assert!(matches!(result, Err(DomainError::PolicyDenied { .. })));

    let sent = f
        .dispatcher
        .send_settlement_notification("m_1", "ops@merchant.io", 7, "EUR", "settled")
        .await
        .unwrap();
    assert_eq!(sent.message, "Settlement of EUR 0.07 has been settled");
    assert_eq!(sent.channel, NotificationChannel::Settlement);
}

#[tokio::test]
async fn test_get_and_mark_delivered() {
    let f = fixture();
    let sent = f
        .dispatcher
        .send(email(NotificationChannel::Transaction, "ops@merchant.io"))
        .await
        .unwrap();

    let fetched = f.dispatcher.get(sent.id).await.unwrap();
    assert_eq!(fetched.status, NotificationStatus::Sent);

    let delivered = f.dispatcher.mark_delivered(sent.id).await.unwrap();
    assert_eq!(delivered.status, NotificationStatus::Delivered);

    let stored = f.dispatcher.get(sent.id).await.unwrap();
    assert_eq!(stored.status, NotificationStatus::Delivered);
    assert!(stored.sent_at.is_some());
    assert!(stored.delivered_at.is_some());
    assert_eq!(stored.retry_count, 2);
}

#[tokio::test]
async fn test_mark_delivered_requires_sent() {
    let f = fixture();
    let pending = Notification::new(
        NotificationType::Email,
        NotificationChannel::Transaction,
        "ops@merchant.io",
        "Hi",
    );
    let id = pending.id;
    f.notifications.insert(pending).await;

    assert!(matches!(
        f.dispatcher.mark_delivered(id).await,
        Err(DomainError::Validation { .. })
    ));
    assert!(matches!(
        f.dispatcher.mark_delivered(Uuid::new_v4()).await,
        Err(DomainError::NotFound { .. })
    ));
}

#[tokio::test]
async fn test_list_for_merchant_and_user() {
    let f = fixture();
    for i in 0..3 {
        let notification = email(NotificationChannel::Transaction, "ops@merchant.io")
            .with_user(Some(format!("u_{}", i % 2)));
        f.dispatcher.send(notification).await.unwrap();
    }

    assert_eq!(f.dispatcher.list_for_merchant("m_1", 10).await.unwrap().len(), 3);
    assert_eq!(f.dispatcher.list_for_merchant("m_1", 2).await.unwrap().len(), 2);
    assert!(f.dispatcher.list_for_merchant("m_2", 10).await.unwrap().is_empty());
    assert_eq!(f.dispatcher.list_for_user("u_0", 10).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_redeliver_pending() {
    let f = fixture();

    let ok = Notification::new(
        NotificationType::Email,
        NotificationChannel::Transaction,
        "a@merchant.io",
        "first",
    );
    let mut exhausted = Notification::new(
        NotificationType::Email,
        NotificationChannel::Transaction,
        "b@merchant.io",
        "second",
    );
    exhausted.retry_count = 3;
    let ok_id = ok.id;
    let exhausted_id = exhausted.id;
    f.notifications.insert(stale(ok)).await;
    f.notifications.insert(stale(exhausted)).await;

    let report = f.dispatcher.redeliver_pending(10).await.unwrap();

    assert_eq!(report.attempted, 1);
    assert_eq!(report.sent, 1);
    assert_eq!(report.failed, 0);
    assert_eq!(
        f.dispatcher.get(ok_id).await.unwrap().status,
        NotificationStatus::Sent
    );
    assert_eq!(
        f.dispatcher.get(exhausted_id).await.unwrap().status,
        NotificationStatus::Pending
    );
}

#[tokio::test]
async fn test_redeliver_transient_failures_until_limit() {
    let f = fixture_with_config(DispatchConfig {
        delivery_timeout_ms: 200,
        max_redeliveries: 2,
        ..DispatchConfig::default()
    });
    f.gateway.set_mode(GatewayMode::FailTransient);
    let notification = Notification::new(
        NotificationType::Email,
        NotificationChannel::Transaction,
        "a@merchant.io",
        "retry me",
    );
    let id = notification.id;
    f.notifications.insert(stale(notification)).await;

    let first = f.dispatcher.redeliver_pending(10).await.unwrap();
    assert_eq!(first.failed, 1);
    let stored = f.dispatcher.get(id).await.unwrap();
    assert_eq!(stored.status, NotificationStatus::Pending);
    assert_eq!(stored.retry_count, 1);

    let second = f.dispatcher.redeliver_pending(10).await.unwrap();
    assert_eq!(second.failed, 1);
    let stored = f.dispatcher.get(id).await.unwrap();
    assert_eq!(stored.status, NotificationStatus::Failed);
    assert_eq!(stored.retry_count, 2);

    let third = f.dispatcher.redeliver_pending(10).await.unwrap();
    assert_eq!(third.attempted, 0);
}

#[tokio::test]
async fn test_redeliver_permanent_failure_marks_failed() {
    let f = fixture();
    f.gateway.set_mode(GatewayMode::FailPermanent);
    let notification = Notification::new(
        NotificationType::Email,
        NotificationChannel::Settlement,
        "ops@merchant.io",
        "Settlement completed",
    );
    let id = notification.id;
    f.notifications.insert(stale(notification)).await;

    let report = f.dispatcher.redeliver_pending(10).await.unwrap();
    assert_eq!(report.failed, 1);
    let stored = f.dispatcher.get(id).await.unwrap();
    assert_eq!(stored.status, NotificationStatus::Failed);
    assert!(stored.sent_at.is_none());
}

#[tokio::test]
async fn test_redeliver_skips_recent_pending() {
    let f = fixture();
    let notification = email(NotificationChannel::Transaction, "ops@merchant.io");
    let id = notification.id;
    f.notifications.insert(notification).await;

    let report = f.dispatcher.redeliver_pending(10).await.unwrap();

    assert_eq!(report.attempted, 0);
    assert_eq!(f.gateway.call_count(), 0);
    assert_eq!(
        f.dispatcher.get(id).await.unwrap().status,
        NotificationStatus::Pending
    );
}

#[tokio::test]
async fn test_redeliver_does_not_touch_in_flight_send() {
    let f = fixture();
    f.gateway.set_mode(GatewayMode::SucceedAfter(50));

    let redelivery = async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        let report = f.dispatcher.redeliver_pending(10).await.unwrap();
        f.gateway.set_mode(GatewayMode::FailPermanent);
        report
    };
    let (sent, report) = tokio::join!(
        f.dispatcher
            .send(email(NotificationChannel::Transaction, "ops@merchant.io")),
        redelivery
    );

    let sent = sent.unwrap();
    assert_eq!(report.attempted, 0);
    assert_eq!(f.gateway.call_count(), 1);

    let stored = f.dispatcher.get(sent.id).await.unwrap();
    assert_eq!(stored.status, NotificationStatus::Sent);
    assert!(stored.sent_at.is_some());
    assert_eq!(stored.retry_count, 1);
}

#[tokio::test]
async fn test_redeliver_retires_security_notifications() {
    let f = fixture();
    let notification = Notification::new(
        NotificationType::Sms,
        NotificationChannel::Security,
        "+15550001111",
        "Your code is 482913",
    )
    .with_merchant("m_1");
    let id = notification.id;
    f.notifications.insert(stale(notification)).await;

    let report = f.dispatcher.redeliver_pending(10).await.unwrap();

    assert_eq!(report.attempted, 1);
    assert_eq!(report.skipped, 1);
    assert_eq!(report.sent, 0);
    assert_eq!(f.gateway.call_count(), 0);
    let stored = f.dispatcher.get(id).await.unwrap();
    assert_eq!(stored.status, NotificationStatus::Failed);
    assert!(stored.sent_at.is_none());
    assert!(stored.error_message.is_some());

    let again = f.dispatcher.redeliver_pending(10).await.unwrap();
    assert_eq!(again.attempted, 0);
}

#[tokio::test]
async fn test_late_status_write_cannot_override_sent() {
    let f = fixture();
    let sent = f
        .dispatcher
        .send(email(NotificationChannel::Transaction, "ops@merchant.io"))
        .await
        .unwrap();

    assert!(!f
        .notifications
        .update_status(sent.id, NotificationStatus::Failed, Some("late".to_string()))
        .await
        .unwrap());
    assert!(!f
        .notifications
        .update_status(sent.id, NotificationStatus::Pending, None)
        .await
        .unwrap());

    let stored = f.dispatcher.get(sent.id).await.unwrap();
    assert_eq!(stored.status, NotificationStatus::Sent);
    assert!(stored.sent_at.is_some());
    assert!(stored.error_message.is_none());
    assert_eq!(stored.retry_count, 1);
}

#[tokio::test]
async fn test_preferences_created_with_defaults() {
    let f = fixture();

    let prefs = f.dispatcher.preferences("m_9").await.unwrap();
    assert!(prefs.email_enabled);
    assert!(!prefs.sms_enabled);
    assert!(f.preferences.get("m_9").await.is_some());

    assert!(matches!(
        f.dispatcher.preferences("").await,
        Err(DomainError::Validation { .. })
    ));
}

#[tokio::test]
async fn test_update_preferences() {
    let f = fixture();

    let missing = NotificationPreferences::defaults_for("m_404");
    assert!(matches!(
        f.dispatcher.update_preferences(missing).await,
        Err(DomainError::NotFound { .. })
    ));

    let mut prefs = f.dispatcher.preferences("m_1").await.unwrap();
    prefs.sms_enabled = true;
    prefs.phone_number = Some("+15550001111".to_string());
    f.dispatcher.update_preferences(prefs).await.unwrap();

    let stored = f.dispatcher.preferences("m_1").await.unwrap();
    assert!(stored.sms_enabled);
    assert_eq!(stored.phone_number.as_deref(), Some("+15550001111"));

    let mut bad = stored.clone();
    bad.email_address = Some("not-an-email".to_string());
    assert!(matches!(
        f.dispatcher.update_preferences(bad).await,
        Err(DomainError::Validation { .. })
    ));
}

#[test]
fn test_format_minor_amount() {
    assert_eq!(format_minor_amount(1234), "12.34");
    assert_eq!(format_minor_amount(5), "0.05");
    assert_eq!(format_minor_amount(100_000), "1000.00");
    assert_eq!(format_minor_amount(-250), "-2.50");
}
