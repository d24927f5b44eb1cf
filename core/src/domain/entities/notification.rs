//! Notification record entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Transport a notification is delivered over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    Email,
    Sms,
    Push,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::Email => "email",
            NotificationType::Sms => "sms",
            NotificationType::Push => "push",
        }
    }
}

impl std::fmt::Display for NotificationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for NotificationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "email" => Ok(NotificationType::Email),
            "sms" => Ok(NotificationType::Sms),
            "push" => Ok(NotificationType::Push),
            other => Err(format!("unsupported notification type: {}", other)),
        }
    }
}

/// Business category used for preference gating
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationChannel {
    Transaction,
    Payout,
    Settlement,
    Security,
    System,
}

impl NotificationChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationChannel::Transaction => "transaction",
            NotificationChannel::Payout => "payout",
            NotificationChannel::Settlement => "settlement",
            NotificationChannel::Security => "security",
            NotificationChannel::System => "system",
        }
    }
}

impl std::fmt::Display for NotificationChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for NotificationChannel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "transaction" => Ok(NotificationChannel::Transaction),
            "payout" => Ok(NotificationChannel::Payout),
            "settlement" => Ok(NotificationChannel::Settlement),
            "security" => Ok(NotificationChannel::Security),
            "system" => Ok(NotificationChannel::System),
            other => Err(format!("unknown notification channel: {}", other)),
        }
    }
}

/// Delivery status of a notification record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationStatus {
    Pending,
    Sent,
    Failed,
    Delivered,
}

impl NotificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationStatus::Pending => "pending",
            NotificationStatus::Sent => "sent",
            NotificationStatus::Failed => "failed",
            NotificationStatus::Delivered => "delivered",
        }
    }

    /// Whether `sent_at` must be set in this status
    pub fn implies_sent(&self) -> bool {
        matches!(self, NotificationStatus::Sent | NotificationStatus::Delivered)
    }

    /// Statuses a record may be in when it moves to this one
    ///
    /// Pending may be rewritten as pending so a failed redelivery can bump
    /// `retry_count`; failed and delivered are final.
    pub fn predecessors(&self) -> &'static [NotificationStatus] {
        match self {
            NotificationStatus::Pending
            | NotificationStatus::Sent
            | NotificationStatus::Failed => &[NotificationStatus::Pending],
            NotificationStatus::Delivered => &[NotificationStatus::Sent],
        }
    }

    pub fn can_transition_to(&self, next: NotificationStatus) -> bool {
        next.predecessors().contains(self)
    }
}

impl std::fmt::Display for NotificationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for NotificationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(NotificationStatus::Pending),
            "sent" => Ok(NotificationStatus::Sent),
            "failed" => Ok(NotificationStatus::Failed),
            "delivered" => Ok(NotificationStatus::Delivered),
            other => Err(format!("unknown notification status: {}", other)),
        }
    }
}

/// A notification attempt and its outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub merchant_id: Option<String>,
    pub user_id: Option<String>,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub channel: NotificationChannel,
    /// Phone number, email address or push token; may be empty until backfilled
    pub recipient: String,
    pub subject: Option<String>,
    pub message: String,
    pub status: NotificationStatus,
    pub sent_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
    /// Audit counter, bumped by every status update
    pub retry_count: i32,
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// Creates a pending notification with no merchant, user or subject
    pub fn new(
        notification_type: NotificationType,
        channel: NotificationChannel,
        recipient: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            merchant_id: None,
            user_id: None,
            notification_type,
            channel,
            recipient: recipient.into(),
            subject: None,
            message: message.into(),
            status: NotificationStatus::Pending,
            sent_at: None,
            delivered_at: None,
            error_message: None,
            retry_count: 0,
            metadata: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_merchant(mut self, merchant_id: impl Into<String>) -> Self {
        self.merchant_id = Some(merchant_id.into());
        self
    }

    pub fn with_user(mut self, user_id: Option<String>) -> Self {
        self.user_id = user_id;
        self
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn has_recipient(&self) -> bool {
        !self.recipient.trim().is_empty()
    }

    /// Applies a status update the way the record store does.
    ///
    /// `sent_at` is stamped on entering sent or delivered (and kept
    /// afterwards), `delivered_at` only on delivered, and `retry_count` grows
    /// by one on every update. A transition the current status does not
    /// allow leaves the record untouched and returns `false`.
    pub fn apply_status(
        &mut self,
        status: NotificationStatus,
        error_message: Option<String>,
        now: DateTime<Utc>,
    ) -> bool {
        if !self.status.can_transition_to(status) {
            return false;
        }
        self.status = status;
        self.error_message = error_message;
        if status.implies_sent() && self.sent_at.is_none() {
            self.sent_at = Some(now);
        }
        if status == NotificationStatus::Delivered {
            self.delivered_at = Some(now);
        }
        self.retry_count += 1;
        true
    }
}
