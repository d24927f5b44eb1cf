//! Per-merchant notification preferences and the eligibility rules built on them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::notification::{NotificationChannel, NotificationType};

/// Outcome of checking a notification against a merchant's preferences
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eligibility {
    Allowed,
    /// The business category is switched off
    ChannelDisabled(NotificationChannel),
    /// The transport is switched off
    TypeDisabled(NotificationType),
}

impl Eligibility {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Eligibility::Allowed)
    }

    /// Human readable reason for a refusal
    pub fn reason(&self) -> Option<String> {
        match self {
            Eligibility::Allowed => None,
            Eligibility::ChannelDisabled(channel) => {
                Some(format!("{} notifications are disabled", channel))
            }
            Eligibility::TypeDisabled(kind) => Some(format!("{} delivery is disabled", kind)),
        }
    }
}

/// Toggles controlling which notifications a merchant receives
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationPreferences {
    pub id: Uuid,
    pub merchant_id: String,

    // Transport toggles
    pub email_enabled: bool,
    pub sms_enabled: bool,
    pub push_enabled: bool,

    // Category toggles
    pub transaction_notifications: bool,
    pub payout_notifications: bool,
    pub settlement_notifications: bool,
    pub security_notifications: bool,
    /// Stored and returned, never consulted
    pub marketing_notifications: bool,

    // Default contact points
    pub email_address: Option<String>,
    pub phone_number: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl NotificationPreferences {
    /// Default record created the first time a merchant's preferences are read
    pub fn defaults_for(merchant_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            merchant_id: merchant_id.into(),
            email_enabled: true,
            sms_enabled: false,
            push_enabled: true,
            transaction_notifications: true,
            payout_notifications: true,
            settlement_notifications: true,
            security_notifications: true,
            marketing_notifications: false,
            email_address: None,
            phone_number: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn type_enabled(&self, notification_type: NotificationType) -> bool {
        match notification_type {
            NotificationType::Email => self.email_enabled,
            NotificationType::Sms => self.sms_enabled,
            NotificationType::Push => self.push_enabled,
        }
    }

    /// Category toggle; `system` has none and is always on
    pub fn channel_enabled(&self, channel: NotificationChannel) -> bool {
        match channel {
            NotificationChannel::Transaction => self.transaction_notifications,
            NotificationChannel::Payout => self.payout_notifications,
            NotificationChannel::Settlement => self.settlement_notifications,
            NotificationChannel::Security => self.security_notifications,
            NotificationChannel::System => true,
        }
    }

    /// Decides whether a notification may be sent.
    ///
    /// System notifications always go out. Security notifications depend only
    /// on the security toggle and ignore the transport toggles. Every other
    /// channel needs both its category and its transport enabled.
    pub fn evaluate(
        &self,
        notification_type: NotificationType,
        channel: NotificationChannel,
    ) -> Eligibility {
        match channel {
            NotificationChannel::System => Eligibility::Allowed,
            NotificationChannel::Security if self.security_notifications => Eligibility::Allowed,
            _ if !self.channel_enabled(channel) => Eligibility::ChannelDisabled(channel),
            _ if !self.type_enabled(notification_type) => {
                Eligibility::TypeDisabled(notification_type)
            }
            _ => Eligibility::Allowed,
        }
    }

    pub fn should_send(
        &self,
        notification_type: NotificationType,
        channel: NotificationChannel,
    ) -> bool {
        self.evaluate(notification_type, channel).is_allowed()
    }

    /// Stored contact point for a transport, if any
    pub fn contact_for(&self, notification_type: NotificationType) -> Option<&str> {
        let contact = match notification_type {
            NotificationType::Email => self.email_address.as_deref(),
            NotificationType::Sms => self.phone_number.as_deref(),
            NotificationType::Push => None,
        };
        contact.filter(|value| !value.trim().is_empty())
    }
}
