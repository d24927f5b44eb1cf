//! Types for dispatcher results

use serde::{Deserialize, Serialize};

use crate::domain::entities::{Eligibility, NotificationChannel, NotificationPreferences, NotificationType};

/// Result of fetching a merchant's preferences before a send
///
/// A store failure does not block sending; it yields `Unavailable`, which
/// allows everything and offers no contact points.
#[derive(Debug, Clone)]
pub enum PreferenceLookup {
    Found(NotificationPreferences),
    Unavailable,
}

impl PreferenceLookup {
    pub fn evaluate(
        &self,
        notification_type: NotificationType,
        channel: NotificationChannel,
    ) -> Eligibility {
        match self {
            PreferenceLookup::Found(prefs) => prefs.evaluate(notification_type, channel),
            PreferenceLookup::Unavailable => Eligibility::Allowed,
        }
    }

    pub fn contact_for(&self, notification_type: NotificationType) -> Option<&str> {
        match self {
            PreferenceLookup::Found(prefs) => prefs.contact_for(notification_type),
            PreferenceLookup::Unavailable => None,
        }
    }
}

/// Summary of one redelivery pass over pending notifications
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedeliveryReport {
    /// Pending records picked up
    pub attempted: usize,
    /// Records delivered and marked sent
    pub sent: usize,
    /// Records the gateway rejected or that timed out
    pub failed: usize,
    /// Security records retired without a delivery attempt
    pub skipped: usize,
}

impl RedeliveryReport {
    pub fn is_empty(&self) -> bool {
        self.attempted == 0
    }
}
