//! Preference-gated notification dispatch
//!
//! Notifications are checked against the merchant's preferences, recorded as
//! pending, handed to a delivery gateway and then marked sent or failed.

mod service;
mod traits;
mod types;

#[cfg(test)]
pub(crate) mod tests;

pub use service::{format_minor_amount, NotificationDispatcher};
pub use traits::{DeliveryGateway, DeliveryReceipt, NotificationSender};
pub use types::{PreferenceLookup, RedeliveryReport};
