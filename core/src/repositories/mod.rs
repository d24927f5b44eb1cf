//! Repository interfaces for persisted codes, notifications and preferences.

pub mod notification;
pub mod otp;
pub mod preferences;

pub use notification::NotificationRepository;
pub use otp::OtpRepository;
pub use preferences::PreferencesRepository;

#[cfg(test)]
pub use notification::MockNotificationRepository;
#[cfg(test)]
pub use otp::MockOtpRepository;
#[cfg(test)]
pub use preferences::MockPreferencesRepository;
