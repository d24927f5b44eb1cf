//! Domain entities for one-time codes and merchant notifications.

pub mod notification;
pub mod otp;
pub mod preferences;

pub use notification::{Notification, NotificationChannel, NotificationStatus, NotificationType};
pub use otp::{
    DeliveryMethod, Otp, OtpPurpose, OtpStatus, DEFAULT_CODE_LENGTH, DEFAULT_EXPIRY_MINUTES,
    DEFAULT_MAX_ATTEMPTS,
};
pub use preferences::{Eligibility, NotificationPreferences};
