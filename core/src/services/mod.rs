//! Business services containing domain logic and use cases.

pub mod notification;
pub mod otp;

pub use notification::{
    DeliveryGateway, DeliveryReceipt, NotificationDispatcher, NotificationSender,
    PreferenceLookup, RedeliveryReport,
};
pub use otp::{
    GenerateOtpRequest, OtpCleanupTask, OtpInspection, OtpService, OtpVerification,
    VerifyOtpRequest,
};
