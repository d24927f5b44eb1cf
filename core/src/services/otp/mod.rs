//! One-time code service
//!
//! Codes are stored with their attempt counter and expiry; their state
//! (pending, verified, expired, exhausted) is derived on every read.

mod cleanup;
mod service;
mod templates;
mod types;


pub use cleanup::OtpCleanupTask;
pub use service::OtpService;
pub use types::{GenerateOtpRequest, OtpInspection, OtpVerification, VerifyOtpRequest};
