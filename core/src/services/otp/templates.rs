//! Delivery text for one-time codes

use crate::domain::entities::OtpPurpose;

pub(crate) fn otp_subject(brand: &str) -> String {
    format!("{} Verification Code", brand)
}

pub(crate) fn otp_message(brand: &str, purpose: OtpPurpose, code: &str, minutes: i64) -> String {
    match purpose {
        OtpPurpose::Payout | OtpPurpose::Withdrawal => format!(
            "Your {} {} verification code is: {}. Valid for {} minutes. Do not share this code with anyone.",
            brand, purpose, code, minutes
        ),
        OtpPurpose::SettingsChange => format!(
            "Your {} settings change verification code is: {}. Valid for {} minutes.",
            brand, code, minutes
        ),
        OtpPurpose::Login => format!(
            "Your {} login verification code is: {}. Valid for {} minutes.",
            brand, code, minutes
        ),
        OtpPurpose::TwoFactor => format!(
            "Your {} 2FA code is: {}. Valid for {} minutes.",
            brand, code, minutes
        ),
    }
}
