//! Delivery provider configuration

use serde::{Deserialize, Serialize};

use super::env_parse;

/// SMS provider selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SmsProvider {
    /// Log messages instead of sending them
    #[default]
    Log,
    /// Send through the Twilio Messages API
    Twilio,
}

impl std::str::FromStr for SmsProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "log" | "mock" => Ok(SmsProvider::Log),
            "twilio" => Ok(SmsProvider::Twilio),
            _ => Err(format!("Unknown SMS provider: {}", s)),
        }
    }
}

/// Twilio credentials and request settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TwilioSettings {
    /// Twilio Account SID
    pub account_sid: String,
    /// Twilio Auth Token
    pub auth_token: String,
    /// Sending phone number (E.164)
    pub from_number: String,
    /// API base URL
    pub api_base: String,
    /// Timeout for API requests in seconds
    pub request_timeout_secs: u64,
}

impl Default for TwilioSettings {
    fn default() -> Self {
        Self {
            account_sid: String::new(),
            auth_token: String::new(),
            from_number: String::new(),
            api_base: String::from("https://api.twilio.com"),
            request_timeout_secs: 30,
        }
    }
}

/// Delivery gateway configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct DeliveryConfig {
    /// Which provider handles SMS
    pub sms_provider: SmsProvider,
    /// Twilio settings, used when `sms_provider` is `twilio`
    pub twilio: TwilioSettings,
}

impl DeliveryConfig {
    /// Create from environment variables
    pub fn from_env() -> Self {
        let defaults = TwilioSettings::default();
        Self {
            sms_provider: env_parse("DELIVERY_SMS_PROVIDER").unwrap_or_default(),
            twilio: TwilioSettings {
                account_sid: std::env::var("TWILIO_ACCOUNT_SID").unwrap_or_default(),
                auth_token: std::env::var("TWILIO_AUTH_TOKEN").unwrap_or_default(),
                from_number: std::env::var("TWILIO_FROM_NUMBER").unwrap_or_default(),
                api_base: std::env::var("TWILIO_API_BASE").unwrap_or(defaults.api_base),
                request_timeout_secs: env_parse("TWILIO_REQUEST_TIMEOUT_SECS")
                    .unwrap_or(defaults.request_timeout_secs),
            },
        }
    }
}
