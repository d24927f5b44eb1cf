//! Twilio SMS gateway
//!
//! Sends through the Twilio Messages REST API with a plain form POST.
//! Failures are classified for the dispatcher's redelivery policy:
//! rate limiting, 5xx responses and transport errors are transient, every
//! other rejection is permanent.

use async_trait::async_trait;
use phonenumber::{Mode, PhoneNumber};
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use pn_core::domain::entities::NotificationType;
use pn_core::errors::DeliveryError;
use pn_core::services::{DeliveryGateway, DeliveryReceipt};
use pn_shared::config::TwilioSettings;
use pn_shared::masking::mask_phone_number;

use crate::InfrastructureError;

pub const PROVIDER_NAME: &str = "twilio";

/// Longest body Twilio accepts
pub const MAX_MESSAGE_LENGTH: usize = 1600;

#[derive(Debug, Deserialize)]
struct MessageResponse {
    sid: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    code: Option<i64>,
    message: Option<String>,
}

/// SMS delivery through Twilio
pub struct TwilioSmsGateway {
    client: reqwest::Client,
    settings: TwilioSettings,
}

impl TwilioSmsGateway {
    pub fn new(settings: TwilioSettings) -> Result<Self, InfrastructureError> {
        if settings.account_sid.trim().is_empty() || settings.auth_token.trim().is_empty() {
            return Err(InfrastructureError::Config(
                "Twilio account SID and auth token are required".to_string(),
            ));
        }
        if !settings.from_number.starts_with('+')
            || settings.from_number.parse::<PhoneNumber>().is_err()
        {
            return Err(InfrastructureError::Config(
                "Twilio from number must be in E.164 format (starting with '+')".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()?;

        info!(
            from_number = %mask_phone_number(&settings.from_number),
            "Twilio SMS gateway initialized"
        );

        Ok(Self { client, settings })
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.settings.api_base.trim_end_matches('/'),
            self.settings.account_sid
        )
    }

    async fn post_message(&self, to: &str, body: &str) -> Result<DeliveryReceipt, DeliveryError> {
        let form = [
            ("To", to),
            ("From", self.settings.from_number.as_str()),
            ("Body", body),
        ];

        let response = self
            .client
            .post(self.messages_url())
            .basic_auth(&self.settings.account_sid, Some(&self.settings.auth_token))
            .form(&form)
            .send()
            .await
            .map_err(|e| {
                warn!(
                    recipient = %mask_phone_number(to),
                    error = %e,
                    "Twilio request failed"
                );
                DeliveryError::transient(format!("Twilio request failed: {}", e))
            })?;

        let status = response.status();
        if status.is_success() {
            let message: MessageResponse = response.json().await.map_err(|e| {
                DeliveryError::transient(format!("Unreadable Twilio response: {}", e))
            })?;
            info!(
                recipient = %mask_phone_number(to),
                message_sid = %message.sid,
                event = "sms_sent",
                "SMS accepted by Twilio"
            );
            return Ok(DeliveryReceipt::new(PROVIDER_NAME, Some(message.sid)));
        }

        let detail = response
            .json::<ErrorResponse>()
            .await
            .ok()
            .map(|e| match (e.code, e.message) {
                (Some(code), Some(message)) => format!("{} (code {})", message, code),
                (None, Some(message)) => message,
                (Some(code), None) => format!("code {}", code),
                (None, None) => String::new(),
            })
            .unwrap_or_default();

        let err = classify_status(status, &detail);
        error!(
            recipient = %mask_phone_number(to),
            status = status.as_u16(),
            transient = err.is_transient(),
            event = "sms_rejected",
            "Twilio rejected SMS"
        );
        Err(err)
    }
}

/// Map a non-success Twilio response to a delivery error
pub fn classify_status(status: StatusCode, detail: &str) -> DeliveryError {
    let message = if detail.is_empty() {
        format!("Twilio returned {}", status)
    } else {
        format!("Twilio returned {}: {}", status, detail)
    };

    if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        DeliveryError::transient(message)
    } else {
        DeliveryError::permanent(message)
    }
}

/// Validate and normalize a phone number to E.164
///
/// Numbers without a leading `+` are assumed to be North American.
pub fn normalize_e164(phone: &str) -> Result<String, DeliveryError> {
    let digits = pn_shared::validation::normalize_phone_number(phone);
    let candidate = if digits.starts_with('+') {
        digits
    } else {
        warn!(
            recipient = %mask_phone_number(&digits),
            "Phone number missing country code, assuming +1"
        );
        format!("+1{}", digits)
    };

    let parsed = candidate
        .parse::<PhoneNumber>()
        .map_err(|e| DeliveryError::permanent(format!("Invalid phone number: {}", e)))?;
    if !phonenumber::is_valid(&parsed) {
        return Err(DeliveryError::permanent("Invalid phone number"));
    }

    let formatted = parsed.format().mode(Mode::E164).to_string();
    debug!(recipient = %mask_phone_number(&formatted), "Validated phone number");
    Ok(formatted)
}

#[async_trait]
impl DeliveryGateway for TwilioSmsGateway {
    async fn deliver(
        &self,
        notification_type: NotificationType,
        recipient: &str,
        _subject: Option<&str>,
        body: &str,
    ) -> Result<DeliveryReceipt, DeliveryError> {
        if notification_type != NotificationType::Sms {
            return Err(DeliveryError::permanent(format!(
                "Twilio cannot deliver {} notifications",
                notification_type
            )));
        }
        if body.chars().count() > MAX_MESSAGE_LENGTH {
            return Err(DeliveryError::permanent(format!(
                "Message exceeds maximum length of {} characters",
                MAX_MESSAGE_LENGTH
            )));
        }

        let to = normalize_e164(recipient)?;
        self.post_message(&to, body).await
    }
}
