//! MySQL implementations of the core repository traits.
//!
//! UUIDs are stored as CHAR(36), enums by their lowercase names and
//! metadata bags as JSON text.

mod notification_repository_impl;
mod otp_repository_impl;
mod preferences_repository_impl;

pub use notification_repository_impl::MySqlNotificationRepository;
pub use otp_repository_impl::MySqlOtpRepository;
pub use preferences_repository_impl::MySqlPreferencesRepository;

use std::str::FromStr;

use sqlx::mysql::MySqlRow;
use sqlx::{MySql, Row};
use uuid::Uuid;

use pn_core::errors::DomainError;

/// Read a column, mapping decode failures to a storage error
pub(crate) fn column<'r, T>(row: &'r MySqlRow, name: &str) -> Result<T, DomainError>
where
    T: sqlx::Decode<'r, MySql> + sqlx::Type<MySql>,
{
    row.try_get(name)
        .map_err(|e| DomainError::storage(format!("Failed to get {}: {}", name, e)))
}

pub(crate) fn uuid_column(row: &MySqlRow, name: &str) -> Result<Uuid, DomainError> {
    let raw: String = column(row, name)?;
    Uuid::parse_str(&raw)
        .map_err(|e| DomainError::storage(format!("Invalid UUID in {}: {}", name, e)))
}

/// Parse an enum stored by its string name
pub(crate) fn enum_column<T>(row: &MySqlRow, name: &str) -> Result<T, DomainError>
where
    T: FromStr<Err = String>,
{
    let raw: String = column(row, name)?;
    raw.parse()
        .map_err(|e: String| DomainError::storage(format!("Invalid {}: {}", name, e)))
}

pub(crate) fn json_column(
    row: &MySqlRow,
    name: &str,
) -> Result<Option<serde_json::Value>, DomainError> {
    let raw: Option<String> = column(row, name)?;
    raw.filter(|text| !text.is_empty())
        .map(|text| {
            serde_json::from_str(&text)
                .map_err(|e| DomainError::storage(format!("Invalid JSON in {}: {}", name, e)))
        })
        .transpose()
}

pub(crate) fn json_text(value: &Option<serde_json::Value>) -> Option<String> {
    value.as_ref().map(|v| v.to_string())
}

/// Map a query failure to a storage error with context
pub(crate) fn query_error(context: &'static str) -> impl Fn(sqlx::Error) -> DomainError {
    move |e| {
        tracing::error!(error = %e, context, "Database query failed");
        DomainError::storage(format!("{}: {}", context, e))
    }
}
