//! Database module - MySQL implementations using SQLx
//!
//! - Connection pool management
//! - Record stores for one-time codes, notifications and preferences
//!
//! The schema these stores expect ships in `infra/migrations/`.

pub mod connection;
pub mod mysql;

// Re-export commonly used types
pub use connection::{DatabasePool, PoolStatistics};
pub use mysql::{MySqlNotificationRepository, MySqlOtpRepository, MySqlPreferencesRepository};
