//! # PayNotify Core
//!
//! Domain layer for one-time codes and preference-gated merchant
//! notifications: entities, repository interfaces, services and error types.
//! Storage and delivery providers live behind the traits in
//! [`repositories`] and [`services::DeliveryGateway`].

pub mod domain;
pub mod errors;
pub mod repositories;
pub mod services;

pub use domain::*;
pub use errors::*;
pub use repositories::*;
pub use services::*;
