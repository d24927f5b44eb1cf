mod service_tests;

pub use mocks::{GatewayMode, MockDeliveryGateway};
