// Application layer - Use cases and ports
pub mod auth;
pub mod channel_registry;
pub mod display_sink;
pub mod errors;
pub mod polling_scheduler;
pub mod telemetry_client;
