// Error taxonomy shared by the application layer
use crate::domain::crop::CropId;
use thiserror::Error;

/// Failure talking to the remote telemetry service. Every transport problem
/// is converted into one of these at the client boundary.
#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("telemetry service unreachable: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("telemetry service responded with HTTP {0}")]
    Status(u16),
    #[error("malformed telemetry response: {0}")]
    Malformed(String),
    #[error("telemetry service rejected the write")]
    Rejected,
}

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("invalid username or password")]
    AuthFailure,
    #[error("crop selection was not confirmed: {0}")]
    PublishFailure(#[source] TelemetryError),
    #[error("failed to fetch sensor data: {0}")]
    FetchFailure(#[source] TelemetryError),
    #[error("no channel configured for crop {0}")]
    UnknownCropFailure(CropId),
    #[error("dashboard is shutting down")]
    SchedulerStopped,
}
