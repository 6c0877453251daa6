// Port to the remote telemetry service
use crate::application::channel_registry::ChannelConfig;
use crate::application::errors::TelemetryError;
use crate::domain::crop::CropId;
use crate::domain::sample::Sample;
use async_trait::async_trait;

#[async_trait]
pub trait TelemetryClient: Send + Sync {
    /// Broadcast the active crop on the selection channel
    async fn publish_selection(&self, crop: CropId) -> Result<(), TelemetryError>;

    /// Most recent reading of a channel
    async fn read_latest(&self, channel: &ChannelConfig) -> Result<Sample, TelemetryError>;

    /// Up to `count` most recent readings, oldest first
    async fn read_history(
        &self,
        channel: &ChannelConfig,
        count: usize,
    ) -> Result<Vec<Sample>, TelemetryError>;
}
