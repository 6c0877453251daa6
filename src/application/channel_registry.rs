// Static crop -> telemetry channel mapping
use crate::application::errors::DashboardError;
use crate::domain::crop::{Crop, CropId};
use std::collections::BTreeMap;

/// Credentials of one remote channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelConfig {
    pub channel_id: String,
    pub write_api_key: String,
    pub read_api_key: String,
}

impl ChannelConfig {
    pub fn new(
        channel_id: impl Into<String>,
        write_api_key: impl Into<String>,
        read_api_key: impl Into<String>,
    ) -> Self {
        Self {
            channel_id: channel_id.into(),
            write_api_key: write_api_key.into(),
            read_api_key: read_api_key.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChannelRegistry {
    selection: ChannelConfig,
    crops: BTreeMap<CropId, (Crop, ChannelConfig)>,
}

impl ChannelRegistry {
    pub fn new(selection: ChannelConfig, crops: impl IntoIterator<Item = (Crop, ChannelConfig)>) -> Self {
        let crops = crops
            .into_iter()
            .map(|(crop, channel)| (crop.id, (crop, channel)))
            .collect();
        Self { selection, crops }
    }

    /// Channel the active crop id is broadcast on.
    pub fn selection_channel(&self) -> &ChannelConfig {
        &self.selection
    }

    pub fn channel(&self, id: CropId) -> Result<&ChannelConfig, DashboardError> {
        self.crops
            .get(&id)
            .map(|(_, channel)| channel)
            .ok_or(DashboardError::UnknownCropFailure(id))
    }

    pub fn crop(&self, id: CropId) -> Result<&Crop, DashboardError> {
        self.crops
            .get(&id)
            .map(|(crop, _)| crop)
            .ok_or(DashboardError::UnknownCropFailure(id))
    }

    /// Configured crops ordered by id.
    pub fn crops(&self) -> Vec<Crop> {
        self.crops.values().map(|(crop, _)| crop.clone()).collect()
    }
}
