use crate::application::channel_registry::{ChannelConfig, ChannelRegistry};
use crate::application::polling_scheduler::{
    PollingSettings, DEFAULT_HISTORY_RESULTS, DEFAULT_POLL_INTERVAL,
};
use crate::domain::crop::{Crop, CropId};
use crate::domain::series::DEFAULT_SERIES_CAPACITY;
use chrono::FixedOffset;
use serde::Deserialize;
use std::collections::HashSet;
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Deserialize, Clone)]
pub struct DashboardConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub telemetry: TelemetrySettings,
    #[serde(default)]
    pub display: DisplaySettings,
    pub selection_channel: ChannelSettings,
    #[serde(default)]
    pub crops: Vec<CropSettings>,
    #[serde(default)]
    pub users: Vec<UserSettings>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    #[serde(default = "default_bind")]
    pub bind: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TelemetrySettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_history_results")]
    pub history_results: usize,
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DisplaySettings {
    #[serde(default = "default_series_capacity")]
    pub series_capacity: usize,
    #[serde(default = "default_utc_offset_minutes")]
    pub utc_offset_minutes: i32,
    #[serde(default = "default_notification_ttl_secs")]
    pub notification_ttl_secs: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChannelSettings {
    pub channel_id: String,
    pub write_api_key: String,
    pub read_api_key: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CropSettings {
    pub id: u32,
    pub name: String,
    pub channel_id: String,
    pub write_api_key: String,
    pub read_api_key: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct UserSettings {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("no crops configured")]
    NoCrops,
    #[error("crop id {0} is configured more than once")]
    DuplicateCrop(u32),
    #[error("crop ids must be positive")]
    ZeroCropId,
    #[error("poll interval must be at least one second")]
    ZeroInterval,
    #[error("series capacity must be at least one point")]
    ZeroCapacity,
    #[error("UTC offset of {0} minutes is out of range")]
    InvalidOffset(i32),
    #[error("notification TTL of {0} seconds is out of range")]
    InvalidNotificationTtl(i64),
    #[error("invalid bind address {0:?}")]
    InvalidBind(String),
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_base_url() -> String {
    "https://api.thingspeak.com".to_string()
}

fn default_poll_interval_secs() -> u64 {
    DEFAULT_POLL_INTERVAL.as_secs()
}

fn default_history_results() -> usize {
    DEFAULT_HISTORY_RESULTS
}

fn default_series_capacity() -> usize {
    DEFAULT_SERIES_CAPACITY
}

fn default_utc_offset_minutes() -> i32 {
    // India Standard Time
    330
}

fn default_notification_ttl_secs() -> i64 {
    5
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self { bind: default_bind() }
    }
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            poll_interval_secs: default_poll_interval_secs(),
            history_results: default_history_results(),
            request_timeout_secs: None,
        }
    }
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            series_capacity: default_series_capacity(),
            utc_offset_minutes: default_utc_offset_minutes(),
            notification_ttl_secs: default_notification_ttl_secs(),
        }
    }
}

/// Load `config/dashboard.toml`, then apply `AGROSMART__SECTION__KEY`
/// environment overrides.
pub fn load_dashboard_config() -> anyhow::Result<DashboardConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/dashboard"))
        .add_source(
            config::Environment::with_prefix("AGROSMART")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let config: DashboardConfig = settings.try_deserialize()?;
    config.validate()?;
    Ok(config)
}

impl DashboardConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.crops.is_empty() {
            return Err(ConfigError::NoCrops);
        }
        let mut seen = HashSet::new();
        for crop in &self.crops {
            if crop.id == 0 {
                return Err(ConfigError::ZeroCropId);
            }
            if !seen.insert(crop.id) {
                return Err(ConfigError::DuplicateCrop(crop.id));
            }
        }
        if self.telemetry.poll_interval_secs == 0 {
            return Err(ConfigError::ZeroInterval);
        }
        if self.display.series_capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        self.utc_offset()?;
        self.notification_ttl()?;
        self.bind_addr()?;
        Ok(())
    }

    pub fn channel_registry(&self) -> ChannelRegistry {
        let selection = &self.selection_channel;
        ChannelRegistry::new(
            ChannelConfig::new(
                selection.channel_id.clone(),
                selection.write_api_key.clone(),
                selection.read_api_key.clone(),
            ),
            self.crops.iter().map(|c| {
                (
                    Crop::new(CropId(c.id), c.name.clone()),
                    ChannelConfig::new(
                        c.channel_id.clone(),
                        c.write_api_key.clone(),
                        c.read_api_key.clone(),
                    ),
                )
            }),
        )
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.server
            .bind
            .parse()
            .map_err(|_| ConfigError::InvalidBind(self.server.bind.clone()))
    }

    pub fn polling_settings(&self) -> PollingSettings {
        PollingSettings {
            interval: Duration::from_secs(self.telemetry.poll_interval_secs),
            history_results: self.telemetry.history_results,
        }
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.telemetry.request_timeout_secs.map(Duration::from_secs)
    }

    pub fn utc_offset(&self) -> Result<FixedOffset, ConfigError> {
        let minutes = self.display.utc_offset_minutes;
        minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or(ConfigError::InvalidOffset(minutes))
    }

    pub fn notification_ttl(&self) -> Result<chrono::Duration, ConfigError> {
        let secs = self.display.notification_ttl_secs;
        if secs <= 0 {
            return Err(ConfigError::InvalidNotificationTtl(secs));
        }
        chrono::Duration::try_seconds(secs).ok_or(ConfigError::InvalidNotificationTtl(secs))
    }

    pub fn allow_list(&self) -> Vec<(String, String)> {
        self.users
            .iter()
            .map(|u| (u.username.clone(), u.password.clone()))
            .collect()
    }
}
