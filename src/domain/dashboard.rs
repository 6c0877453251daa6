// Dashboard domain model - everything the page shows besides the charts
use super::crop::Crop;
use super::readout::Readouts;
use super::sample::Metric;
use super::series::SeriesPoint;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::VecDeque;

/// Status line under the crop buttons.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum CropStatus {
    Idle,
    Pending { crop: String },
    Selected { crop: String },
    Failed { crop: String },
}

impl CropStatus {
    pub fn message(&self) -> String {
        match self {
            CropStatus::Idle => "Select a crop to start monitoring".to_string(),
            CropStatus::Pending { crop } => format!("Sending crop selection ({})...", crop),
            CropStatus::Selected { crop } => format!("{} selected!", crop),
            CropStatus::Failed { .. } => "Failed to send crop selection. Try again.".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
    pub at: DateTime<Utc>,
}

/// Transient status messages. Entries older than `ttl` are dropped lazily.
#[derive(Debug, Clone)]
pub struct NotificationBoard {
    ttl: Duration,
    entries: VecDeque<Notification>,
}

impl NotificationBoard {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: VecDeque::new(),
        }
    }

    pub fn push(&mut self, level: NotificationLevel, message: impl Into<String>, now: DateTime<Utc>) {
        self.expire(now);
        self.entries.push_back(Notification {
            level,
            message: message.into(),
            at: now,
        });
    }

    pub fn live(&mut self, now: DateTime<Utc>) -> Vec<Notification> {
        self.expire(now);
        self.entries.iter().cloned().collect()
    }

    fn expire(&mut self, now: DateTime<Utc>) {
        while let Some(front) = self.entries.front() {
            if now - front.at >= self.ttl {
                self.entries.pop_front();
            } else {
                break;
            }
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesView {
    pub metric: Metric,
    pub label: &'static str,
    pub points: Vec<SeriesPoint>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSnapshot {
    pub selected_crop: Option<Crop>,
    pub crop_status: CropStatus,
    pub crop_status_message: String,
    pub crop_info: Option<String>,
    pub readouts: Readouts,
    pub series: Vec<SeriesView>,
    pub notifications: Vec<Notification>,
}
