// Display sink - applies fetch outcomes to readouts, series and charts
use crate::application::errors::DashboardError;
use crate::domain::crop::Crop;
use crate::domain::dashboard::{
    CropStatus, DashboardSnapshot, NotificationBoard, NotificationLevel, SeriesView,
};
use crate::domain::readout::Readouts;
use crate::domain::sample::{Metric, Sample};
use crate::domain::series::{SeriesPoint, SeriesStore};
use chrono::{FixedOffset, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Draws a metric's series. Implementations must not block.
pub trait ChartRenderer: Send + Sync {
    fn redraw(&self, metric: Metric, points: &[SeriesPoint]);
}

/// Identifies one crop selection. Results fetched under an older epoch are
/// discarded instead of being drawn into the new crop's charts.
pub type Epoch = u64;

struct DashboardState {
    epoch: Epoch,
    selected: Option<Crop>,
    crop_status: CropStatus,
    readouts: Readouts,
    series: SeriesStore,
    notifications: NotificationBoard,
}

#[derive(Clone)]
pub struct DisplaySink {
    state: Arc<RwLock<DashboardState>>,
    renderer: Arc<dyn ChartRenderer>,
    offset: FixedOffset,
}

impl DisplaySink {
    pub fn new(
        renderer: Arc<dyn ChartRenderer>,
        series_capacity: usize,
        offset: FixedOffset,
        notification_ttl: chrono::Duration,
    ) -> Self {
        let state = DashboardState {
            epoch: 0,
            selected: None,
            crop_status: CropStatus::Idle,
            readouts: Readouts::default(),
            series: SeriesStore::new(series_capacity),
            notifications: NotificationBoard::new(notification_ttl),
        };
        Self {
            state: Arc::new(RwLock::new(state)),
            renderer,
            offset,
        }
    }

    pub async fn selection_pending(&self, crop: &Crop) {
        let mut state = self.state.write().await;
        state.crop_status = CropStatus::Pending {
            crop: crop.name.clone(),
        };
    }

    pub async fn selection_failed(&self, crop: &Crop) {
        let mut state = self.state.write().await;
        state.crop_status = CropStatus::Failed {
            crop: crop.name.clone(),
        };
    }

    /// Confirm a crop: clears every series and opens a new epoch.
    pub async fn start_epoch(&self, crop: &Crop) -> Epoch {
        let mut state = self.state.write().await;
        state.epoch += 1;
        state.selected = Some(crop.clone());
        state.crop_status = CropStatus::Selected {
            crop: crop.name.clone(),
        };
        state.series.reset();
        self.redraw_all(&state.series);
        state.epoch
    }

    /// Returns false when the outcome belonged to a superseded epoch.
    pub async fn apply_history(
        &self,
        epoch: Epoch,
        outcome: Result<Vec<Sample>, DashboardError>,
    ) -> bool {
        let mut state = self.state.write().await;
        if state.epoch != epoch {
            return false;
        }

        match outcome {
            Ok(samples) => {
                state.series.seed(&samples);
                self.redraw_all(&state.series);
            }
            Err(_) => {
                state.readouts.mark_unavailable();
                state
                    .notifications
                    .push(NotificationLevel::Error, "Failed to load historical data.", Utc::now());
            }
        }
        true
    }

    /// Returns false when the outcome belonged to a superseded epoch.
    pub async fn apply_latest(&self, epoch: Epoch, outcome: Result<Sample, DashboardError>) -> bool {
        let mut state = self.state.write().await;
        if state.epoch != epoch {
            tracing::debug!(epoch, current = state.epoch, "discarding stale sample");
            return false;
        }

        match outcome {
            Ok(sample) => {
                state.readouts = Readouts::from_sample(&sample, self.offset);
                state.series.append(&sample);
                self.redraw_all(&state.series);
            }
            Err(_) => {
                // Series keep their last good trace
                state.readouts.mark_unavailable();
                state
                    .notifications
                    .push(NotificationLevel::Error, "Failed to fetch sensor data.", Utc::now());
            }
        }
        true
    }

    pub async fn notify(&self, level: NotificationLevel, message: impl Into<String>) {
        let mut state = self.state.write().await;
        state.notifications.push(level, message, Utc::now());
    }

    pub async fn snapshot(&self) -> DashboardSnapshot {
        let mut state = self.state.write().await;
        let notifications = state.notifications.live(Utc::now());
        DashboardSnapshot {
            selected_crop: state.selected.clone(),
            crop_status_message: state.crop_status.message(),
            crop_status: state.crop_status.clone(),
            crop_info: state
                .selected
                .as_ref()
                .map(|c| format!("Live sensor data for {}", c.name)),
            readouts: state.readouts.clone(),
            series: series_views(&state.series),
            notifications,
        }
    }

    pub async fn series(&self) -> Vec<SeriesView> {
        let state = self.state.read().await;
        series_views(&state.series)
    }

    fn redraw_all(&self, series: &SeriesStore) {
        for s in series.iter() {
            self.renderer.redraw(s.metric(), &s.points());
        }
    }
}

fn series_views(store: &SeriesStore) -> Vec<SeriesView> {
    store
        .iter()
        .map(|s| SeriesView {
            metric: s.metric(),
            label: s.metric().label(),
            points: s.points(),
        })
        .collect()
}
