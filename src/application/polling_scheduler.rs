//! Polling scheduler: owns the recurring "read latest" loop of the selected
//! crop.
//!
//! ```text
//! Idle ──[selection published]──▶ Active(crop) ──[shutdown]──▶ Stopped
//!                                   │      ▲
//!                                   └──────┘ [another crop published]
//! ```
//!
//! Entering `Active` resets the series and spawns the ticker, which backfills
//! history, applies one immediate reading and then follows the interval. The
//! previous ticker is always aborted before a new one is spawned, so at most
//! one exists. Shutdown moves to a terminal `Stopped` (idle, never re-armed).

use crate::application::channel_registry::ChannelRegistry;
use crate::application::display_sink::{DisplaySink, Epoch};
use crate::application::errors::DashboardError;
use crate::application::telemetry_client::TelemetryClient;
use crate::domain::crop::{Crop, CropId};
use crate::domain::dashboard::NotificationLevel;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{error, info, warn};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(15);
pub const DEFAULT_HISTORY_RESULTS: usize = 20;

#[derive(Debug, Clone, Copy)]
pub struct PollingSettings {
    pub interval: Duration,
    pub history_results: usize,
}

impl Default for PollingSettings {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            history_results: DEFAULT_HISTORY_RESULTS,
        }
    }
}

enum SchedulerState {
    Idle,
    Active {
        crop: CropId,
        ticket: u64,
        ticker: JoinHandle<()>,
    },
    /// Torn down; no further ticker may be armed
    Stopped,
}

#[derive(Clone)]
pub struct PollingScheduler {
    client: Arc<dyn TelemetryClient>,
    registry: Arc<ChannelRegistry>,
    sink: DisplaySink,
    settings: PollingSettings,
    state: Arc<Mutex<SchedulerState>>,
    tickets: Arc<AtomicU64>,
}

impl PollingScheduler {
    pub fn new(
        client: Arc<dyn TelemetryClient>,
        registry: Arc<ChannelRegistry>,
        sink: DisplaySink,
        settings: PollingSettings,
    ) -> Self {
        Self {
            client,
            registry,
            sink,
            settings,
            state: Arc::new(Mutex::new(SchedulerState::Idle)),
            tickets: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Publish `crop_id` as the active crop and, once the device channel
    /// accepts it, switch polling over to that crop's channel.
    ///
    /// The state lock is only held to swap tickers; publishing, backfill and
    /// the immediate reading never run under it. When selections overlap,
    /// the one requested last wins even if its publish returns first.
    pub async fn select_crop(&self, crop_id: CropId) -> Result<Crop, DashboardError> {
        let ticket = self.tickets.fetch_add(1, Ordering::Relaxed) + 1;
        if matches!(*self.state.lock().await, SchedulerState::Stopped) {
            return Err(DashboardError::SchedulerStopped);
        }

        let crop = match self.registry.crop(crop_id) {
            Ok(crop) => crop.clone(),
            Err(e) => {
                error!(crop_id = %crop_id, "selection references an unknown crop");
                return Err(e);
            }
        };

        self.sink.selection_pending(&crop).await;
        if let Err(e) = self.client.publish_selection(crop.id).await {
            warn!(crop_id = %crop.id, error = %e, "crop selection was not confirmed");
            self.sink.selection_failed(&crop).await;
            return Err(DashboardError::PublishFailure(e));
        }

        let mut state = self.state.lock().await;
        match &*state {
            SchedulerState::Stopped => {
                info!(crop_id = %crop.id, "scheduler stopped, not arming a ticker");
                return Err(DashboardError::SchedulerStopped);
            }
            SchedulerState::Active { crop: current, ticket: newer, .. } if *newer > ticket => {
                info!(crop_id = %crop.id, active = %current, "selection superseded by a later one");
                return Ok(crop);
            }
            _ => {}
        }

        if let SchedulerState::Active { crop: previous, ticker, .. } =
            std::mem::replace(&mut *state, SchedulerState::Idle)
        {
            ticker.abort();
            info!(crop_id = %previous, "stopped polling");
        }

        let epoch = self.sink.start_epoch(&crop).await;
        let task = PollTask {
            client: self.client.clone(),
            registry: self.registry.clone(),
            sink: self.sink.clone(),
            crop: crop.id,
            epoch,
        };
        let ticker = tokio::spawn(task.run(self.settings));
        *state = SchedulerState::Active {
            crop: crop.id,
            ticket,
            ticker,
        };
        drop(state);

        info!(
            crop_id = %crop.id,
            crop = %crop.name,
            interval_secs = self.settings.interval.as_secs(),
            "polling started"
        );
        self.sink
            .notify(
                NotificationLevel::Success,
                format!("Crop changed to {}. ESP32 adjusting parameters.", crop.name),
            )
            .await;

        Ok(crop)
    }

    /// Page teardown: cancel the ticker. Later selections are refused.
    pub async fn shutdown(&self) {
        let mut state = self.state.lock().await;
        if let SchedulerState::Active { crop, ticker, .. } =
            std::mem::replace(&mut *state, SchedulerState::Stopped)
        {
            ticker.abort();
            info!(crop_id = %crop, "polling stopped on shutdown");
        }
    }

    pub async fn active_crop(&self) -> Option<CropId> {
        match &*self.state.lock().await {
            SchedulerState::Active { crop, .. } => Some(*crop),
            SchedulerState::Idle | SchedulerState::Stopped => None,
        }
    }
}

/// Everything one ticker needs, owned so it can live in a spawned task
struct PollTask {
    client: Arc<dyn TelemetryClient>,
    registry: Arc<ChannelRegistry>,
    sink: DisplaySink,
    crop: CropId,
    epoch: Epoch,
}

impl PollTask {
    async fn backfill(&self, count: usize) {
        let channel = match self.registry.channel(self.crop) {
            Ok(channel) => channel,
            Err(e) => {
                error!(crop_id = %self.crop, error = %e, "skipping backfill");
                return;
            }
        };

        let history = self
            .client
            .read_history(channel, count)
            .await
            .map_err(DashboardError::FetchFailure);
        match &history {
            Ok(samples) => info!(crop_id = %self.crop, points = samples.len(), "historical data loaded"),
            Err(e) => warn!(crop_id = %self.crop, error = %e, "historical backfill failed"),
        }
        self.sink.apply_history(self.epoch, history).await;
    }

    async fn tick(&self) {
        let channel = match self.registry.channel(self.crop) {
            Ok(channel) => channel,
            Err(e) => {
                error!(crop_id = %self.crop, error = %e, "skipping tick");
                return;
            }
        };

        let latest = self
            .client
            .read_latest(channel)
            .await
            .map_err(DashboardError::FetchFailure);
        if let Err(e) = &latest {
            warn!(
                crop_id = %self.crop,
                channel_id = %channel.channel_id,
                error = %e,
                "tick failed, keeping last series"
            );
        }
        self.sink.apply_latest(self.epoch, latest).await;
    }

    /// Backfill, one immediate reading, then a reading every `interval`.
    async fn run(self, settings: PollingSettings) {
        self.backfill(settings.history_results).await;
        self.tick().await;

        let period = settings.interval;
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            self.tick().await;
        }
    }
}
