// Application state for HTTP handlers
use crate::application::auth::AuthService;
use crate::application::channel_registry::ChannelRegistry;
use crate::application::display_sink::DisplaySink;
use crate::application::polling_scheduler::PollingScheduler;
use crate::infrastructure::chart_feed::BroadcastRenderer;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub auth: AuthService,
    pub registry: Arc<ChannelRegistry>,
    pub scheduler: PollingScheduler,
    pub sink: DisplaySink,
    pub charts: BroadcastRenderer,
}

impl AppState {
    /// Stop polling and end every open chart stream so graceful shutdown
    /// has no connection left to wait on.
    pub async fn teardown(&self) {
        self.scheduler.shutdown().await;
        self.charts.close();
    }
}
