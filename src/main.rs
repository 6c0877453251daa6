// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::sync::Arc;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{compression::CompressionLayer, trace::TraceLayer};
use tracing_subscriber::EnvFilter;

use crate::application::auth::{AllowListVerifier, AuthService};
use crate::application::display_sink::DisplaySink;
use crate::application::polling_scheduler::PollingScheduler;
use crate::infrastructure::chart_feed::BroadcastRenderer;
use crate::infrastructure::config::load_dashboard_config;
use crate::infrastructure::thingspeak_client::ThingSpeakClient;
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    dashboard_page, dashboard_snapshot, health_check, index, list_crops, login, login_page,
    logout, select_crop, session, stream_charts,
};

const CHART_FEED_CAPACITY: usize = 64;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let config = load_dashboard_config()?;
    let addr = config.bind_addr()?;

    // Create telemetry client (infrastructure layer)
    let registry = Arc::new(config.channel_registry());
    let client = Arc::new(ThingSpeakClient::new(
        config.telemetry.base_url.clone(),
        registry.selection_channel().clone(),
        config.request_timeout(),
    )?);
    let charts = BroadcastRenderer::new(CHART_FEED_CAPACITY);

    // Create services (application layer)
    let sink = DisplaySink::new(
        Arc::new(charts.clone()),
        config.display.series_capacity,
        config.utc_offset()?,
        config.notification_ttl()?,
    );
    let scheduler = PollingScheduler::new(
        client,
        registry.clone(),
        sink.clone(),
        config.polling_settings(),
    );
    let auth = AuthService::new(Arc::new(AllowListVerifier::new(config.allow_list())));

    // Create application state
    let state = Arc::new(AppState {
        auth,
        registry,
        scheduler,
        sink,
        charts,
    });

    // Build router (presentation layer)
    // Chart stream is routed after the compression layer and stays uncompressed
    let router = Router::new()
        .route("/healthz", get(health_check))
        .route("/", get(index))
        .route("/login", get(login_page).post(login))
        .route("/logout", post(logout))
        .route("/dashboard", get(dashboard_page))
        .route("/api/session", get(session))
        .route("/api/crops", get(list_crops))
        .route("/api/crops/:id/select", post(select_crop))
        .route("/api/dashboard", get(dashboard_snapshot))
        .layer(CompressionLayer::new())
        .route("/api/dashboard/stream", get(stream_charts))
        .layer(TraceLayer::new_for_http())
        .with_state(state.clone());

    // Start server
    tracing::info!(%addr, crops = config.crops.len(), "starting agrosmart dashboard");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal(state))
        .await?;

    tracing::info!("dashboard stopped");

    Ok(())
}

/// Resolves on Ctrl+C after tearing the dashboard down, so open chart
/// streams end and the server can drain. A second Ctrl+C exits at once.
async fn shutdown_signal(state: Arc<AppState>) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }

    tracing::info!("shutdown requested, stopping polling");
    state.teardown().await;

    tokio::spawn(async {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("second interrupt, exiting without draining");
            std::process::exit(130);
        }
    });
}
