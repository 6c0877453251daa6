// HTTP request handlers
use crate::application::auth::Session;
use crate::application::errors::DashboardError;
use crate::domain::crop::{Crop, CropId};
use crate::domain::dashboard::DashboardSnapshot;
use crate::infrastructure::chart_feed::{chart_stream, ChartUpdate};
use crate::infrastructure::chunked_json::ndjson_response;
use crate::presentation::app_state::AppState;
use crate::presentation::pages;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    Form, Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const LOGIN_ERROR: &str = "Invalid username or password";

#[derive(Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct CropList {
    pub crops: Vec<Crop>,
    pub selected: Option<CropId>,
}

#[derive(Serialize)]
pub struct SelectionResponse {
    pub crop: Crop,
    pub message: String,
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl IntoResponse for DashboardError {
    fn into_response(self) -> Response {
        let (status, kind) = match &self {
            DashboardError::AuthFailure => (StatusCode::UNAUTHORIZED, "auth_failure"),
            DashboardError::PublishFailure(_) => (StatusCode::BAD_GATEWAY, "publish_failure"),
            DashboardError::FetchFailure(_) => (StatusCode::BAD_GATEWAY, "fetch_failure"),
            DashboardError::UnknownCropFailure(_) => (StatusCode::NOT_FOUND, "unknown_crop"),
            DashboardError::SchedulerStopped => (StatusCode::SERVICE_UNAVAILABLE, "shutting_down"),
        };
        let body = ErrorBody {
            error: kind,
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

pub async fn index(State(state): State<Arc<AppState>>) -> Redirect {
    if state.auth.session().await.logged_in {
        Redirect::to("/dashboard")
    } else {
        Redirect::to("/login")
    }
}

/// Already logged in users go straight to the dashboard
pub async fn login_page(State(state): State<Arc<AppState>>) -> Response {
    if state.auth.session().await.logged_in {
        return Redirect::to("/dashboard").into_response();
    }
    Html(pages::login_page(None)).into_response()
}

pub async fn login(State(state): State<Arc<AppState>>, Form(form): Form<LoginForm>) -> Response {
    match state.auth.login(&form.username, &form.password).await {
        Ok(_) => Redirect::to("/dashboard").into_response(),
        // Re-render the form inline, no redirect
        Err(_) => (
            StatusCode::UNAUTHORIZED,
            Html(pages::login_page(Some(LOGIN_ERROR))),
        )
            .into_response(),
    }
}

pub async fn logout(State(state): State<Arc<AppState>>) -> Redirect {
    state.auth.logout().await;
    Redirect::to("/login")
}

pub async fn session(State(state): State<Arc<AppState>>) -> Json<Session> {
    Json(state.auth.session().await)
}

pub async fn dashboard_page(State(state): State<Arc<AppState>>) -> Response {
    if !state.auth.session().await.logged_in {
        return Redirect::to("/login").into_response();
    }
    Html(pages::DASHBOARD_HTML).into_response()
}

pub async fn list_crops(State(state): State<Arc<AppState>>) -> Json<CropList> {
    Json(CropList {
        crops: state.registry.crops(),
        selected: state.scheduler.active_crop().await,
    })
}

pub async fn select_crop(
    Path(id): Path<u32>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<SelectionResponse>, DashboardError> {
    let crop = state.scheduler.select_crop(CropId(id)).await?;
    Ok(Json(SelectionResponse {
        message: format!("{} selected!", crop.name),
        crop,
    }))
}

pub async fn dashboard_snapshot(State(state): State<Arc<AppState>>) -> Json<DashboardSnapshot> {
    Json(state.sink.snapshot().await)
}

/// Chart redraws as newline-delimited JSON, starting with the current series
pub async fn stream_charts(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    // Subscribe before reading the current series so no redraw falls between
    let rx = state.charts.subscribe();
    let initial: Vec<ChartUpdate> = state
        .sink
        .series()
        .await
        .into_iter()
        .map(|s| ChartUpdate {
            metric: s.metric,
            label: s.label,
            points: s.points,
        })
        .collect();

    ndjson_response(chart_stream(initial, rx, state.charts.closed_signal()))
}
