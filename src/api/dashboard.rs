//! Read and control endpoints backed by the integration facade.

use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use chrono::{Duration, Utc};
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

use super::{AppError, DashboardState};
use crate::model::{CalendarEvent, FetchOutcome, MessageThread, PlaybackState, Project};
use crate::providers::spotify::PlaybackAction;

/// Default calendar window in days when the query omits one.
const DEFAULT_WINDOW_DAYS: i64 = 7;

#[derive(Deserialize)]
pub(crate) struct RefreshQuery {
    #[serde(default)]
    refresh: bool,
}

#[derive(Deserialize)]
pub(crate) struct WindowQuery {
    days: Option<i64>,
}

#[derive(Deserialize)]
pub(crate) struct ControlQuery {
    value: Option<u8>,
}

/// GET /api/projects?refresh=
pub(crate) async fn get_projects(
    State(state): State<Arc<DashboardState>>,
    Query(query): Query<RefreshQuery>,
) -> Result<Json<FetchOutcome<Vec<Project>>>, AppError> {
    debug!(refresh = query.refresh, "Projects requested");
    let outcome = state.facade.get_projects(query.refresh).await?;
    Ok(Json(outcome))
}

/// GET /api/threads?refresh=
pub(crate) async fn get_threads(
    State(state): State<Arc<DashboardState>>,
    Query(query): Query<RefreshQuery>,
) -> Result<Json<FetchOutcome<Vec<MessageThread>>>, AppError> {
    debug!(refresh = query.refresh, "Threads requested");
    let outcome = state.facade.get_message_threads(query.refresh).await?;
    Ok(Json(outcome))
}

/// GET /api/calendar/events?days=
pub(crate) async fn get_calendar_events(
    State(state): State<Arc<DashboardState>>,
    Query(query): Query<WindowQuery>,
) -> Result<Json<FetchOutcome<Vec<CalendarEvent>>>, AppError> {
    let days = query.days.unwrap_or(DEFAULT_WINDOW_DAYS).clamp(1, 31);
    let start = Utc::now();
    let end = start + Duration::days(days);

    let outcome = state.facade.get_calendar_events(start, end).await?;
    Ok(Json(outcome))
}

/// GET /api/player
pub(crate) async fn get_player(
    State(state): State<Arc<DashboardState>>,
) -> Result<Json<FetchOutcome<Option<PlaybackState>>>, AppError> {
    let outcome = state.facade.get_playback_state().await?;
    Ok(Json(outcome))
}

/// POST /api/player/:action?value=
pub(crate) async fn control_player(
    State(state): State<Arc<DashboardState>>,
    Path(action): Path<String>,
    Query(query): Query<ControlQuery>,
) -> Result<Json<FetchOutcome<()>>, AppError> {
    let action = PlaybackAction::parse(&action, query.value).ok_or_else(|| {
        AppError::BadRequest(format!("unknown playback action '{}'", action))
    })?;

    let outcome = state.facade.control_playback(action).await?;
    Ok(Json(outcome))
}
