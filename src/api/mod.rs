//! HTTP API exposed to the dashboard UI.
//!
//! Read endpoints return the facade's [`FetchOutcome`] JSON directly, so the
//! UI can distinguish "not configured" and "not authenticated" from data.
//! Hard failures become structured JSON errors; the OAuth callback is the
//! one place that answers with a redirect instead, because the browser lands
//! there coming from the provider.

mod dashboard;
mod oauth;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use std::sync::Arc;

use crate::facade::{FacadeError, IntegrationFacade};
use crate::providers::ProviderError;

/// Shared state for all dashboard routes.
#[derive(Clone)]
pub struct DashboardState {
    /// The integration facade answering every request
    pub facade: Arc<IntegrationFacade>,
    /// Where OAuth callbacks send the browser when they finish
    pub ui_redirect_url: String,
}

/// Build the dashboard API router.
pub fn create_dashboard_router(state: DashboardState) -> Router {
    Router::new()
        .route("/api/projects", get(dashboard::get_projects))
        .route("/api/threads", get(dashboard::get_threads))
        .route("/api/calendar/events", get(dashboard::get_calendar_events))
        .route("/api/player", get(dashboard::get_player))
        .route("/api/player/:action", post(dashboard::control_player))
        .route("/api/auth/:provider/start", get(oauth::oauth_start))
        .route("/api/auth/:provider/callback", get(oauth::oauth_callback))
        .with_state(Arc::new(state))
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<&'static str>,
}

/// Application error types for dashboard endpoints
pub(crate) enum AppError {
    BadRequest(String),
    NotFound(String),
    PremiumRequired,
    ServerError(String),
    BadGateway(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, None, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, None, msg),
            AppError::PremiumRequired => (
                StatusCode::FORBIDDEN,
                Some("premium_required"),
                "playback control requires a premium subscription".to_string(),
            ),
            AppError::ServerError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, None, msg),
            AppError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, None, msg),
        };

        (status, Json(ErrorResponse { error: message, code })).into_response()
    }
}

impl From<FacadeError> for AppError {
    fn from(error: FacadeError) -> Self {
        match error {
            FacadeError::Provider(ProviderError::PremiumRequired) => AppError::PremiumRequired,
            FacadeError::Provider(e) => AppError::BadGateway(e.to_string()),
            FacadeError::OAuth(e) => AppError::BadGateway(e.to_string()),
            FacadeError::Store(e) => AppError::ServerError(e.to_string()),
        }
    }
}
