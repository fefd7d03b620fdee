//! OAuth start and callback endpoints.
//!
//! The callback always terminates by redirecting the browser back to the UI
//! with the result encoded in query parameters; a provider error, a forged
//! state or a failed exchange never surfaces as an exception to the user.

use axum::{
    extract::{Path, Query, State},
    response::Redirect,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};

use super::{AppError, DashboardState};
use crate::oauth::{OAuthError, OAuthProvider};

/// Query parameters the provider sends to the callback.
#[derive(Deserialize)]
pub(crate) struct OAuthCallback {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
}

/// GET /api/auth/:provider/start
///
/// Redirects the browser to the provider's authorization page.
pub(crate) async fn oauth_start(
    State(state): State<Arc<DashboardState>>,
    Path(slug): Path<String>,
) -> Result<Redirect, AppError> {
    let provider = OAuthProvider::from_slug(&slug)
        .ok_or_else(|| AppError::NotFound(format!("unknown provider '{}'", slug)))?;

    match state.facade.start_auth(provider) {
        Ok(url) => {
            info!(provider = %provider, "Redirecting to OAuth provider");
            Ok(Redirect::temporary(&url))
        }
        Err(OAuthError::Configuration(msg)) => Err(AppError::BadRequest(msg)),
        Err(e) => Err(AppError::ServerError(e.to_string())),
    }
}

/// GET /api/auth/:provider/callback
///
/// Exchanges the authorization code, then hands control back to the UI via a
/// redirect carrying `?connected=` or `?error=`.
pub(crate) async fn oauth_callback(
    State(state): State<Arc<DashboardState>>,
    Path(slug): Path<String>,
    Query(callback): Query<OAuthCallback>,
) -> Redirect {
    let ui = state.ui_redirect_url.trim_end_matches('/');

    let Some(provider) = OAuthProvider::from_slug(&slug) else {
        return Redirect::temporary(&format!("{ui}?error=unknown_provider"));
    };

    if let Some(error) = callback.error {
        warn!(provider = %provider, error = %error, "Provider denied authorization");
        return Redirect::temporary(&format!(
            "{ui}?error={}",
            urlencoding::encode(&error)
        ));
    }

    let (Some(code), Some(csrf_state)) = (callback.code, callback.state) else {
        return Redirect::temporary(&format!("{ui}?error=missing_code"));
    };

    match state
        .facade
        .complete_auth(provider, &code, &csrf_state)
        .await
    {
        Ok(()) => {
            info!(provider = %provider, "OAuth flow completed");
            Redirect::temporary(&format!("{ui}?connected={}", provider.slug()))
        }
        Err(OAuthError::StateMismatch) => {
            Redirect::temporary(&format!("{ui}?error=state_mismatch"))
        }
        Err(OAuthError::Configuration(_)) => {
            Redirect::temporary(&format!("{ui}?error=not_configured"))
        }
        Err(e) => {
            warn!(provider = %provider, error = %e, "Code exchange failed");
            Redirect::temporary(&format!("{ui}?error=exchange_failed"))
        }
    }
}
