// Dashboard API routing and error mapping, driven through the router.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use hubdeck::api::{create_dashboard_router, DashboardState};
use hubdeck::credentials::SecretCipher;
use hubdeck::facade::IntegrationFacade;
use hubdeck::oauth::OAuthSessionManager;
use hubdeck::settings::{IntegrationSettings, SqliteSettingsStore, DEFAULT_USER};
use tower::ServiceExt;

fn make_state() -> (DashboardState, Arc<SqliteSettingsStore>) {
    let store = Arc::new(SqliteSettingsStore::open(":memory:").unwrap());
    let cipher = Arc::new(SecretCipher::new("api-test-key").unwrap());
    let oauth = OAuthSessionManager::new(
        store.clone(),
        cipher.clone(),
        "http://localhost:8686".to_string(),
    );
    let facade = IntegrationFacade::new(store.clone(), cipher, oauth);
    (
        DashboardState {
            facade: Arc::new(facade),
            ui_redirect_url: "http://localhost:8686/settings".to_string(),
        },
        store,
    )
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_projects_report_not_configured() {
    let (state, _store) = make_state();
    let app = create_dashboard_router(state);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/projects")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "not_configured");
}

#[tokio::test]
async fn test_threads_report_not_configured() {
    let (state, _store) = make_state();
    let app = create_dashboard_router(state);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/threads?refresh=true")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "not_configured");
}

#[tokio::test]
async fn test_calendar_events_report_not_configured() {
    let (state, _store) = make_state();
    let app = create_dashboard_router(state);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/calendar/events?days=3")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "not_configured");
}

#[tokio::test]
async fn test_player_unknown_action_is_bad_request() {
    let (state, _store) = make_state();
    let app = create_dashboard_router(state);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/player/rewind")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("rewind"));
}

#[tokio::test]
async fn test_player_volume_requires_value() {
    let (state, _store) = make_state();
    let app = create_dashboard_router(state);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/player/volume")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_auth_start_unknown_provider_is_not_found() {
    let (state, _store) = make_state();
    let app = create_dashboard_router(state);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/auth/fitbit/start")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_auth_start_without_client_config_is_bad_request() {
    let (state, _store) = make_state();
    let app = create_dashboard_router(state);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/auth/google/start")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_auth_start_redirects_to_provider() {
    let (state, store) = make_state();
    store
        .upsert(
            DEFAULT_USER,
            &IntegrationSettings {
                google_client_id: Some("client-123".to_string()),
                google_client_secret: Some("shhh".to_string()),
                ..Default::default()
            },
        )
        .unwrap();
    let app = create_dashboard_router(state);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/auth/google/start")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    let location = response.headers()["location"].to_str().unwrap();
    assert!(location.starts_with("https://accounts.google.com/o/oauth2/v2/auth"));
    assert!(location.contains("client_id=client-123"));
    assert!(location.contains("access_type=offline"));
}

#[tokio::test]
async fn test_callback_provider_error_redirects_to_ui() {
    let (state, _store) = make_state();
    let app = create_dashboard_router(state);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/auth/spotify/callback?error=access_denied")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    let location = response.headers()["location"].to_str().unwrap();
    assert!(location.starts_with("http://localhost:8686/settings"));
    assert!(location.contains("error=access_denied"));
}

#[tokio::test]
async fn test_callback_without_code_redirects_with_error() {
    let (state, _store) = make_state();
    let app = create_dashboard_router(state);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/auth/google/callback")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    let location = response.headers()["location"].to_str().unwrap();
    assert!(location.contains("error=missing_code"));
}

#[tokio::test]
async fn test_callback_with_forged_state_redirects_with_error() {
    let (state, store) = make_state();
    store
        .upsert(
            DEFAULT_USER,
            &IntegrationSettings {
                google_client_id: Some("client-123".to_string()),
                google_client_secret: Some("shhh".to_string()),
                ..Default::default()
            },
        )
        .unwrap();
    let app = create_dashboard_router(state);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/auth/google/callback?code=abc&state=not-issued-by-us")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    let location = response.headers()["location"].to_str().unwrap();
    assert!(location.contains("error=state_mismatch"));
}

#[tokio::test]
async fn test_callback_unknown_provider_redirects_with_error() {
    let (state, _store) = make_state();
    let app = create_dashboard_router(state);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/auth/fitbit/callback?code=abc&state=xyz")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    let location = response.headers()["location"].to_str().unwrap();
    assert!(location.contains("error=unknown_provider"));
}
