use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tracing::info;

use hubdeck::api::{create_dashboard_router, DashboardState};
use hubdeck::config;
use hubdeck::credentials::SecretCipher;
use hubdeck::facade::IntegrationFacade;
use hubdeck::oauth::OAuthSessionManager;
use hubdeck::settings::SqliteSettingsStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hubdeck=info".into()),
        )
        .init();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "hubdeck.toml".to_string());
    let config = config::load_config(&config_path)?;

    // Refuse to start without key material; secrets must never be stored
    // under a known default key
    let key = config.storage.resolve_encryption_key()?;
    let cipher = Arc::new(SecretCipher::new(&key)?);

    let settings = Arc::new(
        SqliteSettingsStore::open(&config.storage.settings_db)
            .context("Failed to open settings store")?,
    );

    let oauth = OAuthSessionManager::new(
        settings.clone(),
        cipher.clone(),
        config.server.callback_base_url.clone(),
    );

    let facade = IntegrationFacade::new(settings, cipher, oauth)
        .with_cache_ttl(Duration::from_secs(config.cache.ttl_seconds));

    let router = create_dashboard_router(DashboardState {
        facade: Arc::new(facade),
        ui_redirect_url: config.server.ui_redirect_url.clone(),
    })
    .layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(&config.server.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.bind_addr))?;

    info!(addr = %config.server.bind_addr, "hubdeck listening");
    axum::serve(listener, router).await?;

    Ok(())
}
