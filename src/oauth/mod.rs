//! OAuth session management for the two OAuth-backed providers.
//!
//! Owns the authorization-code and refresh-token flows. Per provider, per
//! user the lifecycle is:
//!
//! ```text
//! NotConfigured -> Configured -> Authenticated
//!       ^              ^             |
//!       |              |       refresh rejected
//!       |              |             v
//!       |              +------ ReauthRequired
//! ```
//!
//! `ReauthRequired` is only exited by a fresh code exchange. Access tokens
//! are never persisted; every API call re-derives one from the stored
//! refresh token, which is the only credential written to disk (encrypted).

mod exchange;
mod provider;
mod state;

pub use provider::{OAuthProvider, TokenAuth};
pub use state::StateManager;

use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::credentials::SecretCipher;
use crate::settings::{IntegrationSettings, SqliteSettingsStore, DEFAULT_USER};

/// Failure raised by the OAuth layer.
#[derive(Debug, Error)]
pub enum OAuthError {
    /// Client id or secret missing from settings; the user must configure
    /// the provider before authorization can start.
    #[error("{0}")]
    Configuration(String),

    /// The callback state token was missing, expired, reused, or bound to a
    /// different provider.
    #[error("oauth state mismatch (possible CSRF)")]
    StateMismatch,

    /// The token endpoint rejected the request for a reason other than a
    /// dead refresh token.
    #[error("token exchange failed: {0}")]
    Exchange(String),

    /// No refresh token is stored; the user has never completed the flow.
    #[error("provider is not authenticated")]
    NotAuthenticated,

    /// The stored refresh token was rejected (`invalid_grant`); only a new
    /// authorization fixes this.
    #[error("refresh token rejected, re-authorization required")]
    ReauthRequired,

    /// Settings store failure.
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

/// Orchestrates authorization-URL generation, code exchange, refresh-token
/// storage and access-token renewal.
pub struct OAuthSessionManager {
    settings: Arc<SqliteSettingsStore>,
    cipher: Arc<SecretCipher>,
    states: StateManager,
    http: reqwest::Client,
    callback_base_url: String,
    token_url_override: Option<String>,
}

impl OAuthSessionManager {
    /// Create a manager writing through the given store and cipher.
    pub fn new(
        settings: Arc<SqliteSettingsStore>,
        cipher: Arc<SecretCipher>,
        callback_base_url: String,
    ) -> Self {
        Self {
            settings,
            cipher,
            states: StateManager::new(),
            http: reqwest::Client::new(),
            callback_base_url: callback_base_url.trim_end_matches('/').to_string(),
            token_url_override: None,
        }
    }

    /// Point both providers' token endpoints at a custom URL (for testing
    /// with a mock server).
    pub fn with_token_url(mut self, url: String) -> Self {
        self.token_url_override = Some(url);
        self
    }

    fn token_url(&self, provider: OAuthProvider) -> String {
        self.token_url_override
            .clone()
            .unwrap_or_else(|| provider.token_url().to_string())
    }

    fn redirect_uri(&self, provider: OAuthProvider) -> String {
        format!(
            "{}/api/auth/{}/callback",
            self.callback_base_url,
            provider.slug()
        )
    }

    /// Load and trim the client id/secret for a provider.
    ///
    /// Manual credential entry commonly introduces stray whitespace, so both
    /// values are trimmed before the emptiness check. The secret may be
    /// stored encrypted or plain.
    fn client_config(&self, provider: OAuthProvider) -> Result<(String, String), OAuthError> {
        let settings = self.settings.get(DEFAULT_USER)?.unwrap_or_default();

        let (id, secret) = match provider {
            OAuthProvider::GoogleCalendar => {
                (settings.google_client_id, settings.google_client_secret)
            }
            OAuthProvider::Spotify => {
                (settings.spotify_client_id, settings.spotify_client_secret)
            }
        };

        let id = id.map(|v| v.trim().to_string()).unwrap_or_default();
        let secret = secret
            .map(|v| self.cipher.decrypt_or_plaintext(&v).trim().to_string())
            .unwrap_or_default();

        if id.is_empty() || secret.is_empty() {
            return Err(OAuthError::Configuration(format!(
                "{} client id/secret not configured",
                provider.slug()
            )));
        }

        Ok((id, secret))
    }

    /// Read and decrypt the stored refresh token for a provider.
    fn stored_refresh_token(&self, provider: OAuthProvider) -> Result<String, OAuthError> {
        let settings = self.settings.get(DEFAULT_USER)?.unwrap_or_default();
        let stored = match provider {
            OAuthProvider::GoogleCalendar => settings.google_refresh_token,
            OAuthProvider::Spotify => settings.spotify_refresh_token,
        }
        .ok_or(OAuthError::NotAuthenticated)?;

        match self.cipher.try_decrypt(&stored) {
            Some(token) => Ok(token),
            None => {
                // Undecryptable token is treated as absent, not as an error
                warn!(provider = %provider, "stored refresh token failed decryption");
                Err(OAuthError::NotAuthenticated)
            }
        }
    }

    /// Build the provider authorization URL with a fresh CSRF state token.
    pub fn authorization_url(&self, provider: OAuthProvider) -> Result<String, OAuthError> {
        let (client_id, _) = self.client_config(provider)?;
        let state = self.states.create(provider);
        let url = provider.build_auth_url(&client_id, &self.redirect_uri(provider), &state);

        debug!(provider = %provider, "Built authorization URL");
        Ok(url)
    }

    /// Complete the authorization-code flow from the callback.
    ///
    /// Verifies the state token, exchanges the code, and persists the
    /// refresh token encrypted. A response without a refresh token (repeat
    /// consent) leaves the previously stored token untouched.
    pub async fn complete_authorization(
        &self,
        provider: OAuthProvider,
        code: &str,
        state: &str,
    ) -> Result<(), OAuthError> {
        if !self.states.consume(state, provider) {
            warn!(provider = %provider, "OAuth callback with invalid state");
            return Err(OAuthError::StateMismatch);
        }

        let (client_id, client_secret) = self.client_config(provider)?;
        let grant = exchange::exchange_code(
            &self.http,
            &self.token_url(provider),
            provider,
            &client_id,
            &client_secret,
            code,
            &self.redirect_uri(provider),
        )
        .await?;

        if let Some(refresh_token) = grant.refresh_token {
            let encrypted = self.cipher.encrypt(&refresh_token);
            let mut patch = IntegrationSettings::default();
            match provider {
                OAuthProvider::GoogleCalendar => patch.google_refresh_token = Some(encrypted),
                OAuthProvider::Spotify => patch.spotify_refresh_token = Some(encrypted),
            }
            self.settings.upsert(DEFAULT_USER, &patch)?;
            info!(provider = %provider, "Stored refresh token");
        } else {
            debug!(provider = %provider, "Exchange returned no refresh token, keeping stored one");
        }

        Ok(())
    }

    /// Obtain a live access token by running the refresh grant.
    ///
    /// Configuration is checked first: a provider with no client id/secret
    /// fails with [`OAuthError::Configuration`], not `NotAuthenticated`.
    /// With a configured client but no stored refresh token it fails with
    /// [`OAuthError::NotAuthenticated`] before any network call, and with
    /// [`OAuthError::ReauthRequired`] when the provider rejects the stored
    /// token.
    pub async fn access_token(&self, provider: OAuthProvider) -> Result<String, OAuthError> {
        let (client_id, client_secret) = self.client_config(provider)?;
        let refresh_token = self.stored_refresh_token(provider)?;

        let grant = exchange::refresh_access_token(
            &self.http,
            &self.token_url(provider),
            provider,
            &client_id,
            &client_secret,
            &refresh_token,
        )
        .await?;

        // Some providers rotate the refresh token on use
        if let Some(new_refresh) = grant.refresh_token {
            let encrypted = self.cipher.encrypt(&new_refresh);
            let mut patch = IntegrationSettings::default();
            match provider {
                OAuthProvider::GoogleCalendar => patch.google_refresh_token = Some(encrypted),
                OAuthProvider::Spotify => patch.spotify_refresh_token = Some(encrypted),
            }
            self.settings.upsert(DEFAULT_USER, &patch)?;
        }

        Ok(grant.access_token)
    }

    /// Best-effort check that the stored refresh token is still accepted.
    pub async fn is_authenticated(&self, provider: OAuthProvider) -> bool {
        match self.access_token(provider).await {
            Ok(_) => true,
            Err(e) => {
                debug!(provider = %provider, error = %e, "Authentication check failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    fn test_fixture() -> (Arc<SqliteSettingsStore>, Arc<SecretCipher>) {
        let store = Arc::new(SqliteSettingsStore::open(":memory:").unwrap());
        let cipher = Arc::new(SecretCipher::new("oauth-test-key").unwrap());
        (store, cipher)
    }

    fn manager_with(
        store: Arc<SqliteSettingsStore>,
        cipher: Arc<SecretCipher>,
    ) -> OAuthSessionManager {
        OAuthSessionManager::new(store, cipher, "http://localhost:8686".to_string())
    }

    fn configure_spotify(store: &SqliteSettingsStore) {
        store
            .upsert(
                DEFAULT_USER,
                &IntegrationSettings {
                    spotify_client_id: Some("cid".to_string()),
                    spotify_client_secret: Some("csecret".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();
    }

    #[test]
    fn test_authorization_url_requires_configuration() {
        let (store, cipher) = test_fixture();
        let manager = manager_with(store, cipher);

        let err = manager
            .authorization_url(OAuthProvider::GoogleCalendar)
            .unwrap_err();
        assert!(matches!(err, OAuthError::Configuration(_)));
    }

    #[test]
    fn test_authorization_url_trims_whitespace_credentials() {
        let (store, cipher) = test_fixture();
        store
            .upsert(
                DEFAULT_USER,
                &IntegrationSettings {
                    google_client_id: Some("  cid-1  ".to_string()),
                    google_client_secret: Some(" secret ".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();

        let manager = manager_with(store, cipher);
        let url = manager
            .authorization_url(OAuthProvider::GoogleCalendar)
            .unwrap();
        assert!(url.contains("client_id=cid-1"));
        assert!(url.contains("redirect_uri=http%3A%2F%2Flocalhost%3A8686%2Fapi%2Fauth%2Fgoogle%2Fcallback"));
    }

    #[test]
    fn test_whitespace_only_credentials_are_not_configured() {
        let (store, cipher) = test_fixture();
        store
            .upsert(
                DEFAULT_USER,
                &IntegrationSettings {
                    spotify_client_id: Some("   ".to_string()),
                    spotify_client_secret: Some("secret".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();

        let manager = manager_with(store, cipher);
        let err = manager.authorization_url(OAuthProvider::Spotify).unwrap_err();
        assert!(matches!(err, OAuthError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_access_token_unconfigured_is_configuration_error() {
        let (store, cipher) = test_fixture();
        // Nothing configured at all: Configuration must win over
        // NotAuthenticated so the facade can report "not configured"
        let manager = manager_with(store, cipher)
            .with_token_url("http://127.0.0.1:1/token".to_string());

        let err = manager.access_token(OAuthProvider::Spotify).await.unwrap_err();
        assert!(matches!(err, OAuthError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_access_token_without_stored_refresh_token() {
        let (store, cipher) = test_fixture();
        configure_spotify(&store);
        // Token URL points nowhere reachable; NotAuthenticated must win
        // before any network call is attempted
        let manager = manager_with(store, cipher)
            .with_token_url("http://127.0.0.1:1/token".to_string());

        let err = manager.access_token(OAuthProvider::Spotify).await.unwrap_err();
        assert!(matches!(err, OAuthError::NotAuthenticated));
    }

    #[tokio::test]
    async fn test_complete_authorization_stores_encrypted_refresh_token() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"access_token": "at-1", "refresh_token": "rt-1", "expires_in": 3600}"#)
            .create_async()
            .await;

        let (store, cipher) = test_fixture();
        configure_spotify(&store);
        let manager =
            manager_with(store.clone(), cipher.clone()).with_token_url(server.url());

        let state = manager.states.create(OAuthProvider::Spotify);
        manager
            .complete_authorization(OAuthProvider::Spotify, "code-1", &state)
            .await
            .unwrap();

        let stored = store
            .get(DEFAULT_USER)
            .unwrap()
            .unwrap()
            .spotify_refresh_token
            .unwrap();
        assert_ne!(stored, "rt-1");
        assert_eq!(cipher.try_decrypt(&stored).as_deref(), Some("rt-1"));
    }

    #[tokio::test]
    async fn test_repeat_exchange_without_refresh_token_preserves_stored_one() {
        let mut server = Server::new_async().await;
        // Repeat consent: provider omits the refresh token
        let _mock = server
            .mock("POST", "/")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"access_token": "at-2"}"#)
            .create_async()
            .await;

        let (store, cipher) = test_fixture();
        configure_spotify(&store);
        store
            .upsert(
                DEFAULT_USER,
                &IntegrationSettings {
                    spotify_refresh_token: Some(cipher.encrypt("abc")),
                    ..Default::default()
                },
            )
            .unwrap();

        let manager =
            manager_with(store.clone(), cipher.clone()).with_token_url(server.url());
        let state = manager.states.create(OAuthProvider::Spotify);
        manager
            .complete_authorization(OAuthProvider::Spotify, "code-2", &state)
            .await
            .unwrap();

        let stored = store
            .get(DEFAULT_USER)
            .unwrap()
            .unwrap()
            .spotify_refresh_token
            .unwrap();
        assert_eq!(cipher.try_decrypt(&stored).as_deref(), Some("abc"));
    }

    #[tokio::test]
    async fn test_complete_authorization_rejects_bad_state() {
        let (store, cipher) = test_fixture();
        configure_spotify(&store);
        let manager = manager_with(store, cipher);

        let err = manager
            .complete_authorization(OAuthProvider::Spotify, "code", "forged-state")
            .await
            .unwrap_err();
        assert!(matches!(err, OAuthError::StateMismatch));
    }

    #[tokio::test]
    async fn test_access_token_refresh_flow() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"access_token": "fresh-at", "expires_in": 3600}"#)
            .create_async()
            .await;

        let (store, cipher) = test_fixture();
        configure_spotify(&store);
        store
            .upsert(
                DEFAULT_USER,
                &IntegrationSettings {
                    spotify_refresh_token: Some(cipher.encrypt("rt-stored")),
                    ..Default::default()
                },
            )
            .unwrap();

        let manager = manager_with(store, cipher).with_token_url(server.url());
        let token = manager.access_token(OAuthProvider::Spotify).await.unwrap();
        assert_eq!(token, "fresh-at");
    }

    #[tokio::test]
    async fn test_is_authenticated_swallows_failures() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .with_status(400)
            .with_body(r#"{"error": "invalid_grant"}"#)
            .create_async()
            .await;

        let (store, cipher) = test_fixture();
        configure_spotify(&store);
        store
            .upsert(
                DEFAULT_USER,
                &IntegrationSettings {
                    spotify_refresh_token: Some(cipher.encrypt("dead")),
                    ..Default::default()
                },
            )
            .unwrap();

        let manager = manager_with(store, cipher).with_token_url(server.url());
        assert!(!manager.is_authenticated(OAuthProvider::Spotify).await);
    }
}
