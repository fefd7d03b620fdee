//! Single entry point for the route-handler layer.
//!
//! Every read resolves "is this provider configured" before any network
//! call and answers with a structured [`FetchOutcome`] instead of an error
//! when credentials are absent. Provider and OAuth failures surface as
//! [`FacadeError`] and are converted to displayable results at the API
//! boundary; a failing provider never takes down an unrelated request.

use chrono::{DateTime, Utc};
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::cache::{ResultCache, KEY_PROJECTS, KEY_THREADS};
use crate::credentials::SecretCipher;
use crate::model::{CalendarEvent, FetchOutcome, MessageThread, PlaybackState, Project};
use crate::normalize;
use crate::oauth::{OAuthError, OAuthProvider, OAuthSessionManager};
use crate::providers::calendar::{GoogleCalendarClient, BASE_URL as CALENDAR_BASE_URL};
use crate::providers::monday::{MondayClient, BASE_URL as MONDAY_BASE_URL};
use crate::providers::redmine::RedmineClient;
use crate::providers::spotify::{PlaybackAction, SpotifyClient, BASE_URL as SPOTIFY_BASE_URL};
use crate::providers::ProviderError;
use crate::settings::{SqliteSettingsStore, DEFAULT_USER};

/// How many issues the thread view fetches per refresh.
const THREAD_FETCH_LIMIT: u32 = 15;

/// Hard failure from a facade operation.
///
/// Missing configuration or authorization are NOT errors; they come back as
/// [`FetchOutcome`] variants.
#[derive(Debug, Error)]
pub enum FacadeError {
    /// Upstream provider failure
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// OAuth failure other than "not configured / not authenticated"
    #[error(transparent)]
    OAuth(OAuthError),

    /// Settings store failure
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

/// Composes settings, cipher, OAuth sessions, caches and provider clients.
pub struct IntegrationFacade {
    settings: Arc<SqliteSettingsStore>,
    cipher: Arc<SecretCipher>,
    oauth: OAuthSessionManager,
    projects_cache: ResultCache<Vec<Project>>,
    threads_cache: ResultCache<Vec<MessageThread>>,
    monday_base_url: String,
    calendar_base_url: String,
    spotify_base_url: String,
}

impl IntegrationFacade {
    /// Create a facade against the production provider endpoints.
    pub fn new(
        settings: Arc<SqliteSettingsStore>,
        cipher: Arc<SecretCipher>,
        oauth: OAuthSessionManager,
    ) -> Self {
        Self {
            settings,
            cipher,
            oauth,
            projects_cache: ResultCache::new(),
            threads_cache: ResultCache::new(),
            monday_base_url: MONDAY_BASE_URL.to_string(),
            calendar_base_url: CALENDAR_BASE_URL.to_string(),
            spotify_base_url: SPOTIFY_BASE_URL.to_string(),
        }
    }

    /// Override the Monday endpoint (for testing with a mock server).
    pub fn with_monday_base_url(mut self, url: String) -> Self {
        self.monday_base_url = url;
        self
    }

    /// Override the Calendar endpoint (for testing with a mock server).
    pub fn with_calendar_base_url(mut self, url: String) -> Self {
        self.calendar_base_url = url;
        self
    }

    /// Override the Spotify endpoint (for testing with a mock server).
    pub fn with_spotify_base_url(mut self, url: String) -> Self {
        self.spotify_base_url = url;
        self
    }

    /// Replace both result caches with a custom TTL (for testing expiry).
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.projects_cache = ResultCache::with_ttl(ttl);
        self.threads_cache = ResultCache::with_ttl(ttl);
        self
    }

    /// Read a configured secret-ish settings field: decrypt-or-plaintext,
    /// trimmed, empty treated as absent.
    fn configured_value(&self, raw: Option<String>) -> Option<String> {
        raw.map(|v| self.cipher.decrypt_or_plaintext(&v).trim().to_string())
            .filter(|v| !v.is_empty())
    }

    /// Projects from the project-management provider (cached).
    pub async fn get_projects(
        &self,
        force_refresh: bool,
    ) -> Result<FetchOutcome<Vec<Project>>, FacadeError> {
        let settings = self.settings.get(DEFAULT_USER)?.unwrap_or_default();
        let Some(api_key) = self.configured_value(settings.monday_api_key) else {
            return Ok(FetchOutcome::NotConfigured);
        };

        if force_refresh {
            self.projects_cache.invalidate(KEY_PROJECTS);
        }
        if let Some(hit) = self.projects_cache.get(KEY_PROJECTS) {
            debug!(age_seconds = hit.age_seconds, "Serving projects from cache");
            return Ok(FetchOutcome::Ready {
                data: hit.value,
                cached: true,
                age_seconds: hit.age_seconds,
            });
        }

        let client = MondayClient::with_base_url(api_key, self.monday_base_url.clone());
        let boards = client.list_boards().await?;

        let slug = settings.monday_account_slug.unwrap_or_default();
        let projects: Vec<Project> = boards
            .iter()
            .map(|board| normalize::project_from_board(board, &slug))
            .collect();

        self.projects_cache.set(KEY_PROJECTS, projects.clone());
        Ok(FetchOutcome::fresh(projects))
    }

    /// Tracker issues presented as message threads (cached).
    ///
    /// Fetches the issue list, then fans out one journals call per issue so
    /// the "last message" can prefer the latest comment. A failing detail
    /// call falls back to the listing item rather than aborting the batch.
    pub async fn get_message_threads(
        &self,
        force_refresh: bool,
    ) -> Result<FetchOutcome<Vec<MessageThread>>, FacadeError> {
        let settings = self.settings.get(DEFAULT_USER)?.unwrap_or_default();
        let base_url = settings
            .redmine_base_url
            .clone()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());
        let api_key = self.configured_value(settings.redmine_api_key);
        let (Some(api_key), Some(base_url)) = (api_key, base_url) else {
            return Ok(FetchOutcome::NotConfigured);
        };

        if force_refresh {
            self.threads_cache.invalidate(KEY_THREADS);
        }
        if let Some(hit) = self.threads_cache.get(KEY_THREADS) {
            debug!(age_seconds = hit.age_seconds, "Serving threads from cache");
            return Ok(FetchOutcome::Ready {
                data: hit.value,
                cached: true,
                age_seconds: hit.age_seconds,
            });
        }

        let client = RedmineClient::new(api_key, base_url.clone());
        let issues = client.list_issues(THREAD_FETCH_LIMIT).await?;

        let details = join_all(issues.iter().map(|issue| client.get_issue(issue.id))).await;

        let now = Utc::now();
        let threads: Vec<MessageThread> = issues
            .into_iter()
            .zip(details)
            .map(|(listed, detailed)| match detailed {
                Ok(full) => normalize::thread_from_issue(&full, &base_url, now),
                Err(e) => {
                    warn!(issue_id = listed.id, error = %e, "Issue detail fetch failed, using listing data");
                    normalize::thread_from_issue(&listed, &base_url, now)
                }
            })
            .collect();

        self.threads_cache.set(KEY_THREADS, threads.clone());
        Ok(FetchOutcome::fresh(threads))
    }

    /// Calendar events across all of the user's calendars in a time window.
    ///
    /// Never cached: the window changes per request and the provider is not
    /// the rate-limiting concern here. One slow or failing calendar is
    /// skipped, the rest still merge.
    pub async fn get_calendar_events(
        &self,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<FetchOutcome<Vec<CalendarEvent>>, FacadeError> {
        let token = match self.oauth.access_token(OAuthProvider::GoogleCalendar).await {
            Ok(token) => token,
            Err(e) => return oauth_outcome(e),
        };

        let client = GoogleCalendarClient::with_base_url(token, self.calendar_base_url.clone());
        let calendars = client.list_calendars().await?;

        let fetches = calendars
            .iter()
            .map(|cal| client.list_events(&cal.id, window_start, window_end));
        let results = join_all(fetches).await;

        let mut events: Vec<CalendarEvent> = Vec::new();
        for (calendar, result) in calendars.iter().zip(results) {
            let label = calendar.summary.as_deref().unwrap_or(&calendar.id);
            match result {
                Ok(items) => events.extend(
                    items
                        .iter()
                        .filter(|e| e.status.as_deref() != Some("cancelled"))
                        .map(|e| normalize::event_from_google(label, e)),
                ),
                Err(e) => {
                    warn!(calendar = %calendar.id, error = %e, "Calendar fetch failed, skipping");
                }
            }
        }
        events.sort_by_key(|e| e.start);

        Ok(FetchOutcome::fresh(events))
    }

    /// Current playback state; `None` inside a `Ready` outcome means nothing
    /// is playing. The access token is re-derived on every call.
    pub async fn get_playback_state(
        &self,
    ) -> Result<FetchOutcome<Option<PlaybackState>>, FacadeError> {
        let token = match self.oauth.access_token(OAuthProvider::Spotify).await {
            Ok(token) => token,
            Err(e) => return oauth_outcome(e),
        };

        let client = SpotifyClient::with_base_url(token, self.spotify_base_url.clone());
        let playback = client.playback_state().await?;

        Ok(FetchOutcome::fresh(
            playback.as_ref().map(normalize::playback_from_raw),
        ))
    }

    /// Send a playback control command.
    pub async fn control_playback(
        &self,
        action: PlaybackAction,
    ) -> Result<FetchOutcome<()>, FacadeError> {
        let token = match self.oauth.access_token(OAuthProvider::Spotify).await {
            Ok(token) => token,
            Err(e) => return oauth_outcome(e),
        };

        let client = SpotifyClient::with_base_url(token, self.spotify_base_url.clone());
        client.control(action).await?;
        Ok(FetchOutcome::fresh(()))
    }

    /// Begin the OAuth flow: the authorization URL to redirect the user to.
    pub fn start_auth(&self, provider: OAuthProvider) -> Result<String, OAuthError> {
        self.oauth.authorization_url(provider)
    }

    /// Finish the OAuth flow from callback parameters.
    pub async fn complete_auth(
        &self,
        provider: OAuthProvider,
        code: &str,
        state: &str,
    ) -> Result<(), OAuthError> {
        self.oauth.complete_authorization(provider, code, state).await
    }
}

/// Map OAuth failures to outcomes: missing configuration and dead/absent
/// refresh tokens are expected states, everything else is a hard error.
fn oauth_outcome<T>(error: OAuthError) -> Result<FetchOutcome<T>, FacadeError> {
    match error {
        OAuthError::Configuration(_) => Ok(FetchOutcome::NotConfigured),
        OAuthError::NotAuthenticated | OAuthError::ReauthRequired => {
            Ok(FetchOutcome::NotAuthenticated)
        }
        other => Err(FacadeError::OAuth(other)),
    }
}
