//! Spotify Web API client (player endpoints only).
//!
//! Two quirks matter here: HTTP 204 on the player endpoint means "nothing is
//! playing" and is a valid result, and HTTP 403 on control endpoints means
//! the account has no premium plan, surfaced as
//! [`ProviderError::PremiumRequired`].

use reqwest::{Client, Method, StatusCode};
use serde::Deserialize;

use super::{api_error, ProviderError};

/// Default Spotify API base URL.
pub const BASE_URL: &str = "https://api.spotify.com";

const PROVIDER: &str = "spotify";

/// Artist reference on a track.
#[derive(Clone, Debug, Deserialize)]
pub struct SpotifyArtist {
    /// Artist name
    pub name: String,
}

/// Album art image.
#[derive(Clone, Debug, Deserialize)]
pub struct SpotifyImage {
    /// Image URL
    pub url: String,
}

/// Album reference on a track.
#[derive(Clone, Debug, Deserialize)]
pub struct SpotifyAlbum {
    /// Album name
    pub name: String,
    /// Cover images, largest first
    #[serde(default)]
    pub images: Vec<SpotifyImage>,
}

/// The currently playing track.
#[derive(Clone, Debug, Deserialize)]
pub struct SpotifyTrack {
    /// Track title
    pub name: String,
    /// Track length in milliseconds
    #[serde(default)]
    pub duration_ms: Option<u64>,
    /// Performing artists
    #[serde(default)]
    pub artists: Vec<SpotifyArtist>,
    /// Album the track belongs to
    pub album: SpotifyAlbum,
}

/// Active playback device.
#[derive(Clone, Debug, Deserialize)]
pub struct SpotifyDevice {
    /// Device volume (0-100), absent for devices without volume control
    #[serde(default)]
    pub volume_percent: Option<u8>,
}

/// Raw player state from `GET /v1/me/player`.
#[derive(Clone, Debug, Deserialize)]
pub struct SpotifyPlayback {
    /// Whether playback is active
    pub is_playing: bool,
    /// Playback position in milliseconds
    #[serde(default)]
    pub progress_ms: Option<u64>,
    /// Currently playing track; absent for podcasts or private sessions
    #[serde(default)]
    pub item: Option<SpotifyTrack>,
    /// Active device
    #[serde(default)]
    pub device: Option<SpotifyDevice>,
}

/// A playback control command.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PlaybackAction {
    /// Resume playback
    Play,
    /// Pause playback
    Pause,
    /// Skip to next track
    Next,
    /// Skip to previous track
    Previous,
    /// Set device volume (0-100)
    Volume(u8),
}

impl PlaybackAction {
    /// Parse an action name plus optional value, as received from the API
    /// layer. Volume requires a value; the others reject one silently by
    /// ignoring it.
    pub fn parse(action: &str, value: Option<u8>) -> Option<Self> {
        match action {
            "play" => Some(Self::Play),
            "pause" => Some(Self::Pause),
            "next" => Some(Self::Next),
            "previous" => Some(Self::Previous),
            "volume" => value.map(|v| Self::Volume(v.min(100))),
            _ => None,
        }
    }
}

/// HTTP client for Spotify player endpoints.
pub struct SpotifyClient {
    access_token: String,
    http_client: Client,
    base_url: String,
}

impl SpotifyClient {
    /// Create a client against the production endpoint.
    pub fn new(access_token: String) -> Self {
        Self::with_base_url(access_token, BASE_URL.to_string())
    }

    /// Create a client with a custom endpoint (for testing with a mock server).
    pub fn with_base_url(access_token: String, base_url: String) -> Self {
        Self {
            access_token,
            http_client: Client::new(),
            base_url,
        }
    }

    /// Fetch the current player state. `Ok(None)` means nothing is playing.
    pub async fn playback_state(&self) -> Result<Option<SpotifyPlayback>, ProviderError> {
        let url = format!("{}/v1/me/player", self.base_url);
        let response = self
            .http_client
            .get(&url)
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(ProviderError::request(PROVIDER))?;

        // 204: no active device / nothing playing
        if response.status() == StatusCode::NO_CONTENT {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(api_error(PROVIDER, response).await);
        }

        let body: SpotifyPlayback = response
            .json()
            .await
            .map_err(ProviderError::request(PROVIDER))?;
        Ok(Some(body))
    }

    /// Send a playback control command.
    pub async fn control(&self, action: PlaybackAction) -> Result<(), ProviderError> {
        let (method, path) = match action {
            PlaybackAction::Play => (Method::PUT, "/v1/me/player/play".to_string()),
            PlaybackAction::Pause => (Method::PUT, "/v1/me/player/pause".to_string()),
            PlaybackAction::Next => (Method::POST, "/v1/me/player/next".to_string()),
            PlaybackAction::Previous => (Method::POST, "/v1/me/player/previous".to_string()),
            PlaybackAction::Volume(percent) => (
                Method::PUT,
                format!("/v1/me/player/volume?volume_percent={}", percent),
            ),
        };

        let url = format!("{}{}", self.base_url, path);
        let response = self
            .http_client
            .request(method, &url)
            .bearer_auth(&self.access_token)
            .header("Content-Length", "0")
            .send()
            .await
            .map_err(ProviderError::request(PROVIDER))?;

        if response.status() == StatusCode::FORBIDDEN {
            return Err(ProviderError::PremiumRequired);
        }
        if !response.status().is_success() {
            return Err(api_error(PROVIDER, response).await);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    #[tokio::test]
    async fn test_playback_state() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/v1/me/player")
            .match_header("Authorization", "Bearer at-1")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{
                    "is_playing": true,
                    "progress_ms": 61500,
                    "item": {
                        "name": "Paranoid Android",
                        "duration_ms": 383000,
                        "artists": [{"name": "Radiohead"}],
                        "album": {
                            "name": "OK Computer",
                            "images": [{"url": "https://i.scdn.co/image/large"}]
                        }
                    },
                    "device": {"volume_percent": 65}
                }"#,
            )
            .create_async()
            .await;

        let client = SpotifyClient::with_base_url("at-1".to_string(), server.url());
        let playback = client.playback_state().await.unwrap().unwrap();

        assert!(playback.is_playing);
        assert_eq!(playback.progress_ms, Some(61500));
        let track = playback.item.unwrap();
        assert_eq!(track.name, "Paranoid Android");
        assert_eq!(track.artists[0].name, "Radiohead");
        assert_eq!(playback.device.unwrap().volume_percent, Some(65));
    }

    #[tokio::test]
    async fn test_204_means_nothing_playing() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/v1/me/player")
            .with_status(204)
            .create_async()
            .await;

        let client = SpotifyClient::with_base_url("at-1".to_string(), server.url());
        let playback = client.playback_state().await.unwrap();
        assert!(playback.is_none());
    }

    #[tokio::test]
    async fn test_control_premium_required() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("PUT", "/v1/me/player/play")
            .with_status(403)
            .with_body(r#"{"error": {"reason": "PREMIUM_REQUIRED"}}"#)
            .create_async()
            .await;

        let client = SpotifyClient::with_base_url("at-1".to_string(), server.url());
        let err = client.control(PlaybackAction::Play).await.unwrap_err();
        assert!(matches!(err, ProviderError::PremiumRequired));
    }

    #[tokio::test]
    async fn test_control_volume() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("PUT", "/v1/me/player/volume")
            .match_query(Matcher::UrlEncoded("volume_percent".into(), "40".into()))
            .with_status(204)
            .create_async()
            .await;

        let client = SpotifyClient::with_base_url("at-1".to_string(), server.url());
        client.control(PlaybackAction::Volume(40)).await.unwrap();
        mock.assert_async().await;
    }

    #[test]
    fn test_parse_actions() {
        assert_eq!(PlaybackAction::parse("play", None), Some(PlaybackAction::Play));
        assert_eq!(PlaybackAction::parse("next", None), Some(PlaybackAction::Next));
        assert_eq!(
            PlaybackAction::parse("volume", Some(80)),
            Some(PlaybackAction::Volume(80))
        );
        // Volume clamps to 100 and requires a value
        assert_eq!(
            PlaybackAction::parse("volume", Some(130)),
            Some(PlaybackAction::Volume(100))
        );
        assert_eq!(PlaybackAction::parse("volume", None), None);
        assert_eq!(PlaybackAction::parse("shuffle", None), None);
    }
}
