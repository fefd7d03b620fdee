//! OAuth provider configurations.
//!
//! The two grant flows differ in small but important ways: Google needs
//! `access_type=offline` plus forced consent to guarantee a refresh token,
//! while Spotify authenticates the token endpoint with HTTP Basic
//! (client_id:client_secret) instead of body parameters.

use std::fmt;

/// How the token endpoint expects client authentication.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TokenAuth {
    /// client_id / client_secret as form body fields (Google)
    Body,
    /// HTTP Basic authorization header (Spotify)
    Basic,
}

/// The two OAuth providers this system supports.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OAuthProvider {
    /// Google Calendar (calendar read access)
    GoogleCalendar,
    /// Spotify (playback read and control)
    Spotify,
}

impl OAuthProvider {
    /// URL-safe identifier used in routes and redirect URIs.
    pub fn slug(&self) -> &'static str {
        match self {
            Self::GoogleCalendar => "google",
            Self::Spotify => "spotify",
        }
    }

    /// Parse a route slug.
    pub fn from_slug(slug: &str) -> Option<Self> {
        match slug {
            "google" => Some(Self::GoogleCalendar),
            "spotify" => Some(Self::Spotify),
            _ => None,
        }
    }

    /// Authorization endpoint.
    pub fn auth_url(&self) -> &'static str {
        match self {
            Self::GoogleCalendar => "https://accounts.google.com/o/oauth2/v2/auth",
            Self::Spotify => "https://accounts.spotify.com/authorize",
        }
    }

    /// Token endpoint.
    pub fn token_url(&self) -> &'static str {
        match self {
            Self::GoogleCalendar => "https://oauth2.googleapis.com/token",
            Self::Spotify => "https://accounts.spotify.com/api/token",
        }
    }

    /// Scopes requested during authorization.
    pub fn scopes(&self) -> &'static [&'static str] {
        match self {
            Self::GoogleCalendar => &["https://www.googleapis.com/auth/calendar.readonly"],
            Self::Spotify => &[
                "user-read-playback-state",
                "user-modify-playback-state",
                "user-read-currently-playing",
            ],
        }
    }

    /// Client authentication style at the token endpoint.
    pub fn token_auth(&self) -> TokenAuth {
        match self {
            Self::GoogleCalendar => TokenAuth::Body,
            Self::Spotify => TokenAuth::Basic,
        }
    }

    /// Extra query parameters on the authorization URL.
    ///
    /// Google only issues a refresh token for offline access with forced
    /// consent; without these the first exchange returns no refresh token.
    pub fn extra_auth_params(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            Self::GoogleCalendar => &[("access_type", "offline"), ("prompt", "consent")],
            Self::Spotify => &[],
        }
    }

    /// Build the full authorization URL for this provider.
    pub fn build_auth_url(&self, client_id: &str, redirect_uri: &str, state: &str) -> String {
        let scopes = self.scopes().join(" ");
        let mut url = format!(
            "{}?client_id={}&redirect_uri={}&scope={}&state={}&response_type=code",
            self.auth_url(),
            urlencoding::encode(client_id),
            urlencoding::encode(redirect_uri),
            urlencoding::encode(&scopes),
            urlencoding::encode(state)
        );
        for (key, value) in self.extra_auth_params() {
            url.push_str(&format!("&{}={}", key, value));
        }
        url
    }
}

impl fmt::Display for OAuthProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug_roundtrip() {
        assert_eq!(
            OAuthProvider::from_slug("google"),
            Some(OAuthProvider::GoogleCalendar)
        );
        assert_eq!(
            OAuthProvider::from_slug("spotify"),
            Some(OAuthProvider::Spotify)
        );
        assert_eq!(OAuthProvider::from_slug("github"), None);
        assert_eq!(OAuthProvider::GoogleCalendar.slug(), "google");
    }

    #[test]
    fn test_google_auth_url_forces_offline_consent() {
        let url = OAuthProvider::GoogleCalendar.build_auth_url(
            "client-1",
            "http://localhost:8686/api/auth/google/callback",
            "state-abc",
        );

        assert!(url.starts_with("https://accounts.google.com/o/oauth2/v2/auth?"));
        assert!(url.contains("client_id=client-1"));
        assert!(url.contains("access_type=offline"));
        assert!(url.contains("prompt=consent"));
        assert!(url.contains("state=state-abc"));
        assert!(url.contains("response_type=code"));
        assert!(url.contains(
            "redirect_uri=http%3A%2F%2Flocalhost%3A8686%2Fapi%2Fauth%2Fgoogle%2Fcallback"
        ));
    }

    #[test]
    fn test_spotify_auth_url_plain_code_flow() {
        let url = OAuthProvider::Spotify.build_auth_url(
            "client-2",
            "http://localhost:8686/api/auth/spotify/callback",
            "state-xyz",
        );

        assert!(url.starts_with("https://accounts.spotify.com/authorize?"));
        assert!(!url.contains("access_type"));
        // Scope list is URL encoded with %20 separators
        assert!(url.contains("user-read-playback-state%20user-modify-playback-state"));
    }

    #[test]
    fn test_token_auth_styles() {
        assert_eq!(OAuthProvider::GoogleCalendar.token_auth(), TokenAuth::Body);
        assert_eq!(OAuthProvider::Spotify.token_auth(), TokenAuth::Basic);
    }
}
