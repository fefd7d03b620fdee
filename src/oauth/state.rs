//! CSRF state tokens for the authorization-code flow.
//!
//! A state token is minted when the authorization URL is built and must come
//! back unchanged on the callback. Tokens are single-use and expire after
//! ten minutes; expired entries are swept lazily on the next mint, so no
//! background task runs between requests.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

use super::provider::OAuthProvider;

/// Default state lifetime in seconds.
const DEFAULT_EXPIRY_SECONDS: i64 = 600;

struct StateEntry {
    provider: OAuthProvider,
    created_at: DateTime<Utc>,
}

/// In-memory store of pending OAuth state tokens.
pub struct StateManager {
    states: Mutex<HashMap<String, StateEntry>>,
    expiry: Duration,
}

impl StateManager {
    /// Create a manager with the default 10-minute expiry.
    pub fn new() -> Self {
        Self::with_expiry_seconds(DEFAULT_EXPIRY_SECONDS)
    }

    /// Create a manager with a custom expiry (used by tests).
    pub fn with_expiry_seconds(seconds: i64) -> Self {
        Self {
            states: Mutex::new(HashMap::new()),
            expiry: Duration::seconds(seconds),
        }
    }

    /// Mint a new state token bound to a provider.
    pub fn create(&self, provider: OAuthProvider) -> String {
        let token = Uuid::new_v4().to_string();
        let now = Utc::now();

        let mut states = self.states.lock().unwrap();
        // Lazy sweep keeps the map bounded without a cleanup task
        states.retain(|_, entry| now - entry.created_at <= self.expiry);
        states.insert(
            token.clone(),
            StateEntry {
                provider,
                created_at: now,
            },
        );

        token
    }

    /// Validate and consume a state token for a provider.
    ///
    /// Returns false for an unknown, expired, already-used, or
    /// wrong-provider token. The token is removed either way (single-use).
    pub fn consume(&self, token: &str, provider: OAuthProvider) -> bool {
        let mut states = self.states.lock().unwrap();
        let Some(entry) = states.remove(token) else {
            return false;
        };
        if Utc::now() - entry.created_at > self.expiry {
            return false;
        }
        entry.provider == provider
    }
}

impl Default for StateManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_consume() {
        let manager = StateManager::new();
        let token = manager.create(OAuthProvider::Spotify);
        assert!(!token.is_empty());
        assert!(manager.consume(&token, OAuthProvider::Spotify));
    }

    #[test]
    fn test_single_use() {
        let manager = StateManager::new();
        let token = manager.create(OAuthProvider::GoogleCalendar);
        assert!(manager.consume(&token, OAuthProvider::GoogleCalendar));
        assert!(!manager.consume(&token, OAuthProvider::GoogleCalendar));
    }

    #[test]
    fn test_wrong_provider_rejected() {
        let manager = StateManager::new();
        let token = manager.create(OAuthProvider::Spotify);
        assert!(!manager.consume(&token, OAuthProvider::GoogleCalendar));
    }

    #[test]
    fn test_unknown_token_rejected() {
        let manager = StateManager::new();
        assert!(!manager.consume("bogus", OAuthProvider::Spotify));
    }

    #[test]
    fn test_expired_token_rejected() {
        let manager = StateManager::with_expiry_seconds(0);
        let token = manager.create(OAuthProvider::Spotify);
        std::thread::sleep(std::time::Duration::from_millis(20));
        assert!(!manager.consume(&token, OAuthProvider::Spotify));
    }
}
