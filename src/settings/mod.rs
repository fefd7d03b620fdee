//! Integration settings: one record per user holding provider credentials.
//!
//! Every credential field is optional. A missing credential means the
//! provider is "not configured", which is an expected state the rest of the
//! system must handle without erroring.

mod store;

pub use store::SqliteSettingsStore;

use serde::{Deserialize, Serialize};

use crate::credentials::SecretCipher;

/// User id used throughout this single-tenant deployment.
pub const DEFAULT_USER: &str = "default";

/// Per-provider credentials and connection settings.
///
/// Doubles as the upsert patch: a `None` field in a patch preserves the
/// stored value (see [`SqliteSettingsStore::upsert`]), which is what keeps a
/// previously stored refresh token alive when a repeat OAuth consent omits
/// one.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct IntegrationSettings {
    /// Monday.com personal API token
    pub monday_api_key: Option<String>,
    /// Monday.com account slug, used to build deep links back to boards
    pub monday_account_slug: Option<String>,

    /// Redmine REST API key
    pub redmine_api_key: Option<String>,
    /// Base URL of the Redmine instance (e.g. `https://redmine.example.com`)
    pub redmine_base_url: Option<String>,

    /// Google OAuth client id
    pub google_client_id: Option<String>,
    /// Google OAuth client secret (encrypted at rest)
    pub google_client_secret: Option<String>,
    /// Google OAuth refresh token (encrypted at rest)
    pub google_refresh_token: Option<String>,

    /// Spotify OAuth client id
    pub spotify_client_id: Option<String>,
    /// Spotify OAuth client secret (encrypted at rest)
    pub spotify_client_secret: Option<String>,
    /// Spotify OAuth refresh token (encrypted at rest)
    pub spotify_refresh_token: Option<String>,
}

impl IntegrationSettings {
    /// Mutable references to the sensitive fields, in stable order.
    ///
    /// Client ids, the account slug and the base URL are not secret and stay
    /// plain so they remain readable in the database.
    fn secret_fields_mut(&mut self) -> [&mut Option<String>; 6] {
        [
            &mut self.monday_api_key,
            &mut self.redmine_api_key,
            &mut self.google_client_secret,
            &mut self.google_refresh_token,
            &mut self.spotify_client_secret,
            &mut self.spotify_refresh_token,
        ]
    }

    /// Encrypt every non-empty secret field in place.
    ///
    /// Applied on the write path before an upsert. Empty strings are
    /// normalized to `None` so they never overwrite a stored secret with an
    /// encrypted empty value.
    pub fn encrypt_secrets(&mut self, cipher: &SecretCipher) {
        for field in self.secret_fields_mut() {
            match field.take() {
                Some(value) if !value.trim().is_empty() => {
                    *field = Some(cipher.encrypt(&value));
                }
                _ => {}
            }
        }
    }

    /// Decrypt every secret field in place, keeping plaintext values as-is.
    ///
    /// Values that fail decryption are assumed to predate encryption and are
    /// passed through unchanged.
    pub fn decrypt_secrets(&mut self, cipher: &SecretCipher) {
        for field in self.secret_fields_mut() {
            if let Some(value) = field.take() {
                *field = Some(cipher.decrypt_or_plaintext(&value));
            }
        }
    }
}
