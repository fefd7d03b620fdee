//! SQLite-backed settings store.
//!
//! One row per user. Secret columns hold ciphertext produced by
//! [`SecretCipher`](crate::credentials::SecretCipher); this store never
//! touches the cipher itself, callers encrypt before writing.

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;

use super::IntegrationSettings;

/// Settings persistence backed by SQLite.
///
/// # Thread safety
/// The connection is wrapped in a Mutex; writes are last-writer-wins with no
/// optimistic locking, which is acceptable for a single-browser deployment.
pub struct SqliteSettingsStore {
    conn: Mutex<Connection>,
}

impl SqliteSettingsStore {
    /// Open (or create) the settings database at `db_path`.
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path).context("Failed to open settings database")?;

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS settings (
                user_id TEXT PRIMARY KEY,
                monday_api_key TEXT,
                monday_account_slug TEXT,
                redmine_api_key TEXT,
                redmine_base_url TEXT,
                google_client_id TEXT,
                google_client_secret TEXT,
                google_refresh_token TEXT,
                spotify_client_id TEXT,
                spotify_client_secret TEXT,
                spotify_refresh_token TEXT,
                updated_at TEXT NOT NULL
            )
            "#,
            [],
        )
        .context("Failed to create settings table")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Retrieve the settings record for a user, if any.
    pub fn get(&self, user_id: &str) -> Result<Option<IntegrationSettings>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            r#"
            SELECT monday_api_key, monday_account_slug,
                   redmine_api_key, redmine_base_url,
                   google_client_id, google_client_secret, google_refresh_token,
                   spotify_client_id, spotify_client_secret, spotify_refresh_token
            FROM settings
            WHERE user_id = ?1
            "#,
            params![user_id],
            |row| {
                Ok(IntegrationSettings {
                    monday_api_key: row.get(0)?,
                    monday_account_slug: row.get(1)?,
                    redmine_api_key: row.get(2)?,
                    redmine_base_url: row.get(3)?,
                    google_client_id: row.get(4)?,
                    google_client_secret: row.get(5)?,
                    google_refresh_token: row.get(6)?,
                    spotify_client_id: row.get(7)?,
                    spotify_client_secret: row.get(8)?,
                    spotify_refresh_token: row.get(9)?,
                })
            },
        )
        .optional()
        .context("Failed to read settings")
    }

    /// Apply a partial update to a user's settings (upsert).
    ///
    /// `None` fields in the patch preserve the stored value; only `Some`
    /// fields are written. There is no way to clear a field through this
    /// path, callers overwrite with a new value instead.
    pub fn upsert(&self, user_id: &str, patch: &IntegrationSettings) -> Result<()> {
        let now = Utc::now().to_rfc3339();

        self.conn
            .lock()
            .unwrap()
            .execute(
                r#"
                INSERT INTO settings (
                    user_id,
                    monday_api_key, monday_account_slug,
                    redmine_api_key, redmine_base_url,
                    google_client_id, google_client_secret, google_refresh_token,
                    spotify_client_id, spotify_client_secret, spotify_refresh_token,
                    updated_at
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
                ON CONFLICT(user_id) DO UPDATE SET
                    monday_api_key = COALESCE(excluded.monday_api_key, settings.monday_api_key),
                    monday_account_slug = COALESCE(excluded.monday_account_slug, settings.monday_account_slug),
                    redmine_api_key = COALESCE(excluded.redmine_api_key, settings.redmine_api_key),
                    redmine_base_url = COALESCE(excluded.redmine_base_url, settings.redmine_base_url),
                    google_client_id = COALESCE(excluded.google_client_id, settings.google_client_id),
                    google_client_secret = COALESCE(excluded.google_client_secret, settings.google_client_secret),
                    google_refresh_token = COALESCE(excluded.google_refresh_token, settings.google_refresh_token),
                    spotify_client_id = COALESCE(excluded.spotify_client_id, settings.spotify_client_id),
                    spotify_client_secret = COALESCE(excluded.spotify_client_secret, settings.spotify_client_secret),
                    spotify_refresh_token = COALESCE(excluded.spotify_refresh_token, settings.spotify_refresh_token),
                    updated_at = excluded.updated_at
                "#,
                params![
                    user_id,
                    patch.monday_api_key,
                    patch.monday_account_slug,
                    patch.redmine_api_key,
                    patch.redmine_base_url,
                    patch.google_client_id,
                    patch.google_client_secret,
                    patch.google_refresh_token,
                    patch.spotify_client_id,
                    patch.spotify_client_secret,
                    patch.spotify_refresh_token,
                    now,
                ],
            )
            .context("Failed to upsert settings")?;

        Ok(())
    }
}
