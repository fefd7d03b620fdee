//! Canonical read models served to the dashboard.
//!
//! Every provider-specific shape is normalized into one of these before it
//! leaves the integration layer, so the UI never sees raw provider payloads.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A project board from the project-management provider.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct Project {
    /// Provider-side board id
    pub id: String,
    /// Board name
    pub title: String,
    /// Human status label (mapped from the provider state)
    pub status_label: String,
    /// Display color for the status, as a hex string
    pub status_color: String,
    /// Last activity timestamp, when the provider reports one
    pub updated_at: Option<DateTime<Utc>>,
    /// Deep link back to the board
    pub url: String,
}

/// An issue from the tracker, presented as a message thread.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct MessageThread {
    /// Provider-side issue id
    pub id: u64,
    /// Issue subject
    pub subject: String,
    /// Most recent comment with non-empty text, or the issue description
    pub last_message: String,
    /// Issue status name
    pub status_label: String,
    /// Issue priority name
    pub priority_label: String,
    /// Display color for the priority, as a hex string
    pub priority_color: String,
    /// Derived: open status and updated within the last 24 hours
    pub unread: bool,
    /// Last update timestamp
    pub updated_at: Option<DateTime<Utc>>,
    /// Deep link back to the issue
    pub url: String,
}

/// A calendar event inside the requested window.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct CalendarEvent {
    /// Provider-side event id
    pub id: String,
    /// Event title
    pub title: String,
    /// Name of the calendar the event belongs to
    pub calendar: String,
    /// Event start (midnight UTC for all-day events)
    pub start: DateTime<Utc>,
    /// Event end, when present
    pub end: Option<DateTime<Utc>>,
    /// Derived from the provider sending a date instead of a datetime
    pub all_day: bool,
    /// Deep link to the event
    pub url: Option<String>,
}

/// Current playback state of the music provider.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct PlaybackState {
    /// Whether playback is active
    pub playing: bool,
    /// Track title
    pub track: String,
    /// Artist names, comma-joined
    pub artist: String,
    /// Album title
    pub album: String,
    /// Largest album art image, when available
    pub album_art_url: Option<String>,
    /// Playback position in milliseconds
    pub progress_ms: Option<u64>,
    /// Track length in milliseconds
    pub duration_ms: Option<u64>,
    /// Active device volume (0-100), when reported
    pub volume_percent: Option<u8>,
}

/// Outcome of a facade read: missing configuration and missing
/// authorization are first-class states, not errors.
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FetchOutcome<T> {
    /// The provider has no credentials configured.
    NotConfigured,
    /// The provider is configured but holds no valid refresh token.
    NotAuthenticated,
    /// Data was fetched (or served from cache).
    Ready {
        /// The normalized payload.
        data: T,
        /// True when served from the result cache.
        cached: bool,
        /// Age of the payload in seconds (0 for a fresh fetch).
        age_seconds: u64,
    },
}

impl<T> FetchOutcome<T> {
    /// Convenience constructor for a fresh (non-cached) result.
    pub fn fresh(data: T) -> Self {
        FetchOutcome::Ready {
            data,
            cached: false,
            age_seconds: 0,
        }
    }
}
