//! Normalization of provider-native shapes into canonical models.
//!
//! Pure functions, no I/O. Normalization is total: every raw item maps to
//! exactly one canonical object, and unmapped status or priority values
//! degrade to a default label/color instead of failing. Timestamps that do
//! not parse degrade to the epoch (calendar) or `None` (projects, threads).

use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::model::{CalendarEvent, MessageThread, PlaybackState, Project};
use crate::providers::calendar::{EventTime, GoogleEvent};
use crate::providers::monday::MondayBoard;
use crate::providers::redmine::RedmineIssue;
use crate::providers::spotify::SpotifyPlayback;

/// Board state -> (label, color). Anything else falls back to the default.
const BOARD_STATE_TABLE: &[(&str, &str, &str)] = &[
    ("active", "Active", "#00c875"),
    ("archived", "Archived", "#808080"),
    ("deleted", "Deleted", "#e2445c"),
];

const DEFAULT_BOARD_STATE: (&str, &str) = ("Unknown", "#c4c4c4");

/// Priority name -> color. Anything else falls back to the default.
const PRIORITY_COLOR_TABLE: &[(&str, &str)] = &[
    ("Low", "#999999"),
    ("Normal", "#4caf50"),
    ("High", "#ff9800"),
    ("Urgent", "#f44336"),
    ("Immediate", "#b71c1c"),
];

const DEFAULT_PRIORITY: (&str, &str) = ("Normal", "#4caf50");

/// Statuses that mark an issue as terminal; terminal issues are never unread.
const TERMINAL_STATUSES: &[&str] = &["Closed", "Resolved", "Rejected"];

/// An issue counts as unread this long after its last update.
const UNREAD_WINDOW_HOURS: i64 = 24;

/// Map a Monday board into a canonical project.
///
/// The deep link is built from the configured account slug; an unconfigured
/// slug yields an unusable but harmless URL rather than an error.
pub fn project_from_board(board: &MondayBoard, account_slug: &str) -> Project {
    let state = board.state.as_deref().unwrap_or_default();
    let (label, color) = BOARD_STATE_TABLE
        .iter()
        .find(|(key, _, _)| key.eq_ignore_ascii_case(state))
        .map(|(_, label, color)| (*label, *color))
        .unwrap_or(DEFAULT_BOARD_STATE);

    Project {
        id: board.id.clone(),
        title: board.name.clone(),
        status_label: label.to_string(),
        status_color: color.to_string(),
        updated_at: board.updated_at.as_deref().and_then(parse_rfc3339),
        url: format!(
            "https://{}.monday.com/boards/{}",
            account_slug.trim(),
            board.id
        ),
    }
}

/// Map a Redmine issue into a message thread.
///
/// `now` is injected so the 24-hour unread window is testable. An issue is
/// unread iff its status is not terminal and it was updated inside the
/// window; the last message prefers the highest-id journal with non-empty
/// notes over the original description.
pub fn thread_from_issue(issue: &RedmineIssue, base_url: &str, now: DateTime<Utc>) -> MessageThread {
    let updated_at = issue.updated_on.as_deref().and_then(parse_rfc3339);

    let terminal = TERMINAL_STATUSES
        .iter()
        .any(|s| s.eq_ignore_ascii_case(&issue.status.name));
    let recently_updated = updated_at
        .map(|ts| now.signed_duration_since(ts) < Duration::hours(UNREAD_WINDOW_HOURS))
        .unwrap_or(false);

    let last_message = issue
        .journals
        .iter()
        .filter(|j| j.notes.as_deref().is_some_and(|n| !n.trim().is_empty()))
        .max_by_key(|j| j.id)
        .and_then(|j| j.notes.clone())
        .or_else(|| {
            issue
                .description
                .clone()
                .filter(|d| !d.trim().is_empty())
        })
        .unwrap_or_default();

    let priority_name = issue.priority.as_ref().map(|p| p.name.as_str());
    let (priority_label, priority_color) = priority_name
        .and_then(|name| {
            PRIORITY_COLOR_TABLE
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(name))
                .map(|(_, color)| (name, *color))
        })
        .unwrap_or(DEFAULT_PRIORITY);

    MessageThread {
        id: issue.id,
        subject: issue.subject.clone(),
        last_message,
        status_label: issue.status.name.clone(),
        priority_label: priority_label.to_string(),
        priority_color: priority_color.to_string(),
        unread: !terminal && recently_updated,
        updated_at,
        url: format!("{}/issues/{}", base_url.trim_end_matches('/'), issue.id),
    }
}

/// Map a Google Calendar event into a canonical event.
///
/// All-day is derived from the start field carrying a date instead of a
/// datetime; the provider sends no explicit flag.
pub fn event_from_google(calendar_label: &str, event: &GoogleEvent) -> CalendarEvent {
    let all_day = event.start.date.is_some();

    CalendarEvent {
        id: event.id.clone(),
        title: event.summary.clone().unwrap_or_default(),
        calendar: calendar_label.to_string(),
        start: parse_event_time(&event.start),
        end: event.end.as_ref().map(parse_event_time),
        all_day,
        url: event.html_link.clone(),
    }
}

/// Map raw Spotify player state into the canonical playback model.
pub fn playback_from_raw(raw: &SpotifyPlayback) -> PlaybackState {
    let (track, artist, album, album_art_url, duration_ms) = match &raw.item {
        Some(item) => (
            item.name.clone(),
            item.artists
                .iter()
                .map(|a| a.name.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            item.album.name.clone(),
            item.album.images.first().map(|i| i.url.clone()),
            item.duration_ms,
        ),
        None => (String::new(), String::new(), String::new(), None, None),
    };

    PlaybackState {
        playing: raw.is_playing,
        track,
        artist,
        album,
        album_art_url,
        progress_ms: raw.progress_ms,
        duration_ms,
        volume_percent: raw.device.as_ref().and_then(|d| d.volume_percent),
    }
}

fn parse_rfc3339(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Resolve an event time to UTC: datetime as-is, date at midnight UTC,
/// neither (or unparseable) degrades to the epoch.
fn parse_event_time(time: &EventTime) -> DateTime<Utc> {
    if let Some(dt) = time.date_time.as_deref().and_then(parse_rfc3339) {
        return dt;
    }
    if let Some(date) = time
        .date
        .as_deref()
        .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
    {
        return date
            .and_hms_opt(0, 0, 0)
            .map(|naive| naive.and_utc())
            .unwrap_or(DateTime::UNIX_EPOCH);
    }
    DateTime::UNIX_EPOCH
}
