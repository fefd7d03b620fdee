//! Google Calendar REST client.
//!
//! Bearer-token authenticated. The events call expands recurring events
//! (`singleEvents=true`) so the dashboard only deals in concrete instances.

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;

use super::{api_error, ProviderError};

/// Default Calendar API base URL.
pub const BASE_URL: &str = "https://www.googleapis.com/calendar/v3";

const PROVIDER: &str = "google";

/// A calendar from the user's calendar list.
#[derive(Clone, Debug, Deserialize)]
pub struct CalendarEntry {
    /// Calendar id (an email-like identifier)
    pub id: String,
    /// Display name
    #[serde(default)]
    pub summary: Option<String>,
    /// True for the account's primary calendar
    #[serde(default)]
    pub primary: bool,
}

/// Start or end of an event: either a date (all-day) or a datetime.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct EventTime {
    /// Set for all-day events (`YYYY-MM-DD`)
    #[serde(default)]
    pub date: Option<String>,
    /// Set for timed events (RFC 3339)
    #[serde(rename = "dateTime", default)]
    pub date_time: Option<String>,
}

/// A calendar event.
#[derive(Clone, Debug, Deserialize)]
pub struct GoogleEvent {
    /// Event id
    pub id: String,
    /// Event title
    #[serde(default)]
    pub summary: Option<String>,
    /// Event status ("confirmed", "tentative", "cancelled")
    #[serde(default)]
    pub status: Option<String>,
    /// Link to the event in the provider UI
    #[serde(rename = "htmlLink", default)]
    pub html_link: Option<String>,
    /// Event start
    #[serde(default)]
    pub start: EventTime,
    /// Event end
    #[serde(default)]
    pub end: Option<EventTime>,
}

#[derive(Debug, Deserialize)]
struct CalendarListResponse {
    #[serde(default)]
    items: Vec<CalendarEntry>,
}

#[derive(Debug, Deserialize)]
struct EventsResponse {
    #[serde(default)]
    items: Vec<GoogleEvent>,
}

/// HTTP client for the Google Calendar API.
pub struct GoogleCalendarClient {
    access_token: String,
    http_client: Client,
    base_url: String,
}

impl GoogleCalendarClient {
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

    /// Fetch the calendars the user owns or subscribes to.
    pub async fn list_calendars(&self) -> Result<Vec<CalendarEntry>, ProviderError> {
        let url = format!("{}/users/me/calendarList", self.base_url);
        let response = self
            .http_client
            .get(&url)
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(ProviderError::request(PROVIDER))?;

        if !response.status().is_success() {
            return Err(api_error(PROVIDER, response).await);
        }

        let body: CalendarListResponse = response
            .json()
            .await
            .map_err(ProviderError::request(PROVIDER))?;
        Ok(body.items)
    }

    /// Fetch events of one calendar inside a time window, expanded and
    /// ordered by start time.
    pub async fn list_events(
        &self,
        calendar_id: &str,
        time_min: DateTime<Utc>,
        time_max: DateTime<Utc>,
    ) -> Result<Vec<GoogleEvent>, ProviderError> {
        let url = format!(
            "{}/calendars/{}/events",
            self.base_url,
            urlencoding::encode(calendar_id)
        );
        let response = self
            .http_client
            .get(&url)
            .bearer_auth(&self.access_token)
            .query(&[
                ("timeMin", time_min.to_rfc3339()),
                ("timeMax", time_max.to_rfc3339()),
                ("singleEvents", "true".to_string()),
                ("orderBy", "startTime".to_string()),
                ("maxResults", "100".to_string()),
            ])
            .send()
            .await
            .map_err(ProviderError::request(PROVIDER))?;

        if !response.status().is_success() {
            return Err(api_error(PROVIDER, response).await);
        }

        let body: EventsResponse = response
            .json()
            .await
            .map_err(ProviderError::request(PROVIDER))?;
        Ok(body.items)
    }
}
