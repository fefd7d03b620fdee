//! Redmine REST client.
//!
//! Authenticates with the `X-Redmine-API-Key` header against a per-user base
//! URL. The issue list endpoint does not include journals, so the client
//! also exposes a show call with `include=journals` for comment history.

use reqwest::Client;
use serde::Deserialize;

use super::{api_error, ProviderError};

const PROVIDER: &str = "redmine";

/// Issue status reference.
#[derive(Clone, Debug, Deserialize)]
pub struct RedmineStatus {
    /// Status id
    pub id: u32,
    /// Status name ("New", "In Progress", "Closed", ...)
    pub name: String,
}

/// Issue priority reference.
#[derive(Clone, Debug, Deserialize)]
pub struct RedminePriority {
    /// Priority id
    pub id: u32,
    /// Priority name ("Low", "Normal", "High", ...)
    pub name: String,
}

/// A journal entry (comment or field change) on an issue.
#[derive(Clone, Debug, Deserialize)]
pub struct RedmineJournal {
    /// Journal id; higher means more recent
    pub id: u64,
    /// Comment text; empty or absent for pure field changes
    #[serde(default)]
    pub notes: Option<String>,
}

/// A Redmine issue, optionally with its journals.
#[derive(Clone, Debug, Deserialize)]
pub struct RedmineIssue {
    /// Issue id
    pub id: u64,
    /// Issue subject line
    pub subject: String,
    /// Original description
    #[serde(default)]
    pub description: Option<String>,
    /// Current status
    pub status: RedmineStatus,
    /// Priority, when assigned
    #[serde(default)]
    pub priority: Option<RedminePriority>,
    /// Last update timestamp (RFC 3339)
    #[serde(default)]
    pub updated_on: Option<String>,
    /// Journals; only populated by [`RedmineClient::get_issue`]
    #[serde(default)]
    pub journals: Vec<RedmineJournal>,
}

#[derive(Debug, Deserialize)]
struct IssueListResponse {
    issues: Vec<RedmineIssue>,
}

#[derive(Debug, Deserialize)]
struct IssueShowResponse {
    issue: RedmineIssue,
}

/// HTTP client for a Redmine instance.
pub struct RedmineClient {
    api_key: String,
    http_client: Client,
    base_url: String,
}

impl RedmineClient {
    /// Create a client for the given instance base URL.
    pub fn new(api_key: String, base_url: String) -> Self {
        Self {
            api_key,
            http_client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Fetch open issues, most recently updated first.
    pub async fn list_issues(&self, limit: u32) -> Result<Vec<RedmineIssue>, ProviderError> {
        let url = format!("{}/issues.json", self.base_url);
        let response = self
            .http_client
            .get(&url)
            .header("X-Redmine-API-Key", &self.api_key)
            .query(&[
                ("status_id", "open"),
                ("sort", "updated_on:desc"),
                ("limit", &limit.to_string()),
            ])
            .send()
            .await
            .map_err(ProviderError::request(PROVIDER))?;

        if !response.status().is_success() {
            return Err(api_error(PROVIDER, response).await);
        }

        let body: IssueListResponse = response
            .json()
            .await
            .map_err(ProviderError::request(PROVIDER))?;
        Ok(body.issues)
    }

    /// Fetch one issue with its journals.
    pub async fn get_issue(&self, id: u64) -> Result<RedmineIssue, ProviderError> {
        let url = format!("{}/issues/{}.json", self.base_url, id);
        let response = self
            .http_client
            .get(&url)
            .header("X-Redmine-API-Key", &self.api_key)
            .query(&[("include", "journals")])
            .send()
            .await
            .map_err(ProviderError::request(PROVIDER))?;

        if !response.status().is_success() {
            return Err(api_error(PROVIDER, response).await);
        }

        let body: IssueShowResponse = response
            .json()
            .await
            .map_err(ProviderError::request(PROVIDER))?;
        Ok(body.issue)
    }
}
