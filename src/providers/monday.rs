//! Monday.com GraphQL client.
//!
//! Monday authenticates with the raw API token in the `Authorization` header
//! and answers GraphQL errors with HTTP 200 plus an `errors` array, which is
//! mapped to [`ProviderError::Api`] here.

use reqwest::Client;
use serde::Deserialize;

use super::{api_error, ProviderError};

/// Default Monday GraphQL endpoint.
pub const BASE_URL: &str = "https://api.monday.com/v2";

const PROVIDER: &str = "monday";

const BOARDS_QUERY: &str =
    "query { boards (limit: 50, order_by: used_at) { id name state updated_at } }";

/// A Monday board as returned by the boards query.
#[derive(Clone, Debug, Deserialize)]
pub struct MondayBoard {
    /// Board id (GraphQL ID, serialized as a string)
    pub id: String,
    /// Board name
    pub name: String,
    /// Board lifecycle state ("active", "archived", "deleted")
    #[serde(default)]
    pub state: Option<String>,
    /// Last activity timestamp (RFC 3339)
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct BoardsData {
    boards: Vec<MondayBoard>,
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    #[serde(default)]
    data: Option<BoardsData>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

/// HTTP client for the Monday.com GraphQL API.
pub struct MondayClient {
    api_key: String,
    http_client: Client,
    base_url: String,
}

impl MondayClient {
    /// Create a client against the production endpoint.
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, BASE_URL.to_string())
    }

    /// Create a client with a custom endpoint (for testing with a mock server).
    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        Self {
            api_key,
            http_client: Client::new(),
            base_url,
        }
    }

    /// Fetch the account's boards, most recently used first.
    pub async fn list_boards(&self) -> Result<Vec<MondayBoard>, ProviderError> {
        let response = self
            .http_client
            .post(&self.base_url)
            .header("Authorization", &self.api_key)
            .header("API-Version", "2024-10")
            .json(&serde_json::json!({ "query": BOARDS_QUERY }))
            .send()
            .await
            .map_err(ProviderError::request(PROVIDER))?;

        if !response.status().is_success() {
            return Err(api_error(PROVIDER, response).await);
        }

        let body: GraphQlResponse = response
            .json()
            .await
            .map_err(ProviderError::request(PROVIDER))?;

        if let Some(error) = body.errors.first() {
            return Err(ProviderError::Api {
                provider: PROVIDER,
                status: 200,
                message: error.message.clone(),
            });
        }

        Ok(body.data.map(|d| d.boards).unwrap_or_default())
    }
}
