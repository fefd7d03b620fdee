//! Thin HTTP clients for the four external services.
//!
//! Each client owns exactly the calls the dashboard needs: auth header
//! construction, request parameters and parsing into provider-native structs.
//! Normalization into canonical models happens separately in
//! [`crate::normalize`]. None of these are general-purpose SDKs.
//!
//! All clients accept a base URL override so tests can point them at a mock
//! server.

pub mod calendar;
pub mod monday;
pub mod redmine;
pub mod spotify;

use thiserror::Error;

/// Failure raised by a provider client.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The provider answered with a non-success status.
    #[error("{provider} API error {status}: {message}")]
    Api {
        /// Provider name ("monday", "redmine", "google", "spotify")
        provider: &'static str,
        /// HTTP status code
        status: u16,
        /// Response body, truncated for logging
        message: String,
    },

    /// Playback control was rejected because the account lacks a premium plan.
    #[error("spotify playback control requires a premium subscription")]
    PremiumRequired,

    /// The request itself failed (connect, timeout, body decode).
    #[error("{provider} request failed: {source}")]
    Request {
        /// Provider name
        provider: &'static str,
        /// Underlying transport error
        #[source]
        source: reqwest::Error,
    },
}

impl ProviderError {
    pub(crate) fn request(provider: &'static str) -> impl FnOnce(reqwest::Error) -> Self {
        move |source| Self::Request { provider, source }
    }
}

/// Turn a non-2xx response into an `Api` error carrying status and body.
pub(crate) async fn api_error(provider: &'static str, response: reqwest::Response) -> ProviderError {
    let status = response.status().as_u16();
    let mut message = response.text().await.unwrap_or_default();
    if message.len() > 500 {
        // Back off to a char boundary before truncating
        let mut end = 500;
        while !message.is_char_boundary(end) {
            end -= 1;
        }
        message.truncate(end);
    }
    ProviderError::Api {
        provider,
        status,
        message,
    }
}
