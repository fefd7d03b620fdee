//! Token endpoint calls: authorization-code exchange and refresh grant.

use serde::Deserialize;

use super::provider::{OAuthProvider, TokenAuth};
use super::OAuthError;

/// Result of a successful token endpoint call.
#[derive(Debug)]
pub struct TokenGrant {
    /// Short-lived access token
    pub access_token: String,
    /// Refresh token; present on first consent, commonly omitted afterwards
    pub refresh_token: Option<String>,
    /// Access token lifetime in seconds, when reported
    #[allow(dead_code)]
    pub expires_in: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
}

/// Exchange an authorization code for tokens.
pub async fn exchange_code(
    http: &reqwest::Client,
    token_url: &str,
    provider: OAuthProvider,
    client_id: &str,
    client_secret: &str,
    code: &str,
    redirect_uri: &str,
) -> Result<TokenGrant, OAuthError> {
    let params = [
        ("grant_type", "authorization_code"),
        ("code", code),
        ("redirect_uri", redirect_uri),
    ];
    request_token(
        http,
        token_url,
        provider,
        client_id,
        client_secret,
        &params,
        false,
    )
    .await
}

/// Trade a refresh token for a fresh access token.
pub async fn refresh_access_token(
    http: &reqwest::Client,
    token_url: &str,
    provider: OAuthProvider,
    client_id: &str,
    client_secret: &str,
    refresh_token: &str,
) -> Result<TokenGrant, OAuthError> {
    let params = [
        ("grant_type", "refresh_token"),
        ("refresh_token", refresh_token),
    ];
    request_token(
        http,
        token_url,
        provider,
        client_id,
        client_secret,
        &params,
        true,
    )
    .await
}

async fn request_token(
    http: &reqwest::Client,
    token_url: &str,
    provider: OAuthProvider,
    client_id: &str,
    client_secret: &str,
    grant_params: &[(&str, &str)],
    refresh_grant: bool,
) -> Result<TokenGrant, OAuthError> {
    let mut form: Vec<(&str, &str)> = grant_params.to_vec();

    let mut request = http.post(token_url).header("Accept", "application/json");
    match provider.token_auth() {
        TokenAuth::Body => {
            form.push(("client_id", client_id));
            form.push(("client_secret", client_secret));
        }
        TokenAuth::Basic => {
            request = request.basic_auth(client_id, Some(client_secret));
        }
    }

    tracing::debug!(provider = %provider, "Calling token endpoint");

    let response = request
        .form(&form)
        .send()
        .await
        .map_err(|e| OAuthError::Exchange(format!("token request failed: {e}")))?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        // On the refresh grant, invalid_grant means the refresh token was
        // revoked or expired and only a fresh authorization recovers. On the
        // code exchange the same error just means a bad or reused code.
        if refresh_grant && body.contains("invalid_grant") {
            return Err(OAuthError::ReauthRequired);
        }
        return Err(OAuthError::Exchange(format!(
            "token endpoint returned {status}: {body}"
        )));
    }

    let token: TokenResponse = response
        .json()
        .await
        .map_err(|e| OAuthError::Exchange(format!("invalid token response: {e}")))?;

    tracing::debug!(
        provider = %provider,
        has_refresh_token = token.refresh_token.is_some(),
        expires_in = ?token.expires_in,
        "Token endpoint call succeeded"
    );

    Ok(TokenGrant {
        access_token: token.access_token,
        refresh_token: token.refresh_token,
        expires_in: token.expires_in,
    })
}
