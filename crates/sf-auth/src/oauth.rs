//! OAuth 2.0 token grants against `/services/oauth2/token`.
//!
//! Supported grants:
//! - **Username-password**: connected app credentials plus a user login
//! - **Refresh token**: renew an access token previously issued with `refresh_token` scope

use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::credentials::SalesforceCredentials;
use crate::error::{Error, ErrorKind, Result};
use crate::PRODUCTION_LOGIN_URL;

/// OAuth 2.0 configuration for a connected app.
///
/// `consumer_secret` is redacted in Debug output.
#[derive(Clone)]
pub struct OAuthConfig {
    /// Consumer key (client_id).
    pub consumer_key: String,
    consumer_secret: Option<String>,
    /// Login endpoint, e.g. [`PRODUCTION_LOGIN_URL`] or a My Domain URL.
    pub login_url: String,
}

impl std::fmt::Debug for OAuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthConfig")
            .field("consumer_key", &self.consumer_key)
            .field("consumer_secret", &"[REDACTED]")
            .field("login_url", &self.login_url)
            .finish()
    }
}

impl OAuthConfig {
    /// Create a new OAuth config against the production login URL.
    pub fn new(consumer_key: impl Into<String>) -> Self {
        Self {
            consumer_key: consumer_key.into(),
            consumer_secret: None,
            login_url: PRODUCTION_LOGIN_URL.to_string(),
        }
    }

    /// Set the consumer secret.
    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.consumer_secret = Some(secret.into());
        self
    }

    /// Set the login URL (sandbox, My Domain, or a test server).
    pub fn with_login_url(mut self, url: impl Into<String>) -> Self {
        self.login_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Load from `SF_CLIENT_ID`, optional `SF_CLIENT_SECRET` and optional `SF_LOGIN_URL`.
    pub fn from_env() -> Result<Self> {
        let consumer_key = std::env::var("SF_CLIENT_ID")
            .map_err(|_| Error::new(ErrorKind::EnvVar("SF_CLIENT_ID".to_string())))?;

        let mut config = Self::new(consumer_key);
        if let Ok(secret) = std::env::var("SF_CLIENT_SECRET") {
            config = config.with_secret(secret);
        }
        if let Ok(login_url) = std::env::var("SF_LOGIN_URL") {
            config = config.with_login_url(login_url);
        }
        Ok(config)
    }

    fn token_url(&self) -> String {
        format!("{}/services/oauth2/token", self.login_url)
    }
}

/// OAuth client for obtaining access tokens.
#[derive(Clone)]
pub struct OAuthClient {
    config: OAuthConfig,
    http_client: reqwest::Client,
}

impl std::fmt::Debug for OAuthClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl OAuthClient {
    /// Create a new OAuth client.
    pub fn new(config: OAuthConfig) -> Self {
        Self {
            config,
            http_client: reqwest::Client::new(),
        }
    }

    /// Get the OAuth config.
    pub fn config(&self) -> &OAuthConfig {
        &self.config
    }

    /// Username-password grant. `password` includes the security token suffix
    /// when the org requires one.
    #[instrument(skip(self, password))]
    pub async fn password(&self, username: &str, password: &str) -> Result<TokenResponse> {
        self.grant(&[
            ("grant_type", "password"),
            ("username", username),
            ("password", password),
        ])
        .await
    }

    /// Refresh an access token.
    #[instrument(skip(self, refresh_token))]
    pub async fn refresh_token(&self, refresh_token: &str) -> Result<TokenResponse> {
        self.grant(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ])
        .await
    }

    async fn grant(&self, params: &[(&str, &str)]) -> Result<TokenResponse> {
        let mut form: Vec<(&str, &str)> = params.to_vec();
        form.push(("client_id", &self.config.consumer_key));
        if let Some(ref secret) = self.config.consumer_secret {
            form.push(("client_secret", secret));
        }

        let body = serde_urlencoded::to_string(&form)?;

        let response = self
            .http_client
            .post(self.config.token_url())
            .header("Content-Type", "application/x-www-form-urlencoded")
            .header("Accept", "application/json")
            .body(body)
            .send()
            .await?;

        handle_token_response(response).await
    }
}

async fn handle_token_response(response: reqwest::Response) -> Result<TokenResponse> {
    let status = response.status();
    let body = response.bytes().await?;

    if !status.is_success() {
        let error = serde_json::from_slice::<OAuthErrorResponse>(&body).unwrap_or_else(|_| {
            OAuthErrorResponse {
                error: status.as_u16().to_string(),
                error_description: status
                    .canonical_reason()
                    .unwrap_or("token request failed")
                    .to_string(),
            }
        });
        return Err(Error::new(ErrorKind::OAuth {
            error: error.error,
            description: error.error_description,
        }));
    }

    Ok(serde_json::from_slice(&body)?)
}

/// Token response from the OAuth endpoint.
///
/// `access_token`, `refresh_token` and `signature` are redacted in Debug output.
#[derive(Clone, Deserialize, Serialize)]
pub struct TokenResponse {
    /// Access token.
    pub access_token: String,
    /// Refresh token (if requested).
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Instance URL.
    pub instance_url: String,
    /// Identity URL.
    #[serde(default)]
    pub id: Option<String>,
    /// Token type (usually "Bearer").
    #[serde(default)]
    pub token_type: Option<String>,
    /// Issued-at timestamp (milliseconds since epoch, as a string).
    #[serde(default)]
    pub issued_at: Option<String>,
    /// HMAC signature over id and issued_at.
    #[serde(default)]
    pub signature: Option<String>,
}

impl std::fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenResponse")
            .field("access_token", &"[REDACTED]")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("instance_url", &self.instance_url)
            .field("id", &self.id)
            .field("token_type", &self.token_type)
            .field("issued_at", &self.issued_at)
            .field("signature", &self.signature.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl TokenResponse {
    /// Convert to SalesforceCredentials.
    pub fn to_credentials(&self, api_version: &str) -> SalesforceCredentials {
        let creds = SalesforceCredentials::new(&self.instance_url, &self.access_token, api_version);

        match self.refresh_token {
            Some(ref rt) => creds.with_refresh_token(rt),
            None => creds,
        }
    }
}

#[derive(Debug, Deserialize)]
struct OAuthErrorResponse {
    error: String,
    #[serde(default)]
    error_description: String,
}
