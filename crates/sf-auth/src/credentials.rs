//! Credentials trait and implementations.
//!
//! All credential types implement custom Debug to redact sensitive data.

use quarry_sf_client::{ClientConfig, SalesforceClient};

use crate::error::{Error, ErrorKind, Result};

/// Trait for Salesforce credentials.
pub trait Credentials: Send + Sync {
    /// Get the Salesforce instance URL.
    fn instance_url(&self) -> &str;

    /// Get the access token.
    fn access_token(&self) -> &str;

    /// Get the API version (e.g., "62.0").
    fn api_version(&self) -> &str;

    /// Returns true if the credentials appear to be valid (non-empty).
    fn is_valid(&self) -> bool {
        !self.instance_url().is_empty() && !self.access_token().is_empty()
    }
}

/// Standard Salesforce credentials implementation.
///
/// Sensitive fields (access_token, refresh_token) are redacted in Debug output.
#[derive(Clone)]
pub struct SalesforceCredentials {
    instance_url: String,
    access_token: String,
    api_version: String,
    refresh_token: Option<String>,
}

impl std::fmt::Debug for SalesforceCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SalesforceCredentials")
            .field("instance_url", &self.instance_url)
            .field("access_token", &"[REDACTED]")
            .field("api_version", &self.api_version)
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

impl SalesforceCredentials {
    /// Create new credentials with the given values.
    pub fn new(
        instance_url: impl Into<String>,
        access_token: impl Into<String>,
        api_version: impl Into<String>,
    ) -> Self {
        Self {
            instance_url: instance_url.into(),
            access_token: access_token.into(),
            api_version: api_version.into(),
            refresh_token: None,
        }
    }

    /// Attach a refresh token.
    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(refresh_token.into());
        self
    }

    /// Set the API version.
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    /// Get the refresh token if available.
    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }

    /// Replace the access token (e.g., after a refresh).
    pub fn set_access_token(&mut self, token: impl Into<String>) {
        self.access_token = token.into();
    }

    /// Load credentials from environment variables.
    ///
    /// Required: `SF_INSTANCE_URL`, `SF_ACCESS_TOKEN`.
    /// Optional: `SF_API_VERSION` (default [`quarry_sf_client::DEFAULT_API_VERSION`]),
    /// `SF_REFRESH_TOKEN`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |name: &str| {
            lookup(name)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| Error::new(ErrorKind::EnvVar(name.to_string())))
        };

        let instance_url = required("SF_INSTANCE_URL")?;
        let access_token = required("SF_ACCESS_TOKEN")?;
        let api_version = lookup("SF_API_VERSION")
            .unwrap_or_else(|| quarry_sf_client::DEFAULT_API_VERSION.to_string());

        let mut creds = Self::new(instance_url, access_token, api_version);
        if let Some(rt) = lookup("SF_REFRESH_TOKEN") {
            creds = creds.with_refresh_token(rt);
        }

        Ok(creds)
    }

    /// Build an authenticated API client with the default transport configuration.
    pub fn connect(&self) -> Result<SalesforceClient> {
        self.connect_with_config(ClientConfig::default())
    }

    /// Build an authenticated API client with a custom transport configuration.
    pub fn connect_with_config(&self, config: ClientConfig) -> Result<SalesforceClient> {
        if !self.is_valid() {
            return Err(Error::new(ErrorKind::InvalidCredentials(
                "instance URL and access token are required".to_string(),
            )));
        }

        let client = SalesforceClient::with_config(&self.instance_url, &self.access_token, config)?
            .with_api_version(&self.api_version);
        Ok(client)
    }
}

impl Credentials for SalesforceCredentials {
    fn instance_url(&self) -> &str {
        &self.instance_url
    }

    fn access_token(&self) -> &str {
        &self.access_token
    }

    fn api_version(&self) -> &str {
        &self.api_version
    }
}
