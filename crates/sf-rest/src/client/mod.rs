//! Salesforce REST API client.
//!
//! This client wraps `SalesforceClient` from `sf-client` and provides the
//! describe, limits and discovery calls the bulk query engine builds on.

use quarry_sf_auth::Credentials;
use quarry_sf_client::{ClientConfig, SalesforceClient};

use crate::error::Result;

mod describe;
mod limits;

pub use limits::{Limit, RecordCount};

/// Salesforce REST API client.
///
/// Provides typed methods for:
/// - Global and per-object describe
/// - Typed single-record reads through [`crate::SObjectResource`]
/// - Org limits, record counts, API versions and resources
///
/// # Example
///
/// ```rust,ignore
/// use quarry_sf_rest::SalesforceRestClient;
///
/// let client = SalesforceRestClient::new(
///     "https://myorg.my.salesforce.com",
///     "access_token_here",
/// )?;
///
/// let lead = client.describe_sobject("Lead").await?;
/// let limits = client.limits().await?;
/// ```
#[derive(Debug, Clone)]
pub struct SalesforceRestClient {
    client: SalesforceClient,
}

impl SalesforceRestClient {
    /// Create a new REST client with the given instance URL and access token.
    pub fn new(instance_url: impl Into<String>, access_token: impl Into<String>) -> Result<Self> {
        let client = SalesforceClient::new(instance_url, access_token)?;
        Ok(Self { client })
    }

    /// Create a new REST client with custom HTTP configuration.
    pub fn with_config(
        instance_url: impl Into<String>,
        access_token: impl Into<String>,
        config: ClientConfig,
    ) -> Result<Self> {
        let client = SalesforceClient::with_config(instance_url, access_token, config)?;
        Ok(Self { client })
    }

    /// Create a REST client from credentials, keeping their API version.
    pub fn from_credentials(credentials: &impl Credentials) -> Result<Self> {
        let client = SalesforceClient::new(credentials.instance_url(), credentials.access_token())?
            .with_api_version(credentials.api_version());
        Ok(Self { client })
    }

    /// Create a REST client from an existing SalesforceClient.
    pub fn from_client(client: SalesforceClient) -> Self {
        Self { client }
    }

    /// Get the underlying SalesforceClient.
    pub fn inner(&self) -> &SalesforceClient {
        &self.client
    }

    /// Get the instance URL.
    pub fn instance_url(&self) -> &str {
        self.client.instance_url()
    }

    /// Get the API version.
    pub fn api_version(&self) -> &str {
        self.client.api_version()
    }

    /// Set the API version.
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.client = self.client.with_api_version(version);
        self
    }
}

/// API version information.
#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
pub struct ApiVersion {
    pub version: String,
    pub label: String,
    pub url: String,
}
