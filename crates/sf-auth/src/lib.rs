//! # quarry-sf-auth
//!
//! Salesforce authentication for the quarry crates.
//!
//! - **Username-password grant**: exchanges connected-app and user credentials
//!   for an access token
//! - **Refresh-token grant**: renews an expired access token
//! - **Credentials**: instance URL, access token and API version, loadable
//!   from the environment
//!
//! Tokens and secrets are redacted in Debug output and skipped in tracing spans.
//!
//! ## Example
//!
//! ```rust,ignore
//! use quarry_sf_auth::{OAuthClient, OAuthConfig};
//!
//! let oauth = OAuthClient::new(OAuthConfig::from_env()?);
//! let token = oauth.password("user@example.com", "password+securitytoken").await?;
//! let client = token.to_credentials("62.0").connect()?;
//! ```

mod credentials;
mod error;
mod oauth;

pub use credentials::{Credentials, SalesforceCredentials};
pub use error::{Error, ErrorKind, Result};
pub use oauth::{OAuthClient, OAuthConfig, TokenResponse};

/// Default Salesforce login URL for production.
pub const PRODUCTION_LOGIN_URL: &str = "https://login.salesforce.com";

/// Default Salesforce login URL for sandbox.
pub const SANDBOX_LOGIN_URL: &str = "https://test.salesforce.com";
