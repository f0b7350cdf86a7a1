//! # quarry-sf
//!
//! Salesforce Bulk API 2.0 query engine for Rust.
//!
//! Queries are validated against the object's describe before anything is
//! sent, run as server-side bulk jobs, and streamed back as typed records.
//!
//! ## Security
//!
//! - Sensitive data (tokens, secrets) are redacted in Debug output
//! - Tracing/logging skips credential parameters
//! - Object, field and job identifiers are validated before they reach a URL
//!
//! ## Crates
//!
//! - **quarry-sf-client** - Core HTTP client with retry, compression and Salesforce error decoding
//! - **quarry-sf-auth** - Credentials and OAuth 2.0 token flows
//! - **quarry-sf-rest** - Describe, limits, record lookup and the typed value model
//! - **quarry-sf-bulk** - Bulk API 2.0 query jobs, paginated results and query sessions
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use quarry_sf::{BulkApiClient, QuerySpec, SalesforceCredentials, SalesforceRestClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let creds = SalesforceCredentials::from_env()?;
//!     let rest = SalesforceRestClient::from_credentials(&creds)?;
//!     let bulk = BulkApiClient::from_credentials(&creds)?;
//!
//!     let describe = rest.describe_sobject("Account").await?;
//!     let spec = QuerySpec::builder(&describe)
//!         .columns(["Id", "Name", "Industry"])
//!         .build()?;
//!
//!     for account in bulk.query_records(spec).await? {
//!         println!("{:?}", account.get("Name"));
//!     }
//!
//!     Ok(())
//! }
//! ```

// Re-export all crates for convenient access
#[cfg(feature = "auth")]
pub use quarry_sf_auth as auth;
#[cfg(feature = "bulk")]
pub use quarry_sf_bulk as bulk;
#[cfg(feature = "client")]
pub use quarry_sf_client as client;
#[cfg(feature = "rest")]
pub use quarry_sf_rest as rest;

// Re-export commonly used types at the top level
#[cfg(feature = "auth")]
pub use quarry_sf_auth::{Credentials, SalesforceCredentials};
#[cfg(feature = "bulk")]
pub use quarry_sf_bulk::{BulkApiClient, QuerySession, QuerySpec};
#[cfg(feature = "client")]
pub use quarry_sf_client::{ClientConfig, SalesforceClient};
#[cfg(feature = "rest")]
pub use quarry_sf_rest::{Record, SalesforceRestClient, Value};
