//! # quarry-sf-client
//!
//! Authenticated HTTP transport shared by the quarry Salesforce crates.
//!
//! This crate provides:
//! - Automatic retry with exponential backoff and jitter for 429/5xx responses
//! - Salesforce JSON error decoding with message sanitization
//! - Incremental (chunked) access to response bodies for large CSV results
//! - SOQL and URL safety helpers
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  quarry-sf-rest / quarry-sf-bulk            │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   SalesforceClient                          │
//! │  - Instance URL + access token + API version                │
//! │  - URL builders (rest_url, bulk_url)                        │
//! │  - Typed JSON methods (get_json, post_json, ...)            │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    SfHttpClient                             │
//! │  - Raw HTTP with retry and rate limit handling              │
//! │  - Response wrapper with streaming body access              │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use quarry_sf_client::SalesforceClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), quarry_sf_client::Error> {
//!     let client = SalesforceClient::new("https://myorg.my.salesforce.com", "token")?;
//!     let limits: serde_json::Value = client.rest_get("limits").await?;
//!     println!("{limits}");
//!     Ok(())
//! }
//! ```

mod client;
mod config;
mod error;
mod request;
mod response;
mod retry;
mod salesforce_client;
pub mod security;

pub use client::SfHttpClient;
pub use config::{ClientConfig, ClientConfigBuilder};
pub use error::{Error, ErrorKind, Result};
pub use request::{RequestBuilder, RequestMethod};
pub use response::{ApiUsage, Response};
pub use retry::{BackoffStrategy, RetryConfig, RetryPolicy};
pub use salesforce_client::SalesforceClient;

/// Default Salesforce API version
pub const DEFAULT_API_VERSION: &str = "62.0";

/// User-Agent string for the client
pub const USER_AGENT: &str = concat!("quarry-sf/", env!("CARGO_PKG_VERSION"));
