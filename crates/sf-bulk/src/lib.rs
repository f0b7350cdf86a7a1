//! # quarry-sf-bulk
//!
//! Salesforce Bulk API 2.0 query engine.
//!
//! ## Features
//!
//! - **Validated queries** - [`QuerySpec`] checks columns against the field catalog before any request
//! - **Job control** - Create, inspect, wait for, delete and list query jobs
//! - **Paginated results** - Opaque locators, "not ready yet" handling, streamed CSV bodies
//! - **Typed records** - Rows decoded with types derived from describe metadata
//! - **Scoped sessions** - [`QuerySession`] deletes its job on close, or in the background when dropped
//!
//! ## Example
//!
//! ```rust,ignore
//! use futures::TryStreamExt;
//! use quarry_sf_bulk::{BulkApiClient, QuerySpec};
//! use quarry_sf_rest::SalesforceRestClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let rest = SalesforceRestClient::new("https://myorg.my.salesforce.com", "access_token")?;
//!     let bulk = BulkApiClient::from_client(rest.inner().clone());
//!
//!     let describe = rest.describe_sobject("Opportunity").await?;
//!     let spec = QuerySpec::builder(&describe)
//!         .columns(["Id", "Name", "Amount", "StageName"])
//!         .filter("CloseDate = THIS_YEAR")
//!         .order_by("Amount DESC")
//!         .build()?;
//!
//!     let mut session = bulk.query(spec);
//!     session.enter().await?;
//!     let records: Vec<_> = session.records().try_collect().await?;
//!     session.close().await?;
//!
//!     println!("Retrieved {} records", records.len());
//!     Ok(())
//! }
//! ```

mod client;
mod codec;
mod csv_rows;
mod error;
mod query;
mod results;
mod session;
mod types;

pub use client::BulkApiClient;
pub use codec::RowCodec;
pub use error::{Error, ErrorKind, Result};
pub use query::{Column, QuerySpec, QuerySpecBuilder};
pub use results::{NextPage, ResultPage};
pub use session::{QuerySession, SessionState};
pub use types::*;

// Typed value model shared with the REST crate
pub use quarry_sf_rest::{ColumnType, Record, ScalarType, Value};
