//! # sf-rest
//!
//! Salesforce REST glue for the quarry bulk query engine.
//!
//! ## Features
//!
//! - **Describe** - Global object list and per-object field catalogs
//! - **Type mapping** - Field descriptors to decodable [`ColumnType`]s
//! - **Typed records** - [`Value`] and [`Record`], shared with the bulk crate
//! - **SObject handles** - Cached describe plus typed single-record reads
//! - **Limits** - Org limits, record counts, API versions and resources
//!
//! ## Example
//!
//! ```rust,ignore
//! use quarry_sf_rest::{ColumnType, SalesforceRestClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), quarry_sf_rest::Error> {
//!     let client = SalesforceRestClient::new(
//!         "https://myorg.my.salesforce.com",
//!         "access_token_here",
//!     )?;
//!
//!     let lead = client.describe_sobject("Lead").await?;
//!     for field in lead.scalar_fields() {
//!         println!("{} -> {:?}", field.name, ColumnType::for_field(field));
//!     }
//!
//!     let record = client.sobject("Lead")?.get("00Qxx0000001AbC", None).await?;
//!     println!("{}", serde_json::to_string(&record).unwrap());
//!
//!     Ok(())
//! }
//! ```

mod client;
mod describe;
mod error;
mod field_type;
mod record;
mod sobject;
mod value;

// Main client
pub use client::{ApiVersion, Limit, RecordCount, SalesforceRestClient};

// Describe types
pub use describe::{
    DescribeGlobalResult, DescribeSObjectResult, FieldDescribe, PicklistValue, SObjectBasicInfo,
};

// Typed values
pub use field_type::{ColumnType, FieldType, ScalarType, ValueError};
pub use record::Record;
pub use sobject::SObjectResource;
pub use value::Value;

// Error types
pub use error::{Error, ErrorKind, Result};
