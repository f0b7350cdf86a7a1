//! Integration test suite (requires a real Salesforce org).
//!
//! Every test returns early when no org is configured. Run against an org with:
//!   SF_INSTANCE_URL=... SF_ACCESS_TOKEN=... cargo test --test integration -- --nocapture

#[path = "integration/common.rs"]
mod common;
#[path = "integration/rest.rs"]
mod rest;
#[path = "integration/bulk.rs"]
mod bulk;
