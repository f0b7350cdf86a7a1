//! REST glue integration tests.

use super::common::require_credentials;
use quarry_sf_rest::{FieldType, SalesforceRestClient};

#[tokio::test]
async fn test_describe_account() {
    let Some(creds) = require_credentials() else {
        return;
    };
    let client = SalesforceRestClient::from_credentials(&creds)
        .expect("Failed to create REST client");

    let describe = client
        .describe_sobject("Account")
        .await
        .expect("describe should succeed");

    assert_eq!(describe.name, "Account");
    let billing = describe.field("BillingAddress").expect("Account has BillingAddress");
    assert!(billing.kind().is_composite());
    assert_eq!(describe.field("name").map(|f| f.kind()), Some(FieldType::String));
}

#[tokio::test]
async fn test_limits_and_counts() {
    let Some(creds) = require_credentials() else {
        return;
    };
    let client = SalesforceRestClient::from_credentials(&creds)
        .expect("Failed to create REST client");

    let limits = client.limits().await.expect("limits should succeed");
    let api = limits.get("DailyApiRequests").expect("DailyApiRequests limit");
    assert!(api.remaining <= api.max);

    let counts = client
        .record_count(&["Account", "Contact"])
        .await
        .expect("record count should succeed");
    assert!(counts.iter().all(|c| c.count >= 0));
}

#[tokio::test]
async fn test_invalid_sobject_name_is_rejected_locally() {
    let Some(creds) = require_credentials() else {
        return;
    };
    let client = SalesforceRestClient::from_credentials(&creds)
        .expect("Failed to create REST client");

    assert!(client.describe_sobject("Account'; DROP").await.is_err());
    assert!(client.sobject("../limits").is_err());
}
