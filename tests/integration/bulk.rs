//! Bulk API 2.0 query integration tests.

use super::common::require_credentials;
use quarry_sf_bulk::{BulkApiClient, ErrorKind, QuerySpec, SessionState};
use quarry_sf_rest::SalesforceRestClient;

#[tokio::test]
async fn test_bulk_query_session() {
    let Some(creds) = require_credentials() else {
        return;
    };
    let rest = SalesforceRestClient::from_credentials(&creds)
        .expect("Failed to create REST client");
    let bulk = BulkApiClient::from_credentials(&creds).expect("Failed to create Bulk client");

    let describe = rest.describe_sobject("Account").await.expect("describe Account");
    let spec = QuerySpec::builder(&describe)
        .columns(["Id", "Name", "Industry", "CreatedDate"])
        .limit(25)
        .build()
        .expect("valid spec");

    let mut session = bulk.query(spec);
    session.enter().await.expect("job should be created");
    let job_id = session.job_id().expect("job id").to_string();

    let mut count = 0;
    while let Some(record) = session.next_record().await.expect("records should decode") {
        assert!(record.get("Id").is_some());
        count += 1;
    }
    assert!(count <= 25);

    session.close().await.expect("close should succeed");
    assert_eq!(session.state(), SessionState::Closed);

    let err = bulk.get_query_job(&job_id).await.expect_err("job should be deleted");
    assert!(matches!(err.kind, ErrorKind::Client(_)));
}

#[tokio::test]
async fn test_bulk_query_records_default_columns() {
    let Some(creds) = require_credentials() else {
        return;
    };
    let rest = SalesforceRestClient::from_credentials(&creds)
        .expect("Failed to create REST client");
    let bulk = BulkApiClient::from_credentials(&creds).expect("Failed to create Bulk client");

    let describe = rest.describe_sobject("Contact").await.expect("describe Contact");
    let spec = QuerySpec::builder(&describe).limit(10).build().expect("valid spec");
    let columns: Vec<String> = spec.column_names().map(String::from).collect();

    let records = bulk.query_records(spec).await.expect("query should succeed");
    for record in &records {
        assert_eq!(record.columns().len(), columns.len());
    }
}

#[tokio::test]
async fn test_bulk_list_query_jobs() {
    let Some(creds) = require_credentials() else {
        return;
    };
    let bulk = BulkApiClient::from_credentials(&creds).expect("Failed to create Bulk client");

    let jobs = bulk.get_all_query_jobs().await.expect("listing should succeed");
    assert!(jobs.iter().all(|job| !job.id.is_empty()));
}
