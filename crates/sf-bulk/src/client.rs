//! Bulk API 2.0 query client.
//!
//! Job control (create, status, wait, delete, list) and result page fetching.
//! Each operation is a single request except [`BulkApiClient::wait_for_query_job`],
//! which polls on a fixed interval up to a deadline.

use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, instrument};

use quarry_sf_auth::Credentials;
use quarry_sf_client::security::url as url_security;
use quarry_sf_client::{ClientConfig, SalesforceClient};
use quarry_sf_rest::Record;

use crate::error::{Error, ErrorKind, Result};
use crate::query::QuerySpec;
use crate::results::ResultPage;
use crate::session::QuerySession;
use crate::types::*;

/// Default polling interval for job status checks.
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Default maximum wait time for job completion.
const DEFAULT_MAX_WAIT: Duration = Duration::from_secs(3600); // 1 hour

/// Default delay before returning a "results not ready" page.
const DEFAULT_PENDING_DELAY: Duration = Duration::from_secs(1);

/// Default `maxRecords` per result page.
const DEFAULT_PAGE_SIZE: usize = 10_000;

/// Salesforce Bulk API 2.0 query client.
///
/// Provides:
/// - Low-level job control: create, inspect, wait for, delete and list query jobs
/// - Result page fetching with opaque locators
/// - [`QuerySession`]s that stream typed records from a validated [`QuerySpec`]
///
/// # Example
///
/// ```rust,ignore
/// use quarry_sf_bulk::{BulkApiClient, QuerySpec};
///
/// let client = BulkApiClient::new(
///     "https://myorg.my.salesforce.com",
///     "access_token_here",
/// )?;
///
/// let spec = QuerySpec::builder(&lead_describe)
///     .columns(["Id", "Company", "Rating"])
///     .filter("IsConverted = false")
///     .build()?;
///
/// let mut session = client.query(spec);
/// session.enter().await?;
/// while let Some(record) = session.next_record().await? {
///     println!("{:?}", record.get("Company"));
/// }
/// session.close().await?;
/// ```
#[derive(Debug, Clone)]
pub struct BulkApiClient {
    client: SalesforceClient,
    poll_interval: Duration,
    max_wait: Duration,
    pending_delay: Duration,
    page_size: usize,
}

impl BulkApiClient {
    /// Create a new Bulk API client.
    pub fn new(instance_url: impl Into<String>, access_token: impl Into<String>) -> Result<Self> {
        let client = SalesforceClient::new(instance_url, access_token)?;
        Ok(Self::from_client(client))
    }

    /// Create a new Bulk API client with custom HTTP configuration.
    pub fn with_config(
        instance_url: impl Into<String>,
        access_token: impl Into<String>,
        config: ClientConfig,
    ) -> Result<Self> {
        let client = SalesforceClient::with_config(instance_url, access_token, config)?;
        Ok(Self::from_client(client))
    }

    /// Create a Bulk API client from credentials, keeping their API version.
    pub fn from_credentials(credentials: &impl Credentials) -> Result<Self> {
        let client = SalesforceClient::new(credentials.instance_url(), credentials.access_token())?
            .with_api_version(credentials.api_version());
        Ok(Self::from_client(client))
    }

    /// Create a Bulk API client from an existing SalesforceClient.
    pub fn from_client(client: SalesforceClient) -> Self {
        Self {
            client,
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_wait: DEFAULT_MAX_WAIT,
            pending_delay: DEFAULT_PENDING_DELAY,
            page_size: DEFAULT_PAGE_SIZE,
        }
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

    /// Set the delay between job status polls.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set the deadline for job completion and for results to materialize.
    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = max_wait;
        self
    }

    /// Set the backoff applied when results are not ready yet (HTTP 204).
    pub fn with_pending_delay(mut self, delay: Duration) -> Self {
        self.pending_delay = delay;
        self
    }

    /// Set `maxRecords` for result pages.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn max_wait(&self) -> Duration {
        self.max_wait
    }

    fn job_url(&self, job_id: &str) -> Result<String> {
        if !url_security::is_valid_salesforce_id(job_id) {
            return Err(Error::specification(format!("invalid job id {job_id:?}")));
        }
        Ok(self.client.bulk_url(&format!("query/{}", job_id)))
    }

    // =========================================================================
    // Job Control
    // =========================================================================

    /// Create a query job.
    #[instrument(skip(self, request), fields(operation = ?request.operation))]
    pub async fn create_query_job(&self, request: &CreateQueryJobRequest) -> Result<QueryJob> {
        let url = self.client.bulk_url("query");
        let job: QueryJob = self.client.post_json(&url, request).await?;
        debug!(job_id = %job.id, state = %job.state, "created query job");
        Ok(job)
    }

    /// Get the current state of a query job.
    ///
    /// A body that does not decode as job info is an [`ErrorKind::Internal`] error.
    #[instrument(skip(self))]
    pub async fn get_query_job(&self, job_id: &str) -> Result<QueryJob> {
        let url = self.job_url(job_id)?;
        let response = self.client.execute(self.client.get(&url)).await?;
        let body = response.bytes().await?;

        serde_json::from_slice(&body).map_err(|e| {
            Error::with_source(
                ErrorKind::Internal(format!("unexpected job info for {}", job_id)),
                e,
            )
        })
    }

    /// Poll a query job until it is `JobComplete`.
    ///
    /// `Aborted` and `Failed` end the wait with [`ErrorKind::JobFailed`];
    /// exceeding `max_wait` ends it with [`ErrorKind::Timeout`].
    #[instrument(skip(self))]
    pub async fn wait_for_query_job(&self, job_id: &str) -> Result<QueryJob> {
        let start = Instant::now();
        let mut polls = 0u32;

        loop {
            let job = self.get_query_job(job_id).await?;
            polls += 1;

            if job.state.is_success() {
                debug!(polls, "query job complete");
                return Ok(job);
            }
            if job.state.is_terminal() {
                if let Some(ref message) = job.error_message {
                    debug!(state = %job.state, %message, "query job did not complete");
                }
                return Err(Error::new(ErrorKind::JobFailed {
                    job_id: job_id.to_string(),
                    state: job.state,
                }));
            }

            if start.elapsed() >= self.max_wait {
                return Err(Error::new(ErrorKind::Timeout(format!(
                    "Query job {} did not complete within {:?}",
                    job_id, self.max_wait
                ))));
            }

            debug!(polls, state = %job.state, "query job not complete yet");
            sleep(self.poll_interval).await;
        }
    }

    /// Delete a query job.
    #[instrument(skip(self))]
    pub async fn delete_query_job(&self, job_id: &str) -> Result<()> {
        let url = self.job_url(job_id)?;
        self.client.delete_request(&url).await?;
        Ok(())
    }

    /// List every query job in the org, following `nextRecordsUrl`.
    #[instrument(skip(self))]
    pub async fn get_all_query_jobs(&self) -> Result<Vec<QueryJob>> {
        let first = self
            .client
            .get(&self.client.bulk_url("query"))
            .query("jobType", "V2Query");
        let mut page: QueryJobList = self.client.execute(first).await?.json().await?;
        let mut jobs = std::mem::take(&mut page.records);

        while let (false, Some(next)) = (page.done, page.next_records_url.take()) {
            page = self.client.get_json(&next).await?;
            jobs.append(&mut page.records);
        }

        Ok(jobs)
    }

    // =========================================================================
    // Results
    // =========================================================================

    /// Fetch one page of results.
    ///
    /// `locator` is forwarded verbatim; `None` requests the first page.
    /// `max_records` defaults to the configured page size. When the service
    /// answers 204 (results not materialized yet) this waits the pending delay
    /// and returns an empty page whose [`NextPage`](crate::NextPage) is
    /// `Pending`.
    #[instrument(skip(self))]
    pub async fn get_query_results(
        &self,
        job_id: &str,
        locator: Option<&str>,
        max_records: Option<usize>,
        delimiter: ColumnDelimiter,
    ) -> Result<ResultPage> {
        let url = format!("{}/results", self.job_url(job_id)?);

        let mut request = self
            .client
            .get(&url)
            .accept_csv()
            .query("maxRecords", max_records.unwrap_or(self.page_size).to_string());
        if let Some(loc) = locator {
            request = request.query("locator", loc);
        }

        let response = self.client.execute(request).await?;

        if response.is_no_content() {
            debug!(delay = ?self.pending_delay, "results not ready");
            sleep(self.pending_delay).await;
            return Ok(ResultPage::pending());
        }

        ResultPage::from_response(response, delimiter.byte()).await
    }

    // =========================================================================
    // High-Level Operations
    // =========================================================================

    /// Start a query session. Nothing is sent until [`QuerySession::enter`].
    pub fn query(&self, spec: QuerySpec) -> QuerySession {
        QuerySession::new(self.clone(), spec)
    }

    /// Run a query to completion and collect every record.
    ///
    /// The job is deleted on every path, including errors.
    #[instrument(skip(self, spec), fields(entity = %spec.entity()))]
    pub async fn query_records(&self, spec: QuerySpec) -> Result<Vec<Record>> {
        let mut session = self.query(spec);
        let drained = drain(&mut session).await;
        let closed = session.close().await;

        let records = drained?;
        closed?;
        Ok(records)
    }

    pub(crate) fn pending_deadline_passed(&self, since: Instant) -> bool {
        since.elapsed() >= self.max_wait
    }
}

async fn drain(session: &mut QuerySession) -> Result<Vec<Record>> {
    session.enter().await?;
    let mut records = Vec::new();
    while let Some(record) = session.next_record().await? {
        records.push(record);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::NextPage;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const JOB_ID: &str = "750xx0000000001AAA";

    fn job_body(state: &str) -> serde_json::Value {
        serde_json::json!({
            "id": JOB_ID,
            "operation": "query",
            "object": "Account",
            "state": state,
            "apiVersion": 62.0
        })
    }

    #[test]
    fn test_client_defaults() {
        let client = BulkApiClient::new("https://test.salesforce.com", "token123").unwrap();

        assert_eq!(client.instance_url(), "https://test.salesforce.com");
        assert_eq!(client.api_version(), "62.0");
        assert_eq!(client.poll_interval(), Duration::from_secs(1));
        assert_eq!(client.max_wait(), Duration::from_secs(3600));
        assert_eq!(client.page_size, 10_000);
    }

    #[test]
    fn test_builders() {
        let client = BulkApiClient::new("https://test.salesforce.com", "token123")
            .unwrap()
            .with_poll_interval(Duration::from_secs(10))
            .with_max_wait(Duration::from_secs(120))
            .with_pending_delay(Duration::from_millis(5))
            .with_page_size(500);

        assert_eq!(client.poll_interval, Duration::from_secs(10));
        assert_eq!(client.max_wait, Duration::from_secs(120));
        assert_eq!(client.pending_delay, Duration::from_millis(5));
        assert_eq!(client.page_size, 500);
    }

    #[tokio::test]
    async fn test_create_query_job_wiremock() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/services/data/v62.0/jobs/query"))
            .and(header("Authorization", "Bearer test-token"))
            .and(body_json(serde_json::json!({
                "operation": "query",
                "query": "SELECT Id FROM Account",
                "contentType": "CSV",
                "columnDelimiter": "COMMA",
                "lineEnding": "LF"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(job_body("UploadComplete")))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = BulkApiClient::new(mock_server.uri(), "test-token").unwrap();
        let job = client
            .create_query_job(&CreateQueryJobRequest::new("SELECT Id FROM Account"))
            .await
            .unwrap();
        assert_eq!(job.id, JOB_ID);
        assert_eq!(job.state, JobState::UploadComplete);
    }

    #[tokio::test]
    async fn test_create_query_job_rejected() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/services/data/v62.0/jobs/query"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!([{
                "errorCode": "INVALIDJOB",
                "message": "unexpected token: 'FORM'"
            }])))
            .mount(&mock_server)
            .await;

        let client = BulkApiClient::new(mock_server.uri(), "test-token").unwrap();
        let err = client
            .create_query_job(&CreateQueryJobRequest::new("SELECT Id FORM Account"))
            .await
            .unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Client(_)));
        assert!(err.to_string().contains("INVALIDJOB"));
    }

    #[tokio::test]
    async fn test_get_query_job_bad_shape_is_internal() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(format!("/services/data/v62.0/jobs/query/{JOB_ID}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": JOB_ID,
                "state": "Sleeping"
            })))
            .mount(&mock_server)
            .await;

        let client = BulkApiClient::new(mock_server.uri(), "test-token").unwrap();
        let err = client.get_query_job(JOB_ID).await.unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Internal(_)));
    }

    #[tokio::test]
    async fn test_invalid_job_id_sends_nothing() {
        let mock_server = MockServer::start().await;
        let client = BulkApiClient::new(mock_server.uri(), "test-token").unwrap();

        let err = client.delete_query_job("../../sobjects").await.unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Specification(_)));
        assert!(mock_server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_wait_for_query_job_times_out() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(format!("/services/data/v62.0/jobs/query/{JOB_ID}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(job_body("InProgress")))
            .mount(&mock_server)
            .await;

        let client = BulkApiClient::new(mock_server.uri(), "test-token")
            .unwrap()
            .with_poll_interval(Duration::from_millis(10))
            .with_max_wait(Duration::from_millis(50));

        let err = client.wait_for_query_job(JOB_ID).await.unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Timeout(_)));
    }

    #[tokio::test]
    async fn test_wait_for_query_job_aborted() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(format!("/services/data/v62.0/jobs/query/{JOB_ID}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(job_body("Aborted")))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = BulkApiClient::new(mock_server.uri(), "test-token").unwrap();
        let err = client.wait_for_query_job(JOB_ID).await.unwrap_err();
        match err.kind {
            ErrorKind::JobFailed { state, .. } => assert_eq!(state, JobState::Aborted),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_get_query_results_page() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(format!("/services/data/v62.0/jobs/query/{JOB_ID}/results")))
            .and(query_param("maxRecords", "2"))
            .and(query_param("locator", "MTAw"))
            .and(header("Accept", "text/csv"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("Sforce-Locator", "MjAw")
                    .set_body_string("Id;Name\n001xx1;\"Acme; Inc\"\n001xx2;Globex\n"),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = BulkApiClient::new(mock_server.uri(), "test-token").unwrap();
        let mut page = client
            .get_query_results(JOB_ID, Some("MTAw"), Some(2), ColumnDelimiter::Semicolon)
            .await
            .unwrap();

        assert_eq!(page.next_page(), &NextPage::Locator("MjAw".to_string()));
        assert_eq!(page.header().unwrap().iter().collect::<Vec<_>>(), vec!["Id", "Name"]);
        let rows = page.collect_rows().await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[0][1], "Acme; Inc");
    }

    #[tokio::test]
    async fn test_get_query_results_not_ready() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(format!("/services/data/v62.0/jobs/query/{JOB_ID}/results")))
            .and(query_param("maxRecords", "10000"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&mock_server)
            .await;

        let client = BulkApiClient::new(mock_server.uri(), "test-token")
            .unwrap()
            .with_pending_delay(Duration::from_millis(20));

        let started = Instant::now();
        let mut page = client
            .get_query_results(JOB_ID, None, None, ColumnDelimiter::Comma)
            .await
            .unwrap();

        assert!(started.elapsed() >= Duration::from_millis(20));
        assert_eq!(page.next_page(), &NextPage::Pending);
        assert!(page.next_row().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_get_all_query_jobs_follows_next_url() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/services/data/v62.0/jobs/query"))
            .and(query_param("jobType", "V2Query"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "done": false,
                "records": [job_body("JobComplete")],
                "nextRecordsUrl": "/services/data/v62.0/jobs/query/next-page"
            })))
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/services/data/v62.0/jobs/query/next-page"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "done": true,
                "records": [job_body("InProgress")],
                "nextRecordsUrl": null
            })))
            .mount(&mock_server)
            .await;

        let client = BulkApiClient::new(mock_server.uri(), "test-token").unwrap();
        let jobs = client.get_all_query_jobs().await.unwrap();
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[1].state, JobState::InProgress);
    }
}
