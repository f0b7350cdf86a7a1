//! Bulk query sessions.
//!
//! A [`QuerySession`] owns one remote query job from submission to deletion:
//!
//! ```text
//! Unstarted -> Submitted -> Polling -> ResultsReady -> Draining -> Closed
//!                  |           |                          |
//!                  +---------> Failed <------------------+
//! ```
//!
//! `enter` submits the job. The first `next_record` polls it to completion and
//! then pages through the results, decoding rows one at a time. `close` deletes
//! the job; when no results were read it first waits for the job to finish so
//! the job is not deleted while the service is still writing it. A session
//! dropped before `close` runs the same cleanup on the current tokio runtime.
//! If that cleanup fails, or no runtime is available, the remote job is left
//! behind and a warning names it.

use csv::StringRecord;
use futures::stream::{self, Stream};
use tokio::time::Instant;
use tracing::{debug, warn};

use quarry_sf_rest::Record;

use crate::client::BulkApiClient;
use crate::codec::RowCodec;
use crate::error::{Error, ErrorKind, Result};
use crate::query::QuerySpec;
use crate::results::{NextPage, ResultPage};

/// Lifecycle of a [`QuerySession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Built, nothing sent.
    Unstarted,
    /// Job created.
    Submitted,
    /// Waiting for the job to complete.
    Polling,
    /// Job complete, no page fetched yet.
    ResultsReady,
    /// Reading result pages.
    Draining,
    /// Job deleted (or deletion attempted).
    Closed,
    /// Submission, polling or paging failed.
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Cursor {
    First,
    Locator(String),
    Done,
}

/// One bulk query job and the forward-only sequence of its records.
///
/// Created by [`BulkApiClient::query`]. Drive it with [`enter`](Self::enter),
/// then [`next_record`](Self::next_record) or [`records`](Self::records), then
/// [`close`](Self::close). Calls must not overlap; every method takes
/// `&mut self`.
#[derive(Debug)]
pub struct QuerySession {
    client: BulkApiClient,
    spec: QuerySpec,
    state: SessionState,
    job_id: Option<String>,
    cursor: Cursor,
    page: Option<ResultPage>,
    codec: Option<RowCodec>,
    rows_read: u64,
    pending_since: Option<Instant>,
}

impl QuerySession {
    pub(crate) fn new(client: BulkApiClient, spec: QuerySpec) -> Self {
        Self {
            client,
            spec,
            state: SessionState::Unstarted,
            job_id: None,
            cursor: Cursor::First,
            page: None,
            codec: None,
            rows_read: 0,
            pending_since: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Remote job id, once submitted.
    pub fn job_id(&self) -> Option<&str> {
        self.job_id.as_deref()
    }

    pub fn spec(&self) -> &QuerySpec {
        &self.spec
    }

    /// Submit the query job. A session can be entered once.
    pub async fn enter(&mut self) -> Result<()> {
        if self.state != SessionState::Unstarted {
            return Err(Error::contract(format!(
                "query session already entered (state {:?})",
                self.state
            )));
        }

        match self.client.create_query_job(&self.spec.job_request()).await {
            Ok(job) => {
                self.job_id = Some(job.id);
                self.transition(SessionState::Submitted);
                Ok(())
            }
            Err(err) => {
                self.transition(SessionState::Failed);
                Err(err)
            }
        }
    }

    /// Next decoded record, or `None` once every page is drained.
    ///
    /// A row that fails to decode returns [`ErrorKind::Decode`] and is
    /// skipped; the following call continues with the next row. Any other
    /// error fails the session.
    pub async fn next_record(&mut self) -> Result<Option<Record>> {
        match self.state {
            SessionState::Unstarted => {
                return Err(Error::contract("query session must be entered before reading"))
            }
            SessionState::Closed => return Err(Error::contract("query session is closed")),
            SessionState::Failed => return Err(Error::contract("query session has failed")),
            SessionState::Submitted | SessionState::Polling => {
                self.await_completion().await?;
                self.transition(SessionState::Draining);
            }
            SessionState::ResultsReady => self.transition(SessionState::Draining),
            SessionState::Draining => {}
        }

        match self.pull().await {
            Ok(record) => Ok(record),
            Err(err) if err.is_decode_error() => Err(err),
            Err(err) => {
                self.transition(SessionState::Failed);
                Err(err)
            }
        }
    }

    /// The remaining records as a stream. Ends at the first error.
    pub fn records(&mut self) -> impl Stream<Item = Result<Record>> + '_ {
        stream::try_unfold(self, |session| async move {
            let next = session.next_record().await?;
            Ok::<_, Error>(next.map(|record| (record, session)))
        })
    }

    /// Delete the remote job.
    ///
    /// If no results were read yet the job is first polled to completion; an
    /// error from that wait is returned after the delete is attempted. Delete
    /// failures are logged, never returned. Closing twice is a no-op.
    pub async fn close(&mut self) -> Result<()> {
        let poll_first = match self.state {
            SessionState::Unstarted | SessionState::Closed => {
                self.transition(SessionState::Closed);
                return Ok(());
            }
            SessionState::Submitted | SessionState::Polling => true,
            SessionState::ResultsReady | SessionState::Draining | SessionState::Failed => false,
        };

        self.page = None;
        let result = match self.job_id.clone() {
            Some(job_id) => finish_job(&self.client, &job_id, poll_first).await,
            None => Ok(()),
        };
        self.transition(SessionState::Closed);
        result
    }

    async fn await_completion(&mut self) -> Result<()> {
        let Some(job_id) = self.job_id.clone() else {
            return Err(Error::internal("submitted session has no job id"));
        };

        self.transition(SessionState::Polling);
        match self.client.wait_for_query_job(&job_id).await {
            Ok(_) => {
                self.transition(SessionState::ResultsReady);
                Ok(())
            }
            Err(err) => {
                self.transition(SessionState::Failed);
                Err(err)
            }
        }
    }

    async fn pull(&mut self) -> Result<Option<Record>> {
        loop {
            if let Some(page) = self.page.as_mut() {
                if let Some(raw) = page.next_row().await? {
                    self.rows_read += 1;
                    let codec = self
                        .codec
                        .as_ref()
                        .ok_or_else(|| Error::internal("result rows arrived before a header"))?;
                    return codec.decode(&raw, self.rows_read).map(Some);
                }
                self.page = None;
            }

            let locator = match self.cursor {
                Cursor::Done => return Ok(None),
                Cursor::First => None,
                Cursor::Locator(ref locator) => Some(locator.clone()),
            };
            self.fetch_page(locator.as_deref()).await?;
        }
    }

    async fn fetch_page(&mut self, locator: Option<&str>) -> Result<()> {
        let job_id = self
            .job_id
            .clone()
            .ok_or_else(|| Error::internal("draining session has no job id"))?;

        let page = self
            .client
            .get_query_results(&job_id, locator, None, self.spec.delimiter())
            .await?;

        match page.next_page() {
            NextPage::Pending => {
                let since = *self.pending_since.get_or_insert_with(Instant::now);
                if self.client.pending_deadline_passed(since) {
                    return Err(Error::new(ErrorKind::Timeout(format!(
                        "results of query job {} were not ready within {:?}",
                        job_id,
                        self.client.max_wait()
                    ))));
                }
                return Ok(());
            }
            NextPage::Locator(next) => self.cursor = Cursor::Locator(next.clone()),
            NextPage::Done => self.cursor = Cursor::Done,
        }
        self.pending_since = None;

        if let Some(header) = page.header() {
            self.accept_header(header)?;
        }
        debug!(%job_id, next = ?self.cursor, "fetched result page");
        self.page = Some(page);
        Ok(())
    }

    /// The codec is built once, from the first header; every later page must
    /// repeat that header.
    fn accept_header(&mut self, header: &StringRecord) -> Result<()> {
        match self.codec {
            Some(ref codec) if !codec.matches_header(header) => Err(Error::internal(format!(
                "result header changed from {:?} to {:?}",
                codec.columns(),
                header
            ))),
            Some(_) => Ok(()),
            None => {
                self.codec = Some(RowCodec::new(header, &self.spec.schema())?);
                Ok(())
            }
        }
    }

    fn transition(&mut self, to: SessionState) {
        if self.state != to {
            debug!(
                job_id = self.job_id.as_deref().unwrap_or("-"),
                from = ?self.state,
                to = ?to,
                "query session transition"
            );
            self.state = to;
        }
    }
}

impl Drop for QuerySession {
    fn drop(&mut self) {
        if matches!(self.state, SessionState::Unstarted | SessionState::Closed) {
            return;
        }
        let Some(job_id) = self.job_id.take() else {
            return;
        };
        let poll_first = matches!(self.state, SessionState::Submitted | SessionState::Polling);

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let client = self.client.clone();
                handle.spawn(async move {
                    if let Err(err) = finish_job(&client, &job_id, poll_first).await {
                        warn!(%job_id, error = %err, "query job cleanup after drop failed");
                    }
                });
            }
            Err(_) => warn!(%job_id, "query session dropped outside a runtime; job not deleted"),
        }
    }
}

/// Optionally wait for the job, then delete it. Delete errors are logged and
/// swallowed; a wait error is returned.
async fn finish_job(client: &BulkApiClient, job_id: &str, poll_first: bool) -> Result<()> {
    let waited = if poll_first {
        client.wait_for_query_job(job_id).await.map(|_| ())
    } else {
        Ok(())
    };

    if let Err(err) = client.delete_query_job(job_id).await {
        warn!(%job_id, error = %err, "failed to delete query job");
    }
    waited
}
