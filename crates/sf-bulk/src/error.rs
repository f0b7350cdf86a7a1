//! Error types for sf-bulk.

use crate::types::JobState;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
#[error("{kind}")]
pub struct Error {
    pub kind: ErrorKind,
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        Self { kind, source: None }
    }

    pub fn with_source(
        kind: ErrorKind,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            source: Some(Box::new(source)),
        }
    }

    pub(crate) fn specification(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Specification(message.into()))
    }

    pub(crate) fn contract(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Contract(message.into()))
    }

    pub(crate) fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal(message.into()))
    }

    /// True for row-level data errors; the session stays usable after one.
    pub fn is_decode_error(&self) -> bool {
        matches!(self.kind, ErrorKind::Decode { .. })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    /// Invalid query: unknown or composite column, no columns, bad names.
    #[error("Invalid query: {0}")]
    Specification(String),

    /// The remote job reached `Aborted` or `Failed`.
    #[error("Query job {job_id} ended in state {state}")]
    JobFailed { job_id: String, state: JobState },

    #[error("Timeout: {0}")]
    Timeout(String),

    /// A result cell did not match its declared column type.
    #[error("Row {row}, column {column}: {message}")]
    Decode {
        row: u64,
        column: String,
        message: String,
    },

    /// The service answered with a shape this client does not understand.
    #[error("Internal error: {0}")]
    Internal(String),

    /// An operation was called in a session state that does not allow it.
    #[error("Contract violation: {0}")]
    Contract(String),

    #[error("Client error: {0}")]
    Client(String),

    #[error("CSV error: {0}")]
    Csv(String),
}

impl From<quarry_sf_client::Error> for Error {
    fn from(err: quarry_sf_client::Error) -> Self {
        Error::with_source(ErrorKind::Client(err.kind.to_string()), err)
    }
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        Error::with_source(ErrorKind::Csv(err.to_string()), err)
    }
}
