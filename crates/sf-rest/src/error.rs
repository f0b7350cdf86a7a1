//! Error types for quarry-sf-rest.

/// Result type alias for REST operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for REST operations.
#[derive(Debug, thiserror::Error)]
#[error("{kind}")]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional source error.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl Error {
    /// Create a new error with the given kind.
    pub fn new(kind: ErrorKind) -> Self {
        Self { kind, source: None }
    }

    /// Create a new error with the given kind and source.
    pub fn with_source(
        kind: ErrorKind,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            source: Some(Box::new(source)),
        }
    }
}

/// The kind of error that occurred.
#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    /// Request rejected before it was sent, or by the API.
    #[error("Salesforce error: {error_code} - {message}")]
    Salesforce { error_code: String, message: String },

    /// A field value did not match its described type.
    #[error("Decode error in field {field}: {message}")]
    Decode { field: String, message: String },

    /// Transport error.
    #[error("Client error: {0}")]
    Client(String),
}

impl Error {
    pub(crate) fn invalid(error_code: &str, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Salesforce {
            error_code: error_code.to_string(),
            message: message.into(),
        })
    }
}

impl From<quarry_sf_client::Error> for Error {
    fn from(err: quarry_sf_client::Error) -> Self {
        Error::with_source(ErrorKind::Client(err.kind.to_string()), err)
    }
}
