use tally_domain::MonthKeyError;
use thiserror::Error;

/// Error taxonomy for store-backed operations.
///
/// The aggregation functions in [`crate::summary_service`] have no error
/// channel at all: they always return a value, degrading gracefully on data
/// they did not validate themselves.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Bad user input, surfaced as an inline field error by callers.
    #[error("Validation failed: {0}")]
    Validation(String),
    /// Collaborator/network failure. Retryable by re-invoking the operation.
    #[error("Store operation failed: {0}")]
    Store(String),
    /// A referenced record is gone. Terminal for the calling screen.
    #[error("Not found in {collection}: {id}")]
    NotFound { collection: String, id: String },
    /// The identity collaborator has no active session.
    #[error("Not authenticated")]
    Unauthenticated,
    /// A `YYYY-MM` month key could not be interpreted.
    #[error("Invalid month key: {0}")]
    InvalidMonth(String),
}

impl From<MonthKeyError> for CoreError {
    fn from(err: MonthKeyError) -> Self {
        CoreError::InvalidMonth(err.to_string())
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::Store(format!("document encoding failed: {err}"))
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
