use std::fmt;

use thiserror::Error;

/// Every failure the client can report, either synchronously (validation,
/// closed client) or through a completion handle.
#[derive(Error, Debug)]
pub enum RedshiftDataError {
    /// Malformed connection or auth configuration.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Malformed statement, parameters or batch.
    #[error("validation error: {0}")]
    Validation(String),

    /// The Data API rejected the call with a service error.
    #[error("{operation} rejected [{code}]: {message}")]
    Rejected {
        operation: String,
        code: String,
        message: String,
    },

    /// The statement reached the FAILED state.
    #[error("statement {statement_id} failed: {reason}")]
    StatementFailed { statement_id: String, reason: String },

    /// The statement reached the ABORTED state.
    #[error("statement {statement_id} was aborted")]
    Aborted { statement_id: String },

    /// No terminal state was observed before the poll deadline.
    #[error("statement {statement_id} timed out after {elapsed_ms}ms")]
    Timeout { statement_id: String, elapsed_ms: u64 },

    /// The task was interrupted by client shutdown.
    #[error("cancelled: {0}")]
    Cancelled(String),

    /// The client has been closed.
    #[error("client is closed")]
    Closed,

    /// Opaque downstream failure (transport, dispatch, unexpected response).
    #[error("provider error: {0}")]
    Provider(String),
}

/// Coarse error classification, stable across variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Configuration,
    Validation,
    Execution,
    Timeout,
    Aborted,
    Cancelled,
    Closed,
    Provider,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Configuration => write!(f, "ConfigurationError"),
            ErrorKind::Validation => write!(f, "ValidationError"),
            ErrorKind::Execution => write!(f, "ExecutionError"),
            ErrorKind::Timeout => write!(f, "TimeoutError"),
            ErrorKind::Aborted => write!(f, "AbortedError"),
            ErrorKind::Cancelled => write!(f, "CancelledError"),
            ErrorKind::Closed => write!(f, "ClosedError"),
            ErrorKind::Provider => write!(f, "ProviderError"),
        }
    }
}

impl RedshiftDataError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RedshiftDataError::Configuration(_) => ErrorKind::Configuration,
            RedshiftDataError::Validation(_) => ErrorKind::Validation,
            RedshiftDataError::Rejected { .. } | RedshiftDataError::StatementFailed { .. } => {
                ErrorKind::Execution
            }
            RedshiftDataError::Aborted { .. } => ErrorKind::Aborted,
            RedshiftDataError::Timeout { .. } => ErrorKind::Timeout,
            RedshiftDataError::Cancelled(_) => ErrorKind::Cancelled,
            RedshiftDataError::Closed => ErrorKind::Closed,
            RedshiftDataError::Provider(_) => ErrorKind::Provider,
        }
    }
}

pub type Result<T> = std::result::Result<T, RedshiftDataError>;
