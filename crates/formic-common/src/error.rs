use thiserror::Error;

/// Errors crossing the browser-control boundary.
///
/// Connection-level failures (`Connect`) are a fatal precondition for the
/// whole run; everything else is attributable to a single job attempt.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("backend not attached")]
    NotReady,

    #[error("failed to connect to browser: {0}")]
    Connect(String),

    #[error("navigation failed: {0}")]
    Navigation(String),

    #[error("operation timed out: {0}")]
    Timeout(String),

    #[error("probe error: {0}")]
    Probe(String),

    #[error("screenshot failed: {0}")]
    Screenshot(String),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("operation not supported: {0}")]
    NotSupported(String),

    #[error("{0}")]
    Other(String),
}

impl BackendError {
    /// True for failures worth one retry before giving up on the job.
    pub fn is_transient(&self) -> bool {
        matches!(self, BackendError::Timeout(_) | BackendError::Navigation(_))
    }
}
