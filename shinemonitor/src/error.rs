use thiserror::Error;

/// Failures of a single exchange with the ShineMonitor endpoint.
#[derive(Debug, Error)]
pub enum ShineError {
    /// The vendor did not hand out a session token and secret.
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// The response was not JSON, or lacked the field we asked for.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

pub type ShineResult<T> = Result<T, ShineError>;
