/// Error types for answer-service
use std::time::Duration;
use thiserror::Error;

/// Failure of a single generative backend call.
///
/// Never leaves `AnswerSynthesizer`: it is absorbed by the fallback policy.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("Backend timed out after {0:?}")]
    Timeout(Duration),

    #[error("Backend returned HTTP {status}: {body}")]
    NonSuccess { status: u16, body: String },

    #[error("Malformed backend response: {0}")]
    MalformedResponse(String),

    #[error("Backend transport error: {0}")]
    Transport(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendErrorKind {
    Timeout,
    NonSuccess,
    MalformedResponse,
    Transport,
}

impl BackendError {
    pub fn kind(&self) -> BackendErrorKind {
        match self {
            BackendError::Timeout(_) => BackendErrorKind::Timeout,
            BackendError::NonSuccess { .. } => BackendErrorKind::NonSuccess,
            BackendError::MalformedResponse(_) => BackendErrorKind::MalformedResponse,
            BackendError::Transport(_) => BackendErrorKind::Transport,
        }
    }

    /// Map a reqwest failure, keeping timeouts and body decode errors distinct.
    /// The URL is stripped because it can carry an API key.
    pub(crate) fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        let err = err.without_url();
        if err.is_timeout() {
            BackendError::Timeout(timeout)
        } else if err.is_decode() {
            BackendError::MalformedResponse(err.to_string())
        } else {
            BackendError::Transport(err.to_string())
        }
    }
}

/// Caller-visible outcome of `AnswerSynthesizer::ask` when no answer is returned
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AskError {
    /// Both backends failed; no answer is available
    #[error("No answer available")]
    SynthesisFailure,

    #[error("Request cancelled")]
    Cancelled,

    #[error("Prompt is empty")]
    EmptyPrompt,
}

/// Result type alias for backend calls
pub type BackendResult<T> = Result<T, BackendError>;
