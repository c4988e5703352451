use thiserror::Error;

/// Failures surfaced by the backend client, the archive assembly, and the
/// generation flows. Everything user-facing renders through `Display`.
#[derive(Debug, Error)]
pub enum AssistantError {
    /// The backend could not be reached, timed out, or answered with a
    /// non-success status.
    #[error("{0}")]
    Transport(String),

    #[error("received an empty response from the model")]
    EmptyResponse,

    #[error("archive error: {0}")]
    Archive(String),

    /// A generation flow failed after every tier was exhausted, or its
    /// preconditions were not met.
    #[error("{0}")]
    Generation(String),

    /// Local Maven build problems. The runner reports these through
    /// `BuildOutcome` rather than raising, but callers embedding the
    /// pipeline can still surface them as errors.
    #[error("build error: {0}")]
    Build(String),
}

impl From<reqwest::Error> for AssistantError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AssistantError::Transport(format!("request timed out: {}", err))
        } else if err.is_connect() {
            AssistantError::Transport(format!("connection failed: {}", err))
        } else {
            AssistantError::Transport(err.to_string())
        }
    }
}

impl From<zip::result::ZipError> for AssistantError {
    fn from(err: zip::result::ZipError) -> Self {
        AssistantError::Archive(err.to_string())
    }
}

impl From<std::io::Error> for AssistantError {
    fn from(err: std::io::Error) -> Self {
        AssistantError::Archive(err.to_string())
    }
}
