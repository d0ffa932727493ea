use thiserror::Error;

/// Failure of a single remote operation. Every backend failure surfaces as
/// a value at the operation boundary; nothing propagates as a panic.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("backend returned HTTP {status}: {message}")]
    Http { status: u16, message: String },
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("failed to decode backend response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("{0}")]
    Other(String),
}

impl RemoteError {
    /// HTTP status of the failure, when the backend answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            RemoteError::Http { status, .. } => Some(*status),
            RemoteError::Transport(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
