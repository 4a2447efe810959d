use thiserror::Error;

/// Failure of a single feed operation.
///
/// Components keep the last failure as an opaque value; callers only need
/// to know whether one is present and how to print it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeedError {
    /// The request never produced a response (unreachable host, reset, ...).
    #[error("transport error: {0}")]
    Transport(String),

    /// The service answered with a non-2xx status.
    #[error("{method} {path} failed with status {status}")]
    Response {
        method: String,
        path: String,
        status: u16,
    },

    /// A JSON body could not be encoded or decoded.
    #[error("invalid body: {0}")]
    Body(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl FeedError {
    pub fn transport(err: impl std::fmt::Display) -> Self {
        FeedError::Transport(err.to_string())
    }

    pub fn body(err: impl std::fmt::Display) -> Self {
        FeedError::Body(err.to_string())
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            FeedError::Response { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, FeedError>;
