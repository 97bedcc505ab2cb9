//! Error types for sift-feeds.

/// A transport-level failure talking to the remote collection.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("invalid request uri `{uri}`: {message}")]
    InvalidUri { uri: String, message: String },

    #[error("request failed: {0}")]
    Transport(String),

    #[error("remote returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("request timed out after {0} ms")]
    Timeout(u64),
}

/// A page fetch that could not be attempted or did not reach the remote.
///
/// Malformed payloads are not errors; they come back as a failed page.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("page limit must be at least 1")]
    InvalidLimit,

    #[error(transparent)]
    Source(#[from] SourceError),
}
