//! Error type shared by every `VectorStore` implementation.

/// Failures surfaced by the vector service handle.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The request never produced an HTTP response (refused, reset, timed out).
    #[error("transport error: {0}")]
    Transport(String),

    /// The service answered with a non-success status.
    #[error("http status {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body could not be decoded into the expected shape.
    #[error("unexpected response: {0}")]
    Decode(String),

    /// The query surface answered with a GraphQL `errors` array.
    #[error("query error: {0}")]
    Query(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// A collection definition or record was rejected before (or by) the service.
    #[error("invalid: {0}")]
    Invalid(String),

    /// The readiness probe exhausted its retry budget.
    #[error("service unavailable after {attempts} attempts")]
    Unavailable { attempts: u32 },

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl StoreError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid(message.into())
    }

    /// `true` for a 404 answer or an explicit not-found.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::Status { status: 404, .. })
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return Self::Decode(err.to_string());
        }
        match err.status() {
            Some(status) => Self::Status {
                status: status.as_u16(),
                body: err.to_string(),
            },
            None => Self::Transport(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
