//! Error taxonomy for the backend boundary
//!
//! Every non-success response is normalized into one of these variants
//! before it reaches orchestration code; nothing above this layer looks
//! at raw status codes or response bodies.

/// Normalized backend failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// Credential missing, expired, or revoked (HTTP 401)
    #[error("authentication required")]
    Unauthorized,

    /// The request was understood and rejected; carries the backend's
    /// detail message when one was parseable
    #[error("{0}")]
    BadRequest(String),

    /// The backend failed internally (HTTP 5xx)
    #[error("server error")]
    ServerError,

    /// The request never completed (DNS, connect, timeout, transport)
    #[error("network error: {0}")]
    Network(String),
}

impl ApiError {
    /// Whether the caller should treat this as a dead credential
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized)
    }
}
