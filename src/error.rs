use thiserror::Error;

/// Failures surfaced by pool, node and cluster operations.
///
/// Validation failures (`NodeNotInPool`, `NodeAlreadyExists` and the local
/// `ValidationError` cases) are raised before any write reaches the traffic
/// manager. A `ValidationError` carrying a server message is only known after
/// the round trip.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StingrayError {
    #[error("Authorization failure: {0}")]
    AuthorizationFailure(String),

    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    #[error("{node} is not in pool {pool}")]
    NodeNotInPool { node: String, pool: String },

    #[error("{node} already exists in {pool}")]
    NodeAlreadyExists { node: String, pool: String },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("JSON parse error: {0}")]
    Parse(String),
}

pub type Result<T> = std::result::Result<T, StingrayError>;
