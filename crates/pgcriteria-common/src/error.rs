//! Error types for pgcriteria

use thiserror::Error;

/// Result type alias for pgcriteria operations
pub type Result<T> = std::result::Result<T, CriteriaError>;

/// Unified error type for criterion compilation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CriteriaError {
    /// The fragment sink rejected a write. The builder is unusable afterwards.
    #[error("Write failure: {0}")]
    Write(String),

    /// The query type has no rendering for the scalar kind (e.g. HAS_PREFIX on Int64)
    #[error("Unsupported query type: {0}")]
    UnsupportedQueryType(String),

    /// The array encoder was asked to encode a kind it has no array form for
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// A stored value could not be decoded (timestamps out of range)
    #[error("Value decoding error: {0}")]
    ValueDecoding(String),

    /// The criterion does not carry the values its query type needs
    #[error("Malformed criterion: {0}")]
    MalformedCriterion(String),

    /// The criterion kind does not match the column it was applied to
    #[error("Kind mismatch: {0}")]
    KindMismatch(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A bound value could not be added to the driver arguments
    #[error("Binding error: {0}")]
    Binding(String),
}

impl CriteriaError {
    /// Returns true if the error was caused by the filter input rather than
    /// the environment. Callers usually surface these as a "bad filter" response.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            CriteriaError::UnsupportedQueryType(_)
                | CriteriaError::UnsupportedOperation(_)
                | CriteriaError::ValueDecoding(_)
                | CriteriaError::MalformedCriterion(_)
                | CriteriaError::KindMismatch(_)
        )
    }
}

impl From<std::fmt::Error> for CriteriaError {
    fn from(err: std::fmt::Error) -> Self {
        CriteriaError::Write(err.to_string())
    }
}

impl From<serde_json::Error> for CriteriaError {
    fn from(err: serde_json::Error) -> Self {
        CriteriaError::Serialization(err.to_string())
    }
}
