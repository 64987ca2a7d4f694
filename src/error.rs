use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by the traversal and path-search engine.
///
/// Single store misses never appear here: they are logged at the call site
/// and treated as "no data". Only parameter errors, the enumerator's budget
/// expiry, contract violations in stored blobs, and cancellation propagate.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// The all-simple-paths enumerator exhausted its wall-clock budget.
    /// Partial results are discarded.
    #[error("path enumeration timed out after {0:?}")]
    Timeout(Duration),

    /// A stored block blob violated the eight-field line contract.
    #[error("malformed block blob: {0}")]
    MalformedBlock(String),

    #[error("traversal cancelled")]
    Cancelled,
}
