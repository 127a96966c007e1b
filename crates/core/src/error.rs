use storage::StoreError;
use thiserror::Error;

/// Errors that cross the extraction engine boundary.
///
/// Rule misses and model failures are not errors: the first triggers escalation, the second
/// is absorbed by the model extractor into an all-absent result.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// Empty label or schema; rejected before the knowledge base is touched.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("rule store unavailable: {0}")]
    Store(#[from] StoreError),
}
