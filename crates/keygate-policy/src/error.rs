//! Error types for policy evaluation.

use keygate_core::{Address, CoreError};
use thiserror::Error;

/// Errors that can occur while evaluating conditions and policies.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// The proof was signed by someone other than the candidate under test.
    #[error("identity mismatch: proof signed by {signer}, candidate is {candidate}")]
    IdentityMismatch { candidate: Address, signer: Address },

    /// A determining condition could not be evaluated. Retryable.
    #[error("evaluation unavailable: {0}")]
    EvaluationUnavailable(String),

    /// The policy violates its structural invariants.
    #[error("malformed policy: {0}")]
    MalformedPolicy(String),

    /// Core error.
    #[error("core error: {0}")]
    Core(CoreError),
}

impl PolicyError {
    /// Whether retrying the same evaluation later may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, PolicyError::EvaluationUnavailable(_))
    }
}

impl From<CoreError> for PolicyError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::MalformedPolicy(msg) => PolicyError::MalformedPolicy(msg),
            other => PolicyError::Core(other),
        }
    }
}

/// Result type for policy operations.
pub type Result<T> = std::result::Result<T, PolicyError>;
