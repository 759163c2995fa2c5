//! Error types for the escrow service.

use keygate_core::CoreError;
use keygate_policy::PolicyError;
use thiserror::Error;

/// Errors that can occur during escrow operations.
///
/// Authorization outcomes (`AuthorizationDenied`) and infrastructure
/// outcomes (`PolicyEvaluationFailed`) are separate variants.
#[derive(Debug, Error)]
pub enum EscrowError {
    /// The policy evaluated to false. Final; carries no detail.
    #[error("authorization denied")]
    AuthorizationDenied,

    /// A determining condition could not be evaluated. Retry later.
    #[error("policy evaluation failed: {0}")]
    PolicyEvaluationFailed(String),

    /// The assertion's challenge or signature does not verify.
    #[error("invalid assertion for {0}")]
    InvalidAssertion(String),

    /// The policy violates its structural invariants.
    #[error("malformed policy: {0}")]
    MalformedPolicy(String),

    /// The wrapped key failed authentication (tampered, wrong policy, wrong wrapper).
    #[error("integrity check failed: {0}")]
    Integrity(String),

    /// The randomness source failed while wrapping.
    #[error("entropy source unavailable: {0}")]
    Entropy(String),

    /// Record does not match this service's wrapping mechanism.
    #[error("unsupported wrapped key: {0}")]
    UnsupportedWrapping(String),

    /// Core error.
    #[error("core error: {0}")]
    Core(CoreError),
}

impl EscrowError {
    /// Whether the same request may succeed if retried.
    pub fn is_transient(&self) -> bool {
        matches!(self, EscrowError::PolicyEvaluationFailed(_))
    }
}

impl From<CoreError> for EscrowError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::Integrity => EscrowError::Integrity("authentication tag mismatch".into()),
            CoreError::Entropy(msg) => EscrowError::Entropy(msg),
            CoreError::MalformedPolicy(msg) => EscrowError::MalformedPolicy(msg),
            other => EscrowError::Core(other),
        }
    }
}

impl From<PolicyError> for EscrowError {
    fn from(e: PolicyError) -> Self {
        match e {
            PolicyError::EvaluationUnavailable(cause) => EscrowError::PolicyEvaluationFailed(cause),
            PolicyError::MalformedPolicy(msg) => EscrowError::MalformedPolicy(msg),
            PolicyError::IdentityMismatch { signer, .. } => {
                EscrowError::InvalidAssertion(signer.to_string())
            }
            PolicyError::Core(core) => core.into(),
        }
    }
}

/// Result type for escrow operations.
pub type Result<T> = std::result::Result<T, EscrowError>;
