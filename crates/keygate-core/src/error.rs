//! Error types for Keygate Core.

use thiserror::Error;

use crate::assertion::SigningMethod;

/// Core errors: cryptography, identity encoding, and policy structure.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The OS randomness source could not produce bytes.
    #[error("entropy source unavailable: {0}")]
    Entropy(String),

    /// Authentication tag mismatch: tampered ciphertext or wrong key.
    #[error("integrity check failed")]
    Integrity,

    /// The policy violates its structural invariants.
    #[error("malformed policy: {0}")]
    MalformedPolicy(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid signature")]
    InvalidSignature,

    /// The assertion was signed with a scheme the verifier does not check.
    #[error("unsupported signing method: {0:?}")]
    UnsupportedSigningMethod(SigningMethod),

    /// The signer does not hold a key for the requested identity.
    #[error("signer cannot sign for {0}")]
    UnknownIdentity(String),

    #[error("encoding error: {0}")]
    Encoding(String),

    #[error("decoding error: {0}")]
    Decoding(String),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
