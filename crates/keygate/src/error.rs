//! Error types for the Vault.

use keygate_core::{CoreError, RecordId};
use keygate_escrow::EscrowError;
use keygate_store::StoreError;
use thiserror::Error;

/// Errors that can occur during Vault operations.
#[derive(Debug, Error)]
pub enum VaultError {
    /// Escrow error (authorization, evaluation, wrapping).
    #[error("escrow error: {0}")]
    Escrow(#[from] EscrowError),

    /// Storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// Payload encryption or decryption error.
    #[error("cipher error: {0}")]
    Core(#[from] CoreError),

    /// No artifact stored under this id.
    #[error("record not found: {0}")]
    RecordNotFound(String),

    /// A different artifact is already stored under this record id.
    #[error("conflicting artifact for record {0}")]
    Conflict(RecordId),
}

impl VaultError {
    /// Whether the policy was evaluated and denied access.
    pub fn is_denied(&self) -> bool {
        matches!(self, VaultError::Escrow(EscrowError::AuthorizationDenied))
    }

    /// Whether the same request may succeed if retried.
    pub fn is_transient(&self) -> bool {
        matches!(self, VaultError::Escrow(e) if e.is_transient())
    }
}

/// Result type for Vault operations.
pub type Result<T> = std::result::Result<T, VaultError>;
