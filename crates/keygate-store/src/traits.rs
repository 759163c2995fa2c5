//! RecordStore trait: the abstract interface for artifact persistence.
//!
//! Sealed artifacts are immutable and content-addressed by their
//! [`RecordId`], so the store never updates in place. Implementations
//! include SQLite (primary) and in-memory (for tests).

use async_trait::async_trait;
use keygate_core::{RecordId, SealedArtifact};

use crate::error::{Result, StoreError};

/// Result of storing an artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertResult {
    /// Artifact was stored.
    Inserted,
    /// The identical artifact is already stored (idempotent - not an error).
    AlreadyExists,
    /// A different artifact is stored under the same record id.
    ///
    /// The record id covers the wrapped key and policy but not the
    /// ciphertext, so this means the same record was paired with another
    /// payload.
    Conflict {
        /// The record id both artifacts share.
        existing: RecordId,
    },
}

/// Async interface for sealed-artifact persistence.
///
/// # Design Notes
///
/// - **Idempotent inserts**: storing the same artifact twice returns `AlreadyExists`.
/// - **No updates**: a new policy means a new record, hence a new id.
/// - **Ordering**: `list` returns ids in ascending byte order.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Store an artifact under its record id.
    async fn put(&self, artifact: &SealedArtifact) -> Result<InsertResult>;

    /// Load an artifact by record id.
    async fn get(&self, id: &RecordId) -> Result<Option<SealedArtifact>>;

    /// Check whether an artifact is stored.
    async fn has(&self, id: &RecordId) -> Result<bool>;

    /// All stored record ids.
    async fn list(&self) -> Result<Vec<RecordId>>;

    /// Delete an artifact. Returns whether anything was removed.
    ///
    /// Removing the artifact does not revoke copies held elsewhere.
    async fn remove(&self, id: &RecordId) -> Result<bool>;
}

/// Convenience methods on top of [`RecordStore`].
pub trait RecordStoreExt: RecordStore {
    /// Load an artifact, failing with `NotFound` if it is absent.
    fn require(
        &self,
        id: &RecordId,
    ) -> impl std::future::Future<Output = Result<SealedArtifact>> + Send;
}

impl<S: RecordStore + ?Sized> RecordStoreExt for S {
    async fn require(&self, id: &RecordId) -> Result<SealedArtifact> {
        self.get(id)
            .await?
            .ok_or_else(|| StoreError::NotFound(id.to_hex()))
    }
}
