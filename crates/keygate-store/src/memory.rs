//! In-memory implementation of the RecordStore trait.
//!
//! This is primarily for testing. It has the same semantics as SQLite
//! but keeps everything in memory with no persistence.

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use keygate_core::{RecordId, SealedArtifact};

use crate::error::Result;
use crate::traits::{InsertResult, RecordStore};

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock.
#[derive(Default)]
pub struct MemoryStore {
    artifacts: RwLock<BTreeMap<RecordId, SealedArtifact>>,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored artifacts.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn read(&self) -> RwLockReadGuard<'_, BTreeMap<RecordId, SealedArtifact>> {
        self.artifacts.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, BTreeMap<RecordId, SealedArtifact>> {
        self.artifacts.write().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn put(&self, artifact: &SealedArtifact) -> Result<InsertResult> {
        let id = artifact.id();
        let mut artifacts = self.write();

        if let Some(existing) = artifacts.get(&id) {
            return Ok(if existing == artifact {
                InsertResult::AlreadyExists
            } else {
                InsertResult::Conflict { existing: id }
            });
        }

        artifacts.insert(id, artifact.clone());
        Ok(InsertResult::Inserted)
    }

    async fn get(&self, id: &RecordId) -> Result<Option<SealedArtifact>> {
        Ok(self.read().get(id).cloned())
    }

    async fn has(&self, id: &RecordId) -> Result<bool> {
        Ok(self.read().contains_key(id))
    }

    async fn list(&self) -> Result<Vec<RecordId>> {
        Ok(self.read().keys().copied().collect())
    }

    async fn remove(&self, id: &RecordId) -> Result<bool> {
        Ok(self.write().remove(id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::RecordStoreExt;
    use crate::StoreError;
    use keygate_core::{
        encrypt_fresh, Address, Condition, Policy, WrappedKey, WrappedKeyRecord,
    };

    fn make_artifact(byte: u8, payload: &[u8]) -> SealedArtifact {
        let (ciphertext, _key) = encrypt_fresh(payload).unwrap();
        let wrapped = WrappedKey::Master {
            key_id: [byte; 32],
            nonce: [byte; 12],
            ciphertext: vec![byte; 48],
        };
        let policy = Policy::single(Condition::caller_is(Address::from_bytes([byte; 32]))).unwrap();
        SealedArtifact {
            ciphertext,
            record: WrappedKeyRecord::new(wrapped, policy).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_put_and_get() {
        let store = MemoryStore::new();
        let artifact = make_artifact(1, b"payload");

        assert_eq!(store.put(&artifact).await.unwrap(), InsertResult::Inserted);
        assert!(store.has(&artifact.id()).await.unwrap());
        assert_eq!(store.get(&artifact.id()).await.unwrap(), Some(artifact));
    }

    #[tokio::test]
    async fn test_idempotent_put() {
        let store = MemoryStore::new();
        let artifact = make_artifact(1, b"payload");

        store.put(&artifact).await.unwrap();
        assert_eq!(store.put(&artifact).await.unwrap(), InsertResult::AlreadyExists);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_same_record_other_payload_conflicts() {
        let store = MemoryStore::new();
        let a = make_artifact(1, b"first");
        let mut b = a.clone();
        b.ciphertext = make_artifact(1, b"second").ciphertext;

        store.put(&a).await.unwrap();
        assert_eq!(
            store.put(&b).await.unwrap(),
            InsertResult::Conflict { existing: a.id() }
        );
        assert_eq!(store.get(&a.id()).await.unwrap(), Some(a));
    }

    #[tokio::test]
    async fn test_list_and_remove() {
        let store = MemoryStore::new();
        let a = make_artifact(1, b"a");
        let b = make_artifact(2, b"b");
        store.put(&a).await.unwrap();
        store.put(&b).await.unwrap();

        let mut expected = vec![a.id(), b.id()];
        expected.sort();
        assert_eq!(store.list().await.unwrap(), expected);

        assert!(store.remove(&a.id()).await.unwrap());
        assert!(!store.remove(&a.id()).await.unwrap());
        assert_eq!(store.list().await.unwrap(), vec![b.id()]);
    }

    #[tokio::test]
    async fn test_require_missing() {
        let store = MemoryStore::new();
        let result = store.require(&RecordId::from_bytes([7; 32])).await;
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }
}
