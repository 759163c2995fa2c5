//! SQLite implementation of the RecordStore trait.
//!
//! This is the primary storage backend. It uses rusqlite with bundled
//! SQLite; every operation runs on the blocking pool via
//! `tokio::task::spawn_blocking`.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use keygate_core::{RecordId, SealedArtifact, WrappedKey};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use crate::error::{Result, StoreError};
use crate::migration::{self, now_millis};
use crate::traits::{InsertResult, RecordStore};

/// SQLite-based store implementation.
///
/// Thread-safe via an internal Mutex.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = Connection::open(path)?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `f` against the connection on the blocking pool.
    async fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut conn = conn.lock().map_err(|e| {
                StoreError::Database(rusqlite::Error::SqliteFailure(
                    rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_LOCKED),
                    Some(format!("mutex poisoned: {}", e)),
                ))
            })?;
            f(&mut conn)
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }
}

fn wrapping_name(wrapped: &WrappedKey) -> &'static str {
    match wrapped {
        WrappedKey::Master { .. } => "master",
        WrappedKey::Sealed { .. } => "sealed",
    }
}

/// Decode a stored artifact and check that it belongs under `id`.
fn decode_artifact(id: &RecordId, bytes: &[u8]) -> Result<SealedArtifact> {
    let artifact = SealedArtifact::from_bytes(bytes)?;
    if artifact.id() != *id {
        return Err(StoreError::InvalidData(format!(
            "artifact filed under {} decodes as {}",
            id,
            artifact.id()
        )));
    }
    Ok(artifact)
}

fn id_from_blob(bytes: Vec<u8>) -> Result<RecordId> {
    let arr: [u8; 32] = bytes
        .try_into()
        .map_err(|b: Vec<u8>| StoreError::InvalidData(format!("record id of {} bytes", b.len())))?;
    Ok(RecordId::from_bytes(arr))
}

#[async_trait]
impl RecordStore for SqliteStore {
    async fn put(&self, artifact: &SealedArtifact) -> Result<InsertResult> {
        let id = artifact.id();
        let bytes = artifact.to_bytes()?;
        let digest = artifact.record.policy.digest()?;
        let wrapping = wrapping_name(&artifact.record.wrapped_key);

        let result = self
            .with_conn(move |conn| {
                let tx = conn.transaction()?;

                let existing: Option<Vec<u8>> = tx
                    .query_row(
                        "SELECT artifact FROM artifacts WHERE record_id = ?1",
                        params![id.as_bytes().as_slice()],
                        |row| row.get(0),
                    )
                    .optional()?;

                if let Some(existing) = existing {
                    return Ok(if existing == bytes {
                        InsertResult::AlreadyExists
                    } else {
                        InsertResult::Conflict { existing: id }
                    });
                }

                tx.execute(
                    "INSERT INTO artifacts (record_id, policy_digest, wrapping, artifact, stored_at)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![
                        id.as_bytes().as_slice(),
                        digest.as_bytes().as_slice(),
                        wrapping,
                        bytes,
                        now_millis(),
                    ],
                )?;
                tx.commit()?;

                Ok(InsertResult::Inserted)
            })
            .await?;

        debug!(record = %id, ?result, "artifact stored");
        Ok(result)
    }

    async fn get(&self, id: &RecordId) -> Result<Option<SealedArtifact>> {
        let id = *id;
        self.with_conn(move |conn| {
            let bytes: Option<Vec<u8>> = conn
                .query_row(
                    "SELECT artifact FROM artifacts WHERE record_id = ?1",
                    params![id.as_bytes().as_slice()],
                    |row| row.get(0),
                )
                .optional()?;

            bytes.map(|b| decode_artifact(&id, &b)).transpose()
        })
        .await
    }

    async fn has(&self, id: &RecordId) -> Result<bool> {
        let id = *id;
        self.with_conn(move |conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM artifacts WHERE record_id = ?1",
                params![id.as_bytes().as_slice()],
                |row| row.get(0),
            )?;
            Ok(count > 0)
        })
        .await
    }

    async fn list(&self) -> Result<Vec<RecordId>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT record_id FROM artifacts ORDER BY record_id")?;
            let blobs = stmt
                .query_map([], |row| row.get::<_, Vec<u8>>(0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            blobs.into_iter().map(id_from_blob).collect()
        })
        .await
    }

    async fn remove(&self, id: &RecordId) -> Result<bool> {
        let id = *id;
        let removed = self
            .with_conn(move |conn| {
                let rows = conn.execute(
                    "DELETE FROM artifacts WHERE record_id = ?1",
                    params![id.as_bytes().as_slice()],
                )?;
                Ok(rows > 0)
            })
            .await?;

        if removed {
            debug!(record = %id, "artifact removed");
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keygate_core::{encrypt_fresh, Address, Condition, Policy, WrappedKeyRecord};

    fn make_artifact(byte: u8, payload: &[u8]) -> SealedArtifact {
        let (ciphertext, _key) = encrypt_fresh(payload).unwrap();
        let wrapped = WrappedKey::Sealed {
            ephemeral_public: [byte; 32],
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
        let store = SqliteStore::open_memory().unwrap();
        let artifact = make_artifact(1, b"this is a super secret message");

        assert_eq!(store.put(&artifact).await.unwrap(), InsertResult::Inserted);
        let loaded = store.get(&artifact.id()).await.unwrap().unwrap();
        assert_eq!(loaded, artifact);
    }

    #[tokio::test]
    async fn test_idempotent_put() {
        let store = SqliteStore::open_memory().unwrap();
        let artifact = make_artifact(1, b"payload");

        store.put(&artifact).await.unwrap();
        assert_eq!(store.put(&artifact).await.unwrap(), InsertResult::AlreadyExists);
    }

    #[tokio::test]
    async fn test_conflicting_put() {
        let store = SqliteStore::open_memory().unwrap();
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
    async fn test_get_missing() {
        let store = SqliteStore::open_memory().unwrap();
        let id = RecordId::from_bytes([9; 32]);
        assert!(store.get(&id).await.unwrap().is_none());
        assert!(!store.has(&id).await.unwrap());
    }

    #[tokio::test]
    async fn test_list_and_remove() {
        let store = SqliteStore::open_memory().unwrap();
        let a = make_artifact(1, b"a");
        let b = make_artifact(2, b"b");
        store.put(&b).await.unwrap();
        store.put(&a).await.unwrap();

        let mut expected = vec![a.id(), b.id()];
        expected.sort();
        assert_eq!(store.list().await.unwrap(), expected);

        assert!(store.remove(&b.id()).await.unwrap());
        assert!(!store.has(&b.id()).await.unwrap());
        assert_eq!(store.list().await.unwrap(), vec![a.id()]);
    }

    #[tokio::test]
    async fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keygate.db");
        let artifact = make_artifact(3, b"durable");

        {
            let store = SqliteStore::open(&path).unwrap();
            store.put(&artifact).await.unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.get(&artifact.id()).await.unwrap(), Some(artifact));
    }

    #[tokio::test]
    async fn test_misfiled_artifact_is_invalid() {
        let store = SqliteStore::open_memory().unwrap();
        let a = make_artifact(1, b"a");
        let b = make_artifact(2, b"b");
        store.put(&a).await.unwrap();

        // Overwrite a's row with b's bytes behind the store's back.
        let bytes = b.to_bytes().unwrap();
        let id = a.id();
        store
            .with_conn(move |conn| {
                conn.execute(
                    "UPDATE artifacts SET artifact = ?1 WHERE record_id = ?2",
                    params![bytes, id.as_bytes().as_slice()],
                )?;
                Ok(())
            })
            .await
            .unwrap();

        assert!(matches!(
            store.get(&a.id()).await,
            Err(StoreError::InvalidData(_))
        ));
    }
}
