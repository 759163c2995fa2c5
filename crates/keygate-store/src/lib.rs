//! # Keygate Store
//!
//! Persistence for [`SealedArtifact`]s: a ciphertext together with the
//! wrapped key record that gates it.
//!
//! ## Key Types
//!
//! - [`RecordStore`] - The async trait for all storage operations
//! - [`SqliteStore`] - SQLite-based persistent storage
//! - [`MemoryStore`] - In-memory storage for tests
//! - [`InsertResult`] - Result of storing an artifact
//!
//! ## Usage
//!
//! ```rust,no_run
//! use keygate_store::{RecordStore, RecordStoreExt, SqliteStore};
//! # use keygate_core::SealedArtifact;
//!
//! async fn example(artifact: SealedArtifact) -> keygate_store::Result<()> {
//!     let store = SqliteStore::open("keygate.db")?;
//!     store.put(&artifact).await?;
//!
//!     let loaded = store.require(&artifact.id()).await?;
//!     assert_eq!(loaded, artifact);
//!     Ok(())
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Content addressed**: artifacts are keyed by their `RecordId`
//! - **Idempotent inserts**: storing the same artifact twice returns `AlreadyExists`
//! - **Canonical encoding**: artifacts are stored as CBOR
//!
//! [`SealedArtifact`]: keygate_core::SealedArtifact

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{InsertResult, RecordStore, RecordStoreExt};
