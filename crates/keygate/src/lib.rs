//! # Keygate
//!
//! Condition-gated key escrow. A payload is encrypted once under a fresh
//! symmetric key; that key is wrapped and stored alongside a declarative
//! access policy; anyone may later ask for it back by presenting a signed
//! assertion, and gets it only if the policy holds for them right now.
//!
//! ## Overview
//!
//! - **Policies**: flat, strictly left-folded sequences of conditions and
//!   AND/OR operators. Conditions compare the caller's address or the
//!   result of a read-only contract call.
//! - **Escrow**: content keys are wrapped with the policy digest bound in,
//!   so a swapped policy cannot unlock anything.
//! - **Vault**: orchestrates encryption, escrow and persistence.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use keygate::{Vault, VaultConfig};
//! use keygate::core::Keypair;
//! use keygate::escrow::MasterKeyWrapper;
//! use keygate::policy::memory::MemoryChain;
//! use keygate::store::SqliteStore;
//!
//! async fn example() -> keygate::Result<()> {
//!     let vault = Vault::new(
//!         SqliteStore::open("keygate.db")?,
//!         MasterKeyWrapper::generate()?,
//!         MemoryChain::new(),
//!         VaultConfig::default(),
//!     );
//!
//!     let owner = Keypair::generate();
//!     let policy = vault.subscription_policy(owner.address(), "100")?;
//!     let artifact = vault
//!         .seal(b"this is a super secret message", policy, &owner, owner.address())
//!         .await?;
//!
//!     let plaintext = vault.open(&artifact.id(), &owner, owner.address()).await?;
//!     assert_eq!(plaintext.as_slice(), b"this is a super secret message");
//!     Ok(())
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `keygate::core` - Addresses, policies, assertions, cipher
//! - `keygate::policy` - Condition and policy evaluation
//! - `keygate::escrow` - Key wrapping and the escrow service
//! - `keygate::store` - Artifact persistence

pub mod config;
pub mod error;
pub mod policies;
pub mod vault;

// Re-export component crates
pub use keygate_core as core;
pub use keygate_escrow as escrow;
pub use keygate_policy as policy;
pub use keygate_store as store;

pub use config::VaultConfig;
pub use error::{Result, VaultError};
pub use policies::{subscriber_condition, subscription_policy, SUBSCRIPTION_METHOD};
pub use vault::Vault;

pub use keygate_core::{
    Address, AuthAssertion, Keypair, Policy, PolicyBuilder, RecordId, SealedArtifact,
};
