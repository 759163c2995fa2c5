//! The Vault: end-to-end sealing and opening of payloads.
//!
//! ```text
//! seal:  plaintext -> encrypt -> escrow key under policy -> persist artifact
//! open:  load artifact -> assert identity -> retrieve key -> decrypt
//! ```
//!
//! Each call is sequential and independent. Artifacts are passed and stored
//! explicitly; nothing is remembered between calls except what the
//! [`RecordStore`] holds.

use keygate_core::{
    encrypt_fresh, Address, AuthAssertion, Policy, RecordId, SealedArtifact, Signer,
};
use keygate_escrow::{KeyEscrowService, KeyWrapper};
use keygate_policy::ChainQuery;
use keygate_store::{InsertResult, RecordStore};
use tracing::{debug, info};
use zeroize::Zeroizing;

use crate::config::VaultConfig;
use crate::error::{Result, VaultError};
use crate::policies;

/// Seals payloads under access policies and opens them for authorized callers.
pub struct Vault<S, W, Q> {
    store: S,
    escrow: KeyEscrowService<W, Q>,
    config: VaultConfig,
}

impl<S: RecordStore, W: KeyWrapper, Q: ChainQuery> Vault<S, W, Q> {
    /// Create a vault over a store, a wrapping mechanism and a chain backend.
    pub fn new(store: S, wrapper: W, chain: Q, config: VaultConfig) -> Self {
        let escrow = KeyEscrowService::new(wrapper, chain, config.evaluator.clone());
        Self {
            store,
            escrow,
            config,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn escrow(&self) -> &KeyEscrowService<W, Q> {
        &self.escrow
    }

    pub fn config(&self) -> &VaultConfig {
        &self.config
    }

    /// The configured subscription policy for `owner` and `plan_id`.
    pub fn subscription_policy(&self, owner: Address, plan_id: &str) -> Result<Policy> {
        Ok(policies::subscription_policy(
            self.config.chain.clone(),
            self.config.subscription_contract,
            owner,
            plan_id,
        )?)
    }

    /// Encrypt `plaintext`, escrow its key under `policy` and persist the result.
    ///
    /// `signer` must be able to sign as `owner`.
    pub async fn seal(
        &self,
        plaintext: &[u8],
        policy: Policy,
        signer: &dyn Signer,
        owner: Address,
    ) -> Result<SealedArtifact> {
        let owner_proof = AuthAssertion::build(owner, signer)?;
        let (ciphertext, key) = encrypt_fresh(plaintext)?;
        let record = self.escrow.store(&key, policy, &owner_proof)?;
        drop(key);

        let artifact = SealedArtifact { ciphertext, record };
        match self.store.put(&artifact).await? {
            InsertResult::Inserted | InsertResult::AlreadyExists => {}
            InsertResult::Conflict { existing } => return Err(VaultError::Conflict(existing)),
        }

        info!(record = %artifact.id(), %owner, bytes = plaintext.len(), "payload sealed");
        Ok(artifact)
    }

    /// Load the artifact stored under `id` and open it as `identity`.
    pub async fn open(
        &self,
        id: &RecordId,
        signer: &dyn Signer,
        identity: Address,
    ) -> Result<Zeroizing<Vec<u8>>> {
        let artifact = self
            .store
            .get(id)
            .await?
            .ok_or_else(|| VaultError::RecordNotFound(id.to_hex()))?;
        self.open_artifact(&artifact, signer, identity).await
    }

    /// Open an artifact held by the caller, as `identity`.
    pub async fn open_artifact(
        &self,
        artifact: &SealedArtifact,
        signer: &dyn Signer,
        identity: Address,
    ) -> Result<Zeroizing<Vec<u8>>> {
        let proof = AuthAssertion::build(identity, signer)?;
        let key = self.escrow.retrieve(&artifact.record, &proof).await?;
        let plaintext = Zeroizing::new(artifact.ciphertext.decrypt(&key)?);

        debug!(record = %artifact.id(), %identity, "payload opened");
        Ok(plaintext)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keygate_core::{Condition, Keypair};
    use keygate_escrow::MasterKeyWrapper;
    use keygate_policy::memory::MemoryChain;
    use keygate_store::MemoryStore;
    use std::sync::Arc;

    type TestVault = Vault<MemoryStore, MasterKeyWrapper, Arc<MemoryChain>>;

    fn vault() -> TestVault {
        Vault::new(
            MemoryStore::new(),
            MasterKeyWrapper::generate().unwrap(),
            MemoryChain::new(),
            VaultConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_seal_persists_and_opens() {
        let vault = vault();
        let owner = Keypair::generate();
        let policy = Policy::single(Condition::caller_is(owner.address())).unwrap();

        let artifact = vault
            .seal(b"hello", policy, &owner, owner.address())
            .await
            .unwrap();
        assert!(vault.store().has(&artifact.id()).await.unwrap());

        let plaintext = vault
            .open(&artifact.id(), &owner, owner.address())
            .await
            .unwrap();
        assert_eq!(plaintext.as_slice(), b"hello");
    }

    #[tokio::test]
    async fn test_open_unknown_record() {
        let vault = vault();
        let owner = Keypair::generate();

        let result = vault
            .open(&RecordId::from_bytes([1; 32]), &owner, owner.address())
            .await;
        assert!(matches!(result, Err(VaultError::RecordNotFound(_))));
    }

    #[tokio::test]
    async fn test_signer_must_hold_identity() {
        let vault = vault();
        let owner = Keypair::generate();
        let other = Keypair::generate();
        let policy = Policy::single(Condition::caller_is(owner.address())).unwrap();

        let result = vault.seal(b"x", policy, &other, owner.address()).await;
        assert!(matches!(result, Err(VaultError::Core(_))));
    }

    #[tokio::test]
    async fn test_denied_open() {
        let vault = vault();
        let owner = Keypair::generate();
        let other = Keypair::generate();
        let policy = Policy::single(Condition::caller_is(owner.address())).unwrap();

        let artifact = vault
            .seal(b"secret", policy, &owner, owner.address())
            .await
            .unwrap();
        let err = vault
            .open(&artifact.id(), &other, other.address())
            .await
            .unwrap_err();
        assert!(err.is_denied());
        assert!(!err.is_transient());
    }
}
