//! The key escrow service.
//!
//! `store` wraps a content key under a policy; `retrieve` releases it to a
//! candidate whose signed assertion satisfies that policy right now.
//!
//! ## Outcomes of `retrieve`
//!
//! | policy verdict | result                                   |
//! |----------------|------------------------------------------|
//! | satisfied      | unwrapped key                            |
//! | unsatisfied    | [`EscrowError::AuthorizationDenied`]     |
//! | unavailable    | [`EscrowError::PolicyEvaluationFailed`]  |
//!
//! A denial carries no detail about which condition failed.

use keygate_core::{
    AuthAssertion, Ed25519Verifier, Policy, SignatureVerifier, SymmetricKey, WrappedKeyRecord,
};
use keygate_policy::{ChainQuery, EvaluatorConfig, PolicyEvaluator, Verdict};
use tracing::{debug, info, warn};

use crate::error::{EscrowError, Result};
use crate::wrap::KeyWrapper;

/// Wraps keys under policies and releases them to authorized candidates.
///
/// Records are immutable and `retrieve` takes `&self`, so a shared service
/// serves any number of concurrent retrievals.
pub struct KeyEscrowService<W, Q, V = Ed25519Verifier> {
    wrapper: W,
    evaluator: PolicyEvaluator<Q>,
    verifier: V,
}

impl<W: KeyWrapper, Q: ChainQuery> KeyEscrowService<W, Q> {
    /// Create a service that verifies Ed25519 assertions.
    pub fn new(wrapper: W, chain: Q, config: EvaluatorConfig) -> Self {
        Self::with_verifier(wrapper, chain, config, Ed25519Verifier)
    }
}

impl<W: KeyWrapper, Q: ChainQuery, V: SignatureVerifier> KeyEscrowService<W, Q, V> {
    /// Create a service with a custom signature verifier.
    pub fn with_verifier(wrapper: W, chain: Q, config: EvaluatorConfig, verifier: V) -> Self {
        Self {
            wrapper,
            evaluator: PolicyEvaluator::new(chain, config),
            verifier,
        }
    }

    pub fn wrapper(&self) -> &W {
        &self.wrapper
    }

    pub fn evaluator(&self) -> &PolicyEvaluator<Q> {
        &self.evaluator
    }

    /// Escrow `key` under `policy`.
    ///
    /// The owner must present a valid assertion, but is not implicitly
    /// granted access: only the policy decides who may retrieve. Each call
    /// produces an independent record.
    pub fn store(
        &self,
        key: &SymmetricKey,
        policy: Policy,
        owner_proof: &AuthAssertion,
    ) -> Result<WrappedKeyRecord> {
        self.verify_assertion(owner_proof)?;

        let digest = policy.digest()?;
        let wrapped = self.wrapper.wrap(key, &digest)?;
        let record = WrappedKeyRecord::new(wrapped, policy)?;

        info!(
            record = %record.id,
            owner = %owner_proof.signer,
            conditions = record.policy.len(),
            "key escrowed"
        );
        Ok(record)
    }

    /// Release the key in `record` if the assertion's signer satisfies its policy.
    pub async fn retrieve(
        &self,
        record: &WrappedKeyRecord,
        candidate_proof: &AuthAssertion,
    ) -> Result<SymmetricKey> {
        self.verify_assertion(candidate_proof)?;

        let digest = record.policy.digest()?;
        if WrappedKeyRecord::compute_id(&record.wrapped_key, &digest)? != record.id {
            return Err(EscrowError::Integrity(
                "record id does not match its contents".into(),
            ));
        }

        let candidate = candidate_proof.signer;
        let verdict = self
            .evaluator
            .verdict(&record.policy, &candidate, candidate_proof)
            .await?;

        match verdict {
            Verdict::Satisfied => {
                let key = self.wrapper.unwrap(&record.wrapped_key, &digest)?;
                debug!(record = %record.id, %candidate, "key released");
                Ok(key)
            }
            Verdict::Unsatisfied => {
                info!(record = %record.id, %candidate, "retrieval denied");
                Err(EscrowError::AuthorizationDenied)
            }
            Verdict::Unavailable(cause) => {
                warn!(record = %record.id, %candidate, "policy could not be evaluated");
                Err(EscrowError::PolicyEvaluationFailed(cause))
            }
        }
    }

    fn verify_assertion(&self, proof: &AuthAssertion) -> Result<()> {
        proof
            .verify(&self.verifier)
            .map_err(|_| EscrowError::InvalidAssertion(proof.signer.to_string()))
    }
}
