//! Property tests across the cipher, evaluator and escrow service.

use std::sync::Arc;

use keygate_core::{AuthAssertion, Ciphertext, CoreError, Keypair};
use keygate_escrow::{EscrowError, KeyEscrowService, MasterKeyWrapper};
use keygate_policy::memory::MemoryChain;
use keygate_policy::{EvaluatorConfig, PolicyError, PolicyEvaluator};
use keygate_testkit::generators::{
    keypair, plaintext, policy_from_params, symmetric_key, PolicyParams,
};
use proptest::prelude::*;

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

fn assertion(keypair: &Keypair) -> AuthAssertion {
    AuthAssertion::build(keypair.address(), keypair).unwrap()
}

proptest! {
    #[test]
    fn test_encrypt_decrypt_roundtrip(key in symmetric_key(), data in plaintext(512)) {
        let ciphertext = Ciphertext::encrypt(&data, &key).unwrap();
        prop_assert_eq!(ciphertext.decrypt(&key).unwrap(), data);
    }

    #[test]
    fn test_wrong_key_is_integrity_error(
        k1 in symmetric_key(),
        k2 in symmetric_key(),
        data in plaintext(256),
    ) {
        prop_assume!(k1.as_bytes() != k2.as_bytes());

        let ciphertext = Ciphertext::encrypt(&data, &k1).unwrap();
        prop_assert!(matches!(ciphertext.decrypt(&k2), Err(CoreError::Integrity)));
    }

    #[test]
    fn test_flat_fold_matches_reference(params in any::<PolicyParams>(), candidate in keypair()) {
        let policy = policy_from_params(&params, candidate.address());
        let chain = MemoryChain::new();
        let evaluator = PolicyEvaluator::new(Arc::clone(&chain), EvaluatorConfig::default());
        let proof = assertion(&candidate);

        let result = runtime().block_on(evaluator.evaluate(&policy, &candidate.address(), &proof));

        match params.expected() {
            Some(expected) => prop_assert_eq!(result.unwrap(), expected),
            None => prop_assert!(matches!(result, Err(PolicyError::EvaluationUnavailable(_)))),
        }
        if !params.has_unavailable() {
            prop_assert_eq!(chain.call_count(), 0);
        }
    }

    #[test]
    fn test_tree_form_matches_flat(params in any::<PolicyParams>(), candidate in keypair()) {
        let policy = policy_from_params(&params, candidate.address());
        let evaluator = PolicyEvaluator::new(MemoryChain::new(), EvaluatorConfig::default());
        let proof = assertion(&candidate);
        let rt = runtime();

        let flat = rt.block_on(evaluator.evaluate(&policy, &candidate.address(), &proof));
        let tree = rt.block_on(evaluator.evaluate_tree(
            &policy.to_tree(),
            &candidate.address(),
            &proof,
        ));

        prop_assert_eq!(flat.ok(), tree.ok());
    }

    #[test]
    fn test_retrieve_follows_policy(
        params in any::<PolicyParams>(),
        candidate in keypair(),
        key in symmetric_key(),
    ) {
        let owner = Keypair::from_seed(&[0x0f; 32]);
        let policy = policy_from_params(&params, candidate.address());
        let service = KeyEscrowService::new(
            MasterKeyWrapper::from_bytes([7; 32]),
            MemoryChain::new(),
            EvaluatorConfig::default(),
        );

        let record = service.store(&key, policy, &assertion(&owner)).unwrap();
        let result = runtime().block_on(service.retrieve(&record, &assertion(&candidate)));

        match params.expected() {
            Some(true) => {
                let released = result.unwrap();
                prop_assert_eq!(released.as_bytes(), key.as_bytes());
            }
            Some(false) => prop_assert!(matches!(result, Err(EscrowError::AuthorizationDenied))),
            None => prop_assert!(matches!(result, Err(EscrowError::PolicyEvaluationFailed(_)))),
        }
    }
}
