//! Authentication assertions.
//!
//! An assertion is a signature over a fixed, protocol-wide challenge string,
//! tagged with the address that claims to have produced it. Holders treat it
//! as untrusted until [`AuthAssertion::verify`] succeeds.
//!
//! The challenge carries no nonce and no expiry, so an assertion can be
//! replayed by anyone who observes it. Freshness is an open problem of the
//! protocol, not something this module attempts to solve.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::crypto::{SignatureVerifier, Signer};
use crate::error::{CoreError, Result};
use crate::types::Address;

/// The challenge every assertion signs.
pub const AUTH_CHALLENGE: &str = "Keygate access assertion v0";

/// How the signature was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SigningMethod {
    /// Ed25519 over the UTF-8 challenge bytes.
    Ed25519,
}

/// A signed statement binding an address to [`AUTH_CHALLENGE`].
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthAssertion {
    pub signer: Address,
    pub challenge: String,
    pub signature: Vec<u8>,
    pub method: SigningMethod,
}

impl AuthAssertion {
    /// Sign the protocol challenge as `identity`.
    pub fn build(identity: Address, signer: &dyn Signer) -> Result<Self> {
        let signature = signer.sign(AUTH_CHALLENGE, &identity)?;
        Ok(Self {
            signer: identity,
            challenge: AUTH_CHALLENGE.to_string(),
            signature,
            method: signer.method(),
        })
    }

    /// Check the method, the challenge and the signature for the claimed
    /// signer.
    pub fn verify(&self, verifier: &dyn SignatureVerifier) -> Result<()> {
        if self.method != verifier.method() {
            return Err(CoreError::UnsupportedSigningMethod(self.method));
        }
        if self.challenge != AUTH_CHALLENGE {
            return Err(CoreError::InvalidSignature);
        }
        if !verifier.verify(&self.challenge, &self.signature, &self.signer) {
            return Err(CoreError::InvalidSignature);
        }
        Ok(())
    }

    /// Whether this assertion claims to speak for `candidate`.
    pub fn speaks_for(&self, candidate: &Address) -> bool {
        self.signer == *candidate
    }
}

impl fmt::Debug for AuthAssertion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthAssertion")
            .field("signer", &self.signer)
            .field("method", &self.method)
            .field("signature_len", &self.signature.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{Ed25519Verifier, Keypair};

    #[test]
    fn test_build_and_verify() {
        let keypair = Keypair::generate();
        let assertion = AuthAssertion::build(keypair.address(), &keypair).unwrap();

        assert_eq!(assertion.challenge, AUTH_CHALLENGE);
        assert!(assertion.speaks_for(&keypair.address()));
        assert!(assertion.verify(&Ed25519Verifier).is_ok());
    }

    #[test]
    fn test_claiming_another_address_fails_verification() {
        let alice = Keypair::generate();
        let bob = Keypair::generate();

        let mut assertion = AuthAssertion::build(alice.address(), &alice).unwrap();
        assertion.signer = bob.address();

        assert!(matches!(
            assertion.verify(&Ed25519Verifier),
            Err(CoreError::InvalidSignature)
        ));
    }

    #[test]
    fn test_altered_challenge_fails_verification() {
        let keypair = Keypair::generate();
        let mut assertion = AuthAssertion::build(keypair.address(), &keypair).unwrap();
        assertion.challenge = "something else".to_string();

        assert!(assertion.verify(&Ed25519Verifier).is_err());
    }

    #[test]
    fn test_method_comes_from_signer() {
        let keypair = Keypair::generate();
        let assertion = AuthAssertion::build(keypair.address(), &keypair).unwrap();
        assert_eq!(assertion.method, keypair.method());
        assert_eq!(assertion.method, Ed25519Verifier.method());
    }

    #[test]
    fn test_unknown_method_rejected_on_decode() {
        let keypair = Keypair::generate();
        let assertion = AuthAssertion::build(keypair.address(), &keypair).unwrap();

        let mut doc = serde_json::to_value(&assertion).unwrap();
        let decoded: AuthAssertion = serde_json::from_value(doc.clone()).unwrap();
        assert!(decoded.verify(&Ed25519Verifier).is_ok());

        doc["method"] = serde_json::Value::from("secp256k1");
        assert!(serde_json::from_value::<AuthAssertion>(doc).is_err());
    }

    #[test]
    fn test_assertions_are_replayable() {
        // Same signer, same challenge, deterministic signature: nothing
        // distinguishes a second presentation from the first.
        let keypair = Keypair::from_seed(&[3u8; 32]);
        let a = AuthAssertion::build(keypair.address(), &keypair).unwrap();
        let b = AuthAssertion::build(keypair.address(), &keypair).unwrap();

        assert_eq!(a, b);
    }
}
