//! Signing and verification collaborators.
//!
//! Keygate only needs two things from a wallet: produce a signature for an
//! identity, and check one. Both are traits so a hardware wallet or a
//! remote signer can stand in; [`Keypair`] and [`Ed25519Verifier`] are the
//! in-process Ed25519 implementations.

use std::fmt;

use ed25519_dalek::{Signature, Signer as _, SigningKey, Verifier, VerifyingKey};

use crate::assertion::SigningMethod;
use crate::error::{CoreError, Result};
use crate::types::Address;

/// Produces signatures on behalf of an identity.
pub trait Signer: Send + Sync {
    /// Sign `message` as `identity`.
    ///
    /// Fails with [`CoreError::UnknownIdentity`] if this signer holds no key
    /// for `identity`.
    fn sign(&self, message: &str, identity: &Address) -> Result<Vec<u8>>;

    /// The scheme this signer's signatures use.
    fn method(&self) -> SigningMethod;
}

/// Checks a signature against a claimed address.
pub trait SignatureVerifier: Send + Sync {
    fn verify(&self, message: &str, signature: &[u8], claimed: &Address) -> bool;

    /// The only scheme this verifier accepts.
    fn method(&self) -> SigningMethod;
}

/// A single Ed25519 identity.
#[derive(Clone)]
pub struct Keypair {
    signing_key: SigningKey,
}

impl Keypair {
    /// Generate a new random keypair.
    pub fn generate() -> Self {
        let mut rng = rand::rngs::OsRng;
        let signing_key = SigningKey::generate(&mut rng);
        Self { signing_key }
    }

    /// Create from a 32-byte seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        let signing_key = SigningKey::from_bytes(seed);
        Self { signing_key }
    }

    /// The address this keypair signs for.
    pub fn address(&self) -> Address {
        Address(self.signing_key.verifying_key().to_bytes())
    }

    /// Sign raw bytes.
    pub fn sign_bytes(&self, message: &[u8]) -> [u8; 64] {
        self.signing_key.sign(message).to_bytes()
    }
}

impl Signer for Keypair {
    fn sign(&self, message: &str, identity: &Address) -> Result<Vec<u8>> {
        if *identity != self.address() {
            return Err(CoreError::UnknownIdentity(identity.to_string()));
        }
        Ok(self.sign_bytes(message.as_bytes()).to_vec())
    }

    fn method(&self) -> SigningMethod {
        SigningMethod::Ed25519
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Keypair({:?})", self.address())
    }
}

/// Verifies Ed25519 signatures where the address is the verifying key.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ed25519Verifier;

impl Ed25519Verifier {
    /// Verify, reporting why a signature was rejected.
    pub fn check(&self, message: &[u8], signature: &[u8], claimed: &Address) -> Result<()> {
        let verifying_key = VerifyingKey::from_bytes(claimed.as_bytes())
            .map_err(|e| CoreError::InvalidAddress(e.to_string()))?;
        let sig_bytes: [u8; 64] = signature
            .try_into()
            .map_err(|_| CoreError::InvalidSignature)?;
        verifying_key
            .verify(message, &Signature::from_bytes(&sig_bytes))
            .map_err(|_| CoreError::InvalidSignature)
    }
}

impl SignatureVerifier for Ed25519Verifier {
    fn verify(&self, message: &str, signature: &[u8], claimed: &Address) -> bool {
        self.check(message.as_bytes(), signature, claimed).is_ok()
    }

    fn method(&self) -> SigningMethod {
        SigningMethod::Ed25519
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keypair_sign_verify() {
        let keypair = Keypair::generate();
        let address = keypair.address();
        let signature = keypair.sign("hello world", &address).unwrap();

        assert!(Ed25519Verifier.verify("hello world", &signature, &address));

        // Tampered message should fail
        assert!(!Ed25519Verifier.verify("hello worlD", &signature, &address));
    }

    #[test]
    fn test_signature_does_not_transfer_to_other_address() {
        let alice = Keypair::generate();
        let bob = Keypair::generate();
        let signature = alice.sign("msg", &alice.address()).unwrap();

        assert!(!Ed25519Verifier.verify("msg", &signature, &bob.address()));
    }

    #[test]
    fn test_sign_for_foreign_identity_fails() {
        let alice = Keypair::generate();
        let bob = Keypair::generate();

        assert!(matches!(
            alice.sign("msg", &bob.address()),
            Err(CoreError::UnknownIdentity(_))
        ));
    }

    #[test]
    fn test_truncated_signature_rejected() {
        let keypair = Keypair::generate();
        let address = keypair.address();
        let signature = keypair.sign("msg", &address).unwrap();

        assert!(!Ed25519Verifier.verify("msg", &signature[..63], &address));
    }

    #[test]
    fn test_keypair_deterministic_from_seed() {
        let seed = [0x42u8; 32];
        let kp1 = Keypair::from_seed(&seed);
        let kp2 = Keypair::from_seed(&seed);
        assert_eq!(kp1.address(), kp2.address());
    }
}
