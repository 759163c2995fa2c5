//! # Keygate Core
//!
//! Pure primitives for Keygate: addresses, access policies, authentication
//! assertions, escrow records and the symmetric cipher.
//!
//! This crate contains no I/O and no chain access. Evaluation of policies
//! against live state lives in `keygate-policy`; wrapping and unwrapping
//! of keys lives in `keygate-escrow`.
//!
//! ## Key Types
//!
//! - [`SymmetricKey`] / [`Ciphertext`] - content encryption (ChaCha20-Poly1305)
//! - [`Policy`] - flat alternating list of [`Condition`]s and operators
//! - [`AuthAssertion`] - signed proof of control over an [`Address`]
//! - [`WrappedKeyRecord`] - a wrapped key bound to its policy
//!
//! ## Canonicalization
//!
//! Persisted artifacts are encoded as CBOR. See [`canonical`].

pub mod assertion;
pub mod canonical;
pub mod cipher;
pub mod crypto;
pub mod error;
pub mod policy;
pub mod record;
pub mod types;
pub mod value;

pub use assertion::{AuthAssertion, SigningMethod, AUTH_CHALLENGE};
pub use cipher::{encrypt_fresh, CipherSuite, Ciphertext, SymmetricKey, KEY_LEN, NONCE_LEN};
pub use crypto::{Ed25519Verifier, Keypair, SignatureVerifier, Signer};
pub use error::{CoreError, Result};
pub use policy::{
    BoolOp, Comparator, Condition, ContractQuery, DirectComparison, IdentityComparator,
    IdentityField, Param, Policy, PolicyBuilder, PolicyDigest, PolicyTree,
};
pub use record::{RecordId, SealedArtifact, WrappedKey, WrappedKeyRecord};
pub use types::{Address, ChainId, MethodSignature};
pub use value::Value;
