//! Key wrapping mechanisms.
//!
//! A wrapper encrypts a content key so that only the escrow service can
//! recover it. The policy digest is bound in as associated data: a record
//! whose policy has been swapped fails to unwrap.
//!
//! Two single-node mechanisms are provided:
//!
//! 1. [`MasterKeyWrapper`]: ChaCha20-Poly1305 under a service-held master key
//! 2. [`SealedKeyWrapper`]: ephemeral X25519 agreement with a service key,
//!    expanded with Blake3, then ChaCha20-Poly1305
//!
//! A distributed custody network plugs in by implementing [`KeyWrapper`].

use std::fmt;

use keygate_core::cipher::fill_random;
use keygate_core::{PolicyDigest, SymmetricKey, WrappedKey, KEY_LEN, NONCE_LEN};
use x25519_dalek::{PublicKey, StaticSecret};

use crate::error::{EscrowError, Result};

const MASTER_ID_CONTEXT: &str = "keygate-escrow-v0-master-id";
const SEAL_CONTEXT: &str = "keygate-escrow-v0-seal";

/// Wraps and unwraps content keys.
pub trait KeyWrapper: Send + Sync {
    /// Wrap `key`, binding it to `binding`.
    fn wrap(&self, key: &SymmetricKey, binding: &PolicyDigest) -> Result<WrappedKey>;

    /// Recover a key wrapped with the same `binding`.
    fn unwrap(&self, wrapped: &WrappedKey, binding: &PolicyDigest) -> Result<SymmetricKey>;
}

/// Wraps under a single 256-bit master key.
pub struct MasterKeyWrapper {
    master: SymmetricKey,
    key_id: [u8; 32],
}

impl MasterKeyWrapper {
    /// Generate a new random master key.
    pub fn generate() -> Result<Self> {
        Ok(Self::from_key(SymmetricKey::generate()?))
    }

    /// Use existing master key bytes.
    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self::from_key(SymmetricKey::from_bytes(bytes))
    }

    fn from_key(master: SymmetricKey) -> Self {
        let key_id = blake3::derive_key(MASTER_ID_CONTEXT, master.as_bytes());
        Self { master, key_id }
    }

    /// Identifier recorded alongside every key this wrapper produces.
    pub fn key_id(&self) -> &[u8; 32] {
        &self.key_id
    }
}

impl KeyWrapper for MasterKeyWrapper {
    fn wrap(&self, key: &SymmetricKey, binding: &PolicyDigest) -> Result<WrappedKey> {
        let mut nonce = [0u8; NONCE_LEN];
        fill_random(&mut nonce)?;
        let ciphertext = self.master.seal(key.as_bytes(), binding.as_bytes(), &nonce)?;

        Ok(WrappedKey::Master {
            key_id: self.key_id,
            nonce,
            ciphertext,
        })
    }

    fn unwrap(&self, wrapped: &WrappedKey, binding: &PolicyDigest) -> Result<SymmetricKey> {
        let WrappedKey::Master {
            key_id,
            nonce,
            ciphertext,
        } = wrapped
        else {
            return Err(EscrowError::UnsupportedWrapping(
                "expected a master-key wrapping".into(),
            ));
        };
        if *key_id != self.key_id {
            return Err(EscrowError::Integrity(
                "wrapped under a different master key".into(),
            ));
        }

        let bytes = self.master.open(ciphertext, binding.as_bytes(), nonce)?;
        Ok(SymmetricKey::from_slice(&bytes)?)
    }
}

impl fmt::Debug for MasterKeyWrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MasterKeyWrapper({})", &hex_prefix(&self.key_id))
    }
}

/// Wraps to a service X25519 key using a fresh ephemeral key per record.
pub struct SealedKeyWrapper {
    secret: StaticSecret,
    public: PublicKey,
}

impl SealedKeyWrapper {
    /// Generate a new random service key.
    pub fn generate() -> Result<Self> {
        let mut seed = [0u8; 32];
        fill_random(&mut seed)?;
        Ok(Self::from_bytes(seed))
    }

    /// Create from secret key bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        let secret = StaticSecret::from(bytes);
        let public = PublicKey::from(&secret);
        Self { secret, public }
    }

    /// The service public key that wrapped keys are sealed to.
    pub fn public_key(&self) -> [u8; 32] {
        *self.public.as_bytes()
    }
}

/// Expand an X25519 shared secret into a one-off wrapping key.
fn derive_seal_key(
    shared: &[u8; 32],
    ephemeral_public: &[u8; 32],
    binding: &PolicyDigest,
) -> SymmetricKey {
    let mut hasher = blake3::Hasher::new_derive_key(SEAL_CONTEXT);
    hasher.update(shared);
    hasher.update(ephemeral_public);
    hasher.update(binding.as_bytes());
    SymmetricKey::from_bytes(*hasher.finalize().as_bytes())
}

impl KeyWrapper for SealedKeyWrapper {
    fn wrap(&self, key: &SymmetricKey, binding: &PolicyDigest) -> Result<WrappedKey> {
        // Single-use secret; StaticSecret lets entropy failures surface as errors.
        let mut seed = [0u8; 32];
        fill_random(&mut seed)?;
        let ephemeral = StaticSecret::from(seed);
        let ephemeral_public = *PublicKey::from(&ephemeral).as_bytes();

        let shared = ephemeral.diffie_hellman(&self.public);
        let wrap_key = derive_seal_key(shared.as_bytes(), &ephemeral_public, binding);

        let mut nonce = [0u8; NONCE_LEN];
        fill_random(&mut nonce)?;
        let ciphertext = wrap_key.seal(key.as_bytes(), binding.as_bytes(), &nonce)?;

        Ok(WrappedKey::Sealed {
            ephemeral_public,
            nonce,
            ciphertext,
        })
    }

    fn unwrap(&self, wrapped: &WrappedKey, binding: &PolicyDigest) -> Result<SymmetricKey> {
        let WrappedKey::Sealed {
            ephemeral_public,
            nonce,
            ciphertext,
        } = wrapped
        else {
            return Err(EscrowError::UnsupportedWrapping(
                "expected a sealed wrapping".into(),
            ));
        };

        let shared = self.secret.diffie_hellman(&PublicKey::from(*ephemeral_public));
        let wrap_key = derive_seal_key(shared.as_bytes(), ephemeral_public, binding);

        let bytes = wrap_key.open(ciphertext, binding.as_bytes(), nonce)?;
        Ok(SymmetricKey::from_slice(&bytes)?)
    }
}

impl fmt::Debug for SealedKeyWrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SealedKeyWrapper({})", hex_prefix(self.public.as_bytes()))
    }
}

fn hex_prefix(bytes: &[u8; 32]) -> String {
    bytes[..8].iter().map(|b| format!("{b:02x}")).collect()
}
