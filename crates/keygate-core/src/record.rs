//! Escrow records: the durable artifacts a consumer persists.
//!
//! A [`WrappedKeyRecord`] pairs a wrapped content key with the policy that
//! gates it. Together with the [`Ciphertext`] it forms a [`SealedArtifact`].
//! Records have no update operation: a different policy means a new record.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::canonical;
use crate::cipher::{Ciphertext, NONCE_LEN};
use crate::error::Result;
use crate::policy::{Policy, PolicyDigest};

const RECORD_ID_CONTEXT: &str = "keygate-core-v0-record";

/// Content address of a record.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordId(pub [u8; 32]);

impl RecordId {
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> std::result::Result<Self, hex::FromHexError> {
        let bytes = hex::decode(s)?;
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|_| hex::FromHexError::InvalidStringLength)?;
        Ok(Self(arr))
    }
}

impl fmt::Debug for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecordId({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.to_hex()[..16])
    }
}

/// A content key encrypted by one of the escrow wrapping mechanisms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WrappedKey {
    /// Encrypted under a service-held master key.
    Master {
        /// Identifies which master key can unwrap this.
        key_id: [u8; 32],
        nonce: [u8; NONCE_LEN],
        ciphertext: Vec<u8>,
    },

    /// Encrypted to a service X25519 public key via an ephemeral agreement.
    Sealed {
        ephemeral_public: [u8; 32],
        nonce: [u8; NONCE_LEN],
        ciphertext: Vec<u8>,
    },
}

/// A wrapped key bound to the policy that gates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WrappedKeyRecord {
    pub id: RecordId,
    pub wrapped_key: WrappedKey,
    pub policy: Policy,
}

impl WrappedKeyRecord {
    /// Assemble a record, deriving its id from the wrapped key and policy.
    pub fn new(wrapped_key: WrappedKey, policy: Policy) -> Result<Self> {
        let id = Self::compute_id(&wrapped_key, &policy.digest()?)?;
        Ok(Self {
            id,
            wrapped_key,
            policy,
        })
    }

    /// Id over the wrapped bytes and the policy digest.
    pub fn compute_id(wrapped_key: &WrappedKey, digest: &PolicyDigest) -> Result<RecordId> {
        let mut hasher = blake3::Hasher::new_derive_key(RECORD_ID_CONTEXT);
        hasher.update(&canonical::to_cbor(wrapped_key)?);
        hasher.update(digest.as_bytes());
        Ok(RecordId(*hasher.finalize().as_bytes()))
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        canonical::to_cbor(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        canonical::from_cbor(bytes)
    }
}

/// Ciphertext plus the record that gates its key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedArtifact {
    pub ciphertext: Ciphertext,
    pub record: WrappedKeyRecord,
}

impl SealedArtifact {
    pub fn id(&self) -> RecordId {
        self.record.id
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        canonical::to_cbor(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        canonical::from_cbor(bytes)
    }
}
