//! Symmetric cipher: content keys and authenticated ciphertexts.
//!
//! Payloads are encrypted once under a fresh [`SymmetricKey`] using
//! ChaCha20-Poly1305. The key is then handed to the escrow layer; the
//! [`Ciphertext`] is safe to publish.

use std::fmt;

use bytes::Bytes;
use chacha20poly1305::{
    aead::{Aead, KeyInit, Payload},
    ChaCha20Poly1305, Nonce,
};
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::error::{CoreError, Result};

/// Length of a symmetric key in bytes.
pub const KEY_LEN: usize = 32;

/// Length of a ChaCha20-Poly1305 nonce in bytes.
pub const NONCE_LEN: usize = 12;

/// Fill `buf` from the OS randomness source.
pub fn fill_random(buf: &mut [u8]) -> Result<()> {
    OsRng
        .try_fill_bytes(buf)
        .map_err(|e| CoreError::Entropy(e.to_string()))
}

/// A 256-bit content key. Zeroed when dropped.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SymmetricKey([u8; KEY_LEN]);

impl SymmetricKey {
    /// Generate a new random key.
    pub fn generate() -> Result<Self> {
        let mut bytes = [0u8; KEY_LEN];
        fill_random(&mut bytes)?;
        Ok(Self(bytes))
    }

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Create from a slice, checking the length.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let arr: [u8; KEY_LEN] = bytes.try_into().map_err(|_| {
            CoreError::Decoding(format!(
                "invalid key length: expected {KEY_LEN}, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self(arr))
    }

    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }

    /// Encrypt with associated data bound into the tag.
    pub fn seal(&self, plaintext: &[u8], aad: &[u8], nonce: &[u8; NONCE_LEN]) -> Result<Vec<u8>> {
        let cipher = ChaCha20Poly1305::new_from_slice(&self.0)
            .map_err(|e| CoreError::Encoding(e.to_string()))?;
        cipher
            .encrypt(Nonce::from_slice(nonce), Payload { msg: plaintext, aad })
            .map_err(|e| CoreError::Encoding(e.to_string()))
    }

    /// Decrypt and authenticate. Any tag mismatch is [`CoreError::Integrity`].
    pub fn open(
        &self,
        ciphertext: &[u8],
        aad: &[u8],
        nonce: &[u8; NONCE_LEN],
    ) -> Result<Zeroizing<Vec<u8>>> {
        let cipher =
            ChaCha20Poly1305::new_from_slice(&self.0).map_err(|_| CoreError::Integrity)?;
        cipher
            .decrypt(Nonce::from_slice(nonce), Payload { msg: ciphertext, aad })
            .map(Zeroizing::new)
            .map_err(|_| CoreError::Integrity)
    }
}

impl fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SymmetricKey(..)")
    }
}

/// Cipher suite identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum CipherSuite {
    /// ChaCha20-Poly1305 with a 256-bit key and 96-bit random nonce.
    ChaCha20Poly1305 = 1,
}

/// An encrypted payload.
///
/// Immutable once produced. Cloning is cheap (the data is reference counted).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ciphertext {
    /// Algorithm used.
    pub suite: CipherSuite,

    /// Nonce used for encryption (unique per encryption).
    pub nonce: [u8; NONCE_LEN],

    /// The encrypted data, including the authentication tag.
    pub data: Bytes,
}

impl Ciphertext {
    /// Encrypt plaintext under `key` with a fresh nonce.
    pub fn encrypt(plaintext: &[u8], key: &SymmetricKey) -> Result<Self> {
        let mut nonce = [0u8; NONCE_LEN];
        fill_random(&mut nonce)?;
        let data = key.seal(plaintext, &[], &nonce)?;

        Ok(Self {
            suite: CipherSuite::ChaCha20Poly1305,
            nonce,
            data: Bytes::from(data),
        })
    }

    /// Decrypt with `key`. Fails with [`CoreError::Integrity`] on tamper or wrong key.
    pub fn decrypt(&self, key: &SymmetricKey) -> Result<Vec<u8>> {
        match self.suite {
            CipherSuite::ChaCha20Poly1305 => {
                let mut plaintext = key.open(&self.data, &[], &self.nonce)?;
                Ok(std::mem::take(&mut *plaintext))
            }
        }
    }

    /// Size of the encrypted data, tag included.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Generate a fresh key and encrypt `plaintext` under it.
pub fn encrypt_fresh(plaintext: &[u8]) -> Result<(Ciphertext, SymmetricKey)> {
    let key = SymmetricKey::generate()?;
    let ciphertext = Ciphertext::encrypt(plaintext, &key)?;
    Ok((ciphertext, key))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let key = SymmetricKey::generate().unwrap();
        let plaintext = b"this is a super secret message";

        let ciphertext = Ciphertext::encrypt(plaintext, &key).unwrap();
        assert_ne!(&ciphertext.data[..], &plaintext[..]);

        let decrypted = ciphertext.decrypt(&key).unwrap();
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn test_wrong_key_is_integrity_error() {
        let key1 = SymmetricKey::generate().unwrap();
        let key2 = SymmetricKey::generate().unwrap();

        let ciphertext = Ciphertext::encrypt(b"secret", &key1).unwrap();

        assert!(matches!(ciphertext.decrypt(&key2), Err(CoreError::Integrity)));
    }

    #[test]
    fn test_tampered_ciphertext_is_integrity_error() {
        let key = SymmetricKey::generate().unwrap();
        let mut ciphertext = Ciphertext::encrypt(b"secret", &key).unwrap();

        let mut data = ciphertext.data.to_vec();
        data[0] ^= 0x01;
        ciphertext.data = Bytes::from(data);

        assert!(matches!(ciphertext.decrypt(&key), Err(CoreError::Integrity)));
    }

    #[test]
    fn test_aad_mismatch_is_integrity_error() {
        let key = SymmetricKey::generate().unwrap();
        let nonce = [7u8; NONCE_LEN];
        let sealed = key.seal(b"payload", b"context-a", &nonce).unwrap();

        assert!(key.open(&sealed, b"context-a", &nonce).is_ok());
        assert!(matches!(
            key.open(&sealed, b"context-b", &nonce),
            Err(CoreError::Integrity)
        ));
    }

    #[test]
    fn test_nonces_are_fresh() {
        let key = SymmetricKey::generate().unwrap();
        let a = Ciphertext::encrypt(b"same", &key).unwrap();
        let b = Ciphertext::encrypt(b"same", &key).unwrap();
        assert_ne!(a.nonce, b.nonce);
    }

    #[test]
    fn test_key_from_slice_checks_length() {
        assert!(SymmetricKey::from_slice(&[0u8; 31]).is_err());
        assert!(SymmetricKey::from_slice(&[0u8; KEY_LEN]).is_ok());
    }

    #[test]
    fn test_debug_hides_key_material() {
        let key = SymmetricKey::from_bytes([0xab; KEY_LEN]);
        assert_eq!(format!("{:?}", key), "SymmetricKey(..)");
    }
}
