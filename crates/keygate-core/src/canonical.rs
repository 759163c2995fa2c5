//! Canonical binary encoding.
//!
//! Every persisted artifact is encoded as CBOR. Struct fields serialize in
//! declaration order, so the same value always produces the same bytes;
//! digests are computed over this encoding.

use serde::{de::DeserializeOwned, Serialize};

use crate::error::{CoreError, Result};

/// Encode a value as CBOR.
pub fn to_cbor<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    ciborium::into_writer(value, &mut buf).map_err(|e| CoreError::Encoding(e.to_string()))?;
    Ok(buf)
}

/// Decode a value from CBOR.
pub fn from_cbor<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    ciborium::from_reader(bytes).map_err(|e| CoreError::Decoding(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    #[test]
    fn test_encoding_is_deterministic() {
        let value = Value::List(vec![Value::Number(1), Value::from("a")]);
        assert_eq!(to_cbor(&value).unwrap(), to_cbor(&value.clone()).unwrap());
    }

    #[test]
    fn test_garbage_fails_to_decode() {
        let result: Result<Value> = from_cbor(&[0xff, 0x00, 0x13]);
        assert!(matches!(result, Err(CoreError::Decoding(_))));
    }
}
