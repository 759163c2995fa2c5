//! Structured values passed to and returned from contract calls.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::Address;

/// A decoded contract call parameter or result.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Value {
    Bool(bool),
    Number(i128),
    Text(String),
    Address(Address),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Numeric view of this value. Decimal text counts as a number.
    pub fn as_number(&self) -> Option<i128> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Text(s) => s.trim().parse().ok(),
            Value::Bool(_) | Value::Address(_) | Value::List(_) | Value::Map(_) => None,
        }
    }

    /// Follow a dotted path into nested maps and lists.
    ///
    /// Numeric segments index into lists. An empty path returns `self`.
    pub fn lookup(&self, path: &str) -> Option<&Value> {
        if path.is_empty() {
            return Some(self);
        }
        path.split('.').try_fold(self, |current, segment| match current {
            Value::Map(fields) => fields.get(segment),
            Value::List(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
    }

    /// Compare two values if they are comparable.
    ///
    /// Numbers (and numeric text) order numerically. Addresses, booleans and
    /// non-numeric text only support equality: they return `Some(Equal)` when
    /// equal and `None` otherwise, so ordering comparators evaluate to false.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        if let (Some(a), Some(b)) = (self.as_number(), other.as_number()) {
            return Some(a.cmp(&b));
        }
        match (self, other) {
            (Value::Text(a), Value::Text(b)) if a == b => Some(Ordering::Equal),
            (Value::Address(a), Value::Address(b)) if a == b => Some(Ordering::Equal),
            (Value::Address(a), Value::Text(b)) | (Value::Text(b), Value::Address(a)) => {
                match b.parse::<Address>() {
                    Ok(parsed) if parsed == *a => Some(Ordering::Equal),
                    _ => None,
                }
            }
            (Value::Bool(a), Value::Bool(b)) if a == b => Some(Ordering::Equal),
            _ => None,
        }
    }

    /// Whether this value can be ordered (not just equated).
    pub fn is_numeric(&self) -> bool {
        self.as_number().is_some()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => write!(f, "{n}"),
            Value::Text(s) => write!(f, "{s:?}"),
            Value::Address(a) => write!(f, "{a}"),
            Value::List(items) => write!(f, "[{} items]", items.len()),
            Value::Map(fields) => write!(f, "{{{} fields}}", fields.len()),
        }
    }
}

impl From<i128> for Value {
    fn from(n: i128) -> Self {
        Value::Number(n)
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Number(n.into())
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<Address> for Value {
    fn from(a: Address) -> Self {
        Value::Address(a)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_text_coerces() {
        assert_eq!(Value::from("0").compare(&Value::Number(1)), Some(Ordering::Less));
        assert_eq!(Value::Number(3).compare(&Value::from(" 3 ")), Some(Ordering::Equal));
    }

    #[test]
    fn test_text_only_supports_equality() {
        let a = Value::from("gold");
        assert_eq!(a.compare(&Value::from("gold")), Some(Ordering::Equal));
        assert_eq!(a.compare(&Value::from("silver")), None);
    }

    #[test]
    fn test_address_against_text() {
        let addr = Address::from_bytes([0x11; 32]);
        let text = Value::Text(addr.to_string().to_uppercase().replacen("0X", "0x", 1));
        assert_eq!(Value::Address(addr).compare(&text), Some(Ordering::Equal));
    }

    #[test]
    fn test_lookup_nested_path() {
        let mut inner = BTreeMap::new();
        inner.insert("count".to_string(), Value::Number(2));
        let value = Value::List(vec![Value::Number(0), Value::Map(inner)]);

        assert_eq!(value.lookup("1.count"), Some(&Value::Number(2)));
        assert_eq!(value.lookup(""), Some(&value));
        assert_eq!(value.lookup("1.missing"), None);
        assert_eq!(value.lookup("x"), None);
    }
}
