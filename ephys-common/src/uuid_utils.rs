//! Content-derived identifiers
//!
//! Entities that have no natural surrogate key (e.g. a clustering run) are
//! identified by hashing their full composite key. Two independent runs that
//! observe the same key therefore agree on the same UUID without a shared
//! counter.
//!
//! **Canonical form:** fields are visited in ascending byte order of their
//! names. For each field the UTF-8 bytes of the value's canonical text are
//! fed to SHA-256, followed by a single `0x1F` unit separator. Canonical text:
//!
//! | value      | text                              |
//! |------------|-----------------------------------|
//! | `Text`     | verbatim                          |
//! | `Int`      | decimal, leading `-` if negative  |
//! | `Bool`     | `true` / `false`                  |
//! | `DateTime` | `%Y-%m-%d %H:%M:%S`               |
//!
//! The first 16 bytes of the digest are used verbatim as the UUID bytes.

use crate::time::format_datetime;
use chrono::NaiveDateTime;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use uuid::Uuid;

const FIELD_SEPARATOR: u8 = 0x1F;

/// A single key field value
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum KeyValue {
    Text(String),
    Int(i64),
    Bool(bool),
    DateTime(NaiveDateTime),
}

impl KeyValue {
    /// Canonical text used for hashing
    pub fn canonical(&self) -> String {
        match self {
            KeyValue::Text(s) => s.clone(),
            KeyValue::Int(i) => i.to_string(),
            KeyValue::Bool(b) => b.to_string(),
            KeyValue::DateTime(dt) => format_datetime(dt),
        }
    }
}

impl From<&str> for KeyValue {
    fn from(value: &str) -> Self {
        KeyValue::Text(value.to_string())
    }
}

impl From<String> for KeyValue {
    fn from(value: String) -> Self {
        KeyValue::Text(value)
    }
}

impl From<i64> for KeyValue {
    fn from(value: i64) -> Self {
        KeyValue::Int(value)
    }
}

impl From<u32> for KeyValue {
    fn from(value: u32) -> Self {
        KeyValue::Int(i64::from(value))
    }
}

impl From<bool> for KeyValue {
    fn from(value: bool) -> Self {
        KeyValue::Bool(value)
    }
}

impl From<NaiveDateTime> for KeyValue {
    fn from(value: NaiveDateTime) -> Self {
        KeyValue::DateTime(value)
    }
}

/// Composite key: field name → value, always iterated in field-name order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompositeKey {
    fields: BTreeMap<String, KeyValue>,
}

impl CompositeKey {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, field: impl Into<String>, value: impl Into<KeyValue>) -> Self {
        self.insert(field, value);
        self
    }

    /// Insert or replace a field
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<KeyValue>) {
        self.fields.insert(field.into(), value.into());
    }

    pub fn get(&self, field: &str) -> Option<&KeyValue> {
        self.fields.get(field)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Canonical byte representation fed to the hash
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        for value in self.fields.values() {
            bytes.extend_from_slice(value.canonical().as_bytes());
            bytes.push(FIELD_SEPARATOR);
        }
        bytes
    }
}

/// Derive a deterministic UUID from a composite key
pub fn derive_id(key: &CompositeKey) -> Uuid {
    let digest = Sha256::digest(key.canonical_bytes());
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&digest[..16]);
    Uuid::from_bytes(bytes)
}
