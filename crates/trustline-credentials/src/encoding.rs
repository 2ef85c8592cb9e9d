//! Attribute encoding.
//!
//! Every credential attribute travels as a `{raw, encoded}` pair. The
//! encoded form is a decimal integer: 32-bit integers encode as themselves,
//! anything else as the big-endian integer formed by the first 16 bytes of
//! its BLAKE3 hash. The mapping is deterministic so that values encoded at
//! issuance compare equal when encoded again later.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::CredentialError;

/// Encode a raw attribute value.
pub fn encode_attribute(raw: &str) -> String {
    if let Ok(n) = raw.trim().parse::<i32>() {
        return n.to_string();
    }
    let digest = trustline_crypto::hash(raw.as_bytes());
    let mut prefix = [0u8; 16];
    prefix.copy_from_slice(&digest[..16]);
    u128::from_be_bytes(prefix).to_string()
}

fn is_decimal(s: &str) -> bool {
    let digits = s.strip_prefix('-').unwrap_or(s);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// One attribute value as carried inside a credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeValue {
    pub raw: String,
    pub encoded: String,
}

impl AttributeValue {
    /// Pair `raw` with its canonical encoding.
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let encoded = encode_attribute(&raw);
        Self { raw, encoded }
    }

    /// Pair `raw` with an issuer-chosen encoding, which must be a decimal
    /// integer.
    pub fn with_encoding(
        raw: impl Into<String>,
        encoded: impl Into<String>,
    ) -> Result<Self, CredentialError> {
        let encoded = encoded.into();
        if !is_decimal(&encoded) {
            return Err(CredentialError::InvalidValues(format!(
                "encoded value {:?} is not a decimal integer",
                encoded
            )));
        }
        Ok(Self {
            raw: raw.into(),
            encoded,
        })
    }
}

/// Attribute name → value map for one credential.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CredentialValues(BTreeMap<String, AttributeValue>);

impl CredentialValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build values from raw strings, encoding each one.
    pub fn from_raw<I, K, V>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self(
            values
                .into_iter()
                .map(|(k, v)| (k.into(), AttributeValue::new(v)))
                .collect(),
        )
    }

    /// Add an attribute with an issuer-chosen encoding.
    pub fn insert_encoded(
        &mut self,
        name: impl Into<String>,
        raw: impl Into<String>,
        encoded: impl Into<String>,
    ) -> Result<(), CredentialError> {
        let value = AttributeValue::with_encoding(raw, encoded)?;
        self.0.insert(name.into(), value);
        Ok(())
    }

    pub fn insert(&mut self, name: impl Into<String>, raw: impl Into<String>) {
        self.0.insert(name.into(), AttributeValue::new(raw));
    }

    pub fn get(&self, name: &str) -> Option<&AttributeValue> {
        self.0.get(name)
    }

    /// Raw value of `name`, if present.
    pub fn raw(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(|v| v.raw.as_str())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &AttributeValue)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Check that the values cover exactly `attr_names` and that every
    /// encoding is a decimal integer.
    pub fn validate_against(&self, attr_names: &[String]) -> Result<(), CredentialError> {
        for name in attr_names {
            if !self.0.contains_key(name) {
                return Err(CredentialError::InvalidValues(format!(
                    "missing attribute: {}",
                    name
                )));
            }
        }
        for (name, value) in &self.0 {
            if !attr_names.iter().any(|a| a == name) {
                return Err(CredentialError::InvalidValues(format!(
                    "unknown attribute: {}",
                    name
                )));
            }
            if !is_decimal(&value.encoded) {
                return Err(CredentialError::InvalidValues(format!(
                    "attribute {} has non-decimal encoding",
                    name
                )));
            }
        }
        Ok(())
    }
}
