use serde::{Deserialize, Serialize};

use trustline_core::{Did, SchemaId};

use crate::error::CredentialError;

/// Upper bound on attributes per schema.
pub const MAX_ATTRIBUTES: usize = 125;

/// Immutable, ledger-registered credential schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    /// `<issuer did>:2:<name>:<version>`.
    pub id: SchemaId,
    pub name: String,
    pub version: String,
    /// Attribute names in declaration order.
    #[serde(rename = "attrNames")]
    pub attr_names: Vec<String>,
    /// Ledger sequence number, assigned when the schema is written.
    #[serde(rename = "seqNo", default, skip_serializing_if = "Option::is_none")]
    pub seq_no: Option<u64>,
}

impl Schema {
    /// Build and validate a schema published by `issuer`.
    pub fn new(
        issuer: &Did,
        name: &str,
        version: &str,
        attr_names: &[&str],
    ) -> Result<Self, CredentialError> {
        validate_segment("name", name)?;
        validate_segment("version", version)?;

        if attr_names.is_empty() {
            return Err(CredentialError::InvalidSchema(
                "schema must have at least one attribute".into(),
            ));
        }
        if attr_names.len() > MAX_ATTRIBUTES {
            return Err(CredentialError::InvalidSchema(format!(
                "schema has {} attributes, maximum is {}",
                attr_names.len(),
                MAX_ATTRIBUTES
            )));
        }

        let mut names: Vec<String> = Vec::with_capacity(attr_names.len());
        for attr in attr_names {
            let attr = attr.trim();
            if attr.is_empty() {
                return Err(CredentialError::InvalidSchema(
                    "attribute names must not be empty".into(),
                ));
            }
            if names.iter().any(|n| n == attr) {
                return Err(CredentialError::InvalidSchema(format!(
                    "duplicate attribute: {}",
                    attr
                )));
            }
            names.push(attr.to_string());
        }

        Ok(Self {
            id: SchemaId::build(issuer, name, version),
            name: name.to_string(),
            version: version.to_string(),
            attr_names: names,
            seq_no: None,
        })
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attr_names.iter().any(|a| a == name)
    }

    /// Reference used inside credential definition ids: the ledger sequence
    /// number when known, the schema id otherwise.
    pub fn reference(&self) -> String {
        match self.seq_no {
            Some(seq_no) => seq_no.to_string(),
            None => self.id.to_string(),
        }
    }
}

fn validate_segment(field: &str, value: &str) -> Result<(), CredentialError> {
    if value.trim().is_empty() {
        return Err(CredentialError::InvalidSchema(format!(
            "{} must not be empty",
            field
        )));
    }
    if value.contains(':') {
        return Err(CredentialError::InvalidSchema(format!(
            "{} must not contain ':'",
            field
        )));
    }
    Ok(())
}
