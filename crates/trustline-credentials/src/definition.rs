use serde::{Deserialize, Serialize};
use std::fmt;

use trustline_core::{CredDefId, Did, SchemaId, Verkey};
use trustline_crypto::KeyPair;

use crate::error::CredentialError;
use crate::schema::Schema;

/// Signature scheme a credential definition signs with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SignatureType {
    #[default]
    #[serde(rename = "ED25519")]
    Ed25519,
}

impl SignatureType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ed25519 => "ED25519",
        }
    }
}

impl fmt::Display for SignatureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options supplied when creating a definition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialDefinitionConfig {
    #[serde(default)]
    pub support_revocation: bool,
}

/// Ledger-registered binding of a schema to an issuer's signing key.
///
/// The private half of `verkey` stays in the issuer's wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialDefinition {
    pub id: CredDefId,
    #[serde(rename = "schemaId")]
    pub schema_id: SchemaId,
    #[serde(rename = "type")]
    pub signature_type: SignatureType,
    pub tag: String,
    #[serde(rename = "attrNames")]
    pub attr_names: Vec<String>,
    /// Public key credentials under this definition are verified with.
    pub verkey: Verkey,
}

impl CredentialDefinition {
    /// DID of the issuer that owns this definition.
    pub fn issuer_did(&self) -> Option<&str> {
        self.id.issuer_did()
    }
}

/// Create a credential definition for `schema` owned by `issuer`.
///
/// Returns the public definition together with the freshly generated
/// signing key, which the caller must keep private.
pub fn create_credential_definition(
    issuer: &Did,
    schema: &Schema,
    tag: &str,
    signature_type: SignatureType,
    config: &CredentialDefinitionConfig,
) -> Result<(CredentialDefinition, KeyPair), CredentialError> {
    if config.support_revocation {
        return Err(CredentialError::Unsupported(
            "credential revocation".into(),
        ));
    }
    if tag.is_empty() || tag.contains(':') {
        return Err(CredentialError::InvalidDefinition(format!(
            "invalid tag: {:?}",
            tag
        )));
    }

    let signing_key = KeyPair::generate();
    let definition = CredentialDefinition {
        id: CredDefId::build(issuer, signature_type.as_str(), &schema.reference(), tag),
        schema_id: schema.id.clone(),
        signature_type,
        tag: tag.to_string(),
        attr_names: schema.attr_names.clone(),
        verkey: signing_key.verkey(),
    };

    tracing::debug!(cred_def_id = %definition.id, schema_id = %schema.id, "credential definition created");

    Ok((definition, signing_key))
}
