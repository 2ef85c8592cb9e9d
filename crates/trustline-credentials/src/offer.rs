use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::Zeroizing;

use trustline_core::{CredDefId, Did, SchemaId};
use trustline_crypto::{create_commitment, random_nonce};

use crate::definition::CredentialDefinition;
use crate::error::CredentialError;

/// Holder-local secret blinded into every credential request the holder
/// makes. Never serialized.
#[derive(Clone)]
pub struct MasterSecret {
    value: Zeroizing<[u8; 32]>,
}

impl MasterSecret {
    pub fn generate() -> Self {
        Self {
            value: Zeroizing::new(random_nonce()),
        }
    }

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self {
            value: Zeroizing::new(bytes),
        }
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.value
    }
}

impl fmt::Debug for MasterSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MasterSecret(<redacted>)")
    }
}

/// Offer of a credential under a definition. Carries no attribute values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialOffer {
    pub schema_id: SchemaId,
    pub cred_def_id: CredDefId,
    /// Fresh per offer; the request must echo it.
    pub nonce: String,
}

/// Holder's answer to an offer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialRequest {
    pub prover_did: Did,
    pub cred_def_id: CredDefId,
    /// Hex BLAKE3 commitment to the master secret.
    pub blinded_ms: String,
    /// Echo of the offer nonce.
    pub nonce: String,
}

/// Holder-private data needed to check and store the issued credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialRequestMetadata {
    pub master_secret_id: String,
    pub cred_def_id: CredDefId,
    /// Hex blinding factor the commitment was made with.
    pub blinding: String,
    pub nonce: String,
}

impl CredentialRequestMetadata {
    pub(crate) fn blinding_bytes(&self) -> Result<[u8; 32], CredentialError> {
        let bytes = hex::decode(&self.blinding)
            .map_err(|e| CredentialError::Serialization(format!("invalid blinding hex: {}", e)))?;
        bytes
            .try_into()
            .map_err(|_| CredentialError::Serialization("blinding must be 32 bytes".into()))
    }
}

/// Build an offer for `cred_def`.
pub fn create_offer(cred_def: &CredentialDefinition) -> CredentialOffer {
    CredentialOffer {
        schema_id: cred_def.schema_id.clone(),
        cred_def_id: cred_def.id.clone(),
        nonce: hex::encode(&random_nonce()[..16]),
    }
}

/// Build a credential request answering `offer`, blinding `master_secret`
/// under a fresh factor.
pub fn create_request(
    prover_did: &Did,
    offer: &CredentialOffer,
    cred_def: &CredentialDefinition,
    master_secret: &MasterSecret,
    master_secret_id: &str,
) -> Result<(CredentialRequest, CredentialRequestMetadata), CredentialError> {
    if offer.cred_def_id != cred_def.id {
        return Err(CredentialError::OfferMismatch(format!(
            "offer references {}, definition is {}",
            offer.cred_def_id, cred_def.id
        )));
    }
    if offer.schema_id != cred_def.schema_id {
        return Err(CredentialError::OfferMismatch(format!(
            "offer schema {} does not match definition schema {}",
            offer.schema_id, cred_def.schema_id
        )));
    }

    let blinding = Zeroizing::new(random_nonce());
    let commitment = create_commitment(master_secret.as_bytes(), &blinding);

    let request = CredentialRequest {
        prover_did: prover_did.clone(),
        cred_def_id: cred_def.id.clone(),
        blinded_ms: hex::encode(commitment),
        nonce: offer.nonce.clone(),
    };
    let metadata = CredentialRequestMetadata {
        master_secret_id: master_secret_id.to_string(),
        cred_def_id: cred_def.id.clone(),
        blinding: hex::encode(*blinding),
        nonce: offer.nonce.clone(),
    };

    Ok((request, metadata))
}
