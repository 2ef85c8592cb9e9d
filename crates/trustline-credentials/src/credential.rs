use serde::{Deserialize, Serialize};

use trustline_core::{CredDefId, SchemaId};
use trustline_crypto::{sign, verify, verify_commitment, KeyPair, PublicKey, Signature};

use crate::definition::CredentialDefinition;
use crate::encoding::CredentialValues;
use crate::error::CredentialError;
use crate::offer::{CredentialOffer, CredentialRequest, CredentialRequestMetadata, MasterSecret};

/// Credential signed by the definition's key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub schema_id: SchemaId,
    pub cred_def_id: CredDefId,
    pub values: CredentialValues,
    /// The holder's commitment, copied from the request.
    pub blinded_ms: String,
    /// Hex Ed25519 signature over [`Credential::signing_payload`].
    pub signature: String,
}

impl Credential {
    /// Canonical bytes covered by the signature.
    pub fn signing_payload(&self) -> Result<Vec<u8>, CredentialError> {
        let canonical = serde_json::json!({
            "schema_id": self.schema_id,
            "cred_def_id": self.cred_def_id,
            "values": self.values,
            "blinded_ms": self.blinded_ms,
        });
        serde_json::to_vec(&canonical).map_err(|e| CredentialError::Serialization(e.to_string()))
    }

    /// Verify the issuer signature against the definition's public key.
    pub fn verify_signature(&self, cred_def: &CredentialDefinition) -> Result<(), CredentialError> {
        let signature = Signature::from_hex(&self.signature).map_err(|e| {
            CredentialError::VerificationFailed(format!("invalid signature: {}", e))
        })?;
        let public_key = PublicKey::from_verkey(&cred_def.verkey)?;
        verify(&self.signing_payload()?, &signature, &public_key).map_err(|_| {
            CredentialError::VerificationFailed("issuer signature verification failed".into())
        })
    }
}

/// Sign a credential with `values` in answer to `request`.
pub fn issue_credential(
    cred_def: &CredentialDefinition,
    signing_key: &KeyPair,
    offer: &CredentialOffer,
    request: &CredentialRequest,
    values: CredentialValues,
) -> Result<Credential, CredentialError> {
    if offer.cred_def_id != cred_def.id || request.cred_def_id != cred_def.id {
        return Err(CredentialError::OfferMismatch(format!(
            "request for {} does not match offered definition {}",
            request.cred_def_id, cred_def.id
        )));
    }
    if request.nonce != offer.nonce {
        return Err(CredentialError::OfferMismatch(
            "request does not echo the offer nonce".into(),
        ));
    }
    if signing_key.verkey() != cred_def.verkey {
        return Err(CredentialError::IssuanceFailed(
            "signing key does not belong to the credential definition".into(),
        ));
    }
    values.validate_against(&cred_def.attr_names)?;

    let mut credential = Credential {
        schema_id: cred_def.schema_id.clone(),
        cred_def_id: cred_def.id.clone(),
        values,
        blinded_ms: request.blinded_ms.clone(),
        signature: String::new(),
    };
    credential.signature = sign(&credential.signing_payload()?, signing_key).to_hex();

    tracing::info!(
        cred_def_id = %cred_def.id,
        prover = %request.prover_did,
        "credential issued"
    );

    Ok(credential)
}

/// Check a received credential before the holder stores it.
pub fn verify_credential(
    credential: &Credential,
    cred_def: &CredentialDefinition,
    metadata: &CredentialRequestMetadata,
    master_secret: &MasterSecret,
) -> Result<(), CredentialError> {
    if credential.cred_def_id != cred_def.id || metadata.cred_def_id != cred_def.id {
        return Err(CredentialError::VerificationFailed(format!(
            "credential definition mismatch: {} vs {}",
            credential.cred_def_id, cred_def.id
        )));
    }
    if credential.schema_id != cred_def.schema_id {
        return Err(CredentialError::VerificationFailed(
            "schema does not match the credential definition".into(),
        ));
    }
    credential.values.validate_against(&cred_def.attr_names)?;
    credential.verify_signature(cred_def)?;

    let commitment: [u8; 32] = hex::decode(&credential.blinded_ms)
        .ok()
        .and_then(|b| b.try_into().ok())
        .ok_or_else(|| CredentialError::VerificationFailed("malformed commitment".into()))?;
    if !verify_commitment(master_secret.as_bytes(), &metadata.blinding_bytes()?, &commitment) {
        return Err(CredentialError::VerificationFailed(
            "credential is not bound to this master secret".into(),
        ));
    }

    Ok(())
}
