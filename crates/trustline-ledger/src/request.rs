use serde::{Deserialize, Serialize};
use std::fmt;

use trustline_core::{Did, Role, Verkey};
use trustline_credentials::{CredentialDefinition, Schema};
use trustline_crypto::{sign, KeyPair, Signature};

use crate::error::LedgerError;

/// Protocol version stamped on requests unless overridden.
pub const DEFAULT_PROTOCOL_VERSION: u8 = 2;

/// Ledger transaction types, with their wire codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TxnType {
    #[serde(rename = "1")]
    Nym,
    #[serde(rename = "101")]
    Schema,
    #[serde(rename = "102")]
    CredDef,
}

impl fmt::Display for TxnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nym => write!(f, "NYM"),
            Self::Schema => write!(f, "SCHEMA"),
            Self::CredDef => write!(f, "CRED_DEF"),
        }
    }
}

/// Write operation carried by a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Operation {
    Nym {
        dest: Did,
        #[serde(skip_serializing_if = "Option::is_none")]
        verkey: Option<Verkey>,
        /// `None` leaves an existing role untouched; new NYMs default to USER.
        #[serde(skip_serializing_if = "Option::is_none")]
        role: Option<Role>,
    },
    Schema {
        data: Schema,
    },
    CredDef {
        data: CredentialDefinition,
    },
}

impl Operation {
    pub fn txn_type(&self) -> TxnType {
        match self {
            Self::Nym { .. } => TxnType::Nym,
            Self::Schema { .. } => TxnType::Schema,
            Self::CredDef { .. } => TxnType::CredDef,
        }
    }
}

/// Unsigned ledger write request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerRequest {
    /// Unique per request; the ledger refuses to apply one twice.
    pub req_id: String,
    /// Submitter DID.
    pub identifier: Did,
    pub operation: Operation,
    pub protocol_version: u8,
}

impl LedgerRequest {
    pub fn new(identifier: &Did, operation: Operation) -> Self {
        Self {
            req_id: uuid::Uuid::now_v7().to_string(),
            identifier: identifier.clone(),
            operation,
            protocol_version: DEFAULT_PROTOCOL_VERSION,
        }
    }

    pub fn with_protocol_version(mut self, version: u8) -> Self {
        self.protocol_version = version;
        self
    }

    /// Canonical bytes covered by the submitter's signature.
    pub fn signing_payload(&self) -> Result<Vec<u8>, LedgerError> {
        serde_json::to_vec(self).map_err(|e| LedgerError::Serialization(e.to_string()))
    }

    /// Sign with the submitter's key.
    pub fn sign(self, keypair: &KeyPair) -> Result<SignedRequest, LedgerError> {
        if keypair.did() != self.identifier {
            return Err(LedgerError::InvalidRequest(format!(
                "key for {} cannot sign on behalf of {}",
                keypair.did(),
                self.identifier
            )));
        }
        let signature = sign(&self.signing_payload()?, keypair);
        Ok(SignedRequest {
            request: self,
            signature: signature.to_hex(),
        })
    }
}

/// Request plus submitter signature, ready for [`crate::Ledger::submit`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedRequest {
    pub request: LedgerRequest,
    /// Hex Ed25519 signature over the request's signing payload.
    pub signature: String,
}

impl SignedRequest {
    pub fn signature(&self) -> Result<Signature, LedgerError> {
        Ok(Signature::from_hex(&self.signature)?)
    }
}

/// Register `dest` with `verkey`, optionally assigning `role`.
pub fn build_nym_request(
    submitter: &Did,
    dest: &Did,
    verkey: Option<&Verkey>,
    role: Option<Role>,
) -> LedgerRequest {
    LedgerRequest::new(
        submitter,
        Operation::Nym {
            dest: dest.clone(),
            verkey: verkey.cloned(),
            role,
        },
    )
}

pub fn build_schema_request(submitter: &Did, schema: &Schema) -> LedgerRequest {
    LedgerRequest::new(
        submitter,
        Operation::Schema {
            data: schema.clone(),
        },
    )
}

pub fn build_cred_def_request(submitter: &Did, cred_def: &CredentialDefinition) -> LedgerRequest {
    LedgerRequest::new(
        submitter,
        Operation::CredDef {
            data: cred_def.clone(),
        },
    )
}
