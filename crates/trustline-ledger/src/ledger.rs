use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use trustline_core::{CredDefId, Did, PoolConfig, Role, SchemaId, Verkey};
use trustline_credentials::{CredentialDefinition, Schema};

use crate::error::LedgerError;
use crate::request::{Operation, SignedRequest, TxnType};

/// Ledger view of a DID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NymRecord {
    pub did: Did,
    pub verkey: Verkey,
    pub role: Role,
    /// DID that wrote the record; `None` for genesis entries.
    pub endorser: Option<Did>,
    pub seq_no: u64,
}

/// Result of an accepted write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionReceipt {
    pub seq_no: u64,
    pub txn_type: TxnType,
    pub req_id: String,
    pub txn_time: DateTime<Utc>,
}

/// Entry in the ledger's ordered transaction log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub seq_no: u64,
    pub submitter: Option<Did>,
    pub req_id: Option<String>,
    pub operation: Operation,
    pub txn_time: DateTime<Utc>,
}

/// Ledger client operations the protocol relies on.
///
/// Writes are not idempotent: resubmitting a NYM for a registered DID is a
/// new (possibly role-changing) transaction.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Pool this client is connected to.
    fn pool(&self) -> &PoolConfig;

    /// Submit a signed write.
    async fn submit(&self, request: SignedRequest) -> Result<TransactionReceipt, LedgerError>;

    /// Resolve a DID to its current verkey and role.
    async fn get_nym(&self, did: &Did) -> Result<NymRecord, LedgerError>;

    async fn get_schema(&self, id: &SchemaId) -> Result<Schema, LedgerError>;

    async fn get_cred_def(&self, id: &CredDefId) -> Result<CredentialDefinition, LedgerError>;
}
