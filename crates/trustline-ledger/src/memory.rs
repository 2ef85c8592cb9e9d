use async_trait::async_trait;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::{DashMap, DashSet};
use std::sync::atomic::{AtomicU64, Ordering};

use trustline_core::{CredDefId, Did, PoolConfig, Role, SchemaId, Verkey};
use trustline_credentials::{CredentialDefinition, Schema};
use trustline_crypto::{verify, PublicKey};

use crate::error::LedgerError;
use crate::ledger::{Ledger, NymRecord, Transaction, TransactionReceipt};
use crate::request::{Operation, SignedRequest};

/// Single-process permissioned ledger.
///
/// Starts from genesis NYMs (normally the pool's stewards), verifies every
/// request signature against the submitter's registered verkey and applies
/// the role rules:
///
/// - any write requires the submitter to hold `TRUST_ANCHOR` or `TRUST_STEWARD`,
/// - a NYM can only grant a role the submitter could grant,
/// - a registered DID's verkey can only be changed by the DID itself,
/// - schemas and credential definitions are immutable.
pub struct InMemoryLedger {
    pool: PoolConfig,
    nyms: DashMap<Did, NymRecord>,
    schemas: DashMap<SchemaId, Schema>,
    cred_defs: DashMap<CredDefId, CredentialDefinition>,
    seen_requests: DashSet<String>,
    log: DashMap<u64, Transaction>,
    next_seq_no: AtomicU64,
}

impl InMemoryLedger {
    pub fn new(pool: PoolConfig) -> Self {
        Self {
            pool,
            nyms: DashMap::new(),
            schemas: DashMap::new(),
            cred_defs: DashMap::new(),
            seen_requests: DashSet::new(),
            log: DashMap::new(),
            next_seq_no: AtomicU64::new(1),
        }
    }

    /// Write a NYM without a submitter, as the pool's genesis file would.
    pub fn add_genesis_nym(&self, did: Did, verkey: Verkey, role: Role) -> u64 {
        let seq_no = self.record(
            None,
            None,
            Operation::Nym {
                dest: did.clone(),
                verkey: Some(verkey.clone()),
                role: Some(role),
            },
        );
        self.nyms.insert(
            did.clone(),
            NymRecord {
                did: did.clone(),
                verkey,
                role,
                endorser: None,
                seq_no,
            },
        );
        tracing::info!(did = %did, role = %role, seq_no, "genesis NYM added");
        seq_no
    }

    /// Ordered copy of the transaction log.
    pub fn transactions(&self) -> Vec<Transaction> {
        let mut txns: Vec<Transaction> = self.log.iter().map(|e| e.value().clone()).collect();
        txns.sort_by_key(|t| t.seq_no);
        txns
    }

    /// Number of transactions written, genesis included.
    pub fn transaction_count(&self) -> usize {
        self.log.len()
    }

    /// Number of NYM transactions written.
    pub fn nym_write_count(&self) -> usize {
        self.log
            .iter()
            .filter(|e| matches!(e.value().operation, Operation::Nym { .. }))
            .count()
    }

    pub fn nym_count(&self) -> usize {
        self.nyms.len()
    }

    fn record(&self, submitter: Option<Did>, req_id: Option<String>, operation: Operation) -> u64 {
        let seq_no = self.next_seq_no.fetch_add(1, Ordering::SeqCst);
        self.log.insert(
            seq_no,
            Transaction {
                seq_no,
                submitter,
                req_id,
                operation,
                txn_time: Utc::now(),
            },
        );
        seq_no
    }

    /// Check pool version, replay, submitter and signature.
    fn authenticate(&self, signed: &SignedRequest) -> Result<NymRecord, LedgerError> {
        let request = &signed.request;
        if request.protocol_version != self.pool.protocol_version {
            return Err(LedgerError::ProtocolVersionMismatch {
                expected: self.pool.protocol_version,
                actual: request.protocol_version,
            });
        }

        let submitter = self
            .nyms
            .get(&request.identifier)
            .map(|r| r.value().clone())
            .ok_or_else(|| LedgerError::UnknownSubmitter(request.identifier.clone()))?;

        let public_key = PublicKey::from_verkey(&submitter.verkey)?;
        verify(&request.signing_payload()?, &signed.signature()?, &public_key)
            .map_err(|_| LedgerError::InvalidSignature)?;

        if !self.seen_requests.insert(request.req_id.clone()) {
            return Err(LedgerError::DuplicateRequest(request.req_id.clone()));
        }

        Ok(submitter)
    }

    fn apply_nym(
        &self,
        submitter: &NymRecord,
        dest: &Did,
        verkey: Option<&Verkey>,
        role: Option<Role>,
    ) -> Result<(), LedgerError> {
        let is_self = submitter.did == *dest;
        if !is_self && !submitter.role.can_write() {
            return Err(LedgerError::Unauthorized(format!(
                "{} with role {} cannot write NYMs",
                submitter.did, submitter.role
            )));
        }
        if let Some(role) = role {
            if !submitter.role.can_grant(role) {
                return Err(LedgerError::Unauthorized(format!(
                    "{} with role {} cannot grant {}",
                    submitter.did, submitter.role, role
                )));
            }
        }

        match self.nyms.entry(dest.clone()) {
            Entry::Occupied(mut existing) => {
                let record = existing.get_mut();
                if let Some(verkey) = verkey {
                    if *verkey != record.verkey {
                        if !is_self {
                            return Err(LedgerError::AlreadyRegistered(format!(
                                "{} is registered with a different verkey",
                                dest
                            )));
                        }
                        record.verkey = verkey.clone();
                    }
                }
                if let Some(role) = role {
                    record.role = role;
                }
                Ok(())
            }
            Entry::Vacant(slot) => {
                let verkey = verkey.cloned().ok_or_else(|| {
                    LedgerError::InvalidRequest(format!("new NYM {} needs a verkey", dest))
                })?;
                slot.insert(NymRecord {
                    did: dest.clone(),
                    verkey,
                    role: role.unwrap_or_default(),
                    endorser: Some(submitter.did.clone()),
                    seq_no: 0,
                });
                Ok(())
            }
        }
    }

    fn apply_schema(&self, submitter: &NymRecord, schema: &Schema) -> Result<Schema, LedgerError> {
        if !submitter.role.can_write() {
            return Err(LedgerError::Unauthorized(format!(
                "{} with role {} cannot write schemas",
                submitter.did, submitter.role
            )));
        }
        if schema.id != SchemaId::build(&submitter.did, &schema.name, &schema.version) {
            return Err(LedgerError::InvalidRequest(format!(
                "schema id {} does not belong to {}",
                schema.id, submitter.did
            )));
        }
        match self.schemas.entry(schema.id.clone()) {
            Entry::Occupied(_) => Err(LedgerError::AlreadyRegistered(schema.id.to_string())),
            Entry::Vacant(slot) => {
                let stored = slot.insert(schema.clone());
                Ok(stored.value().clone())
            }
        }
    }

    fn apply_cred_def(
        &self,
        submitter: &NymRecord,
        cred_def: &CredentialDefinition,
    ) -> Result<(), LedgerError> {
        if !submitter.role.can_write() {
            return Err(LedgerError::Unauthorized(format!(
                "{} with role {} cannot write credential definitions",
                submitter.did, submitter.role
            )));
        }
        if cred_def.issuer_did() != Some(submitter.did.as_str()) {
            return Err(LedgerError::InvalidRequest(format!(
                "credential definition {} does not belong to {}",
                cred_def.id, submitter.did
            )));
        }
        let schema = self
            .schemas
            .get(&cred_def.schema_id)
            .map(|s| s.value().clone())
            .ok_or_else(|| LedgerError::NotFound(format!("schema {}", cred_def.schema_id)))?;
        if schema.attr_names != cred_def.attr_names {
            return Err(LedgerError::InvalidRequest(format!(
                "attributes of {} do not match schema {}",
                cred_def.id, schema.id
            )));
        }
        match self.cred_defs.entry(cred_def.id.clone()) {
            Entry::Occupied(_) => Err(LedgerError::AlreadyRegistered(cred_def.id.to_string())),
            Entry::Vacant(slot) => {
                slot.insert(cred_def.clone());
                Ok(())
            }
        }
    }
}

#[async_trait]
impl Ledger for InMemoryLedger {
    fn pool(&self) -> &PoolConfig {
        &self.pool
    }

    async fn submit(&self, signed: SignedRequest) -> Result<TransactionReceipt, LedgerError> {
        let submitter = self.authenticate(&signed).map_err(|e| {
            tracing::warn!(
                submitter = %signed.request.identifier,
                req_id = %signed.request.req_id,
                error = %e,
                "request rejected"
            );
            e
        })?;

        let request = signed.request;
        let txn_type = request.operation.txn_type();

        let applied = match &request.operation {
            Operation::Nym { dest, verkey, role } => {
                self.apply_nym(&submitter, dest, verkey.as_ref(), *role)
            }
            Operation::Schema { data } => self.apply_schema(&submitter, data).map(|_| ()),
            Operation::CredDef { data } => self.apply_cred_def(&submitter, data),
        };
        if let Err(e) = applied {
            tracing::warn!(
                submitter = %submitter.did,
                txn_type = %txn_type,
                error = %e,
                "write refused"
            );
            return Err(e);
        }

        let seq_no = self.record(
            Some(submitter.did.clone()),
            Some(request.req_id.clone()),
            request.operation.clone(),
        );
        match &request.operation {
            Operation::Nym { dest, .. } => {
                if let Some(mut record) = self.nyms.get_mut(dest) {
                    record.seq_no = seq_no;
                }
            }
            Operation::Schema { data } => {
                if let Some(mut schema) = self.schemas.get_mut(&data.id) {
                    schema.seq_no = Some(seq_no);
                }
            }
            Operation::CredDef { .. } => {}
        }

        tracing::info!(
            submitter = %submitter.did,
            txn_type = %txn_type,
            seq_no,
            "transaction written"
        );

        Ok(TransactionReceipt {
            seq_no,
            txn_type,
            req_id: request.req_id,
            txn_time: Utc::now(),
        })
    }

    async fn get_nym(&self, did: &Did) -> Result<NymRecord, LedgerError> {
        self.nyms
            .get(did)
            .map(|r| r.value().clone())
            .ok_or_else(|| LedgerError::NotFound(format!("NYM {}", did)))
    }

    async fn get_schema(&self, id: &SchemaId) -> Result<Schema, LedgerError> {
        self.schemas
            .get(id)
            .map(|s| s.value().clone())
            .ok_or_else(|| LedgerError::NotFound(format!("schema {}", id)))
    }

    async fn get_cred_def(&self, id: &CredDefId) -> Result<CredentialDefinition, LedgerError> {
        self.cred_defs
            .get(id)
            .map(|d| d.value().clone())
            .ok_or_else(|| LedgerError::NotFound(format!("credential definition {}", id)))
    }
}
