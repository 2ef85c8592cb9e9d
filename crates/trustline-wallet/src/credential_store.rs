use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use trustline_core::{CredDefId, SchemaId};
use trustline_credentials::Credential;

use crate::error::WalletError;

/// A credential held by a prover together with the master secret it is
/// bound to.
#[derive(Debug, Clone)]
pub(crate) struct StoredCredential {
    pub(crate) credential: Credential,
    pub(crate) master_secret_id: String,
}

/// Summary returned when a prover lists its credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialInfo {
    pub referent: String,
    /// Attribute name → raw value.
    pub attrs: BTreeMap<String, String>,
    pub schema_id: SchemaId,
    pub cred_def_id: CredDefId,
    pub master_secret_id: String,
}

/// Query over stored credentials; unset fields match anything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_id: Option<SchemaId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_issuer_did: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuer_did: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cred_def_id: Option<CredDefId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub master_secret_id: Option<String>,
}

impl CredentialFilter {
    pub fn by_cred_def(cred_def_id: &CredDefId) -> Self {
        Self {
            cred_def_id: Some(cred_def_id.clone()),
            ..Self::default()
        }
    }

    pub fn by_master_secret(master_secret_id: &str) -> Self {
        Self {
            master_secret_id: Some(master_secret_id.to_string()),
            ..Self::default()
        }
    }

    fn matches(&self, stored: &StoredCredential) -> bool {
        let cred = &stored.credential;
        // <did>:2:<name>:<version>
        let schema_parts: Vec<&str> = cred.schema_id.as_str().splitn(4, ':').collect();
        let schema_field = |i: usize| schema_parts.get(i).copied();

        self.schema_id.as_ref().map_or(true, |id| *id == cred.schema_id)
            && self
                .schema_issuer_did
                .as_deref()
                .map_or(true, |did| schema_field(0) == Some(did))
            && self
                .schema_name
                .as_deref()
                .map_or(true, |name| schema_field(2) == Some(name))
            && self
                .schema_version
                .as_deref()
                .map_or(true, |version| schema_field(3) == Some(version))
            && self
                .issuer_did
                .as_deref()
                .map_or(true, |did| cred.cred_def_id.issuer_did() == Some(did))
            && self
                .cred_def_id
                .as_ref()
                .map_or(true, |id| *id == cred.cred_def_id)
            && self
                .master_secret_id
                .as_deref()
                .map_or(true, |ms| stored.master_secret_id == ms)
    }
}

/// Prover-side credential storage keyed by referent.
pub struct CredentialStore {
    credentials: DashMap<String, StoredCredential>,
}

impl CredentialStore {
    pub fn new() -> Self {
        Self {
            credentials: DashMap::new(),
        }
    }

    pub(crate) fn insert(
        &self,
        referent: String,
        stored: StoredCredential,
    ) -> Result<(), WalletError> {
        match self.credentials.entry(referent) {
            Entry::Occupied(e) => Err(WalletError::AlreadyExists(format!(
                "credential {}",
                e.key()
            ))),
            Entry::Vacant(slot) => {
                tracing::debug!(referent = %slot.key(), cred_def_id = %stored.credential.cred_def_id, "credential stored");
                slot.insert(stored);
                Ok(())
            }
        }
    }

    pub fn get(&self, referent: &str) -> Option<CredentialInfo> {
        self.credentials
            .get(referent)
            .map(|e| info(e.key(), e.value()))
    }

    /// Full credential by referent.
    pub fn credential(&self, referent: &str) -> Option<Credential> {
        self.credentials
            .get(referent)
            .map(|e| e.value().credential.clone())
    }

    pub fn search(&self, filter: &CredentialFilter) -> Vec<CredentialInfo> {
        let mut found: Vec<CredentialInfo> = self
            .credentials
            .iter()
            .filter(|e| filter.matches(e.value()))
            .map(|e| info(e.key(), e.value()))
            .collect();
        found.sort_by(|a, b| a.referent.cmp(&b.referent));
        found
    }

    pub fn remove(&self, referent: &str) -> bool {
        self.credentials.remove(referent).is_some()
    }

    pub fn count(&self) -> usize {
        self.credentials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }
}

impl Default for CredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

fn info(referent: &str, stored: &StoredCredential) -> CredentialInfo {
    CredentialInfo {
        referent: referent.to_string(),
        attrs: stored
            .credential
            .values
            .iter()
            .map(|(name, value)| (name.clone(), value.raw.clone()))
            .collect(),
        schema_id: stored.credential.schema_id.clone(),
        cred_def_id: stored.credential.cred_def_id.clone(),
        master_secret_id: stored.master_secret_id.clone(),
    }
}
