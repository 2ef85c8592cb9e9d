//! Issuer and prover credential operations backed by wallet storage.

use dashmap::mapref::entry::Entry;

use trustline_core::{CredDefId, Did};
use trustline_credentials::{
    create_credential_definition, create_offer, create_request, issue_credential,
    verify_credential, Credential, CredentialDefinition, CredentialDefinitionConfig,
    CredentialOffer, CredentialRequest, CredentialRequestMetadata, CredentialValues,
    MasterSecret, Schema, SignatureType,
};

use crate::credential_store::{CredentialFilter, CredentialInfo, StoredCredential};
use crate::error::WalletError;
use crate::wallet::Wallet;

/// Build a schema owned by `issuer`. Pure; nothing is stored.
pub fn issuer_create_schema(
    issuer: &Did,
    name: &str,
    version: &str,
    attr_names: &[&str],
) -> Result<Schema, WalletError> {
    Ok(Schema::new(issuer, name, version, attr_names)?)
}

impl Wallet {
    /// Create a credential definition owned by one of this wallet's DIDs
    /// and keep its signing key.
    pub fn issuer_create_and_store_credential_def(
        &self,
        issuer: &Did,
        schema: &Schema,
        tag: &str,
        signature_type: SignatureType,
        config: &CredentialDefinitionConfig,
    ) -> Result<CredentialDefinition, WalletError> {
        if self.my_did(issuer).is_none() {
            return Err(WalletError::UnknownDid(issuer.clone()));
        }
        let (definition, signing_key) =
            create_credential_definition(issuer, schema, tag, signature_type, config)?;

        match self.inner.cred_defs.entry(definition.id.clone()) {
            Entry::Occupied(_) => {
                return Err(WalletError::AlreadyExists(format!(
                    "credential definition {}",
                    definition.id
                )))
            }
            Entry::Vacant(slot) => {
                slot.insert(definition.clone());
            }
        }
        self.inner
            .cred_def_keys
            .insert(definition.id.clone(), signing_key);

        tracing::info!(wallet = %self.inner.id, cred_def_id = %definition.id, "credential definition stored");
        Ok(definition)
    }

    pub fn credential_definition(&self, id: &CredDefId) -> Option<CredentialDefinition> {
        self.inner.cred_defs.get(id).map(|d| d.value().clone())
    }

    /// Offer a credential under a definition held by this wallet.
    pub fn issuer_create_credential_offer(
        &self,
        cred_def_id: &CredDefId,
    ) -> Result<CredentialOffer, WalletError> {
        let definition = self
            .credential_definition(cred_def_id)
            .ok_or_else(|| WalletError::NotFound(format!("credential definition {}", cred_def_id)))?;
        Ok(create_offer(&definition))
    }

    /// Create a master secret. A caller-supplied id that is already in use
    /// fails with `AlreadyExists`; without one a fresh id is generated.
    pub fn prover_create_master_secret(&self, id: Option<&str>) -> Result<String, WalletError> {
        let id = id
            .map(str::to_string)
            .unwrap_or_else(|| uuid::Uuid::now_v7().to_string());
        match self.inner.master_secrets.entry(id.clone()) {
            Entry::Occupied(_) => Err(WalletError::AlreadyExists(format!("master secret {}", id))),
            Entry::Vacant(slot) => {
                slot.insert(MasterSecret::generate());
                tracing::debug!(wallet = %self.inner.id, master_secret_id = %id, "master secret created");
                Ok(id)
            }
        }
    }

    pub fn has_master_secret(&self, id: &str) -> bool {
        self.inner.master_secrets.contains_key(id)
    }

    fn master_secret(&self, id: &str) -> Result<MasterSecret, WalletError> {
        self.inner
            .master_secrets
            .get(id)
            .map(|ms| ms.value().clone())
            .ok_or_else(|| WalletError::NotFound(format!("master secret {}", id)))
    }

    /// Answer an offer, blinding the named master secret.
    pub fn prover_create_credential_req(
        &self,
        prover_did: &Did,
        offer: &CredentialOffer,
        cred_def: &CredentialDefinition,
        master_secret_id: &str,
    ) -> Result<(CredentialRequest, CredentialRequestMetadata), WalletError> {
        let master_secret = self.master_secret(master_secret_id)?;
        Ok(create_request(
            prover_did,
            offer,
            cred_def,
            &master_secret,
            master_secret_id,
        )?)
    }

    /// Sign a credential under a definition held by this wallet.
    pub fn issuer_create_credential(
        &self,
        offer: &CredentialOffer,
        request: &CredentialRequest,
        values: CredentialValues,
    ) -> Result<Credential, WalletError> {
        let definition = self
            .credential_definition(&offer.cred_def_id)
            .ok_or_else(|| {
                WalletError::NotFound(format!("credential definition {}", offer.cred_def_id))
            })?;
        let key = self
            .inner
            .cred_def_keys
            .get(&offer.cred_def_id)
            .ok_or_else(|| WalletError::NotFound(format!("signing key for {}", offer.cred_def_id)))?;
        Ok(issue_credential(
            &definition,
            key.value(),
            offer,
            request,
            values,
        )?)
    }

    /// Verify a received credential and store it. Returns its referent.
    pub fn prover_store_credential(
        &self,
        referent: Option<&str>,
        metadata: &CredentialRequestMetadata,
        credential: Credential,
        cred_def: &CredentialDefinition,
    ) -> Result<String, WalletError> {
        let master_secret = self.master_secret(&metadata.master_secret_id)?;
        verify_credential(&credential, cred_def, metadata, &master_secret)?;

        let referent = referent
            .map(str::to_string)
            .unwrap_or_else(|| uuid::Uuid::now_v7().to_string());
        self.inner.credentials.insert(
            referent.clone(),
            StoredCredential {
                credential,
                master_secret_id: metadata.master_secret_id.clone(),
            },
        )?;
        Ok(referent)
    }

    pub fn prover_get_credentials(&self, filter: &CredentialFilter) -> Vec<CredentialInfo> {
        self.inner.credentials.search(filter)
    }

    pub fn prover_get_credential(&self, referent: &str) -> Result<CredentialInfo, WalletError> {
        self.inner
            .credentials
            .get(referent)
            .ok_or_else(|| WalletError::NotFound(format!("credential {}", referent)))
    }
}
