use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use trustline_core::{CredDefId, Did, Verkey};
use trustline_credentials::{CredentialDefinition, MasterSecret};
use trustline_crypto::{KeyPair, PublicKey};
use trustline_ledger::{Ledger, LedgerRequest, SignedRequest};

use crate::credential_store::CredentialStore;
use crate::error::WalletError;

/// Options for [`Wallet::create_and_store_my_did`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DidInfo {
    /// 32-character seed; makes the identity deterministic.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<String>,
}

impl DidInfo {
    pub fn random() -> Self {
        Self::default()
    }

    pub fn from_seed(seed: impl Into<String>) -> Self {
        Self {
            seed: Some(seed.into()),
        }
    }
}

/// A DID owned by this wallet and its verkey.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocalIdentity {
    pub did: Did,
    pub verkey: Verkey,
}

pub(crate) struct WalletInner {
    pub(crate) id: String,
    /// Verkey → key pair. Never leaves the wallet.
    pub(crate) keys: DashMap<Verkey, KeyPair>,
    pub(crate) my_dids: DashMap<Did, LocalIdentity>,
    /// Counterparty keys learned from the ledger or stored explicitly.
    pub(crate) their_keys: DashMap<Did, Verkey>,
    pub(crate) master_secrets: DashMap<String, MasterSecret>,
    pub(crate) cred_defs: DashMap<CredDefId, CredentialDefinition>,
    /// Signing keys of the definitions in `cred_defs`.
    pub(crate) cred_def_keys: DashMap<CredDefId, KeyPair>,
    pub(crate) credentials: CredentialStore,
}

/// Handle to an opened wallet. Clones share the same contents.
#[derive(Clone)]
pub struct Wallet {
    pub(crate) inner: Arc<WalletInner>,
}

impl Wallet {
    pub(crate) fn new(id: &str) -> Self {
        Self {
            inner: Arc::new(WalletInner {
                id: id.to_string(),
                keys: DashMap::new(),
                my_dids: DashMap::new(),
                their_keys: DashMap::new(),
                master_secrets: DashMap::new(),
                cred_defs: DashMap::new(),
                cred_def_keys: DashMap::new(),
                credentials: CredentialStore::new(),
            }),
        }
    }

    pub fn id(&self) -> &str {
        &self.inner.id
    }

    /// Create a key pair and the DID derived from it.
    ///
    /// Re-creating a seeded identity that already exists returns it as is.
    pub fn create_and_store_my_did(&self, info: DidInfo) -> Result<LocalIdentity, WalletError> {
        let keypair = match info.seed.as_deref() {
            Some(seed) => KeyPair::from_seed_str(seed)?,
            None => KeyPair::generate(),
        };
        let identity = LocalIdentity {
            did: keypair.did(),
            verkey: keypair.verkey(),
        };

        if let Some(existing) = self.inner.my_dids.get(&identity.did) {
            return Ok(existing.value().clone());
        }

        self.inner.keys.insert(identity.verkey.clone(), keypair);
        self.inner
            .my_dids
            .insert(identity.did.clone(), identity.clone());

        tracing::debug!(wallet = %self.inner.id, did = %identity.did, "local DID created");
        Ok(identity)
    }

    pub fn my_did(&self, did: &Did) -> Option<LocalIdentity> {
        self.inner.my_dids.get(did).map(|e| e.value().clone())
    }

    pub fn list_my_dids(&self) -> Vec<LocalIdentity> {
        self.inner.my_dids.iter().map(|e| e.value().clone()).collect()
    }

    /// Remember a counterparty's verkey.
    pub fn store_their_did(&self, did: &Did, verkey: &Verkey) {
        self.inner.their_keys.insert(did.clone(), verkey.clone());
    }

    /// Verkey for `did` from wallet contents only.
    pub fn key_for_local_did(&self, did: &Did) -> Result<Verkey, WalletError> {
        if let Some(identity) = self.inner.my_dids.get(did) {
            return Ok(identity.verkey.clone());
        }
        self.inner
            .their_keys
            .get(did)
            .map(|v| v.value().clone())
            .ok_or_else(|| WalletError::NotFound(format!("verkey for {}", did)))
    }

    /// Verkey for `did`: own DIDs first, then cached counterparty keys, then
    /// the ledger. Ledger answers are cached.
    pub async fn key_for_did(&self, ledger: &dyn Ledger, did: &Did) -> Result<Verkey, WalletError> {
        if let Ok(verkey) = self.key_for_local_did(did) {
            tracing::debug!(did = %did, "verkey resolved from wallet");
            return Ok(verkey);
        }
        let nym = ledger.get_nym(did).await?;
        self.inner.their_keys.insert(did.clone(), nym.verkey.clone());
        tracing::debug!(did = %did, "verkey resolved from ledger");
        Ok(nym.verkey)
    }

    /// Resolve `did` on the ledger, ignoring any cached value, and refresh
    /// the cache.
    pub async fn refresh_key_for_did(
        &self,
        ledger: &dyn Ledger,
        did: &Did,
    ) -> Result<Verkey, WalletError> {
        let nym = ledger.get_nym(did).await?;
        if !self.inner.my_dids.contains_key(did) {
            self.inner.their_keys.insert(did.clone(), nym.verkey.clone());
        }
        Ok(nym.verkey)
    }

    fn with_key<T>(
        &self,
        verkey: &Verkey,
        f: impl FnOnce(&KeyPair) -> Result<T, WalletError>,
    ) -> Result<T, WalletError> {
        let key = self
            .inner
            .keys
            .get(verkey)
            .ok_or_else(|| WalletError::UnknownKey(verkey.clone()))?;
        f(key.value())
    }

    /// Decrypt an anonymous envelope addressed to `my_verkey`.
    pub fn anon_decrypt(&self, my_verkey: &Verkey, ciphertext: &[u8]) -> Result<Vec<u8>, WalletError> {
        self.with_key(my_verkey, |kp| {
            Ok(trustline_crypto::anon_decrypt(kp, ciphertext)?)
        })
    }

    /// Encrypt from `my_verkey` to `their_verkey`, authenticating the sender.
    pub fn auth_crypt(
        &self,
        my_verkey: &Verkey,
        their_verkey: &Verkey,
        message: &[u8],
    ) -> Result<Vec<u8>, WalletError> {
        let recipient = PublicKey::from_verkey(their_verkey)?;
        self.with_key(my_verkey, |kp| {
            Ok(trustline_crypto::auth_crypt(kp, &recipient, message)?)
        })
    }

    /// Decrypt an authenticated envelope, returning the sender's verkey.
    pub fn auth_decrypt(
        &self,
        my_verkey: &Verkey,
        ciphertext: &[u8],
    ) -> Result<(Verkey, Vec<u8>), WalletError> {
        self.with_key(my_verkey, |kp| {
            let (sender, plaintext) = trustline_crypto::auth_decrypt(kp, ciphertext)?;
            Ok((sender.to_verkey(), plaintext))
        })
    }

    /// Sign a ledger request with the key of its submitter DID.
    pub fn sign_request(&self, request: LedgerRequest) -> Result<SignedRequest, WalletError> {
        let identity = self
            .my_did(&request.identifier)
            .ok_or_else(|| WalletError::UnknownDid(request.identifier.clone()))?;
        self.with_key(&identity.verkey, |kp| Ok(request.sign(kp)?))
    }
}

/// Encrypt `message` for `recipient` without revealing the sender.
pub fn anon_crypt(recipient: &Verkey, message: &[u8]) -> Result<Vec<u8>, WalletError> {
    let recipient = PublicKey::from_verkey(recipient)?;
    Ok(trustline_crypto::anon_crypt(&recipient, message)?)
}
