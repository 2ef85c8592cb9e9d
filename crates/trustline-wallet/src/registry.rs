use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use trustline_core::{WalletConfig, WalletCredentials};
use trustline_crypto::{hash_secret, verify_secret};

use crate::error::WalletError;
use crate::wallet::Wallet;

struct StoredWallet {
    /// Argon2 PHC string of the wallet key.
    key_hash: String,
    wallet: Wallet,
}

/// Process-wide set of provisioned wallets, keyed by wallet id.
pub struct WalletRegistry {
    wallets: DashMap<String, StoredWallet>,
}

impl WalletRegistry {
    pub fn new() -> Self {
        Self {
            wallets: DashMap::new(),
        }
    }

    /// Provision a wallet. Fails with `AlreadyExists` if the id is taken,
    /// leaving the existing wallet untouched.
    pub fn create_wallet(
        &self,
        config: &WalletConfig,
        credentials: &WalletCredentials,
    ) -> Result<(), WalletError> {
        if self.wallets.contains_key(&config.id) {
            return Err(WalletError::AlreadyExists(format!("wallet {}", config.id)));
        }
        let key_hash = hash_secret(credentials.key.as_bytes())?;

        match self.wallets.entry(config.id.clone()) {
            Entry::Occupied(_) => Err(WalletError::AlreadyExists(format!("wallet {}", config.id))),
            Entry::Vacant(slot) => {
                slot.insert(StoredWallet {
                    key_hash,
                    wallet: Wallet::new(&config.id),
                });
                tracing::info!(wallet = %config.id, "wallet created");
                Ok(())
            }
        }
    }

    /// Open a wallet, checking its key. Handles returned by repeated opens
    /// share the same contents.
    pub fn open_wallet(
        &self,
        config: &WalletConfig,
        credentials: &WalletCredentials,
    ) -> Result<Wallet, WalletError> {
        let (key_hash, wallet) = {
            let stored = self
                .wallets
                .get(&config.id)
                .ok_or_else(|| WalletError::NotFound(format!("wallet {}", config.id)))?;
            (stored.key_hash.clone(), stored.wallet.clone())
        };
        if !verify_secret(credentials.key.as_bytes(), &key_hash)? {
            tracing::warn!(wallet = %config.id, "wallet open refused: wrong key");
            return Err(WalletError::AccessDenied(config.id.clone()));
        }
        tracing::debug!(wallet = %config.id, "wallet opened");
        Ok(wallet)
    }

    /// Remove a wallet after checking its key.
    pub fn delete_wallet(
        &self,
        config: &WalletConfig,
        credentials: &WalletCredentials,
    ) -> Result<(), WalletError> {
        self.open_wallet(config, credentials)?;
        self.wallets.remove(&config.id);
        tracing::info!(wallet = %config.id, "wallet deleted");
        Ok(())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.wallets.contains_key(id)
    }

    pub fn count(&self) -> usize {
        self.wallets.len()
    }
}

impl Default for WalletRegistry {
    fn default() -> Self {
        Self::new()
    }
}
