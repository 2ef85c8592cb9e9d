use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies a wallet in the local wallet registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WalletConfig {
    /// Wallet name; also its storage key.
    pub id: String,
}

impl WalletConfig {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// Secret used to open a wallet.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletCredentials {
    pub key: String,
}

impl WalletCredentials {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

impl fmt::Debug for WalletCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletCredentials")
            .field("key", &"<redacted>")
            .finish()
    }
}

/// Connection settings for a ledger pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Pool name.
    pub name: String,
    /// Protocol version stamped on every ledger request.
    pub protocol_version: u8,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            name: "pool1".into(),
            protocol_version: 2,
        }
    }
}
