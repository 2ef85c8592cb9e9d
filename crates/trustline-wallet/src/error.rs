use trustline_core::{Did, Verkey};

/// Wallet errors.
#[derive(Debug, thiserror::Error)]
pub enum WalletError {
    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("access denied to wallet {0}")]
    AccessDenied(String),

    #[error("DID {0} is not owned by this wallet")]
    UnknownDid(Did),

    #[error("no key for verkey {0} in this wallet")]
    UnknownKey(Verkey),

    #[error("crypto error: {0}")]
    Crypto(#[from] trustline_crypto::CryptoError),

    #[error("credential error: {0}")]
    Credential(#[from] trustline_credentials::CredentialError),

    #[error("ledger error: {0}")]
    Ledger(#[from] trustline_ledger::LedgerError),

    #[error("core error: {0}")]
    Core(#[from] trustline_core::CoreError),
}
