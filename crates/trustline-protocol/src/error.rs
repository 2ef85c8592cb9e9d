use trustline_core::{CoreError, Did, Verkey};
use trustline_credentials::CredentialError;
use trustline_crypto::CryptoError;
use trustline_ledger::LedgerError;
use trustline_wallet::WalletError;

/// Protocol errors.
///
/// Ledger refusals (including `LedgerError::Unauthorized`) are carried
/// unchanged inside [`ProtocolError::Ledger`].
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Wallet or other provisioning target already present.
    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// Echoed nonce differs from the one issued, or the nonce was used before.
    #[error("nonce replay or mismatch: {0}")]
    ReplayOrMismatch(String),

    /// The sender key of an authenticated message is not the key the
    /// ledger holds for the counterparty's DID.
    #[error("identity spoof: {did} resolves to {resolved}, message was sent by {claimed}")]
    IdentitySpoof {
        did: Did,
        resolved: Verkey,
        claimed: Verkey,
    },

    #[error("decryption failed: {0}")]
    Decryption(String),

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("agent {0} has no public DID")]
    NoPublicDid(String),

    #[error("wallet error: {0}")]
    Wallet(WalletError),

    #[error("credential error: {0}")]
    Credential(#[from] CredentialError),

    #[error("core error: {0}")]
    Core(#[from] CoreError),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl ProtocolError {
    /// Whether the ledger refused a write because the submitter lacks the
    /// required role.
    pub fn is_authorization(&self) -> bool {
        matches!(self, Self::Ledger(LedgerError::Unauthorized(_)))
    }
}

impl From<WalletError> for ProtocolError {
    fn from(e: WalletError) -> Self {
        match e {
            WalletError::AlreadyExists(what) => Self::AlreadyExists(what),
            WalletError::Ledger(e) => Self::Ledger(e),
            WalletError::Crypto(CryptoError::DecryptionError(reason)) => Self::Decryption(reason),
            WalletError::Credential(e) => Self::Credential(e),
            other => Self::Wallet(other),
        }
    }
}

impl From<serde_json::Error> for ProtocolError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}
