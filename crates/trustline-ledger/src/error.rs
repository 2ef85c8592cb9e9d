use trustline_core::Did;

/// Ledger client errors.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// Submitter lacks the role the write requires.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("already registered: {0}")]
    AlreadyRegistered(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("unknown submitter: {0}")]
    UnknownSubmitter(Did),

    #[error("request signature does not verify against the submitter's verkey")]
    InvalidSignature,

    #[error("duplicate request: {0}")]
    DuplicateRequest(String),

    #[error("protocol version mismatch: pool speaks {expected}, request uses {actual}")]
    ProtocolVersionMismatch { expected: u8, actual: u8 },

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("crypto error: {0}")]
    Crypto(#[from] trustline_crypto::CryptoError),
}

impl LedgerError {
    /// Whether the ledger refused the write for lack of role.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized(_))
    }
}
