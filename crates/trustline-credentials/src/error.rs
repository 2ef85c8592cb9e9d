/// Credential primitive errors.
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("invalid schema: {0}")]
    InvalidSchema(String),

    #[error("invalid credential definition: {0}")]
    InvalidDefinition(String),

    #[error("unsupported: {0}")]
    Unsupported(String),

    #[error("offer mismatch: {0}")]
    OfferMismatch(String),

    #[error("invalid credential values: {0}")]
    InvalidValues(String),

    #[error("issuance failed: {0}")]
    IssuanceFailed(String),

    #[error("verification failed: {0}")]
    VerificationFailed(String),

    #[error("crypto error: {0}")]
    Crypto(#[from] trustline_crypto::CryptoError),

    #[error("core error: {0}")]
    Core(#[from] trustline_core::CoreError),

    #[error("serialization error: {0}")]
    Serialization(String),
}
