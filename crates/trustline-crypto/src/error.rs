/// Cryptographic operation errors.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    #[error("invalid seed: {0}")]
    InvalidSeed(String),

    #[error("signature verification failed")]
    SignatureVerificationFailed,

    #[error("encryption failed: {0}")]
    EncryptionError(String),

    #[error("decryption failed: {0}")]
    DecryptionError(String),

    #[error("key derivation failed: {0}")]
    KeyDerivationError(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl From<trustline_core::CoreError> for CryptoError {
    fn from(e: trustline_core::CoreError) -> Self {
        Self::InvalidInput(e.to_string())
    }
}
