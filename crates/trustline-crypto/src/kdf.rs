use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};

use crate::error::CryptoError;

/// Hash a wallet key with Argon2id, returning the PHC string to store.
pub fn hash_secret(secret: &[u8]) -> Result<String, CryptoError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(secret, &salt)
        .map_err(|e| CryptoError::KeyDerivationError(format!("argon2 hash failed: {}", e)))?;
    Ok(hash.to_string())
}

/// Check a wallet key against a stored Argon2id PHC string.
pub fn verify_secret(secret: &[u8], phc: &str) -> Result<bool, CryptoError> {
    let parsed = PasswordHash::new(phc)
        .map_err(|e| CryptoError::KeyDerivationError(format!("invalid hash format: {}", e)))?;

    match Argon2::default().verify_password(secret, &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(CryptoError::KeyDerivationError(format!(
            "verification error: {}",
            e
        ))),
    }
}
