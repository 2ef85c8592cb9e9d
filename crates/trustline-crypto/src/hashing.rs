use rand::RngCore;

/// BLAKE3 hash (32 bytes).
pub type Hash = [u8; 32];

/// Hash arbitrary data using BLAKE3.
pub fn hash(data: &[u8]) -> Hash {
    *blake3::hash(data).as_bytes()
}

/// 32 random bytes from the OS RNG.
pub fn random_nonce() -> [u8; 32] {
    let mut nonce = [0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut nonce);
    nonce
}

/// Create a BLAKE3 commitment: H(value || blinding).
pub fn create_commitment(value: &[u8], blinding: &[u8; 32]) -> Hash {
    let mut hasher = blake3::Hasher::new();
    hasher.update(value);
    hasher.update(blinding);
    *hasher.finalize().as_bytes()
}

/// Check that `commitment` opens to `value` under `blinding`.
pub fn verify_commitment(value: &[u8], blinding: &[u8; 32], commitment: &Hash) -> bool {
    create_commitment(value, blinding) == *commitment
}
