pub mod encryption;
pub mod error;
pub mod hashing;
pub mod kdf;
pub mod keys;
pub mod signing;

pub use encryption::{anon_crypt, anon_decrypt, auth_crypt, auth_decrypt, EncryptedPayload};
pub use error::CryptoError;
pub use hashing::{create_commitment, hash, random_nonce, verify_commitment, Hash};
pub use kdf::{hash_secret, verify_secret};
pub use keys::{KeyPair, PublicKey};
pub use signing::{sign, verify, Signature};
