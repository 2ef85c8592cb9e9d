use ed25519_dalek::{SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use x25519_dalek::{PublicKey as X25519PublicKey, StaticSecret};
use zeroize::Zeroize;

use trustline_core::{Did, Verkey};

use crate::error::CryptoError;

/// Ed25519 key pair backing a DID.
/// Private key material is zeroized on drop by ed25519-dalek.
pub struct KeyPair {
    signing_key: SigningKey,
}

impl KeyPair {
    /// Generate a new random key pair using OS-provided entropy.
    pub fn generate() -> Self {
        let signing_key = SigningKey::generate(&mut OsRng);
        Self { signing_key }
    }

    /// Create a key pair from a 32-byte seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        let signing_key = SigningKey::from_bytes(seed);
        Self { signing_key }
    }

    /// Create a key pair from a 32-character text seed such as
    /// `000000000000000000000000Steward1`.
    pub fn from_seed_str(seed: &str) -> Result<Self, CryptoError> {
        let bytes = seed.as_bytes();
        if bytes.len() != 32 {
            return Err(CryptoError::InvalidSeed(format!(
                "seed must be 32 bytes, got {}",
                bytes.len()
            )));
        }
        let mut buf = [0u8; 32];
        buf.copy_from_slice(bytes);
        let kp = Self::from_seed(&buf);
        buf.zeroize();
        Ok(kp)
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey {
            verifying_key: self.signing_key.verifying_key(),
        }
    }

    /// Base58 verkey of this key pair.
    pub fn verkey(&self) -> Verkey {
        self.public_key().to_verkey()
    }

    /// DID derived from the first 16 bytes of the verkey.
    pub fn did(&self) -> Did {
        Did::from_verkey_bytes(self.signing_key.verifying_key().as_bytes())
    }

    pub(crate) fn signing_key(&self) -> &SigningKey {
        &self.signing_key
    }

    /// X25519 secret for Diffie-Hellman, derived from the Ed25519 secret.
    pub(crate) fn x25519_secret(&self) -> StaticSecret {
        StaticSecret::from(self.signing_key.to_scalar_bytes())
    }
}

/// Ed25519 public key for verification and encryption-to operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKey {
    verifying_key: VerifyingKey,
}

impl PublicKey {
    /// Create from raw bytes (32 bytes).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let bytes_arr: [u8; 32] = bytes.try_into().map_err(|_| CryptoError::InvalidKeyLength {
            expected: 32,
            actual: bytes.len(),
        })?;
        let verifying_key = VerifyingKey::from_bytes(&bytes_arr)
            .map_err(|e| CryptoError::InvalidInput(format!("invalid public key: {}", e)))?;
        Ok(Self { verifying_key })
    }

    pub fn from_verkey(verkey: &Verkey) -> Result<Self, CryptoError> {
        Self::from_bytes(&verkey.to_bytes()?)
    }

    pub fn to_verkey(&self) -> Verkey {
        Verkey::from_bytes(self.verifying_key.as_bytes())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        self.verifying_key.as_bytes()
    }

    pub fn to_bs58(&self) -> String {
        bs58::encode(self.as_bytes()).into_string()
    }

    pub(crate) fn verifying_key(&self) -> &VerifyingKey {
        &self.verifying_key
    }

    /// Birationally mapped X25519 public key.
    pub(crate) fn x25519(&self) -> X25519PublicKey {
        X25519PublicKey::from(self.verifying_key.to_montgomery().to_bytes())
    }
}
