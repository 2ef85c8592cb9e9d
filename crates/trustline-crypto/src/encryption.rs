//! Anonymous and authenticated encryption between Ed25519 identities.
//!
//! Keys are mapped to X25519 for Diffie-Hellman and messages are sealed with
//! ChaCha20-Poly1305 under a BLAKE3-derived key.
//!
//! * `anon_crypt` uses a fresh ephemeral key: the ciphertext says nothing
//!   about who produced it.
//! * `auth_crypt` seals with a static-static agreement between the sender's
//!   and the recipient's keys, then wraps the result (sender verkey
//!   included) in an anonymous envelope. Decryption yields the sender's
//!   public key, and succeeds only if the sender held the matching secret.

use chacha20poly1305::{
    aead::{Aead, KeyInit, Payload},
    ChaCha20Poly1305, Nonce,
};
use rand::RngCore;
use x25519_dalek::{PublicKey as X25519PublicKey, StaticSecret};
use zeroize::Zeroizing;

use crate::error::CryptoError;
use crate::keys::{KeyPair, PublicKey};

const ANON_CONTEXT: &str = "trustline 2024-01 anoncrypt symmetric key";
const AUTH_CONTEXT: &str = "trustline 2024-01 authcrypt symmetric key";

const PUBKEY_LEN: usize = 32;
const NONCE_LEN: usize = 12;
const HEADER_LEN: usize = PUBKEY_LEN + NONCE_LEN;

/// Wire layout shared by both schemes: a 32-byte public key, a 12-byte
/// nonce, then ciphertext with its 16-byte Poly1305 tag.
///
/// For anonymous envelopes the key is the ephemeral X25519 key; for the
/// inner authenticated envelope it is the sender's Ed25519 verkey.
#[derive(Debug, Clone)]
pub struct EncryptedPayload {
    pub pubkey: [u8; PUBKEY_LEN],
    pub nonce: [u8; NONCE_LEN],
    pub ciphertext: Vec<u8>,
}

impl EncryptedPayload {
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_LEN + self.ciphertext.len());
        out.extend_from_slice(&self.pubkey);
        out.extend_from_slice(&self.nonce);
        out.extend_from_slice(&self.ciphertext);
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() < HEADER_LEN {
            return Err(CryptoError::DecryptionError("payload too short".into()));
        }
        let mut pubkey = [0u8; PUBKEY_LEN];
        pubkey.copy_from_slice(&bytes[..PUBKEY_LEN]);
        let mut nonce = [0u8; NONCE_LEN];
        nonce.copy_from_slice(&bytes[PUBKEY_LEN..HEADER_LEN]);
        Ok(Self {
            pubkey,
            nonce,
            ciphertext: bytes[HEADER_LEN..].to_vec(),
        })
    }
}

fn symmetric_key(
    context: &str,
    shared: &x25519_dalek::SharedSecret,
    first: &X25519PublicKey,
    second: &X25519PublicKey,
) -> Result<Zeroizing<[u8; 32]>, CryptoError> {
    if !shared.was_contributory() {
        return Err(CryptoError::InvalidInput(
            "non-contributory key agreement".into(),
        ));
    }
    let mut hasher = blake3::Hasher::new_derive_key(context);
    hasher.update(shared.as_bytes());
    hasher.update(first.as_bytes());
    hasher.update(second.as_bytes());
    Ok(Zeroizing::new(*hasher.finalize().as_bytes()))
}

fn random_nonce() -> [u8; NONCE_LEN] {
    let mut nonce = [0u8; NONCE_LEN];
    rand::rngs::OsRng.fill_bytes(&mut nonce);
    nonce
}

fn seal(key: &[u8; 32], nonce: &[u8; NONCE_LEN], msg: &[u8], aad: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let cipher = ChaCha20Poly1305::new_from_slice(key)
        .map_err(|e| CryptoError::EncryptionError(format!("cipher init failed: {}", e)))?;
    cipher
        .encrypt(Nonce::from_slice(nonce), Payload { msg, aad })
        .map_err(|e| CryptoError::EncryptionError(e.to_string()))
}

fn open(key: &[u8; 32], nonce: &[u8; NONCE_LEN], msg: &[u8], aad: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let cipher = ChaCha20Poly1305::new_from_slice(key)
        .map_err(|e| CryptoError::DecryptionError(format!("cipher init failed: {}", e)))?;
    cipher
        .decrypt(Nonce::from_slice(nonce), Payload { msg, aad })
        .map_err(|_| CryptoError::DecryptionError("authentication tag mismatch".into()))
}

/// Encrypt `plaintext` so that only the holder of `recipient`'s secret key
/// can read it, without revealing the sender.
pub fn anon_crypt(recipient: &PublicKey, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let mut ephemeral_bytes = Zeroizing::new([0u8; 32]);
    rand::rngs::OsRng.fill_bytes(&mut *ephemeral_bytes);
    let ephemeral_secret = StaticSecret::from(*ephemeral_bytes);
    let ephemeral_pubkey = X25519PublicKey::from(&ephemeral_secret);

    let recipient_x = recipient.x25519();
    let shared = ephemeral_secret.diffie_hellman(&recipient_x);
    let key = symmetric_key(ANON_CONTEXT, &shared, &ephemeral_pubkey, &recipient_x)?;

    let nonce = random_nonce();
    let ciphertext = seal(&key, &nonce, plaintext, ephemeral_pubkey.as_bytes())?;

    Ok(EncryptedPayload {
        pubkey: ephemeral_pubkey.to_bytes(),
        nonce,
        ciphertext,
    }
    .to_bytes())
}

/// Decrypt an anonymous envelope addressed to `recipient`.
pub fn anon_decrypt(recipient: &KeyPair, bytes: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let payload = EncryptedPayload::from_bytes(bytes)?;
    let ephemeral_pubkey = X25519PublicKey::from(payload.pubkey);
    let recipient_x = recipient.public_key().x25519();

    let shared = recipient.x25519_secret().diffie_hellman(&ephemeral_pubkey);
    let key = symmetric_key(ANON_CONTEXT, &shared, &ephemeral_pubkey, &recipient_x)
        .map_err(|e| CryptoError::DecryptionError(e.to_string()))?;

    open(&key, &payload.nonce, &payload.ciphertext, &payload.pubkey)
}

/// Encrypt `plaintext` from `sender` to `recipient` so that the recipient
/// learns, and can rely on, the sender's public key.
pub fn auth_crypt(
    sender: &KeyPair,
    recipient: &PublicKey,
    plaintext: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    let sender_pk = sender.public_key();
    let sender_x = sender_pk.x25519();
    let recipient_x = recipient.x25519();

    let shared = sender.x25519_secret().diffie_hellman(&recipient_x);
    let key = symmetric_key(AUTH_CONTEXT, &shared, &sender_x, &recipient_x)?;

    let nonce = random_nonce();
    let ciphertext = seal(&key, &nonce, plaintext, sender_pk.as_bytes())?;

    let inner = EncryptedPayload {
        pubkey: *sender_pk.as_bytes(),
        nonce,
        ciphertext,
    };
    anon_crypt(recipient, &inner.to_bytes())
}

/// Decrypt an authenticated envelope, returning the sender's public key
/// together with the plaintext.
pub fn auth_decrypt(
    recipient: &KeyPair,
    bytes: &[u8],
) -> Result<(PublicKey, Vec<u8>), CryptoError> {
    let inner = EncryptedPayload::from_bytes(&anon_decrypt(recipient, bytes)?)?;
    let sender = PublicKey::from_bytes(&inner.pubkey)
        .map_err(|e| CryptoError::DecryptionError(format!("invalid sender key: {}", e)))?;

    let sender_x = sender.x25519();
    let recipient_x = recipient.public_key().x25519();
    let shared = recipient.x25519_secret().diffie_hellman(&sender_x);
    let key = symmetric_key(AUTH_CONTEXT, &shared, &sender_x, &recipient_x)
        .map_err(|e| CryptoError::DecryptionError(e.to_string()))?;

    let plaintext = open(&key, &inner.nonce, &inner.ciphertext, sender.as_bytes())?;
    Ok((sender, plaintext))
}
