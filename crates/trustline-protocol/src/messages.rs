//! Messages exchanged between agents.
//!
//! Plaintext messages are JSON. Only [`ConnectionRequest`] travels in the
//! clear; everything else is wrapped in [`AnonCrypted`] or [`AuthCrypted`].

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

use trustline_core::{Did, Verkey};

use crate::error::ProtocolError;

/// Single-use handshake nonce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Nonce(pub u64);

impl Nonce {
    pub fn random() -> Self {
        Self(rand::random())
    }
}

impl fmt::Display for Nonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Initiator → subordinate, out of band.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionRequest {
    /// Initiator's pairwise DID, already on the ledger.
    pub did: Did,
    pub nonce: Nonce,
}

/// Subordinate → initiator, anonymously encrypted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionResponse {
    pub did: Did,
    pub verkey: Verkey,
    /// Echo of the request nonce.
    pub nonce: Nonce,
}

/// Subordinate → promoter, authenticated: the identity to promote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerinymInfo {
    pub did: Did,
    pub verkey: Verkey,
}

/// Ciphertext produced by anonymous encryption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnonCrypted(pub Vec<u8>);

/// Ciphertext produced by authenticated encryption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthCrypted(pub Vec<u8>);

impl AnonCrypted {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl AuthCrypted {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

pub(crate) fn to_json<T: Serialize>(message: &T) -> Result<Vec<u8>, ProtocolError> {
    Ok(serde_json::to_vec(message)?)
}

pub(crate) fn from_json<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ProtocolError> {
    Ok(serde_json::from_slice(bytes)?)
}
