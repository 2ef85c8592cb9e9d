use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::error::ProtocolError;
use crate::messages::Nonce;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NonceStatus {
    Pending,
    Consumed,
}

/// Nonces an initiator has put into connection requests.
///
/// A nonce is issued once and consumed at most once; a nonce that has
/// been issued before can never be issued again.
#[derive(Debug, Default)]
pub struct NonceRegistry {
    nonces: DashMap<Nonce, NonceStatus>,
}

impl NonceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a nonce for a new handshake.
    pub fn issue(&self, nonce: Nonce) -> Result<(), ProtocolError> {
        match self.nonces.entry(nonce) {
            Entry::Occupied(_) => Err(ProtocolError::ReplayOrMismatch(format!(
                "nonce {} was already used",
                nonce
            ))),
            Entry::Vacant(slot) => {
                slot.insert(NonceStatus::Pending);
                Ok(())
            }
        }
    }

    /// Accept a pending nonce.
    pub fn consume(&self, nonce: Nonce) -> Result<(), ProtocolError> {
        match self.nonces.get_mut(&nonce) {
            Some(mut status) if *status == NonceStatus::Pending => {
                *status = NonceStatus::Consumed;
                Ok(())
            }
            Some(_) => Err(ProtocolError::ReplayOrMismatch(format!(
                "nonce {} was already consumed",
                nonce
            ))),
            None => Err(ProtocolError::ReplayOrMismatch(format!(
                "nonce {} was never issued",
                nonce
            ))),
        }
    }

    /// Retire a nonce whose handshake failed.
    pub fn burn(&self, nonce: Nonce) {
        self.nonces.insert(nonce, NonceStatus::Consumed);
    }

    pub fn is_pending(&self, nonce: Nonce) -> bool {
        self.nonces
            .get(&nonce)
            .map(|s| *s == NonceStatus::Pending)
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.nonces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nonces.is_empty()
    }
}
