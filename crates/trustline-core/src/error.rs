use crate::exchange_state::{ExchangeEvent, ExchangeState};
use crate::handshake_state::{HandshakeEvent, HandshakeState};

/// Core protocol errors.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("invalid handshake transition: {event:?} not allowed in state {from}")]
    InvalidHandshakeTransition {
        from: HandshakeState,
        event: HandshakeEvent,
    },

    #[error("invalid exchange transition: {event:?} not allowed in state {from}")]
    InvalidExchangeTransition {
        from: ExchangeState,
        event: ExchangeEvent,
    },

    #[error("invalid DID: {0}")]
    InvalidDid(String),

    #[error("invalid verkey: {0}")]
    InvalidVerkey(String),

    #[error("invalid role: {0}")]
    InvalidRole(String),

    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("validation error: {0}")]
    ValidationError(String),
}
