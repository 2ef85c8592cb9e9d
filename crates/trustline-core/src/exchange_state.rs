use std::fmt;

use crate::error::CoreError;

/// States of a single credential exchange instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ExchangeState {
    /// Issuer produced an offer referencing its credential definition.
    Offered,
    /// Holder answered with a credential request.
    Requested,
    /// Issuer signed the credential.
    Issued,
    /// Holder verified and stored the credential. Final state.
    Stored,
    /// The exchange failed. Final state.
    Aborted,
}

impl ExchangeState {
    pub fn is_final(&self) -> bool {
        matches!(self, Self::Stored | Self::Aborted)
    }
}

impl fmt::Display for ExchangeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Offered => write!(f, "OFFERED"),
            Self::Requested => write!(f, "REQUESTED"),
            Self::Issued => write!(f, "ISSUED"),
            Self::Stored => write!(f, "STORED"),
            Self::Aborted => write!(f, "ABORTED"),
        }
    }
}

/// Events that drive a credential exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeEvent {
    Request,
    Issue,
    Store,
    Abort,
}

/// Validates credential exchange transitions.
///
/// Offered → Requested → Issued → Stored, and any non-final state → Aborted.
pub struct ExchangeStateMachine;

impl ExchangeStateMachine {
    pub fn transition(
        current: ExchangeState,
        event: ExchangeEvent,
    ) -> Result<ExchangeState, CoreError> {
        let next = match (current, event) {
            (ExchangeState::Offered, ExchangeEvent::Request) => ExchangeState::Requested,
            (ExchangeState::Requested, ExchangeEvent::Issue) => ExchangeState::Issued,
            (ExchangeState::Issued, ExchangeEvent::Store) => ExchangeState::Stored,
            (state, ExchangeEvent::Abort) if !state.is_final() => ExchangeState::Aborted,
            _ => {
                return Err(CoreError::InvalidExchangeTransition {
                    from: current,
                    event,
                })
            }
        };

        tracing::debug!(from = %current, to = %next, event = ?event, "exchange state transition");

        Ok(next)
    }
}
