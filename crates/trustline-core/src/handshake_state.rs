use std::fmt;

use crate::error::CoreError;

/// States of one side of a pairwise trust handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum HandshakeState {
    /// Nothing exchanged yet.
    Init,
    /// Initiator registered its pairwise DID and emitted a connection request.
    RequestSent,
    /// Subordinate answered a connection request with an encrypted response.
    ResponseSent,
    /// Initiator decrypted a connection response; nonce not yet checked.
    ResponseReceived,
    /// Both pairwise identities are known and the channel is usable.
    Authenticated,
    /// A verinym has been sent over the channel but is not yet on the ledger.
    VerinymPending,
    /// The subordinate's verinym is registered with its role.
    VerinymRegistered,
    /// The handshake failed. Final state.
    Aborted,
}

impl HandshakeState {
    /// Whether this is a final (terminal) state.
    pub fn is_final(&self) -> bool {
        matches!(self, Self::VerinymRegistered | Self::Aborted)
    }

    /// Whether authenticated messages may be exchanged in this state.
    pub fn is_authenticated(&self) -> bool {
        matches!(
            self,
            Self::Authenticated | Self::VerinymPending | Self::VerinymRegistered
        )
    }
}

impl fmt::Display for HandshakeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Init => write!(f, "INIT"),
            Self::RequestSent => write!(f, "REQUEST_SENT"),
            Self::ResponseSent => write!(f, "RESPONSE_SENT"),
            Self::ResponseReceived => write!(f, "RESPONSE_RECEIVED"),
            Self::Authenticated => write!(f, "AUTHENTICATED"),
            Self::VerinymPending => write!(f, "VERINYM_PENDING"),
            Self::VerinymRegistered => write!(f, "VERINYM_REGISTERED"),
            Self::Aborted => write!(f, "ABORTED"),
        }
    }
}

/// Events that drive a handshake forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeEvent {
    /// Initiator emits its connection request.
    SendRequest,
    /// Subordinate emits its anonymously encrypted response.
    SendResponse,
    /// Initiator decrypts the response.
    ReceiveResponse,
    /// Nonce matched and the counterparty's pairwise DID is on the ledger.
    Authenticate,
    /// Verinym material is in flight.
    RequestVerinym,
    /// Verinym written to the ledger.
    RegisterVerinym,
    /// Verinym rejected; the pairwise channel itself stays usable.
    RejectVerinym,
    /// Any unrecoverable failure.
    Abort,
}

/// Validates handshake state transitions.
///
/// Valid transitions:
/// - Init → RequestSent (SendRequest)
/// - Init → ResponseSent (SendResponse)
/// - RequestSent → ResponseReceived (ReceiveResponse)
/// - ResponseReceived → Authenticated (Authenticate)
/// - ResponseSent → Authenticated (Authenticate)
/// - Authenticated → VerinymPending (RequestVerinym)
/// - VerinymPending → VerinymRegistered (RegisterVerinym)
/// - VerinymPending → Authenticated (RejectVerinym)
/// - any non-final state → Aborted (Abort)
pub struct HandshakeStateMachine;

impl HandshakeStateMachine {
    pub fn transition(
        current: HandshakeState,
        event: HandshakeEvent,
    ) -> Result<HandshakeState, CoreError> {
        use HandshakeEvent as E;
        use HandshakeState as S;

        let next = match (current, event) {
            (S::Init, E::SendRequest) => S::RequestSent,
            (S::Init, E::SendResponse) => S::ResponseSent,
            (S::RequestSent, E::ReceiveResponse) => S::ResponseReceived,
            (S::ResponseReceived, E::Authenticate) => S::Authenticated,
            (S::ResponseSent, E::Authenticate) => S::Authenticated,
            (S::Authenticated, E::RequestVerinym) => S::VerinymPending,
            (S::VerinymPending, E::RegisterVerinym) => S::VerinymRegistered,
            (S::VerinymPending, E::RejectVerinym) => S::Authenticated,
            (state, E::Abort) if !state.is_final() => S::Aborted,
            _ => {
                return Err(CoreError::InvalidHandshakeTransition {
                    from: current,
                    event,
                })
            }
        };

        tracing::debug!(from = %current, to = %next, event = ?event, "handshake state transition");

        Ok(next)
    }

    pub fn can_transition(current: HandshakeState, event: HandshakeEvent) -> bool {
        Self::transition(current, event).is_ok()
    }
}
