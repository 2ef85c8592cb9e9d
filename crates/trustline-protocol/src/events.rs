//! Protocol phase events.
//!
//! Each agent broadcasts a [`PhaseEvent`] whenever one of its handshakes or
//! exchanges reaches a new phase. The same event is logged with `tracing`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Capacity of each agent's event channel.
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// Initiator registered its pairwise DID and produced a connection request.
    ConnectionRequested,
    /// Subordinate answered a connection request.
    ConnectionResponded,
    ConnectionAuthenticated,
    /// Onboarding aborted on the initiator side.
    ConnectionRejected,
    VerinymRequested,
    VerinymRegistered,
    VerinymRejected,
    SchemaPublished,
    CredentialDefinitionPublished,
    CredentialOffered,
    CredentialRequested,
    CredentialIssued,
    CredentialStored,
    ExchangeAborted,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ConnectionRequested => "connection_requested",
            Self::ConnectionResponded => "connection_responded",
            Self::ConnectionAuthenticated => "connection_authenticated",
            Self::ConnectionRejected => "connection_rejected",
            Self::VerinymRequested => "verinym_requested",
            Self::VerinymRegistered => "verinym_registered",
            Self::VerinymRejected => "verinym_rejected",
            Self::SchemaPublished => "schema_published",
            Self::CredentialDefinitionPublished => "credential_definition_published",
            Self::CredentialOffered => "credential_offered",
            Self::CredentialRequested => "credential_requested",
            Self::CredentialIssued => "credential_issued",
            Self::CredentialStored => "credential_stored",
            Self::ExchangeAborted => "exchange_aborted",
        };
        f.write_str(name)
    }
}

/// A phase reached by one agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseEvent {
    /// Name of the agent that reached the phase.
    pub agent: String,
    pub phase: Phase,
    /// DID, schema id, definition id or exchange id the phase concerns.
    pub subject: String,
}
