//! Trustline Protocol — Trust handshake, credential exchange and the
//! schema / credential-definition glue between agents and the ledger.
//!
//! An [`Agent`] owns one wallet and a ledger client. Two agents with no
//! prior relationship run [`onboard`] to establish a pairwise channel;
//! a trusted agent then runs [`promote_to_verinym`] to put the other's new
//! public DID on the ledger with a role. Issuers and holders exchange
//! credentials over an authenticated channel with [`exchange_credential`].
//!
//! Every step is also available on its own (`begin_onboarding`,
//! `respond_to_request`, `offer_credential`, ...) with encrypted message
//! values, so callers can carry messages over any transport.

pub mod agent;
pub mod error;
pub mod events;
pub mod exchange;
pub mod handshake;
pub mod messages;
pub mod nonce;
pub mod registry;

#[cfg(test)]
mod test_support;

pub use agent::Agent;
pub use error::ProtocolError;
pub use events::{Phase, PhaseEvent};
pub use exchange::{
    accept_offer, exchange_credential, offer_credential, HolderExchange, IssuedCredential,
    IssuerExchange,
};
pub use handshake::{
    begin_onboarding, begin_onboarding_with_nonce, onboard, promote_to_verinym,
    register_verinym, request_verinym, respond_to_request, Connection, Onboarding,
    PendingOnboarding, Verinym,
};
pub use messages::{AnonCrypted, AuthCrypted, ConnectionRequest, ConnectionResponse, Nonce, VerinymInfo};
pub use nonce::NonceRegistry;
pub use registry::{
    fetch_credential_definition, fetch_schema, publish_credential_definition, publish_schema,
};
