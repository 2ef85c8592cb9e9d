//! Trustline Core — Fundamental types, errors, and state machines shared by
//! the Trustline onboarding and credential-exchange protocol.

pub mod config;
pub mod error;
pub mod exchange_state;
pub mod handshake_state;
pub mod types;

pub use config::{PoolConfig, WalletConfig, WalletCredentials};
pub use error::CoreError;
pub use exchange_state::{ExchangeEvent, ExchangeState, ExchangeStateMachine};
pub use handshake_state::{HandshakeEvent, HandshakeState, HandshakeStateMachine};
pub use types::{CredDefId, Did, Role, SchemaId, Verkey};
