//! Onboarding and verinym promotion.
//!
//! Onboarding gives two agents a pairwise channel: each side creates a DID
//! used only for this relationship, the initiator puts both on the ledger,
//! and the subordinate answers the initiator's nonce under anonymous
//! encryption. Promotion then moves a new, subordinate-generated DID onto
//! the ledger with a role, trusting the request only if its authenticated
//! sender key equals the key the ledger holds for the subordinate's
//! pairwise DID.

use serde::{Deserialize, Serialize};

use trustline_core::{Did, HandshakeEvent, HandshakeState, HandshakeStateMachine, Role, Verkey};
use trustline_wallet::{anon_crypt, LocalIdentity};

use crate::agent::Agent;
use crate::error::ProtocolError;
use crate::events::Phase;
use crate::messages::{
    from_json, to_json, AnonCrypted, AuthCrypted, ConnectionRequest, ConnectionResponse, Nonce,
    VerinymInfo,
};

/// One side of a pairwise channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    /// This side's pairwise identity.
    pub me: LocalIdentity,
    pub their_did: Did,
    pub their_verkey: Verkey,
    pub state: HandshakeState,
}

impl Connection {
    fn advance(&mut self, event: HandshakeEvent) -> Result<(), ProtocolError> {
        self.state = HandshakeStateMachine::transition(self.state, event)?;
        Ok(())
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.is_authenticated()
    }

    pub(crate) fn require_authenticated(&self) -> Result<(), ProtocolError> {
        if !self.is_authenticated() {
            return Err(ProtocolError::InvalidState(format!(
                "connection {} ↔ {} is {}",
                self.me.did, self.their_did, self.state
            )));
        }
        Ok(())
    }

    /// Subordinate side: move to `Authenticated` once the initiator has put
    /// our pairwise DID on the ledger with our key.
    pub async fn confirm(&mut self, agent: &Agent) -> Result<(), ProtocolError> {
        if self.state != HandshakeState::ResponseSent {
            return Err(ProtocolError::InvalidState(format!(
                "cannot confirm a connection in state {}",
                self.state
            )));
        }
        let nym = agent.ledger().get_nym(&self.me.did).await?;
        if nym.verkey != self.me.verkey {
            return Err(ProtocolError::IdentitySpoof {
                did: self.me.did.clone(),
                resolved: nym.verkey,
                claimed: self.me.verkey.clone(),
            });
        }
        self.advance(HandshakeEvent::Authenticate)?;
        agent.emit(Phase::ConnectionAuthenticated, self.their_did.as_str());
        Ok(())
    }
}

/// Initiator-side handshake waiting for the subordinate's response.
#[derive(Debug)]
pub struct PendingOnboarding {
    me: LocalIdentity,
    nonce: Nonce,
    state: HandshakeState,
}

impl PendingOnboarding {
    pub fn nonce(&self) -> Nonce {
        self.nonce
    }

    pub fn me(&self) -> &LocalIdentity {
        &self.me
    }

    pub fn state(&self) -> HandshakeState {
        self.state
    }

    /// Accept the subordinate's response and register its pairwise DID.
    ///
    /// Fails with `ReplayOrMismatch` if the echoed nonce is not the one this
    /// handshake issued; nothing is written to the ledger in that case.
    pub async fn complete(
        mut self,
        initiator: &Agent,
        response: &AnonCrypted,
    ) -> Result<Connection, ProtocolError> {
        let plaintext = match initiator
            .wallet()
            .anon_decrypt(&self.me.verkey, response.as_bytes())
        {
            Ok(p) => p,
            Err(e) => return Err(self.abort(initiator, e.into())),
        };
        let response: ConnectionResponse = match from_json(&plaintext) {
            Ok(r) => r,
            Err(e) => return Err(self.abort(initiator, e)),
        };
        self.state = HandshakeStateMachine::transition(self.state, HandshakeEvent::ReceiveResponse)?;

        if response.nonce != self.nonce {
            tracing::warn!(
                agent = initiator.name(),
                expected = %self.nonce,
                received = %response.nonce,
                "connection response nonce mismatch"
            );
            let err = ProtocolError::ReplayOrMismatch(format!(
                "expected nonce {}, response carries {}",
                self.nonce, response.nonce
            ));
            return Err(self.abort(initiator, err));
        }
        if let Err(e) = initiator.nonces().consume(self.nonce) {
            return Err(self.abort(initiator, e));
        }

        if let Err(e) = initiator
            .send_nym(&response.did, &response.verkey, None)
            .await
        {
            return Err(self.abort(initiator, e));
        }
        initiator
            .wallet()
            .store_their_did(&response.did, &response.verkey);

        let mut connection = Connection {
            me: self.me,
            their_did: response.did,
            their_verkey: response.verkey,
            state: self.state,
        };
        connection.advance(HandshakeEvent::Authenticate)?;
        initiator.emit(Phase::ConnectionAuthenticated, connection.their_did.as_str());
        Ok(connection)
    }

    fn abort(&mut self, initiator: &Agent, err: ProtocolError) -> ProtocolError {
        initiator.nonces().burn(self.nonce);
        if let Ok(next) = HandshakeStateMachine::transition(self.state, HandshakeEvent::Abort) {
            self.state = next;
        }
        initiator.emit(Phase::ConnectionRejected, self.me.did.as_str());
        err
    }
}

/// Start onboarding with a fresh random nonce.
pub async fn begin_onboarding(
    initiator: &Agent,
) -> Result<(PendingOnboarding, ConnectionRequest), ProtocolError> {
    begin_onboarding_with_nonce(initiator, Nonce::random()).await
}

/// Start onboarding with a caller-chosen nonce.
///
/// Creates the initiator's pairwise DID and registers it on the ledger
/// under the initiator's public DID. A nonce this agent has issued before
/// is refused with `ReplayOrMismatch` before anything is written.
pub async fn begin_onboarding_with_nonce(
    initiator: &Agent,
    nonce: Nonce,
) -> Result<(PendingOnboarding, ConnectionRequest), ProtocolError> {
    initiator.public_did()?;
    initiator.nonces().issue(nonce)?;

    let me = match initiator.create_pairwise_identity() {
        Ok(me) => me,
        Err(e) => {
            initiator.nonces().burn(nonce);
            return Err(e);
        }
    };
    if let Err(e) = initiator.send_nym(&me.did, &me.verkey, None).await {
        initiator.nonces().burn(nonce);
        return Err(e);
    }

    let state = HandshakeStateMachine::transition(HandshakeState::Init, HandshakeEvent::SendRequest)?;
    let request = ConnectionRequest {
        did: me.did.clone(),
        nonce,
    };
    initiator.emit(Phase::ConnectionRequested, me.did.as_str());

    Ok((PendingOnboarding { me, nonce, state }, request))
}

/// Subordinate side: answer a connection request.
///
/// The initiator's key is resolved through the ledger, never taken from
/// the request.
pub async fn respond_to_request(
    subordinate: &Agent,
    request: &ConnectionRequest,
) -> Result<(Connection, AnonCrypted), ProtocolError> {
    let their_verkey = subordinate
        .wallet()
        .key_for_did(subordinate.ledger(), &request.did)
        .await?;
    let me = subordinate.create_pairwise_identity()?;

    let response = ConnectionResponse {
        did: me.did.clone(),
        verkey: me.verkey.clone(),
        nonce: request.nonce,
    };
    let ciphertext = anon_crypt(&their_verkey, &to_json(&response)?)?;

    let mut connection = Connection {
        me,
        their_did: request.did.clone(),
        their_verkey,
        state: HandshakeState::Init,
    };
    connection.advance(HandshakeEvent::SendResponse)?;
    subordinate.emit(Phase::ConnectionResponded, request.did.as_str());

    Ok((connection, AnonCrypted(ciphertext)))
}

/// Both sides of a completed onboarding.
#[derive(Debug, Clone)]
pub struct Onboarding {
    pub nonce: Nonce,
    /// The initiator's view of the channel.
    pub initiator: Connection,
    /// The subordinate's view of the channel.
    pub subordinate: Connection,
}

/// Run the whole onboarding handshake between two in-process agents.
pub async fn onboard(initiator: &Agent, subordinate: &Agent) -> Result<Onboarding, ProtocolError> {
    tracing::info!(
        initiator = initiator.name(),
        subordinate = subordinate.name(),
        "onboarding"
    );
    let (pending, request) = begin_onboarding(initiator).await?;
    let nonce = pending.nonce();
    let (mut subordinate_conn, response) = respond_to_request(subordinate, &request).await?;
    let initiator_conn = pending.complete(initiator, &response).await?;
    subordinate_conn.confirm(subordinate).await?;

    Ok(Onboarding {
        nonce,
        initiator: initiator_conn,
        subordinate: subordinate_conn,
    })
}

/// A DID registered on the ledger with a role on its owner's behalf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verinym {
    pub did: Did,
    pub verkey: Verkey,
    pub role: Role,
}

/// Subordinate side: create a new identity and send it to the promoter
/// over the authenticated channel.
pub async fn request_verinym(
    subordinate: &Agent,
    connection: &mut Connection,
) -> Result<(LocalIdentity, AuthCrypted), ProtocolError> {
    if connection.state != HandshakeState::Authenticated {
        return Err(ProtocolError::InvalidState(format!(
            "verinym can only be requested on an authenticated channel, state is {}",
            connection.state
        )));
    }
    let verinym = subordinate.create_pairwise_identity()?;
    let info = VerinymInfo {
        did: verinym.did.clone(),
        verkey: verinym.verkey.clone(),
    };
    let ciphertext = subordinate.wallet().auth_crypt(
        &connection.me.verkey,
        &connection.their_verkey,
        &to_json(&info)?,
    )?;
    connection.advance(HandshakeEvent::RequestVerinym)?;
    subordinate.emit(Phase::VerinymRequested, verinym.did.as_str());

    Ok((verinym, AuthCrypted(ciphertext)))
}

/// Promoter side: authenticate the verinym request and register the new
/// DID with `role`.
///
/// The sender key reported by decryption must equal the key the ledger
/// holds for the counterparty's pairwise DID; otherwise the request fails
/// with `IdentitySpoof` and nothing is registered. Any failure leaves the
/// channel itself authenticated.
pub async fn register_verinym(
    promoter: &Agent,
    connection: &mut Connection,
    message: &AuthCrypted,
    role: Role,
) -> Result<Verinym, ProtocolError> {
    if connection.state != HandshakeState::Authenticated {
        return Err(ProtocolError::InvalidState(format!(
            "verinym can only be registered on an authenticated channel, state is {}",
            connection.state
        )));
    }
    connection.advance(HandshakeEvent::RequestVerinym)?;

    match authenticate_verinym(promoter, connection, message, role).await {
        Ok(verinym) => {
            connection.advance(HandshakeEvent::RegisterVerinym)?;
            promoter.emit(Phase::VerinymRegistered, verinym.did.as_str());
            Ok(verinym)
        }
        Err(e) => {
            connection.advance(HandshakeEvent::RejectVerinym)?;
            promoter.emit(Phase::VerinymRejected, connection.their_did.as_str());
            Err(e)
        }
    }
}

async fn authenticate_verinym(
    promoter: &Agent,
    connection: &Connection,
    message: &AuthCrypted,
    role: Role,
) -> Result<Verinym, ProtocolError> {
    let (sender_verkey, plaintext) = promoter
        .wallet()
        .auth_decrypt(&connection.me.verkey, message.as_bytes())?;

    verify_sender(promoter, &connection.their_did, &sender_verkey).await?;

    let info: VerinymInfo = from_json(&plaintext)?;
    promoter.send_nym(&info.did, &info.verkey, Some(role)).await?;

    Ok(Verinym {
        did: info.did,
        verkey: info.verkey,
        role,
    })
}

/// Check that `sender` is the key the ledger currently holds for `did`.
pub(crate) async fn verify_sender(
    agent: &Agent,
    did: &Did,
    sender: &Verkey,
) -> Result<(), ProtocolError> {
    let resolved = agent
        .wallet()
        .refresh_key_for_did(agent.ledger(), did)
        .await?;
    if resolved != *sender {
        tracing::warn!(
            agent = agent.name(),
            did = %did,
            resolved = %resolved,
            claimed = %sender,
            "sender verkey does not match ledger"
        );
        return Err(ProtocolError::IdentitySpoof {
            did: did.clone(),
            resolved,
            claimed: sender.clone(),
        });
    }
    Ok(())
}

/// Run verinym promotion over an onboarded channel.
///
/// On success the subordinate's side is `VerinymRegistered`; the caller
/// hands the returned [`Verinym`] to [`Agent::adopt_verinym`].
pub async fn promote_to_verinym(
    promoter: &Agent,
    subordinate: &Agent,
    onboarding: &mut Onboarding,
    role: Role,
) -> Result<Verinym, ProtocolError> {
    tracing::info!(
        promoter = promoter.name(),
        subordinate = subordinate.name(),
        role = %role,
        "promoting to verinym"
    );
    let (_, message) = request_verinym(subordinate, &mut onboarding.subordinate).await?;
    match register_verinym(promoter, &mut onboarding.initiator, &message, role).await {
        Ok(verinym) => {
            onboarding
                .subordinate
                .advance(HandshakeEvent::RegisterVerinym)?;
            Ok(verinym)
        }
        Err(e) => {
            onboarding.subordinate.advance(HandshakeEvent::RejectVerinym)?;
            Err(e)
        }
    }
}
