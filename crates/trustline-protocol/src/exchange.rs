//! Credential exchange: offer → request → issue → store.
//!
//! Runs over an authenticated [`Connection`]. Every message is
//! authenticated-encrypted and its sender key is checked against the
//! ledger record of the counterparty's pairwise DID. Each exchange carries
//! its own state; a failure aborts that exchange only.

use trustline_core::{CredDefId, Did, ExchangeEvent, ExchangeState, ExchangeStateMachine};
use trustline_credentials::{
    Credential, CredentialDefinition, CredentialOffer, CredentialRequest,
    CredentialRequestMetadata, CredentialValues,
};

use crate::agent::Agent;
use crate::error::ProtocolError;
use crate::events::Phase;
use crate::handshake::{verify_sender, Connection};
use crate::messages::{from_json, to_json, AuthCrypted};

fn new_exchange_id() -> String {
    uuid::Uuid::now_v7().to_string()
}

/// Decrypt `message` on `connection` and check who sent it.
async fn open_from_counterparty(
    agent: &Agent,
    connection: &Connection,
    message: &AuthCrypted,
) -> Result<Vec<u8>, ProtocolError> {
    let (sender, plaintext) = agent
        .wallet()
        .auth_decrypt(&connection.me.verkey, message.as_bytes())?;
    verify_sender(agent, &connection.their_did, &sender).await?;
    Ok(plaintext)
}

fn seal_for_counterparty(
    agent: &Agent,
    connection: &Connection,
    plaintext: &[u8],
) -> Result<AuthCrypted, ProtocolError> {
    let ciphertext =
        agent
            .wallet()
            .auth_crypt(&connection.me.verkey, &connection.their_verkey, plaintext)?;
    Ok(AuthCrypted(ciphertext))
}

/// Issuer-side state of one exchange.
#[derive(Debug, Clone)]
pub struct IssuerExchange {
    id: String,
    state: ExchangeState,
    their_did: Did,
    offer: CredentialOffer,
}

impl IssuerExchange {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn state(&self) -> ExchangeState {
        self.state
    }

    /// Pairwise DID of the holder this exchange runs with.
    pub fn their_did(&self) -> &Did {
        &self.their_did
    }

    pub fn offer(&self) -> &CredentialOffer {
        &self.offer
    }

    /// Accept the holder's request and answer with the signed credential.
    ///
    /// `connection` must be the channel the offer went out on; any other
    /// is refused with `InvalidState` and the exchange is left as it was.
    pub async fn issue(
        &mut self,
        issuer: &Agent,
        connection: &Connection,
        message: &AuthCrypted,
        values: CredentialValues,
    ) -> Result<AuthCrypted, ProtocolError> {
        check_connection(&self.id, &self.their_did, connection)?;
        if self.state != ExchangeState::Offered {
            return Err(ProtocolError::InvalidState(format!(
                "exchange {} is {}, expected OFFERED",
                self.id, self.state
            )));
        }
        match self.try_issue(issuer, connection, message, values).await {
            Ok(reply) => Ok(reply),
            Err(e) => Err(abort(issuer, &self.id, &mut self.state, e)),
        }
    }

    async fn try_issue(
        &mut self,
        issuer: &Agent,
        connection: &Connection,
        message: &AuthCrypted,
        values: CredentialValues,
    ) -> Result<AuthCrypted, ProtocolError> {
        let plaintext = open_from_counterparty(issuer, connection, message).await?;
        let request: CredentialRequest = from_json(&plaintext)?;
        self.state = ExchangeStateMachine::transition(self.state, ExchangeEvent::Request)?;

        let credential = issuer
            .wallet()
            .issuer_create_credential(&self.offer, &request, values)?;
        let reply = seal_for_counterparty(issuer, connection, &to_json(&credential)?)?;

        self.state = ExchangeStateMachine::transition(self.state, ExchangeEvent::Issue)?;
        issuer.emit(Phase::CredentialIssued, self.id.as_str());
        Ok(reply)
    }
}

/// Holder-side state of one exchange.
#[derive(Debug, Clone)]
pub struct HolderExchange {
    id: String,
    state: ExchangeState,
    their_did: Did,
    cred_def: CredentialDefinition,
    metadata: CredentialRequestMetadata,
}

impl HolderExchange {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn state(&self) -> ExchangeState {
        self.state
    }

    pub fn their_did(&self) -> &Did {
        &self.their_did
    }

    pub fn cred_def_id(&self) -> &CredDefId {
        &self.cred_def.id
    }

    /// Verify the issued credential and store it. Returns its referent.
    ///
    /// `connection` must be the channel the offer arrived on.
    pub async fn store(
        &mut self,
        holder: &Agent,
        connection: &Connection,
        message: &AuthCrypted,
    ) -> Result<String, ProtocolError> {
        check_connection(&self.id, &self.their_did, connection)?;
        if self.state != ExchangeState::Requested {
            return Err(ProtocolError::InvalidState(format!(
                "exchange {} is {}, expected REQUESTED",
                self.id, self.state
            )));
        }
        match self.try_store(holder, connection, message).await {
            Ok(referent) => Ok(referent),
            Err(e) => Err(abort(holder, &self.id, &mut self.state, e)),
        }
    }

    async fn try_store(
        &mut self,
        holder: &Agent,
        connection: &Connection,
        message: &AuthCrypted,
    ) -> Result<String, ProtocolError> {
        let plaintext = open_from_counterparty(holder, connection, message).await?;
        let credential: Credential = from_json(&plaintext)?;
        self.state = ExchangeStateMachine::transition(self.state, ExchangeEvent::Issue)?;

        let referent = holder.wallet().prover_store_credential(
            None,
            &self.metadata,
            credential,
            &self.cred_def,
        )?;

        self.state = ExchangeStateMachine::transition(self.state, ExchangeEvent::Store)?;
        holder.emit(Phase::CredentialStored, referent.as_str());
        Ok(referent)
    }
}

/// Steps must arrive on the channel the exchange started on.
fn check_connection(id: &str, their_did: &Did, connection: &Connection) -> Result<(), ProtocolError> {
    if connection.their_did != *their_did {
        return Err(ProtocolError::InvalidState(format!(
            "exchange {} runs with {}, not {}",
            id, their_did, connection.their_did
        )));
    }
    Ok(())
}

fn abort(agent: &Agent, id: &str, state: &mut ExchangeState, err: ProtocolError) -> ProtocolError {
    if let Ok(next) = ExchangeStateMachine::transition(*state, ExchangeEvent::Abort) {
        *state = next;
    }
    tracing::warn!(agent = agent.name(), exchange = id, error = %err, "credential exchange aborted");
    agent.emit(Phase::ExchangeAborted, id);
    err
}

/// Issuer: offer a credential under `cred_def_id` over `connection`.
pub async fn offer_credential(
    issuer: &Agent,
    connection: &Connection,
    cred_def_id: &CredDefId,
) -> Result<(IssuerExchange, AuthCrypted), ProtocolError> {
    connection.require_authenticated()?;
    let offer = issuer.wallet().issuer_create_credential_offer(cred_def_id)?;
    let message = seal_for_counterparty(issuer, connection, &to_json(&offer)?)?;

    let exchange = IssuerExchange {
        id: new_exchange_id(),
        state: ExchangeState::Offered,
        their_did: connection.their_did.clone(),
        offer,
    };
    issuer.emit(Phase::CredentialOffered, exchange.id.as_str());
    Ok((exchange, message))
}

/// Holder: accept an offer, binding the named master secret.
///
/// The definition the offer refers to is fetched from the ledger.
pub async fn accept_offer(
    holder: &Agent,
    connection: &Connection,
    message: &AuthCrypted,
    master_secret_id: &str,
) -> Result<(HolderExchange, AuthCrypted), ProtocolError> {
    connection.require_authenticated()?;
    let plaintext = open_from_counterparty(holder, connection, message).await?;
    let offer: CredentialOffer = from_json(&plaintext)?;
    let cred_def = holder.ledger().get_cred_def(&offer.cred_def_id).await?;

    let (request, metadata) = holder.wallet().prover_create_credential_req(
        &connection.me.did,
        &offer,
        &cred_def,
        master_secret_id,
    )?;
    let reply = seal_for_counterparty(holder, connection, &to_json(&request)?)?;

    let exchange = HolderExchange {
        id: new_exchange_id(),
        their_did: connection.their_did.clone(),
        state: ExchangeStateMachine::transition(ExchangeState::Offered, ExchangeEvent::Request)?,
        cred_def,
        metadata,
    };
    holder.emit(Phase::CredentialRequested, exchange.id.as_str());
    Ok((exchange, reply))
}

/// Outcome of a completed exchange, from the holder's side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedCredential {
    pub referent: String,
    pub cred_def_id: CredDefId,
    pub values: CredentialValues,
}

/// Run a whole exchange between two in-process agents.
pub async fn exchange_credential(
    issuer: &Agent,
    issuer_conn: &Connection,
    holder: &Agent,
    holder_conn: &Connection,
    cred_def_id: &CredDefId,
    master_secret_id: &str,
    values: CredentialValues,
) -> Result<IssuedCredential, ProtocolError> {
    tracing::info!(
        issuer = issuer.name(),
        holder = holder.name(),
        cred_def_id = %cred_def_id,
        "exchanging credential"
    );
    let (mut issuing, offer) = offer_credential(issuer, issuer_conn, cred_def_id).await?;
    let (mut holding, request) = accept_offer(holder, holder_conn, &offer, master_secret_id).await?;
    let credential = issuing
        .issue(issuer, issuer_conn, &request, values.clone())
        .await?;
    let referent = holding.store(holder, holder_conn, &credential).await?;

    Ok(IssuedCredential {
        referent,
        cred_def_id: cred_def_id.clone(),
        values,
    })
}
