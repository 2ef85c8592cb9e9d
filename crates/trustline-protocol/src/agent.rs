use std::sync::Arc;
use tokio::sync::broadcast;

use trustline_core::{Did, Role, Verkey, WalletConfig, WalletCredentials};
use trustline_ledger::{build_nym_request, Ledger, TransactionReceipt};
use trustline_wallet::{DidInfo, LocalIdentity, Wallet, WalletError, WalletRegistry};

use crate::error::ProtocolError;
use crate::events::{Phase, PhaseEvent, EVENT_CHANNEL_CAPACITY};
use crate::handshake::Verinym;
use crate::nonce::NonceRegistry;

/// A party to the protocol: one wallet, a ledger client and, once it has
/// one, a public DID it signs ledger writes with.
pub struct Agent {
    name: String,
    wallet: Wallet,
    ledger: Arc<dyn Ledger>,
    public_did: Option<LocalIdentity>,
    nonces: NonceRegistry,
    events: broadcast::Sender<PhaseEvent>,
}

impl Agent {
    /// Create the agent's wallet if it does not exist yet, then open it.
    pub fn provision(
        name: impl Into<String>,
        registry: &WalletRegistry,
        config: &WalletConfig,
        credentials: &WalletCredentials,
        ledger: Arc<dyn Ledger>,
    ) -> Result<Self, ProtocolError> {
        let name = name.into();
        match registry.create_wallet(config, credentials) {
            Ok(()) => {}
            Err(WalletError::AlreadyExists(_)) => {
                tracing::debug!(agent = %name, wallet = %config.id, "wallet already provisioned");
            }
            Err(e) => return Err(e.into()),
        }
        let wallet = registry.open_wallet(config, credentials)?;
        Ok(Self::new(name, wallet, ledger))
    }

    /// Wrap an already opened wallet.
    pub fn new(name: impl Into<String>, wallet: Wallet, ledger: Arc<dyn Ledger>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            name: name.into(),
            wallet,
            ledger,
            public_did: None,
            nonces: NonceRegistry::new(),
            events,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn wallet(&self) -> &Wallet {
        &self.wallet
    }

    pub fn ledger(&self) -> &dyn Ledger {
        self.ledger.as_ref()
    }

    pub(crate) fn nonces(&self) -> &NonceRegistry {
        &self.nonces
    }

    /// Receive this agent's phase events from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<PhaseEvent> {
        self.events.subscribe()
    }

    /// Create the agent's public DID from a seed, as for a pool steward
    /// whose DID is in the genesis transactions.
    pub fn create_public_did_from_seed(&mut self, seed: &str) -> Result<LocalIdentity, ProtocolError> {
        let identity = self.wallet.create_and_store_my_did(DidInfo::from_seed(seed))?;
        tracing::info!(agent = %self.name, did = %identity.did, "public DID created from seed");
        self.public_did = Some(identity.clone());
        Ok(identity)
    }

    /// Use a freshly promoted verinym as the public DID.
    pub fn adopt_verinym(&mut self, verinym: &Verinym) -> Result<(), ProtocolError> {
        let identity = self
            .wallet
            .my_did(&verinym.did)
            .ok_or_else(|| ProtocolError::Wallet(WalletError::UnknownDid(verinym.did.clone())))?;
        if identity.verkey != verinym.verkey {
            return Err(ProtocolError::InvalidState(format!(
                "verinym {} does not carry this wallet's key",
                verinym.did
            )));
        }
        tracing::info!(agent = %self.name, did = %identity.did, role = %verinym.role, "verinym adopted");
        self.public_did = Some(identity);
        Ok(())
    }

    pub fn public_did(&self) -> Result<&LocalIdentity, ProtocolError> {
        self.public_did
            .as_ref()
            .ok_or_else(|| ProtocolError::NoPublicDid(self.name.clone()))
    }

    /// Fresh identity for one relationship.
    pub(crate) fn create_pairwise_identity(&self) -> Result<LocalIdentity, ProtocolError> {
        Ok(self.wallet.create_and_store_my_did(DidInfo::random())?)
    }

    /// Sign and submit a NYM for `target` with the agent's public DID.
    pub async fn send_nym(
        &self,
        target: &Did,
        verkey: &Verkey,
        role: Option<Role>,
    ) -> Result<TransactionReceipt, ProtocolError> {
        let submitter = self.public_did()?;
        let request = build_nym_request(&submitter.did, target, Some(verkey), role)
            .with_protocol_version(self.ledger.pool().protocol_version);
        let signed = self.wallet.sign_request(request)?;
        let receipt = self.ledger.submit(signed).await?;
        tracing::debug!(agent = %self.name, target = %target, seq_no = receipt.seq_no, "NYM sent");
        Ok(receipt)
    }

    pub(crate) fn emit(&self, phase: Phase, subject: impl Into<String>) {
        let event = PhaseEvent {
            agent: self.name.clone(),
            phase,
            subject: subject.into(),
        };
        tracing::info!(agent = %event.agent, phase = %event.phase, subject = %event.subject, "protocol phase");
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trustline_core::PoolConfig;
    use trustline_ledger::InMemoryLedger;

    const STEWARD_SEED: &str = "000000000000000000000000Steward1";

    fn ledger() -> Arc<InMemoryLedger> {
        Arc::new(InMemoryLedger::new(PoolConfig::default()))
    }

    #[test]
    fn test_provision_is_idempotent() {
        let registry = WalletRegistry::new();
        let config = WalletConfig::new("governmentWallet");
        let creds = WalletCredentials::new("government_key");
        let ledger = ledger();

        let first = Agent::provision("Government", &registry, &config, &creds, ledger.clone()).unwrap();
        let identity = first.wallet().create_and_store_my_did(DidInfo::random()).unwrap();

        let second = Agent::provision("Government", &registry, &config, &creds, ledger).unwrap();
        assert_eq!(second.wallet().my_did(&identity.did), Some(identity));
    }

    #[test]
    fn test_provision_wrong_key_fails() {
        let registry = WalletRegistry::new();
        let config = WalletConfig::new("faberWallet");
        Agent::provision("Faber", &registry, &config, &WalletCredentials::new("faber_key"), ledger())
            .unwrap();
        let result = Agent::provision(
            "Faber",
            &registry,
            &config,
            &WalletCredentials::new("other"),
            ledger(),
        );
        assert!(matches!(
            result,
            Err(ProtocolError::Wallet(WalletError::AccessDenied(_)))
        ));
    }

    #[tokio::test]
    async fn test_send_nym_requires_public_did() {
        let registry = WalletRegistry::new();
        let agent = Agent::provision(
            "Nobody",
            &registry,
            &WalletConfig::new("w"),
            &WalletCredentials::new("k"),
            ledger(),
        )
        .unwrap();
        let target = agent.create_pairwise_identity().unwrap();
        let result = agent.send_nym(&target.did, &target.verkey, None).await;
        assert!(matches!(result, Err(ProtocolError::NoPublicDid(_))));
    }

    #[tokio::test]
    async fn test_steward_sends_nym() {
        let registry = WalletRegistry::new();
        let ledger = ledger();
        let mut steward = Agent::provision(
            "Steward",
            &registry,
            &WalletConfig::new("stewardWalletName"),
            &WalletCredentials::new("steward_key"),
            ledger.clone(),
        )
        .unwrap();
        let public = steward.create_public_did_from_seed(STEWARD_SEED).unwrap();
        ledger.add_genesis_nym(public.did.clone(), public.verkey.clone(), Role::TrustSteward);

        let target = steward.create_pairwise_identity().unwrap();
        steward
            .send_nym(&target.did, &target.verkey, Some(Role::TrustAnchor))
            .await
            .unwrap();
        let nym = ledger.get_nym(&target.did).await.unwrap();
        assert_eq!(nym.role, Role::TrustAnchor);
    }

    #[tokio::test]
    async fn test_user_send_nym_is_authorization_error() {
        let registry = WalletRegistry::new();
        let ledger = ledger();
        let mut steward = Agent::provision(
            "Steward",
            &registry,
            &WalletConfig::new("steward"),
            &WalletCredentials::new("k"),
            ledger.clone(),
        )
        .unwrap();
        let public = steward.create_public_did_from_seed(STEWARD_SEED).unwrap();
        ledger.add_genesis_nym(public.did.clone(), public.verkey.clone(), Role::TrustSteward);

        let mut user = Agent::provision(
            "User",
            &registry,
            &WalletConfig::new("user"),
            &WalletCredentials::new("k"),
            ledger.clone(),
        )
        .unwrap();
        let user_id = user.create_pairwise_identity().unwrap();
        steward.send_nym(&user_id.did, &user_id.verkey, None).await.unwrap();
        user.adopt_verinym(&Verinym {
            did: user_id.did.clone(),
            verkey: user_id.verkey.clone(),
            role: Role::User,
        })
        .unwrap();

        let target = user.create_pairwise_identity().unwrap();
        let err = user.send_nym(&target.did, &target.verkey, None).await.unwrap_err();
        assert!(err.is_authorization());
    }

    #[test]
    fn test_adopt_foreign_verinym_fails() {
        let registry = WalletRegistry::new();
        let mut agent = Agent::provision(
            "A",
            &registry,
            &WalletConfig::new("a"),
            &WalletCredentials::new("k"),
            ledger(),
        )
        .unwrap();
        let foreign = trustline_crypto::KeyPair::generate();
        let result = agent.adopt_verinym(&Verinym {
            did: foreign.did(),
            verkey: foreign.verkey(),
            role: Role::TrustAnchor,
        });
        assert!(result.is_err());
        assert!(agent.public_did().is_err());
    }

    #[tokio::test]
    async fn test_events_reach_subscribers() {
        let registry = WalletRegistry::new();
        let agent = Agent::provision(
            "A",
            &registry,
            &WalletConfig::new("a"),
            &WalletCredentials::new("k"),
            ledger(),
        )
        .unwrap();
        let mut rx = agent.subscribe();
        agent.emit(Phase::SchemaPublished, "schema-id");
        let event = rx.recv().await.unwrap();
        assert_eq!(event.phase, Phase::SchemaPublished);
        assert_eq!(event.agent, "A");
        assert_eq!(event.subject, "schema-id");
    }
}
