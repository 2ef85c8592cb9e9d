//! Fixtures shared by the unit tests of this crate.

use std::sync::Arc;

use trustline_core::{PoolConfig, Role, WalletConfig, WalletCredentials};
use trustline_ledger::InMemoryLedger;
use trustline_wallet::WalletRegistry;

use crate::agent::Agent;
use crate::handshake::{onboard, promote_to_verinym};

pub const STEWARD_SEED: &str = "000000000000000000000000Steward1";

pub struct Network {
    pub ledger: Arc<InMemoryLedger>,
    pub registry: WalletRegistry,
}

impl Network {
    pub fn new() -> Self {
        Self {
            ledger: Arc::new(InMemoryLedger::new(PoolConfig::default())),
            registry: WalletRegistry::new(),
        }
    }

    pub fn agent(&self, name: &str) -> Agent {
        Agent::provision(
            name,
            &self.registry,
            &WalletConfig::new(format!("{}Wallet", name)),
            &WalletCredentials::new(format!("{}_key", name)),
            self.ledger.clone(),
        )
        .unwrap()
    }

    /// Agent whose public DID is the genesis steward.
    pub fn steward(&self) -> Agent {
        let mut steward = self.agent("Steward");
        let public = steward.create_public_did_from_seed(STEWARD_SEED).unwrap();
        self.ledger
            .add_genesis_nym(public.did, public.verkey, Role::TrustSteward);
        steward
    }

    /// Onboard `name` with `promoter` and promote it to `role`.
    pub async fn promoted(&self, promoter: &Agent, name: &str, role: Role) -> Agent {
        let mut agent = self.agent(name);
        let mut onboarding = onboard(promoter, &agent).await.unwrap();
        let verinym = promote_to_verinym(promoter, &agent, &mut onboarding, role)
            .await
            .unwrap();
        agent.adopt_verinym(&verinym).unwrap();
        agent
    }
}
