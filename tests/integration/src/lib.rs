//! Fixtures shared by the cross-crate scenario tests.

use std::sync::Arc;

use trustline_core::{PoolConfig, Role, WalletConfig, WalletCredentials};
use trustline_ledger::InMemoryLedger;
use trustline_protocol::{onboard, promote_to_verinym, Agent};
use trustline_wallet::WalletRegistry;

pub const STEWARD_SEED: &str = "000000000000000000000000Steward1";
pub const STEWARD_DID: &str = "Th7MpTaRZVRYnPiabds81Y";

/// One in-process pool and the wallets of everyone on it.
pub struct TestNetwork {
    pub ledger: Arc<InMemoryLedger>,
    pub registry: WalletRegistry,
}

impl Default for TestNetwork {
    fn default() -> Self {
        Self::new()
    }
}

impl TestNetwork {
    pub fn new() -> Self {
        Self {
            ledger: Arc::new(InMemoryLedger::new(PoolConfig::default())),
            registry: WalletRegistry::new(),
        }
    }

    /// Agent with a freshly created wallet and no public DID.
    pub fn agent(&self, name: &str) -> Agent {
        Agent::provision(
            name,
            &self.registry,
            &WalletConfig::new(format!("{}Wallet", name.to_lowercase())),
            &WalletCredentials::new(format!("{}_key", name.to_lowercase())),
            self.ledger.clone(),
        )
        .expect("wallet provisioning should succeed")
    }

    /// The genesis steward.
    pub fn steward(&self) -> Agent {
        let mut steward = self.agent("Steward");
        let id = steward
            .create_public_did_from_seed(STEWARD_SEED)
            .expect("steward seed is valid");
        self.ledger
            .add_genesis_nym(id.did, id.verkey, Role::TrustSteward);
        steward
    }

    /// Onboard `name` with `promoter`, promote it to `role` and adopt the
    /// verinym as its public DID.
    pub async fn promoted(&self, promoter: &Agent, name: &str, role: Role) -> Agent {
        let mut agent = self.agent(name);
        let mut onboarding = onboard(promoter, &agent)
            .await
            .expect("onboarding should succeed");
        let verinym = promote_to_verinym(promoter, &agent, &mut onboarding, role)
            .await
            .expect("promotion should succeed");
        agent
            .adopt_verinym(&verinym)
            .expect("verinym belongs to the agent");
        agent
    }
}
