//! Scenario configuration loading and management.

use serde::{Deserialize, Serialize};
use std::path::Path;

use trustline_core::{PoolConfig, WalletConfig, WalletCredentials};

/// Full configuration for a walkthrough run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioConfig {
    /// Ledger pool settings.
    #[serde(default)]
    pub pool: PoolConfig,

    /// Root steward, already on the ledger from genesis.
    #[serde(default)]
    pub steward: StewardConfig,

    #[serde(default = "default_government")]
    pub government: AgentConfig,

    #[serde(default = "default_faber")]
    pub faber: AgentConfig,

    #[serde(default = "default_acme")]
    pub acme: AgentConfig,

    #[serde(default = "default_thrift")]
    pub thrift: AgentConfig,

    #[serde(default = "default_alice")]
    pub alice: AgentConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// One agent: display name and wallet access.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentConfig {
    pub name: String,
    pub wallet: String,
    pub key: String,
}

impl AgentConfig {
    fn new(name: &str, wallet: &str, key: &str) -> Self {
        Self {
            name: name.into(),
            wallet: wallet.into(),
            key: key.into(),
        }
    }

    pub fn wallet_config(&self) -> WalletConfig {
        WalletConfig::new(&self.wallet)
    }

    pub fn wallet_credentials(&self) -> WalletCredentials {
        WalletCredentials::new(&self.key)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StewardConfig {
    #[serde(flatten)]
    pub agent: AgentConfig,
    /// 32-character seed of the steward's genesis DID.
    #[serde(default = "default_steward_seed")]
    pub seed: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (text, json).
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_steward_seed() -> String {
    "000000000000000000000000Steward1".into()
}
fn default_government() -> AgentConfig {
    AgentConfig::new("Government", "governmentWallet", "government_key")
}
fn default_faber() -> AgentConfig {
    AgentConfig::new("Faber", "faberWallet", "faber_key")
}
fn default_acme() -> AgentConfig {
    AgentConfig::new("Acme", "acmeWallet", "acme_key")
}
fn default_thrift() -> AgentConfig {
    AgentConfig::new("Thrift", "thriftWallet", "thrift_key")
}
fn default_alice() -> AgentConfig {
    AgentConfig::new("Alice", "aliceWallet", "alice_key")
}
fn default_log_level() -> String {
    "info".into()
}
fn default_log_format() -> String {
    "text".into()
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            pool: PoolConfig::default(),
            steward: StewardConfig::default(),
            government: default_government(),
            faber: default_faber(),
            acme: default_acme(),
            thrift: default_thrift(),
            alice: default_alice(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for StewardConfig {
    fn default() -> Self {
        Self {
            agent: AgentConfig::new("Sovrin Steward", "stewardWalletName", "steward_key"),
            seed: default_steward_seed(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl ScenarioConfig {
    /// Load config from a TOML file, falling back to defaults for missing fields.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            let config: ScenarioConfig = toml::from_str(&contents)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save the current config to a TOML file.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let contents = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, contents)?;
        Ok(())
    }
}
