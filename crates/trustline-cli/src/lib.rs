//! Trustline CLI — scenario configuration and the getting-started
//! walkthrough driven by the `trustline` binary.

pub mod config;
pub mod scenario;

pub use config::{AgentConfig, LoggingConfig, ScenarioConfig, StewardConfig};
pub use scenario::{run, ScenarioReport};
