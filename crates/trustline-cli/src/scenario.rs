//! The getting-started walkthrough.
//!
//! A steward onboards Government, Faber, Acme and Thrift and promotes each
//! to trust anchor. Government publishes the Job-Certificate and Transcript
//! schemas, Faber and Acme publish credential definitions for them, and
//! Faber onboards Alice and issues her a transcript.

use std::sync::Arc;

use serde::Serialize;

use trustline_core::{CredDefId, Did, Role, SchemaId};
use trustline_credentials::{CredentialDefinitionConfig, CredentialValues};
use trustline_ledger::{InMemoryLedger, Ledger};
use trustline_protocol::{
    exchange_credential, onboard, promote_to_verinym, publish_credential_definition,
    publish_schema, Agent, ProtocolError,
};
use trustline_wallet::WalletRegistry;

use crate::config::{AgentConfig, ScenarioConfig};

pub const JOB_CERTIFICATE_ATTRS: [&str; 5] =
    ["first_name", "last_name", "salary", "employee_status", "experience"];

pub const TRANSCRIPT_ATTRS: [&str; 7] = [
    "first_name",
    "last_name",
    "degree",
    "status",
    "year",
    "average",
    "ssn",
];

/// What the walkthrough left on the ledger and in Alice's wallet.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    pub pool: String,
    pub steward_did: Did,
    pub government_did: Did,
    pub faber_did: Did,
    pub acme_did: Did,
    pub thrift_did: Did,
    pub job_certificate_schema_id: SchemaId,
    pub transcript_schema_id: SchemaId,
    pub faber_transcript_cred_def_id: CredDefId,
    pub acme_job_certificate_cred_def_id: CredDefId,
    pub alice_transcript_referent: String,
    pub ledger_transactions: usize,
}

/// Transcript values Faber issues to Alice.
///
/// Non-integer encodings are issuer-chosen; integers encode as themselves.
pub fn alice_transcript() -> Result<CredentialValues, ProtocolError> {
    let mut values = CredentialValues::new();
    for (name, raw, encoded) in [
        ("first_name", "Alice", "1139481716457488690172217916278103335"),
        ("last_name", "Garcia", "5321642780241790123587902456789123452"),
        ("degree", "Bachelor of Science, Marketing", "12434523576212321"),
        ("status", "graduated", "2213454313412354"),
        ("ssn", "123-45-6789", "3124141231422543541"),
        ("year", "2015", "2015"),
        ("average", "5", "5"),
    ] {
        values.insert_encoded(name, raw, encoded)?;
    }
    Ok(values)
}

fn provision(
    config: &AgentConfig,
    registry: &WalletRegistry,
    ledger: &Arc<InMemoryLedger>,
) -> Result<Agent, ProtocolError> {
    Agent::provision(
        config.name.clone(),
        registry,
        &config.wallet_config(),
        &config.wallet_credentials(),
        ledger.clone(),
    )
}

/// Onboard a new agent with `steward` and make it a trust anchor.
async fn trust_anchor(
    steward: &Agent,
    config: &AgentConfig,
    registry: &WalletRegistry,
    ledger: &Arc<InMemoryLedger>,
) -> Result<Agent, ProtocolError> {
    let mut agent = provision(config, registry, ledger)?;
    let mut onboarding = onboard(steward, &agent).await?;
    let verinym = promote_to_verinym(steward, &agent, &mut onboarding, Role::TrustAnchor).await?;
    agent.adopt_verinym(&verinym)?;
    Ok(agent)
}

/// Run the walkthrough against a fresh in-process ledger.
pub async fn run(config: &ScenarioConfig) -> Result<ScenarioReport, ProtocolError> {
    let ledger = Arc::new(InMemoryLedger::new(config.pool.clone()));
    let registry = WalletRegistry::new();
    tracing::info!(pool = %ledger.pool().name, protocol_version = ledger.pool().protocol_version, "opened pool");

    let mut steward = provision(&config.steward.agent, &registry, &ledger)?;
    let steward_id = steward.create_public_did_from_seed(&config.steward.seed)?;
    ledger.add_genesis_nym(
        steward_id.did.clone(),
        steward_id.verkey.clone(),
        Role::TrustSteward,
    );

    let government = trust_anchor(&steward, &config.government, &registry, &ledger).await?;
    let faber = trust_anchor(&steward, &config.faber, &registry, &ledger).await?;
    let acme = trust_anchor(&steward, &config.acme, &registry, &ledger).await?;
    let thrift = trust_anchor(&steward, &config.thrift, &registry, &ledger).await?;

    let job_certificate =
        publish_schema(&government, "Job-Certificate", "0.2", &JOB_CERTIFICATE_ATTRS).await?;
    let transcript = publish_schema(&government, "Transcript", "1.2", &TRANSCRIPT_ATTRS).await?;

    let no_revocation = CredentialDefinitionConfig::default();
    let faber_transcript =
        publish_credential_definition(&faber, &transcript.id, "TAG1", &no_revocation).await?;
    let acme_job_certificate =
        publish_credential_definition(&acme, &job_certificate.id, "TAG1", &no_revocation).await?;

    let alice = provision(&config.alice, &registry, &ledger)?;
    let faber_alice = onboard(&faber, &alice).await?;
    let master_secret_id = alice.wallet().prover_create_master_secret(None)?;
    let issued = exchange_credential(
        &faber,
        &faber_alice.initiator,
        &alice,
        &faber_alice.subordinate,
        &faber_transcript.id,
        &master_secret_id,
        alice_transcript()?,
    )
    .await?;

    let report = ScenarioReport {
        pool: ledger.pool().name.clone(),
        steward_did: steward_id.did,
        government_did: government.public_did()?.did.clone(),
        faber_did: faber.public_did()?.did.clone(),
        acme_did: acme.public_did()?.did.clone(),
        thrift_did: thrift.public_did()?.did.clone(),
        job_certificate_schema_id: job_certificate.id,
        transcript_schema_id: transcript.id,
        faber_transcript_cred_def_id: faber_transcript.id,
        acme_job_certificate_cred_def_id: acme_job_certificate.id,
        alice_transcript_referent: issued.referent,
        ledger_transactions: ledger.transaction_count(),
    };
    tracing::info!(referent = %report.alice_transcript_referent, transactions = report.ledger_transactions, "walkthrough complete");
    Ok(report)
}
