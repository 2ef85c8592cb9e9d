//! Publishing and resolving schemas and credential definitions.

use trustline_core::{CredDefId, SchemaId};
use trustline_credentials::{
    CredentialDefinition, CredentialDefinitionConfig, Schema, SignatureType,
};
use trustline_ledger::{
    build_cred_def_request, build_schema_request, LedgerRequest, TransactionReceipt,
};
use trustline_wallet::issuer_create_schema;

use crate::agent::Agent;
use crate::error::ProtocolError;
use crate::events::Phase;

async fn submit(agent: &Agent, request: LedgerRequest) -> Result<TransactionReceipt, ProtocolError> {
    let request = request.with_protocol_version(agent.ledger().pool().protocol_version);
    let signed = agent.wallet().sign_request(request)?;
    Ok(agent.ledger().submit(signed).await?)
}

/// Create a schema under the agent's public DID and write it to the ledger.
///
/// The returned schema carries the sequence number the ledger assigned.
pub async fn publish_schema(
    agent: &Agent,
    name: &str,
    version: &str,
    attr_names: &[&str],
) -> Result<Schema, ProtocolError> {
    let issuer = agent.public_did()?.did.clone();
    let mut schema = issuer_create_schema(&issuer, name, version, attr_names)?;

    let receipt = submit(agent, build_schema_request(&issuer, &schema)).await?;
    schema.seq_no = Some(receipt.seq_no);

    tracing::info!(agent = agent.name(), schema_id = %schema.id, seq_no = receipt.seq_no, "schema published");
    agent.emit(Phase::SchemaPublished, schema.id.as_str());
    Ok(schema)
}

pub async fn fetch_schema(agent: &Agent, id: &SchemaId) -> Result<Schema, ProtocolError> {
    Ok(agent.ledger().get_schema(id).await?)
}

/// Fetch `schema_id` from the ledger, create a definition for it under the
/// agent's public DID, and publish the definition.
///
/// The signing key stays in the agent's wallet.
pub async fn publish_credential_definition(
    agent: &Agent,
    schema_id: &SchemaId,
    tag: &str,
    config: &CredentialDefinitionConfig,
) -> Result<CredentialDefinition, ProtocolError> {
    let issuer = agent.public_did()?.did.clone();
    let schema = fetch_schema(agent, schema_id).await?;
    let definition = agent.wallet().issuer_create_and_store_credential_def(
        &issuer,
        &schema,
        tag,
        SignatureType::default(),
        config,
    )?;

    let receipt = submit(agent, build_cred_def_request(&issuer, &definition)).await?;

    tracing::info!(agent = agent.name(), cred_def_id = %definition.id, seq_no = receipt.seq_no, "credential definition published");
    agent.emit(Phase::CredentialDefinitionPublished, definition.id.as_str());
    Ok(definition)
}

pub async fn fetch_credential_definition(
    agent: &Agent,
    id: &CredDefId,
) -> Result<CredentialDefinition, ProtocolError> {
    Ok(agent.ledger().get_cred_def(id).await?)
}
