//! Integration test: schema and definition publishing plus the
//! offer → request → issue → store exchange over an onboarded channel.

use trustline_core::{ExchangeState, Role};
use trustline_credentials::{encode_attribute, CredentialDefinitionConfig, CredentialValues};
use trustline_integration_tests::TestNetwork;
use trustline_ledger::Ledger;
use trustline_protocol::{
    accept_offer, exchange_credential, fetch_credential_definition, fetch_schema,
    offer_credential, onboard, publish_credential_definition, publish_schema, Agent, AuthCrypted,
    Connection, Phase, ProtocolError,
};
use trustline_wallet::CredentialFilter;

const TRANSCRIPT_ATTRS: [&str; 7] = [
    "first_name",
    "last_name",
    "degree",
    "status",
    "year",
    "average",
    "ssn",
];

struct Setup {
    net: TestNetwork,
    faber: Agent,
    alice: Agent,
    faber_alice: Connection,
    alice_faber: Connection,
    cred_def_id: trustline_core::CredDefId,
}

/// Government owns the Transcript schema, Faber issues under it and has
/// onboarded Alice.
async fn setup() -> Setup {
    let net = TestNetwork::new();
    let steward = net.steward();
    let government = net.promoted(&steward, "Government", Role::TrustAnchor).await;
    let faber = net.promoted(&steward, "Faber", Role::TrustAnchor).await;

    let schema = publish_schema(&government, "Transcript", "1.2", &TRANSCRIPT_ATTRS)
        .await
        .expect("schema publish should succeed");
    let definition = publish_credential_definition(
        &faber,
        &schema.id,
        "TAG1",
        &CredentialDefinitionConfig::default(),
    )
    .await
    .expect("definition publish should succeed");

    let alice = net.agent("Alice");
    let onboarding = onboard(&faber, &alice).await.unwrap();

    Setup {
        net,
        faber,
        alice,
        faber_alice: onboarding.initiator,
        alice_faber: onboarding.subordinate,
        cred_def_id: definition.id,
    }
}

fn transcript(first_name: &str) -> CredentialValues {
    CredentialValues::from_raw([
        ("first_name", first_name),
        ("last_name", "Garcia"),
        ("degree", "Bachelor of Science, Marketing"),
        ("status", "graduated"),
        ("year", "2015"),
        ("average", "5"),
        ("ssn", "123-45-6789"),
    ])
}

// =========================================================================
// Registry
// =========================================================================

#[tokio::test]
async fn test_published_artifacts_resolve_from_ledger() {
    let s = setup().await;
    let definition = fetch_credential_definition(&s.alice, &s.cred_def_id)
        .await
        .unwrap();
    let schema = fetch_schema(&s.alice, &definition.schema_id).await.unwrap();

    assert_eq!(schema.name, "Transcript");
    assert_eq!(schema.version, "1.2");
    assert_eq!(definition.attr_names, schema.attr_names);
    assert!(schema.seq_no.is_some());
    assert_eq!(
        s.net.ledger.get_schema(&schema.id).await.unwrap(),
        schema
    );
}

#[tokio::test]
async fn test_schema_is_immutable() {
    let net = TestNetwork::new();
    let steward = net.steward();
    let government = net.promoted(&steward, "Government", Role::TrustAnchor).await;

    publish_schema(&government, "Job-Certificate", "0.2", &["first_name"])
        .await
        .unwrap();
    let err = publish_schema(&government, "Job-Certificate", "0.2", &["first_name", "salary"])
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ProtocolError::Ledger(trustline_ledger::LedgerError::AlreadyRegistered(_))
    ));
}

// =========================================================================
// Exchange
// =========================================================================

#[tokio::test]
async fn test_holder_stores_issued_values() {
    let s = setup().await;
    let ms = s.alice.wallet().prover_create_master_secret(None).unwrap();

    let issued = exchange_credential(
        &s.faber,
        &s.faber_alice,
        &s.alice,
        &s.alice_faber,
        &s.cred_def_id,
        &ms,
        transcript("Alice"),
    )
    .await
    .expect("exchange should succeed");

    let info = s.alice.wallet().prover_get_credential(&issued.referent).unwrap();
    assert_eq!(info.master_secret_id, ms);
    assert_eq!(info.cred_def_id, s.cred_def_id);
    assert_eq!(info.attrs["first_name"], "Alice");
    assert_eq!(info.attrs["year"], "2015");

    let stored = s.alice.wallet().prover_get_credentials(&CredentialFilter::by_master_secret(&ms));
    assert_eq!(stored.len(), 1);
    assert_eq!(encode_attribute("2015"), "2015");
}

#[tokio::test]
async fn test_exchanges_are_independent() {
    let s = setup().await;
    let ms = s.alice.wallet().prover_create_master_secret(Some("ms-1")).unwrap();

    // Two offers in flight at once.
    let (mut first, first_offer) = offer_credential(&s.faber, &s.faber_alice, &s.cred_def_id)
        .await
        .unwrap();
    let (mut second, second_offer) = offer_credential(&s.faber, &s.faber_alice, &s.cred_def_id)
        .await
        .unwrap();
    assert_ne!(first.id(), second.id());

    let (_, first_request) = accept_offer(&s.alice, &s.alice_faber, &first_offer, &ms)
        .await
        .unwrap();
    let (mut holding, second_request) =
        accept_offer(&s.alice, &s.alice_faber, &second_offer, &ms)
            .await
            .unwrap();

    // The first fails on its values; the second is unaffected.
    let mut partial = CredentialValues::new();
    partial.insert("first_name", "Alice");
    assert!(first
        .issue(&s.faber, &s.faber_alice, &first_request, partial)
        .await
        .is_err());
    assert_eq!(first.state(), ExchangeState::Aborted);

    let credential = second
        .issue(&s.faber, &s.faber_alice, &second_request, transcript("Alice"))
        .await
        .unwrap();
    holding
        .store(&s.alice, &s.alice_faber, &credential)
        .await
        .unwrap();
    assert_eq!(second.state(), ExchangeState::Issued);
    assert_eq!(holding.state(), ExchangeState::Stored);
}

#[tokio::test]
async fn test_request_answered_to_other_offer_is_refused() {
    let s = setup().await;
    let ms = s.alice.wallet().prover_create_master_secret(None).unwrap();

    let (mut first, _) = offer_credential(&s.faber, &s.faber_alice, &s.cred_def_id)
        .await
        .unwrap();
    let (_, second_offer) = offer_credential(&s.faber, &s.faber_alice, &s.cred_def_id)
        .await
        .unwrap();
    let (_, request) = accept_offer(&s.alice, &s.alice_faber, &second_offer, &ms)
        .await
        .unwrap();

    // The request echoes the second offer's nonce.
    let result = first
        .issue(&s.faber, &s.faber_alice, &request, transcript("Alice"))
        .await;
    assert!(result.is_err());
    assert_eq!(first.state(), ExchangeState::Aborted);
}

#[tokio::test]
async fn test_exchange_phase_events() {
    let s = setup().await;
    let ms = s.alice.wallet().prover_create_master_secret(None).unwrap();
    let mut faber_events = s.faber.subscribe();
    let mut alice_events = s.alice.subscribe();

    exchange_credential(
        &s.faber,
        &s.faber_alice,
        &s.alice,
        &s.alice_faber,
        &s.cred_def_id,
        &ms,
        transcript("Alice"),
    )
    .await
    .unwrap();

    assert_eq!(faber_events.recv().await.unwrap().phase, Phase::CredentialOffered);
    assert_eq!(faber_events.recv().await.unwrap().phase, Phase::CredentialIssued);
    assert_eq!(alice_events.recv().await.unwrap().phase, Phase::CredentialRequested);
    assert_eq!(alice_events.recv().await.unwrap().phase, Phase::CredentialStored);
}

#[tokio::test]
async fn test_offer_requires_authenticated_channel() {
    let s = setup().await;
    let mut unconfirmed = s.faber_alice.clone();
    unconfirmed.state = trustline_core::HandshakeState::RequestSent;

    let result = offer_credential(&s.faber, &unconfirmed, &s.cred_def_id).await;
    assert!(matches!(result, Err(ProtocolError::InvalidState(_))));
}

// =========================================================================
// Undecryptable messages
// =========================================================================

fn garbage() -> AuthCrypted {
    AuthCrypted(vec![1u8; 100])
}

/// A complete exchange on the same channel after a failed one.
async fn exchange_still_works(s: &Setup, ms: &str) {
    exchange_credential(
        &s.faber,
        &s.faber_alice,
        &s.alice,
        &s.alice_faber,
        &s.cred_def_id,
        ms,
        transcript("Alice"),
    )
    .await
    .expect("channel should still be usable");
}

#[tokio::test]
async fn test_undecryptable_offer() {
    let s = setup().await;
    let ms = s.alice.wallet().prover_create_master_secret(None).unwrap();

    let result = accept_offer(&s.alice, &s.alice_faber, &garbage(), &ms).await;
    assert!(matches!(result, Err(ProtocolError::Decryption(_))));

    exchange_still_works(&s, &ms).await;
}

#[tokio::test]
async fn test_undecryptable_request_aborts_exchange() {
    let s = setup().await;
    let ms = s.alice.wallet().prover_create_master_secret(None).unwrap();
    let (mut issuing, _) = offer_credential(&s.faber, &s.faber_alice, &s.cred_def_id)
        .await
        .unwrap();

    let result = issuing
        .issue(&s.faber, &s.faber_alice, &garbage(), transcript("Alice"))
        .await;
    assert!(matches!(result, Err(ProtocolError::Decryption(_))));
    assert_eq!(issuing.state(), ExchangeState::Aborted);

    exchange_still_works(&s, &ms).await;
}

#[tokio::test]
async fn test_undecryptable_credential_aborts_exchange() {
    let s = setup().await;
    let ms = s.alice.wallet().prover_create_master_secret(None).unwrap();
    let (_, offer) = offer_credential(&s.faber, &s.faber_alice, &s.cred_def_id)
        .await
        .unwrap();
    let (mut holding, _) = accept_offer(&s.alice, &s.alice_faber, &offer, &ms)
        .await
        .unwrap();

    let result = holding.store(&s.alice, &s.alice_faber, &garbage()).await;
    assert!(matches!(result, Err(ProtocolError::Decryption(_))));
    assert_eq!(holding.state(), ExchangeState::Aborted);
    assert!(s
        .alice
        .wallet()
        .prover_get_credentials(&CredentialFilter::by_master_secret(&ms))
        .is_empty());

    exchange_still_works(&s, &ms).await;
}
