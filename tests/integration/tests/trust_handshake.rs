//! Integration test: onboarding and verinym promotion across wallet,
//! ledger and protocol crates.

use futures::future::join_all;

use trustline_core::{HandshakeState, Role};
use trustline_integration_tests::{TestNetwork, STEWARD_DID};
use trustline_ledger::Ledger;
use trustline_protocol::{
    begin_onboarding, begin_onboarding_with_nonce, onboard, promote_to_verinym, register_verinym,
    request_verinym, respond_to_request, AnonCrypted, AuthCrypted, ConnectionRequest, Nonce, Phase,
    ProtocolError, VerinymInfo,
};
use trustline_wallet::DidInfo;

// =========================================================================
// Onboarding
// =========================================================================

#[tokio::test]
async fn test_steward_identity_is_deterministic() {
    let net = TestNetwork::new();
    let steward = net.steward();
    assert_eq!(steward.public_did().unwrap().did.as_str(), STEWARD_DID);
    let nym = net
        .ledger
        .get_nym(&steward.public_did().unwrap().did)
        .await
        .unwrap();
    assert_eq!(nym.role, Role::TrustSteward);
}

#[tokio::test]
async fn test_onboarding_registers_both_pairwise_dids() {
    let net = TestNetwork::new();
    let steward = net.steward();
    let government = net.agent("Government");

    let onboarding = onboard(&steward, &government)
        .await
        .expect("onboarding should succeed");

    for conn in [&onboarding.initiator, &onboarding.subordinate] {
        let nym = net.ledger.get_nym(&conn.me.did).await.unwrap();
        assert_eq!(nym.verkey, conn.me.verkey);
        assert_eq!(nym.role, Role::User);
        assert_eq!(nym.endorser.as_ref(), Some(&steward.public_did().unwrap().did));
    }
    assert_eq!(
        government
            .wallet()
            .key_for_local_did(&onboarding.subordinate.me.did)
            .unwrap(),
        onboarding.subordinate.me.verkey
    );
}

#[tokio::test]
async fn test_onboarding_phase_events() {
    let net = TestNetwork::new();
    let steward = net.steward();
    let faber = net.agent("Faber");
    let mut steward_events = steward.subscribe();
    let mut faber_events = faber.subscribe();

    onboard(&steward, &faber).await.unwrap();

    assert_eq!(
        steward_events.recv().await.unwrap().phase,
        Phase::ConnectionRequested
    );
    assert_eq!(
        steward_events.recv().await.unwrap().phase,
        Phase::ConnectionAuthenticated
    );
    assert_eq!(
        faber_events.recv().await.unwrap().phase,
        Phase::ConnectionResponded
    );
    let last = faber_events.recv().await.unwrap();
    assert_eq!(last.phase, Phase::ConnectionAuthenticated);
    assert_eq!(last.agent, "Faber");
}

#[tokio::test]
async fn test_nonce_mismatch_leaves_ledger_untouched() {
    let net = TestNetwork::new();
    let steward = net.steward();
    let acme = net.agent("Acme");

    let (pending, request) = begin_onboarding_with_nonce(&steward, Nonce(1_000))
        .await
        .unwrap();
    let txns_before = net.ledger.transaction_count();

    let tampered = ConnectionRequest {
        did: request.did.clone(),
        nonce: Nonce(1_001),
    };
    let (acme_conn, response) = respond_to_request(&acme, &tampered).await.unwrap();

    let err = pending
        .complete(&steward, &response)
        .await
        .expect_err("mismatched nonce must be refused");
    assert!(matches!(err, ProtocolError::ReplayOrMismatch(_)));
    assert_eq!(net.ledger.transaction_count(), txns_before);
    assert!(net.ledger.get_nym(&acme_conn.me.did).await.is_err());
}

#[tokio::test]
async fn test_replayed_nonce_is_refused() {
    let net = TestNetwork::new();
    let steward = net.steward();
    let thrift = net.agent("Thrift");

    // First handshake with nonce 42 completes.
    let (pending, request) = begin_onboarding_with_nonce(&steward, Nonce(42))
        .await
        .unwrap();
    let (_, response) = respond_to_request(&thrift, &request).await.unwrap();
    pending.complete(&steward, &response).await.unwrap();

    // Reissuing the nonce is refused outright.
    let err = begin_onboarding_with_nonce(&steward, Nonce(42))
        .await
        .unwrap_err();
    assert!(matches!(err, ProtocolError::ReplayOrMismatch(_)));

    // A response echoing the spent nonce to a new handshake is refused too.
    let (second, second_request) = begin_onboarding_with_nonce(&steward, Nonce(43))
        .await
        .unwrap();
    let replay = ConnectionRequest {
        did: second_request.did,
        nonce: Nonce(42),
    };
    let (thrift_conn, response) = respond_to_request(&thrift, &replay).await.unwrap();
    let writes = net.ledger.nym_write_count();
    let err = second.complete(&steward, &response).await.unwrap_err();
    assert!(matches!(err, ProtocolError::ReplayOrMismatch(_)));
    assert_eq!(net.ledger.nym_write_count(), writes);
    assert!(net.ledger.get_nym(&thrift_conn.me.did).await.is_err());
}

#[tokio::test]
async fn test_undecryptable_response_burns_nonce() {
    let net = TestNetwork::new();
    let steward = net.steward();
    let acme = net.agent("Acme");

    let (pending, request) = begin_onboarding_with_nonce(&steward, Nonce(500))
        .await
        .unwrap();
    let (acme_conn, _) = respond_to_request(&acme, &request).await.unwrap();
    let writes = net.ledger.nym_write_count();

    let err = pending
        .complete(&steward, &AnonCrypted(vec![1u8; 100]))
        .await
        .expect_err("garbage must not decrypt");
    assert!(matches!(err, ProtocolError::Decryption(_)));
    assert_eq!(net.ledger.nym_write_count(), writes);
    assert!(net.ledger.get_nym(&acme_conn.me.did).await.is_err());

    // The nonce is spent; a fresh handshake with the same agent still works.
    let reuse = begin_onboarding_with_nonce(&steward, Nonce(500)).await;
    assert!(matches!(reuse, Err(ProtocolError::ReplayOrMismatch(_))));
    let onboarding = onboard(&steward, &acme).await.expect("fresh onboarding");
    assert_eq!(onboarding.initiator.state, HandshakeState::Authenticated);
}

#[tokio::test]
async fn test_user_cannot_initiate_onboarding() {
    let net = TestNetwork::new();
    let steward = net.steward();
    let alice = net.promoted(&steward, "Alice", Role::User).await;

    let err = begin_onboarding(&alice).await.unwrap_err();
    assert!(err.is_authorization());
}

// =========================================================================
// Verinym promotion
// =========================================================================

#[tokio::test]
async fn test_promotion_registers_trust_anchor() {
    let net = TestNetwork::new();
    let steward = net.steward();
    let mut faber = net.agent("Faber");

    let mut onboarding = onboard(&steward, &faber).await.unwrap();
    let verinym = promote_to_verinym(&steward, &faber, &mut onboarding, Role::TrustAnchor)
        .await
        .expect("promotion should succeed");
    faber.adopt_verinym(&verinym).unwrap();

    let nym = net.ledger.get_nym(&verinym.did).await.unwrap();
    assert_eq!(nym.verkey, verinym.verkey);
    assert_eq!(nym.role, Role::TrustAnchor);
    assert_eq!(onboarding.initiator.state, HandshakeState::VerinymRegistered);

    // The new trust anchor can onboard others.
    let alice = net.agent("Alice");
    onboard(&faber, &alice).await.expect("trust anchor may onboard");
}

#[tokio::test]
async fn test_trust_anchor_promotes_trust_anchor() {
    let net = TestNetwork::new();
    let steward = net.steward();
    let faber = net.promoted(&steward, "Faber", Role::TrustAnchor).await;
    let mut acme = net.agent("Acme");

    let mut onboarding = onboard(&faber, &acme).await.unwrap();
    let verinym = promote_to_verinym(&faber, &acme, &mut onboarding, Role::TrustAnchor)
        .await
        .expect("a trust anchor may promote");

    // The verkey on the ledger is the one Acme generated and holds.
    let generated = acme.wallet().key_for_local_did(&verinym.did).unwrap();
    let nym = net.ledger.get_nym(&verinym.did).await.unwrap();
    assert_eq!(nym.verkey, generated);
    assert_eq!(nym.role, Role::TrustAnchor);
    assert_eq!(nym.endorser.as_ref(), Some(&faber.public_did().unwrap().did));

    acme.adopt_verinym(&verinym).unwrap();
    assert_eq!(acme.public_did().unwrap().did, verinym.did);
}

#[tokio::test]
async fn test_spoofed_sender_is_not_registered() {
    let net = TestNetwork::new();
    let steward = net.steward();
    let government = net.agent("Government");
    let mallory = net.agent("Mallory");

    let mut onboarding = onboard(&steward, &government).await.unwrap();
    let mut gov_conn = onboarding.subordinate.clone();
    let (legit, _) = request_verinym(&government, &mut gov_conn).await.unwrap();

    // Mallory claims Government's new DID but signs with her own key.
    let key = mallory
        .wallet()
        .create_and_store_my_did(DidInfo::random())
        .unwrap();
    let body = serde_json::to_vec(&VerinymInfo {
        did: legit.did.clone(),
        verkey: key.verkey.clone(),
    })
    .unwrap();
    let forged = mallory
        .wallet()
        .auth_crypt(&key.verkey, &onboarding.initiator.me.verkey, &body)
        .unwrap();

    let writes = net.ledger.nym_write_count();
    let err = register_verinym(
        &steward,
        &mut onboarding.initiator,
        &AuthCrypted(forged),
        Role::TrustAnchor,
    )
    .await
    .expect_err("spoofed sender must be rejected");

    assert!(matches!(err, ProtocolError::IdentitySpoof { .. }));
    assert_eq!(net.ledger.nym_write_count(), writes);
    assert!(net.ledger.get_nym(&legit.did).await.is_err());
    assert_eq!(onboarding.initiator.state, HandshakeState::Authenticated);
}

#[tokio::test]
async fn test_demoted_anchor_loses_write_rights() {
    let net = TestNetwork::new();
    let steward = net.steward();
    let faber = net.promoted(&steward, "Faber", Role::TrustAnchor).await;
    let faber_id = faber.public_did().unwrap().clone();

    steward
        .send_nym(&faber_id.did, &faber_id.verkey, Some(Role::User))
        .await
        .unwrap();

    let err = begin_onboarding(&faber).await.unwrap_err();
    assert!(err.is_authorization());
}

#[tokio::test]
async fn test_concurrent_promotions() {
    let net = TestNetwork::new();
    let steward = net.steward();
    let names = ["Government", "Faber", "Acme", "Thrift"];
    let agents: Vec<_> = names.iter().map(|n| net.agent(n)).collect();

    let results = join_all(agents.iter().map(|agent| {
        let steward = &steward;
        async move {
            let mut onboarding = onboard(steward, agent).await?;
            promote_to_verinym(steward, agent, &mut onboarding, Role::TrustAnchor).await
        }
    }))
    .await;

    let mut dids = Vec::new();
    for result in results {
        let verinym = result.expect("every promotion should succeed");
        let nym = net.ledger.get_nym(&verinym.did).await.unwrap();
        assert_eq!(nym.role, Role::TrustAnchor);
        dids.push(verinym.did);
    }
    dids.sort();
    dids.dedup();
    assert_eq!(dids.len(), names.len());
}
