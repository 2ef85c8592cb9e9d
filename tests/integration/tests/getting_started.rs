//! Integration test: the whole getting-started walkthrough.

use trustline_cli::{scenario, ScenarioConfig};
use trustline_integration_tests::STEWARD_DID;

#[tokio::test]
async fn test_walkthrough_completes() {
    let config = ScenarioConfig::default();
    let report = scenario::run(&config).await.expect("walkthrough should succeed");

    assert_eq!(report.steward_did.as_str(), STEWARD_DID);
    assert_eq!(report.pool, "pool1");

    let anchors = [
        &report.government_did,
        &report.faber_did,
        &report.acme_did,
        &report.thrift_did,
    ];
    let mut unique: Vec<_> = anchors.iter().map(|d| d.as_str()).collect();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), 4);

    assert_eq!(
        report.job_certificate_schema_id.as_str(),
        format!("{}:2:Job-Certificate:0.2", report.government_did)
    );
    assert_eq!(
        report.transcript_schema_id.as_str(),
        format!("{}:2:Transcript:1.2", report.government_did)
    );
    assert!(report
        .faber_transcript_cred_def_id
        .as_str()
        .ends_with(":TAG1"));
    assert_eq!(
        report.acme_job_certificate_cred_def_id.issuer_did(),
        Some(report.acme_did.as_str())
    );
    assert!(report.ledger_transactions > 0);
}

#[tokio::test]
async fn test_walkthrough_is_repeatable() {
    let config = ScenarioConfig::default();
    let first = scenario::run(&config).await.unwrap();
    let second = scenario::run(&config).await.unwrap();

    // Fresh pool each run: same steward, same transaction count.
    assert_eq!(first.steward_did, second.steward_did);
    assert_eq!(first.ledger_transactions, second.ledger_transactions);
    assert_ne!(first.faber_did, second.faber_did);
}

