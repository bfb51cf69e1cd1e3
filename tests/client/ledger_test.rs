// LocalLedger validation tests: signatures, family, declared addresses,
// batch atomicity, event routing

use healthledger::client::{
    Batch, BatchList, BatchStatus, ClientError, EventList, EventSource, LedgerIngress, Transaction,
};
use healthledger::crypto::Keypair;
use healthledger::ledger::{identity_address, AccessTier, DataInfo, IdentityRecord};
use healthledger::node::LocalLedger;
use healthledger::processor::{Payload, FAMILY_NAME, FAMILY_VERSION};
use std::time::Duration;

fn txn(kp: &Keypair, payload: &Payload, family: &str, version: &str, outputs: &[String]) -> Transaction {
    let address = identity_address("alice", &kp.public_key());
    Transaction::build(kp, family, version, &[address], outputs, payload.to_bytes().unwrap()).unwrap()
}

fn own(kp: &Keypair) -> Vec<String> {
    vec![identity_address("alice", &kp.public_key())]
}

fn encode(batch: Batch) -> Vec<u8> {
    BatchList::new(vec![batch]).to_bytes().unwrap()
}

fn data_info() -> DataInfo {
    DataInfo {
        name: "vitals".into(),
        size: 6,
        hash: "ab".repeat(64),
        wrapped_key: "cd".repeat(81),
        addr: "alice".into(),
        access_tier: AccessTier::Regular,
    }
}

// ============================================================================
// BATCH VALIDATION
// ============================================================================

#[tokio::test]
async fn test_valid_batch_commits() {
    let ledger = LocalLedger::new();
    let kp = Keypair::generate();
    let t = txn(&kp, &Payload::create_user("alice"), FAMILY_NAME, FAMILY_VERSION, &own(&kp));

    let id = ledger.submit_batch(encode(Batch::build(&kp, vec![t]).unwrap())).await.unwrap();

    assert_eq!(ledger.get_batch_status(&id).await.unwrap(), BatchStatus::Committed);
    assert_eq!(ledger.height().await, 1);
    assert!(ledger.get_state(&own(&kp)[0]).await.unwrap().is_some());
}

#[tokio::test]
async fn test_transactions_in_batch_apply_in_order() {
    let ledger = LocalLedger::new();
    let kp = Keypair::generate();
    let batch = Batch::build(
        &kp,
        vec![
            txn(&kp, &Payload::create_user("alice"), FAMILY_NAME, FAMILY_VERSION, &own(&kp)),
            txn(&kp, &Payload::create_user_data("alice", data_info()), FAMILY_NAME, FAMILY_VERSION, &own(&kp)),
        ],
    )
    .unwrap();

    let id = ledger.submit_batch(encode(batch)).await.unwrap();
    assert_eq!(ledger.get_batch_status(&id).await.unwrap(), BatchStatus::Committed);

    let bytes = ledger.get_state(&own(&kp)[0]).await.unwrap().unwrap();
    assert_eq!(IdentityRecord::from_bytes(&bytes).unwrap().root().repo().len(), 1);
}

#[tokio::test]
async fn test_failing_transaction_voids_whole_batch() {
    let ledger = LocalLedger::new();
    let kp = Keypair::generate();
    let mut unknown = Payload::create_user("alice");
    unknown.action = 99;
    let batch = Batch::build(
        &kp,
        vec![
            txn(&kp, &Payload::create_user("alice"), FAMILY_NAME, FAMILY_VERSION, &own(&kp)),
            txn(&kp, &unknown, FAMILY_NAME, FAMILY_VERSION, &own(&kp)),
        ],
    )
    .unwrap();

    let id = ledger.submit_batch(encode(batch)).await.unwrap();

    match ledger.get_batch_status(&id).await.unwrap() {
        BatchStatus::Invalid(reason) => assert!(reason.contains("Invalid action: 99")),
        other => panic!("expected invalid batch, got {}", other),
    }
    assert!(ledger.get_state(&own(&kp)[0]).await.unwrap().is_none());
    assert_eq!(ledger.height().await, 0);
}

#[tokio::test]
async fn test_unknown_family_rejected() {
    let ledger = LocalLedger::new();
    let kp = Keypair::generate();
    let t = txn(&kp, &Payload::create_user("alice"), "intkey", FAMILY_VERSION, &own(&kp));

    let id = ledger.submit_batch(encode(Batch::build(&kp, vec![t]).unwrap())).await.unwrap();
    assert!(matches!(ledger.get_batch_status(&id).await.unwrap(), BatchStatus::Invalid(_)));
}

#[tokio::test]
async fn test_unsupported_version_rejected() {
    let ledger = LocalLedger::new();
    let kp = Keypair::generate();
    let t = txn(&kp, &Payload::create_user("alice"), FAMILY_NAME, "2.0", &own(&kp));

    let id = ledger.submit_batch(encode(Batch::build(&kp, vec![t]).unwrap())).await.unwrap();
    assert!(matches!(ledger.get_batch_status(&id).await.unwrap(), BatchStatus::Invalid(_)));
}

#[tokio::test]
async fn test_undeclared_output_rejected() {
    let ledger = LocalLedger::new();
    let kp = Keypair::generate();
    let t = txn(&kp, &Payload::create_user("alice"), FAMILY_NAME, FAMILY_VERSION, &[]);

    let id = ledger.submit_batch(encode(Batch::build(&kp, vec![t]).unwrap())).await.unwrap();
    match ledger.get_batch_status(&id).await.unwrap() {
        BatchStatus::Invalid(reason) => assert!(reason.contains("undeclared")),
        other => panic!("expected invalid batch, got {}", other),
    }
}

#[tokio::test]
async fn test_transaction_from_other_signer_rejected() {
    let ledger = LocalLedger::new();
    let batcher = Keypair::generate();
    let other = Keypair::generate();
    let t = txn(&other, &Payload::create_user("alice"), FAMILY_NAME, FAMILY_VERSION, &own(&other));

    let id = ledger.submit_batch(encode(Batch::build(&batcher, vec![t]).unwrap())).await.unwrap();
    assert!(matches!(ledger.get_batch_status(&id).await.unwrap(), BatchStatus::Invalid(_)));
    assert!(ledger.addresses().await.is_empty());
}

#[tokio::test]
async fn test_malformed_submission_refused() {
    let ledger = LocalLedger::new();
    assert!(matches!(
        ledger.submit_batch(b"junk".to_vec()).await,
        Err(ClientError::Validation(_))
    ));
    assert!(matches!(
        ledger.submit_batch(BatchList::new(Vec::new()).to_bytes().unwrap()).await,
        Err(ClientError::Validation(_))
    ));
}

#[tokio::test]
async fn test_unknown_batch_status() {
    let ledger = LocalLedger::new();
    assert_eq!(ledger.get_batch_status("nope").await.unwrap(), BatchStatus::Unknown);
}

// ============================================================================
// EVENTS
// ============================================================================

#[tokio::test]
async fn test_events_reach_only_matching_subscribers() {
    let ledger = LocalLedger::new();
    let alice = Keypair::generate();
    let bob = Keypair::generate();
    let alice_address = identity_address("alice", &alice.public_key());

    let mut alice_sub = ledger.subscribe(&alice_address).await.unwrap();
    let mut bob_sub = ledger
        .subscribe(&identity_address("bob", &bob.public_key()))
        .await
        .unwrap();
    assert_ne!(alice_sub.correlation_id(), bob_sub.correlation_id());

    let t = txn(&alice, &Payload::create_user("alice"), FAMILY_NAME, FAMILY_VERSION, &own(&alice));
    ledger.submit_batch(encode(Batch::build(&alice, vec![t]).unwrap())).await.unwrap();

    let frame = alice_sub.receive().await.unwrap();
    let changes = EventList::from_bytes(&frame).unwrap().state_changes_for(&alice_address).unwrap();
    assert_eq!(changes.len(), 1);
    assert_eq!(
        IdentityRecord::from_bytes(&changes[0].value).unwrap().name(),
        "alice"
    );

    assert!(tokio::time::timeout(Duration::from_millis(50), bob_sub.receive())
        .await
        .is_err());
}

#[tokio::test]
async fn test_unsubscribe_ends_stream() {
    let ledger = LocalLedger::new();
    let mut sub = ledger.subscribe("anything").await.unwrap();
    let id = sub.correlation_id().to_string();

    ledger.unsubscribe(&id).await.unwrap();
    assert!(sub.receive().await.is_none());
    assert!(matches!(ledger.unsubscribe(&id).await, Err(ClientError::Transport(_))));
}

#[tokio::test]
async fn test_stalled_subscriber_does_not_block_submitters() {
    let ledger = LocalLedger::new()
        .with_event_buffer(1)
        .with_delivery_timeout(Duration::from_millis(50));
    // subscribed to everything, never read
    let _stalled = ledger.subscribe("").await.unwrap();

    for _ in 0..3 {
        let kp = Keypair::generate();
        let t = txn(&kp, &Payload::create_user("alice"), FAMILY_NAME, FAMILY_VERSION, &own(&kp));
        let id = tokio::time::timeout(
            Duration::from_secs(2),
            ledger.submit_batch(encode(Batch::build(&kp, vec![t]).unwrap())),
        )
        .await
        .expect("submit blocked on a stalled subscriber")
        .unwrap();
        assert_eq!(ledger.get_batch_status(&id).await.unwrap(), BatchStatus::Committed);
    }
    assert_eq!(ledger.height().await, 3);
}
