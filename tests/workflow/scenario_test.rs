// Create / share / read scenarios

use crate::common::Network;
use healthledger::client::{ClientConfig, ClientSession};
use healthledger::crypto::Keypair;
use healthledger::docstore::DocumentStore;
use healthledger::ledger::AccessTier;
use healthledger::processor::Payload;
use healthledger::workflow::WorkflowError;

// ============================================================================
// OWN DATA
// ============================================================================

#[tokio::test]
async fn test_register_and_whoami() {
    let net = Network::new();
    let alice = net.join("alice").await;

    let me = alice.whoami();
    assert_eq!(me.name, "alice");
    assert_eq!(me.address, alice.address());

    let record = alice.identity().await.unwrap();
    assert_eq!(record.name(), "alice");
    assert!(record.verify_public_key(&me.public_key));
    assert!(record.root().repo().is_empty());
}

#[tokio::test]
async fn test_register_twice_rejected() {
    let net = Network::new();
    let alice = net.join("alice").await;

    assert!(matches!(alice.register().await, Err(WorkflowError::Validation(_))));
}

#[tokio::test]
async fn test_unregistered_identity_not_found() {
    let net = Network::new();
    let ghost = net.open("ghost").await;

    assert!(matches!(ghost.sync().await, Err(WorkflowError::NotFound(_))));
}

#[tokio::test]
async fn test_create_and_read_own_data() {
    let net = Network::new();
    let alice = net.join("alice").await;

    let pointer = alice
        .create_patient_data("vitals", b"120/80", AccessTier::Regular)
        .await
        .unwrap();
    assert_eq!(pointer.name, "vitals");
    assert_eq!(pointer.addr, "alice");
    assert_eq!(pointer.size, 6);

    let listed = alice.list_patient_data().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].hash, pointer.hash);

    let document = alice.get_patient_data(&pointer.hash).await.unwrap();
    assert_eq!(document.plaintext, b"120/80".to_vec());
}

#[tokio::test]
async fn test_sync_reads_committed_root() {
    let net = Network::new();
    let alice = net.join("alice").await;
    let pointer = alice
        .create_patient_data("vitals", b"120/80", AccessTier::Regular)
        .await
        .unwrap();

    let record = alice.sync().await.unwrap();
    assert!(record.root().get_data(&pointer.hash, "alice").unwrap().is_some());
}

#[tokio::test]
async fn test_unknown_hash_not_found() {
    let net = Network::new();
    let alice = net.join("alice").await;

    assert!(matches!(
        alice.get_patient_data("deadbeef").await,
        Err(WorkflowError::NotFound(_))
    ));
}

// ============================================================================
// SHARING
// ============================================================================

#[tokio::test]
async fn test_share_and_read_vitals() {
    let net = Network::new();
    let alice = net.join("alice").await;
    let bob = net.join("bob").await;

    let created = alice
        .create_patient_data("vitals", b"120/80", AccessTier::Regular)
        .await
        .unwrap();
    let shared = alice.share_data(&created.hash, "bob").await.unwrap();

    assert_ne!(shared.hash, created.hash);
    assert_eq!(shared.addr, "bob");
    assert_eq!(shared.name, "shared_by_alice_vitals");
    assert_eq!(shared.access_tier, AccessTier::Regular);

    let rows = net
        .store
        .find_by_hashes(&[created.hash.clone(), shared.hash.clone()])
        .await
        .unwrap();
    assert_eq!(rows.len(), 2);
    assert_ne!(rows[0].ciphertext, rows[1].ciphertext);

    let visible = bob.list_shared_patient_data("alice").await.unwrap();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].hash, shared.hash);

    let document = bob.get_shared_patient_data(&shared.hash, "alice").await.unwrap();
    assert_eq!(document.plaintext, b"120/80".to_vec());
}

#[tokio::test]
async fn test_shared_copy_is_not_own_data() {
    let net = Network::new();
    let alice = net.join("alice").await;
    let bob = net.join("bob").await;

    let created = alice
        .create_patient_data("vitals", b"120/80", AccessTier::Regular)
        .await
        .unwrap();
    let shared = alice.share_data(&created.hash, "bob").await.unwrap();

    assert_eq!(alice.list_patient_data().await.unwrap().len(), 1);
    assert!(matches!(
        alice.get_patient_data(&shared.hash).await,
        Err(WorkflowError::NotFound(_))
    ));
    assert!(matches!(
        bob.get_shared_patient_data(&created.hash, "alice").await,
        Err(WorkflowError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_share_with_unknown_user() {
    let net = Network::new();
    let alice = net.join("alice").await;
    let created = alice
        .create_patient_data("vitals", b"120/80", AccessTier::Regular)
        .await
        .unwrap();

    assert!(matches!(
        alice.share_data(&created.hash, "mallory").await,
        Err(WorkflowError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_list_users() {
    let net = Network::new();
    let alice = net.join("alice").await;
    let bob = net.join("bob").await;

    let mut names: Vec<String> = alice
        .list_users()
        .await
        .unwrap()
        .into_iter()
        .map(|(_, record)| record.name().to_string())
        .collect();
    names.sort();
    assert_eq!(names, vec!["alice".to_string(), "bob".to_string()]);

    let (address, record) = alice.get_user("bob").await.unwrap();
    assert_eq!(address, bob.address());
    assert_eq!(record.public_key(), &bob.whoami().public_key);
}

#[tokio::test]
async fn test_close_releases_session() {
    let net = Network::new();
    let alice = net.join("alice").await;

    alice.close().await.unwrap();
    assert!(alice.session().is_closed());
    assert_eq!(net.ledger.subscriber_count().await, 0);
}

// ============================================================================
// NAME UNIQUENESS
// ============================================================================

/// Register `name` under a fresh key straight through a session, skipping
/// the workflow's uniqueness check
async fn register_raw(net: &Network, name: &str) -> ClientSession {
    let session = ClientSession::open(
        name,
        Keypair::generate(),
        net.ledger.clone(),
        net.ledger.clone(),
        ClientConfig::new(),
    )
    .await
    .unwrap();
    let address = session.address().to_string();
    session
        .submit_and_wait(&[Payload::create_user(name)], &[address.clone()], &[address])
        .await
        .unwrap();
    session
}

#[tokio::test]
async fn test_register_refuses_name_held_by_other_key() {
    let net = Network::new();
    let alice = net.join("alice").await;
    net.join("bob").await;

    let second_bob = net.open("bob").await;
    assert!(matches!(second_bob.register().await, Err(WorkflowError::Validation(_))));

    let bobs = alice
        .list_users()
        .await
        .unwrap()
        .into_iter()
        .filter(|(_, record)| record.name() == "bob")
        .count();
    assert_eq!(bobs, 1);
}

#[tokio::test]
async fn test_ambiguous_name_never_receives_data() {
    let net = Network::new();
    let alice = net.join("alice").await;
    net.join("bob").await;
    let second_bob = register_raw(&net, "bob").await;

    let created = alice
        .create_patient_data("vitals", b"120/80", AccessTier::Regular)
        .await
        .unwrap();

    assert!(matches!(alice.get_user("bob").await, Err(WorkflowError::Validation(_))));
    assert!(matches!(
        alice.share_data(&created.hash, "bob").await,
        Err(WorkflowError::Validation(_))
    ));
    assert!(matches!(
        alice.open_shared_data_to_trusted_party("bob").await,
        Err(WorkflowError::Validation(_))
    ));

    let record = alice.sync().await.unwrap();
    assert_eq!(record.root().data_addressed_to("bob").count(), 0);
    assert_eq!(record.root().repo().len(), 1);

    second_bob.close().await.unwrap();
}
