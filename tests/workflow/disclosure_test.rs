// Re-disclosure tests: tier gating, expiration, trusted parties

use crate::common::Network;
use healthledger::ledger::AccessTier;
use healthledger::workflow::{remove_expired_data, PatientClient, WorkflowError};

/// alice owns a Regular and a Critical record and shares both with bob
async fn shared_pair(net: &Network) -> (PatientClient, PatientClient, PatientClient) {
    let alice = net.join("alice").await;
    let bob = net.join("bob").await;
    let carol = net.join("carol").await;

    let regular = alice
        .create_patient_data("vitals", b"120/80", AccessTier::Regular)
        .await
        .unwrap();
    let critical = alice
        .create_patient_data("diagnosis", b"arrhythmia", AccessTier::Critical)
        .await
        .unwrap();
    alice.share_data(&regular.hash, "bob").await.unwrap();
    alice.share_data(&critical.hash, "bob").await.unwrap();

    (alice, bob, carol)
}

// ============================================================================
// THIRD PARTY
// ============================================================================

#[tokio::test]
async fn test_regular_tier_discloses_only_regular_records() {
    let net = Network::new();
    let (_alice, bob, carol) = shared_pair(&net).await;

    let disclosed = bob
        .open_shared_data_to_third_party("alice", "carol", AccessTier::Regular)
        .await
        .unwrap();
    assert_eq!(disclosed.len(), 1);
    assert_eq!(disclosed[0].addr, "carol");
    assert_eq!(disclosed[0].access_tier, AccessTier::Regular);
    assert_eq!(disclosed[0].name, "shared_by_bob_shared_by_alice_vitals");

    let visible = carol.list_shared_patient_data("bob").await.unwrap();
    assert_eq!(visible.len(), 1);
    let document = carol.get_shared_patient_data(&visible[0].hash, "bob").await.unwrap();
    assert_eq!(document.plaintext, b"120/80".to_vec());
}

#[tokio::test]
async fn test_critical_tier_discloses_everything() {
    let net = Network::new();
    let (_alice, bob, carol) = shared_pair(&net).await;

    let disclosed = bob
        .open_shared_data_to_third_party("alice", "carol", AccessTier::Critical)
        .await
        .unwrap();
    assert_eq!(disclosed.len(), 2);
    assert_eq!(carol.list_shared_patient_data("bob").await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_unset_tier_discloses_nothing() {
    let net = Network::new();
    let (_alice, bob, carol) = shared_pair(&net).await;

    let disclosed = bob
        .open_shared_data_to_third_party("alice", "carol", AccessTier::Unset)
        .await
        .unwrap();
    assert!(disclosed.is_empty());
    assert!(carol.list_shared_patient_data("bob").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_disclosure_to_unknown_target() {
    let net = Network::new();
    let (_alice, bob, _carol) = shared_pair(&net).await;

    assert!(matches!(
        bob.open_shared_data_to_third_party("alice", "mallory", AccessTier::Regular)
            .await,
        Err(WorkflowError::NotFound(_))
    ));
}

// ============================================================================
// EXPIRATION
// ============================================================================

#[tokio::test]
async fn test_sweep_leaves_dangling_pointer() {
    let net = Network::new();
    let (_alice, bob, carol) = shared_pair(&net).await;

    let disclosed = bob
        .open_shared_data_to_third_party("alice", "carol", AccessTier::Regular)
        .await
        .unwrap();
    let hash = disclosed[0].hash.clone();

    // nothing has expired yet
    assert_eq!(bob.remove_expired_data().await.unwrap(), 0);

    let later = chrono::Utc::now().timestamp() + 61;
    assert_eq!(remove_expired_data(net.store.as_ref(), later).await.unwrap(), 1);

    assert!(carol.list_shared_patient_data("bob").await.unwrap().is_empty());
    assert!(matches!(
        carol.get_shared_patient_data(&hash, "bob").await,
        Err(WorkflowError::NotFound(_))
    ));

    // the inode itself stays on the ledger
    let record = bob.sync().await.unwrap();
    assert!(record.root().get_data(&hash, "carol").unwrap().is_some());

    // the originals never expire
    assert_eq!(bob.list_shared_patient_data("alice").await.unwrap().len(), 2);
}

// ============================================================================
// TRUSTED PARTY
// ============================================================================

#[tokio::test]
async fn test_trusted_party_gets_all_own_data_without_expiry() {
    let net = Network::new();
    let alice = net.join("alice").await;
    let carol = net.join("carol").await;

    alice
        .create_patient_data("vitals", b"120/80", AccessTier::Regular)
        .await
        .unwrap();
    alice
        .create_patient_data("diagnosis", b"arrhythmia", AccessTier::Critical)
        .await
        .unwrap();

    let disclosed = alice.open_shared_data_to_trusted_party("carol").await.unwrap();
    assert_eq!(disclosed.len(), 2);

    let far_future = chrono::Utc::now().timestamp() + 10 * 365 * 24 * 3600;
    assert_eq!(remove_expired_data(net.store.as_ref(), far_future).await.unwrap(), 0);

    let mut plaintexts = Vec::new();
    for node in carol.list_shared_patient_data("alice").await.unwrap() {
        let document = carol.get_shared_patient_data(&node.hash, "alice").await.unwrap();
        plaintexts.push(document.plaintext);
    }
    plaintexts.sort();
    assert_eq!(plaintexts, vec![b"120/80".to_vec(), b"arrhythmia".to_vec()]);

    // disclosed copies are addressed to carol, not counted as alice's own
    assert_eq!(alice.list_patient_data().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_trusted_party_with_no_data() {
    let net = Network::new();
    let alice = net.join("alice").await;
    net.join("carol").await;

    assert!(alice.open_shared_data_to_trusted_party("carol").await.unwrap().is_empty());
}
