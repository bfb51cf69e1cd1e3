// Identity record encoding tests

use healthledger::crypto::Keypair;
use healthledger::ledger::{
    decode, encode, AccessTier, CodecError, DataInfo, IdentityRecord, FORMAT_VERSION, MAGIC,
};

fn record_with_data() -> (IdentityRecord, Keypair) {
    let kp = Keypair::generate();
    let mut record = IdentityRecord::generate("alice", kp.public_key());
    record
        .root_mut()
        .create_data(&DataInfo {
            name: "vitals".into(),
            size: 6,
            hash: "ab".repeat(64),
            wrapped_key: "cd".repeat(81),
            addr: "alice".into(),
            access_tier: AccessTier::Critical,
        })
        .unwrap();
    (record, kp)
}

#[test]
fn test_record_bytes_carry_envelope() {
    let (record, _) = record_with_data();
    let bytes = record.to_bytes().unwrap();
    assert_eq!(bytes[..2], MAGIC);
    assert_eq!(bytes[2], FORMAT_VERSION);
}

#[test]
fn test_record_survives_encoding() {
    let (record, kp) = record_with_data();
    let restored = IdentityRecord::from_bytes(&record.to_bytes().unwrap()).unwrap();

    assert_eq!(restored.name(), "alice");
    assert!(restored.verify_public_key(&kp.public_key()));
    assert_eq!(restored.address(), record.address());
    assert_eq!(restored.root(), record.root());
}

#[test]
fn test_truncated_record_rejected() {
    let (record, _) = record_with_data();
    let bytes = record.to_bytes().unwrap();
    assert!(matches!(
        IdentityRecord::from_bytes(&bytes[..bytes.len() / 2]),
        Err(CodecError::DecodeError(_))
    ));
}

#[test]
fn test_generic_encode_decode() {
    let tier = AccessTier::Regular;
    assert_eq!(decode::<AccessTier>(&encode(&tier).unwrap()).unwrap(), tier);
}
