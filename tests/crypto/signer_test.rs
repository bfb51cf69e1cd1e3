// Signing tests

use healthledger::crypto::{Keypair, Signature, Signer};

#[test]
fn test_sign_verify() {
    let kp = Keypair::generate();
    let sig = Signer::sign(&kp, b"batch header");
    assert!(Signer::verify(&kp.public_key(), b"batch header", &sig));
    assert!(!Signer::verify(&kp.public_key(), b"other header", &sig));
}

#[test]
fn test_verify_with_wrong_key_fails() {
    let kp = Keypair::generate();
    let other = Keypair::generate();
    let sig = Signer::sign(&kp, b"msg");
    assert!(!Signer::verify(&other.public_key(), b"msg", &sig));
}

#[test]
fn test_signature_hex_roundtrip() {
    let kp = Keypair::generate();
    let sig = Signer::sign(&kp, b"msg");
    let restored = Signature::from_hex(&sig.to_hex()).unwrap();
    assert_eq!(restored, sig);
}

#[test]
fn test_keypair_restored_from_hex_signs_identically() {
    let kp = Keypair::generate();
    let restored = Keypair::from_hex(&kp.to_hex()).unwrap();
    assert_eq!(restored.public_key(), kp.public_key());

    let sig = Signer::sign(&restored, b"msg");
    assert!(Signer::verify(&kp.public_key(), b"msg", &sig));
}
