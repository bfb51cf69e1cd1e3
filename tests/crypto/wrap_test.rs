// Key wrapping tests

use healthledger::crypto::{unwrap_key, wrap_key, CryptoError, Keypair, SymmetricKey, WRAP_OVERHEAD};

#[test]
fn test_intended_recipient_recovers_key() {
    let recipient = Keypair::generate();
    let raw = SymmetricKey::generate(256).unwrap().to_hex();

    let wrapped = wrap_key(&recipient.public_key(), &raw).unwrap();
    assert_eq!(unwrap_key(recipient.secret_key(), &wrapped).unwrap(), raw);
}

#[test]
fn test_other_private_key_fails() {
    let recipient = Keypair::generate();
    let intruder = Keypair::generate();
    let raw = SymmetricKey::generate(256).unwrap().to_hex();

    let wrapped = wrap_key(&recipient.public_key(), &raw).unwrap();
    assert_eq!(
        unwrap_key(intruder.secret_key(), &wrapped),
        Err(CryptoError::AuthenticationFailed)
    );
}

#[test]
fn test_wrapping_is_randomized() {
    let recipient = Keypair::generate();
    let raw = SymmetricKey::generate(128).unwrap().to_hex();

    let a = wrap_key(&recipient.public_key(), &raw).unwrap();
    let b = wrap_key(&recipient.public_key(), &raw).unwrap();
    assert_ne!(a, b);
    assert_eq!(a.len(), b.len());
}

#[test]
fn test_wrapped_size_is_key_plus_overhead() {
    let recipient = Keypair::generate();
    let key = SymmetricKey::generate(256).unwrap();
    let wrapped = wrap_key(&recipient.public_key(), &key.to_hex()).unwrap();
    assert_eq!(wrapped.len(), key.as_bytes().len() + WRAP_OVERHEAD);
}

#[test]
fn test_malformed_input_rejected() {
    let recipient = Keypair::generate();
    assert!(unwrap_key(recipient.secret_key(), &[]).is_err());
    assert!(unwrap_key(recipient.secret_key(), &[7u8; WRAP_OVERHEAD]).is_err());
    assert!(wrap_key(&recipient.public_key(), "not hex").is_err());
}
