// Content encryption tests

use healthledger::crypto::{
    decrypt_content, digest_hex, encrypt_content, CryptoError, SymmetricKey, IV_SIZE,
};

// ============================================================================
// KEY GENERATION
// ============================================================================

#[test]
fn test_supported_key_sizes() {
    for bits in [128, 192, 256] {
        let key = SymmetricKey::generate(bits).unwrap();
        assert_eq!(key.bits(), bits);
        assert_eq!(key.as_bytes().len(), bits / 8);
    }
}

#[test]
fn test_unsupported_key_sizes_rejected() {
    for bits in [0, 64, 255, 512] {
        assert_eq!(SymmetricKey::generate(bits), Err(CryptoError::InvalidKeySize(bits)));
    }
}

#[test]
fn test_generated_keys_differ() {
    let a = SymmetricKey::generate(256).unwrap();
    let b = SymmetricKey::generate(256).unwrap();
    assert_ne!(a.as_bytes(), b.as_bytes());
}

// ============================================================================
// ENCRYPT / DECRYPT
// ============================================================================

#[test]
fn test_decrypt_recovers_plaintext() {
    let key = SymmetricKey::generate(256).unwrap();
    for plaintext in [&b""[..], b"120/80", &[0u8; 1000][..]] {
        let (_, ciphertext) = encrypt_content(plaintext, &key).unwrap();
        assert_eq!(decrypt_content(&ciphertext, &key).unwrap(), plaintext);
    }
}

#[test]
fn test_fresh_iv_per_encryption() {
    let key = SymmetricKey::generate(256).unwrap();
    let (hash_a, ct_a) = encrypt_content(b"120/80", &key).unwrap();
    let (hash_b, ct_b) = encrypt_content(b"120/80", &key).unwrap();

    assert_ne!(ct_a[..IV_SIZE], ct_b[..IV_SIZE]);
    assert_ne!(ct_a, ct_b);
    assert_ne!(hash_a, hash_b);
    assert_eq!(decrypt_content(&ct_a, &key).unwrap(), b"120/80");
    assert_eq!(decrypt_content(&ct_b, &key).unwrap(), b"120/80");
}

#[test]
fn test_content_hash_covers_iv_and_ciphertext() {
    let key = SymmetricKey::generate(128).unwrap();
    let (hash, ciphertext) = encrypt_content(b"vitals", &key).unwrap();

    assert_eq!(ciphertext.len(), IV_SIZE + 6);
    assert_eq!(hash, digest_hex(&ciphertext));
    assert_ne!(hash, digest_hex(b"vitals"));
}

#[test]
fn test_short_input_rejected() {
    let key = SymmetricKey::generate(256).unwrap();
    assert!(matches!(
        decrypt_content(&[0u8; IV_SIZE - 1], &key),
        Err(CryptoError::CiphertextTooShort { .. })
    ));
}

#[test]
fn test_wrong_key_does_not_recover_plaintext() {
    let key = SymmetricKey::generate(256).unwrap();
    let other = SymmetricKey::generate(256).unwrap();
    let (_, ciphertext) = encrypt_content(b"120/80", &key).unwrap();

    assert_ne!(decrypt_content(&ciphertext, &other).unwrap(), b"120/80");
}

#[test]
fn test_key_hex_roundtrip_keeps_size() {
    let key = SymmetricKey::generate(192).unwrap();
    let restored = SymmetricKey::from_hex(&key.to_hex()).unwrap();
    assert_eq!(restored.bits(), 192);
    assert_eq!(restored.as_bytes(), key.as_bytes());
}
