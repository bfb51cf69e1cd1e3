// KeyTable tests

use healthledger::crypto::{digest_hex_of_hex, SymmetricKey};
use healthledger::ledger::KeyTable;

#[test]
fn test_add_same_key_twice_dedups() {
    let mut table = KeyTable::new();
    let key = SymmetricKey::generate(256).unwrap().to_hex();

    let first = table.add_key(&key, true).unwrap();
    let second = table.add_key(&key, true).unwrap();

    assert_eq!(first, second);
    assert_eq!(table.len(), 1);
    assert_eq!(table.get_key(&first).unwrap().used(), 2);
}

#[test]
fn test_index_is_digest_of_key_bytes() {
    let mut table = KeyTable::new();
    let key = "00112233445566778899aabbccddeeff";
    let index = table.add_key(key, true).unwrap();

    assert_eq!(index, digest_hex_of_hex(key).unwrap());
    assert_eq!(index.len(), 128);
    assert_eq!(table.get_key(&index).unwrap().key(), key);
}

#[test]
fn test_distinct_keys_get_distinct_entries() {
    let mut table = KeyTable::new();
    let a = table.add_key(&SymmetricKey::generate(128).unwrap().to_hex(), true).unwrap();
    let b = table.add_key(&SymmetricKey::generate(128).unwrap().to_hex(), true).unwrap();

    assert_ne!(a, b);
    assert_eq!(table.len(), 2);
    assert_eq!(table.iter().map(|e| e.used()).sum::<u32>(), 2);
}

#[test]
fn test_unused_add_does_not_bump() {
    let mut table = KeyTable::new();
    let index = table.add_key("abcd", true).unwrap();
    table.add_key("abcd", false).unwrap();
    assert_eq!(table.get_key(&index).unwrap().used(), 1);
}

#[test]
fn test_missing_index_is_none() {
    let table = KeyTable::new();
    assert!(table.get_key("nope").is_none());
}
