// KeyTable - deduplicated table of wrapped content keys

use crate::crypto::{digest_hex_of_hex, CryptoError};
use serde::{Deserialize, Serialize};

/// One key entry, indexed by the digest of its hex material
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyEntry {
    index: String,
    key: String,
    used: u32,
}

impl KeyEntry {
    pub fn index(&self) -> &str {
        &self.index
    }

    /// Hex of the (wrapped) key material
    pub fn key(&self) -> &str {
        &self.key
    }

    /// How many inodes reference this entry
    pub fn used(&self) -> u32 {
        self.used
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyTable {
    entries: Vec<KeyEntry>,
}

impl KeyTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &KeyEntry> {
        self.entries.iter()
    }

    pub fn get_key(&self, index: &str) -> Option<&KeyEntry> {
        self.entries.iter().find(|e| e.index == index)
    }

    /// Add a key, returning its index.
    ///
    /// A key already present keeps its single entry; `used` only bumps the
    /// usage count.
    pub fn add_key(&mut self, key_hex: &str, used: bool) -> Result<String, CryptoError> {
        let index = digest_hex_of_hex(key_hex)?;
        let bump = u32::from(used);

        if let Some(entry) = self.entries.iter_mut().find(|e| e.index == index) {
            entry.used = entry.used.saturating_add(bump);
            return Ok(index);
        }

        self.entries.push(KeyEntry {
            index: index.clone(),
            key: key_hex.to_string(),
            used: bump,
        });
        Ok(index)
    }
}
