// Root - an identity's repo plus its key table

use crate::crypto::CryptoError;
use crate::ledger::inode::{AccessTier, DataNode, INode, Repo};
use crate::ledger::keytable::KeyTable;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from ownership-tree mutations and lookups
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerStateError {
    #[error("Duplicate data: {hash} is already registered for {addr}")]
    DuplicateData { hash: String, addr: String },

    #[error("Invalid key material: {0}")]
    InvalidKey(#[from] CryptoError),

    #[error("Key table has no entry {0}")]
    MissingKey(String),
}

/// Everything needed to register one data inode
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataInfo {
    pub name: String,
    pub size: u64,
    /// Digest of the stored ciphertext
    pub hash: String,
    /// Hex of the content key wrapped under `addr`'s public key
    pub wrapped_key: String,
    pub addr: String,
    pub access_tier: AccessTier,
}

/// A resolved data inode, with its wrapped key pulled from the key table
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataPointer {
    pub name: String,
    pub size: u64,
    pub hash: String,
    pub wrapped_key: String,
    pub addr: String,
    pub access_tier: AccessTier,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Root {
    repo: Repo,
    keys: KeyTable,
}

impl Default for Root {
    fn default() -> Self {
        Self::generate()
    }
}

impl Root {
    /// Fresh root with an empty "home" repo and an empty key table
    pub fn generate() -> Self {
        Self {
            repo: Repo::new("home"),
            keys: KeyTable::new(),
        }
    }

    pub fn repo(&self) -> &Repo {
        &self.repo
    }

    pub fn keys(&self) -> &KeyTable {
        &self.keys
    }

    /// Register a data inode.
    ///
    /// A (hash, addr) pair already in the repo fails with `DuplicateData`
    /// and leaves both the repo and the key table untouched.
    pub fn create_data(&mut self, info: &DataInfo) -> Result<(), LedgerStateError> {
        if self.repo.find_data(&info.hash, &info.addr).is_some() {
            return Err(LedgerStateError::DuplicateData {
                hash: info.hash.clone(),
                addr: info.addr.clone(),
            });
        }

        let key_index = self.keys.add_key(&info.wrapped_key, true)?;

        self.repo.append(INode::Data(DataNode {
            name: info.name.clone(),
            hash: info.hash.clone(),
            size: info.size,
            key_index,
            addr: info.addr.clone(),
            access_tier: info.access_tier,
        }));
        Ok(())
    }

    /// Look up a data inode. Absence is `Ok(None)`, not an error.
    pub fn get_data(&self, hash: &str, addr: &str) -> Result<Option<DataPointer>, LedgerStateError> {
        let node = match self.repo.find_data(hash, addr) {
            Some(node) => node,
            None => return Ok(None),
        };
        let key = self
            .keys
            .get_key(&node.key_index)
            .ok_or_else(|| LedgerStateError::MissingKey(node.key_index.clone()))?;

        Ok(Some(DataPointer {
            name: node.name.clone(),
            size: node.size,
            hash: node.hash.clone(),
            wrapped_key: key.key().to_string(),
            addr: node.addr.clone(),
            access_tier: node.access_tier,
        }))
    }

    /// Data inodes whose address field names `addr`, in insertion order
    pub fn data_addressed_to<'a>(&'a self, addr: &'a str) -> impl Iterator<Item = &'a DataNode> + 'a {
        self.repo.data_nodes().filter(move |d| d.addr == addr)
    }
}
