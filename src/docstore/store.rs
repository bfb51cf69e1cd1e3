// Document store - ciphertext rows and share requests
//
// The workflow only sees the DocumentStore / RequestStore traits. The sled
// implementation keeps three trees:
// - records:  id -> DataRecord
// - by_hash:  hash ":" id -> ()
// - requests: id -> ShareRequest

use crate::docstore::model::{DataRecord, ShareRequest};
use crate::ledger::{decode, encode};
use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Tree names
mod trees {
    pub const RECORDS: &str = "records";
    pub const BY_HASH: &str = "records_by_hash";
    pub const REQUESTS: &str = "requests";
}

/// Errors from storage operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Failed to open database: {0}")]
    OpenFailed(String),

    #[error("Database operation failed: {0}")]
    DatabaseError(String),

    #[error("Serialization failed: {0}")]
    SerializationFailed(String),

    #[error("Deserialization failed: {0}")]
    DeserializationFailed(String),
}

impl From<sled::Error> for StoreError {
    fn from(err: sled::Error) -> Self {
        StoreError::DatabaseError(err.to_string())
    }
}

// ============================================================================
// CONTRACTS
// ============================================================================

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Store a ciphertext, returning the new row id
    async fn save(&self, hash: &str, ciphertext: &[u8], expiration: i64) -> Result<String, StoreError>;

    /// Rows for any of `hashes`; no match is an empty list
    async fn find_by_hashes(&self, hashes: &[String]) -> Result<Vec<DataRecord>, StoreError>;

    /// Rows with a nonzero expiration at or before `now`
    async fn find_expired(&self, now: i64) -> Result<Vec<DataRecord>, StoreError>;

    /// Delete rows by id, returning how many existed
    async fn delete_by_ids(&self, ids: &[String]) -> Result<usize, StoreError>;
}

#[async_trait]
pub trait RequestStore: Send + Sync {
    /// Insert or overwrite by `request.id`
    async fn upsert_request(&self, request: &ShareRequest) -> Result<(), StoreError>;

    async fn get_request(&self, id: &str) -> Result<Option<ShareRequest>, StoreError>;

    /// Requests whose approver is `request_from`
    async fn list_requests_for(&self, request_from: &str) -> Result<Vec<ShareRequest>, StoreError>;
}

// ============================================================================
// SLED IMPLEMENTATION
// ============================================================================

/// Statistics about the store
#[derive(Clone, Debug)]
pub struct StoreStats {
    pub records: usize,
    pub requests: usize,
}

pub struct SledDocumentStore {
    db: sled::Db,
    records: sled::Tree,
    by_hash: sled::Tree,
    requests: sled::Tree,
}

impl SledDocumentStore {
    /// Open or create a store at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let db = sled::open(path).map_err(|e| StoreError::OpenFailed(e.to_string()))?;
        Self::from_db(db)
    }

    /// In-memory store, removed on drop
    pub fn temporary() -> Result<Self, StoreError> {
        let db = sled::Config::new()
            .temporary(true)
            .open()
            .map_err(|e| StoreError::OpenFailed(e.to_string()))?;
        Self::from_db(db)
    }

    fn from_db(db: sled::Db) -> Result<Self, StoreError> {
        Ok(Self {
            records: db.open_tree(trees::RECORDS)?,
            by_hash: db.open_tree(trees::BY_HASH)?,
            requests: db.open_tree(trees::REQUESTS)?,
            db,
        })
    }

    pub fn flush(&self) -> Result<(), StoreError> {
        self.db.flush()?;
        Ok(())
    }

    pub fn stats(&self) -> StoreStats {
        StoreStats {
            records: self.records.len(),
            requests: self.requests.len(),
        }
    }

    fn hash_key(hash: &str, id: &str) -> Vec<u8> {
        [hash.as_bytes(), b":", id.as_bytes()].concat()
    }

    fn load_record(&self, id: &[u8]) -> Result<Option<DataRecord>, StoreError> {
        match self.records.get(id)? {
            Some(bytes) => decode(&bytes)
                .map(Some)
                .map_err(|e| StoreError::DeserializationFailed(e.to_string())),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl DocumentStore for SledDocumentStore {
    async fn save(&self, hash: &str, ciphertext: &[u8], expiration: i64) -> Result<String, StoreError> {
        let id = uuid::Uuid::new_v4().to_string();
        let record = DataRecord {
            id: id.clone(),
            hash: hash.to_string(),
            ciphertext: ciphertext.to_vec(),
            expiration,
        };
        let bytes = encode(&record).map_err(|e| StoreError::SerializationFailed(e.to_string()))?;

        self.records.insert(id.as_bytes(), bytes)?;
        self.by_hash.insert(Self::hash_key(hash, &id), Vec::<u8>::new())?;
        debug!(hash = %hash, id = %id, expiration, "document saved");
        Ok(id)
    }

    async fn find_by_hashes(&self, hashes: &[String]) -> Result<Vec<DataRecord>, StoreError> {
        let mut found = Vec::new();
        for hash in hashes {
            let prefix = [hash.as_bytes(), b":"].concat();
            for entry in self.by_hash.scan_prefix(&prefix) {
                let (key, _) = entry?;
                if let Some(record) = self.load_record(&key[prefix.len()..])? {
                    found.push(record);
                }
            }
        }
        Ok(found)
    }

    async fn find_expired(&self, now: i64) -> Result<Vec<DataRecord>, StoreError> {
        let mut expired = Vec::new();
        for entry in self.records.iter() {
            let (_, bytes) = entry?;
            let record: DataRecord =
                decode(&bytes).map_err(|e| StoreError::DeserializationFailed(e.to_string()))?;
            if record.is_expired(now) {
                expired.push(record);
            }
        }
        Ok(expired)
    }

    async fn delete_by_ids(&self, ids: &[String]) -> Result<usize, StoreError> {
        let mut deleted = 0;
        for id in ids {
            if let Some(record) = self.load_record(id.as_bytes())? {
                self.by_hash.remove(Self::hash_key(&record.hash, id))?;
                self.records.remove(id.as_bytes())?;
                deleted += 1;
            }
        }
        Ok(deleted)
    }
}

#[async_trait]
impl RequestStore for SledDocumentStore {
    async fn upsert_request(&self, request: &ShareRequest) -> Result<(), StoreError> {
        let bytes = encode(request).map_err(|e| StoreError::SerializationFailed(e.to_string()))?;
        self.requests.insert(request.id.as_bytes(), bytes)?;
        Ok(())
    }

    async fn get_request(&self, id: &str) -> Result<Option<ShareRequest>, StoreError> {
        match self.requests.get(id.as_bytes())? {
            Some(bytes) => decode(&bytes)
                .map(Some)
                .map_err(|e| StoreError::DeserializationFailed(e.to_string())),
            None => Ok(None),
        }
    }

    async fn list_requests_for(&self, request_from: &str) -> Result<Vec<ShareRequest>, StoreError> {
        let mut out = Vec::new();
        for entry in self.requests.iter() {
            let (_, bytes) = entry?;
            let request: ShareRequest =
                decode(&bytes).map_err(|e| StoreError::DeserializationFailed(e.to_string()))?;
            if request.request_from == request_from {
                out.push(request);
            }
        }
        Ok(out)
    }
}
