// Document-store rows

use crate::crypto::sha256;
use crate::ledger::AccessTier;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One stored ciphertext. `expiration` is epoch seconds, 0 for never.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataRecord {
    pub id: String,
    pub hash: String,
    pub ciphertext: Vec<u8>,
    pub expiration: i64,
}

impl DataRecord {
    pub fn is_expired(&self, now: i64) -> bool {
        self.expiration != 0 && self.expiration <= now
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestStatus {
    #[default]
    Unset,
    Accepted,
    Rejected,
}

impl RequestStatus {
    pub fn code(&self) -> u8 {
        match self {
            Self::Unset => 0,
            Self::Accepted => 1,
            Self::Rejected => 2,
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unset => write!(f, "pending"),
            Self::Accepted => write!(f, "accepted"),
            Self::Rejected => write!(f, "rejected"),
        }
    }
}

/// A pending ask to disclose one content hash.
///
/// `request_from` approves; `source` owns the root the hash was shared
/// from; `target` is the identity that asked and receives the disclosure.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareRequest {
    pub id: String,
    pub hash: String,
    pub name: String,
    pub request_from: String,
    pub source: String,
    pub target: String,
    pub status: RequestStatus,
    pub access_tier: AccessTier,
}

impl ShareRequest {
    pub fn new(
        hash: &str,
        name: &str,
        request_from: &str,
        source: &str,
        target: &str,
        access_tier: AccessTier,
    ) -> Self {
        Self {
            id: Self::stable_id(hash, source, target),
            hash: hash.to_string(),
            name: name.to_string(),
            request_from: request_from.to_string(),
            source: source.to_string(),
            target: target.to_string(),
            status: RequestStatus::Unset,
            access_tier,
        }
    }

    /// Id derived from (hash, source, target); asking again overwrites
    pub fn stable_id(hash: &str, source: &str, target: &str) -> String {
        let key = format!("{}\n{}\n{}", hash, source, target);
        hex::encode(sha256(key.as_bytes()))
    }

    pub fn is_pending(&self) -> bool {
        self.status == RequestStatus::Unset
    }
}
