// LedgerIngress - the ledger's submission and state-query endpoint

use crate::client::ClientError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a submitted batch stands
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BatchStatus {
    Pending,
    Committed,
    Invalid(String),
    Unknown,
}

impl fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "PENDING"),
            Self::Committed => write!(f, "COMMITTED"),
            Self::Invalid(reason) => write!(f, "INVALID ({})", reason),
            Self::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// One page of a prefix listing
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StatePage {
    pub entries: Vec<(String, Vec<u8>)>,
    /// First address of the next page, if there is one
    pub next: Option<String>,
}

#[async_trait]
pub trait LedgerIngress: Send + Sync {
    /// Submit an encoded `BatchList`, returning the id of its first batch
    async fn submit_batch(&self, batch_list: Vec<u8>) -> Result<String, ClientError>;

    async fn get_batch_status(&self, batch_id: &str) -> Result<BatchStatus, ClientError>;

    /// Value at `address`; absent state is `Ok(None)`
    async fn get_state(&self, address: &str) -> Result<Option<Vec<u8>>, ClientError>;

    /// Entries whose address starts with `prefix`, in address order,
    /// beginning at `cursor` (inclusive) when given
    async fn list_by_prefix(
        &self,
        prefix: &str,
        cursor: Option<&str>,
        limit: usize,
    ) -> Result<StatePage, ClientError>;
}
