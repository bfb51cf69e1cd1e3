// Workflow errors

use crate::client::ClientError;
use crate::crypto::CryptoError;
use crate::docstore::StoreError;
use crate::ledger::{CodecError, LedgerStateError};
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkflowError {
    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate data: {hash} is already registered for {addr}")]
    DuplicateData { hash: String, addr: String },

    #[error("Rejected: {0}")]
    Validation(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Undecodable ledger state: {0}")]
    Codec(#[from] CodecError),

    #[error("Invalid access tier: {0}")]
    InvalidAccessTier(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<LedgerStateError> for WorkflowError {
    fn from(e: LedgerStateError) -> Self {
        match e {
            LedgerStateError::DuplicateData { hash, addr } => WorkflowError::DuplicateData { hash, addr },
            LedgerStateError::InvalidKey(c) => WorkflowError::Crypto(c),
            LedgerStateError::MissingKey(index) => WorkflowError::NotFound(format!("key {}", index)),
        }
    }
}

impl From<ClientError> for WorkflowError {
    fn from(e: ClientError) -> Self {
        match e {
            ClientError::Timeout(msg) => WorkflowError::Timeout(msg),
            ClientError::Validation(msg) => WorkflowError::Validation(msg),
            ClientError::Transaction(t) => WorkflowError::Validation(t.to_string()),
            ClientError::Codec(c) => WorkflowError::Codec(c),
            ClientError::Crypto(c) => WorkflowError::Crypto(c),
            other => WorkflowError::Transport(other.to_string()),
        }
    }
}

impl From<StoreError> for WorkflowError {
    fn from(e: StoreError) -> Self {
        WorkflowError::Transport(e.to_string())
    }
}

/// One failed cell (or whole row when `col` is None) of a batch upload.
/// Rows and columns are 1-based, row 1 being the header.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchItemError {
    pub row: usize,
    pub col: Option<usize>,
    pub message: String,
}

impl fmt::Display for BatchItemError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.col {
            Some(col) => write!(f, "csv row {} col {}: {}", self.row, col, self.message),
            None => write!(f, "csv row {}: {}", self.row, self.message),
        }
    }
}

impl std::error::Error for BatchItemError {}
