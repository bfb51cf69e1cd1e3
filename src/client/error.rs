// Client errors

use crate::client::TransactionError;
use crate::crypto::CryptoError;
use crate::ledger::CodecError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Commit not observed: {0}")]
    Timeout(String),

    #[error("Batch rejected: {0}")]
    Validation(String),

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("Malformed transaction: {0}")]
    Transaction(#[from] TransactionError),

    #[error("A commit wait is already outstanding")]
    WaitInProgress,

    #[error("Session is closed")]
    Closed,
}
