// Transactions and batches
//
// A transaction carries an encoded header, the signer's signature over those
// exact header bytes, and the payload. A batch groups transactions under a
// second signed header listing their signatures. Ids are the hex signatures.

use crate::crypto::{digest_hex, CryptoError, Keypair, PublicKey, Signature, Signer};
use crate::ledger::{decode, encode, CodecError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reasons a transaction or batch fails structural verification
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransactionError {
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("Bad header signature on {0}")]
    BadSignature(String),

    #[error("Payload digest mismatch in {0}")]
    PayloadMismatch(String),

    #[error("Batch header does not list transaction {0}")]
    UnlistedTransaction(String),

    #[error("Transaction {0} was not signed by the batch signer")]
    ForeignSigner(String),

    #[error("Empty batch")]
    Empty,
}

// ============================================================================
// TRANSACTION
// ============================================================================

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionHeader {
    pub signer_public_key: PublicKey,
    pub batcher_public_key: PublicKey,
    pub family_name: String,
    pub family_version: String,
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
    pub nonce: String,
    /// sha512 hex of the payload bytes
    pub payload_sha512: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    header: Vec<u8>,
    header_signature: Signature,
    payload: Vec<u8>,
}

impl Transaction {
    /// Build and sign a transaction over `payload`
    pub fn build(
        keypair: &Keypair,
        family_name: &str,
        family_version: &str,
        inputs: &[String],
        outputs: &[String],
        payload: Vec<u8>,
    ) -> Result<Self, TransactionError> {
        let header = TransactionHeader {
            signer_public_key: keypair.public_key(),
            batcher_public_key: keypair.public_key(),
            family_name: family_name.to_string(),
            family_version: family_version.to_string(),
            inputs: inputs.to_vec(),
            outputs: outputs.to_vec(),
            nonce: hex::encode(rand::random::<[u8; 16]>()),
            payload_sha512: digest_hex(&payload),
        };
        let header = encode(&header)?;
        let header_signature = Signer::sign(keypair, &header);

        Ok(Self {
            header,
            header_signature,
            payload,
        })
    }

    pub fn id(&self) -> String {
        self.header_signature.to_hex()
    }

    pub fn header(&self) -> Result<TransactionHeader, TransactionError> {
        Ok(decode(&self.header)?)
    }

    pub fn header_signature(&self) -> &Signature {
        &self.header_signature
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Check the header signature and payload digest, returning the header
    pub fn verify(&self) -> Result<TransactionHeader, TransactionError> {
        let header = self.header()?;
        if !Signer::verify(&header.signer_public_key, &self.header, &self.header_signature) {
            return Err(TransactionError::BadSignature(self.id()));
        }
        if header.payload_sha512 != digest_hex(&self.payload) {
            return Err(TransactionError::PayloadMismatch(self.id()));
        }
        Ok(header)
    }
}

// ============================================================================
// BATCH
// ============================================================================

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchHeader {
    pub signer_public_key: PublicKey,
    pub transaction_ids: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Batch {
    header: Vec<u8>,
    header_signature: Signature,
    transactions: Vec<Transaction>,
}

impl Batch {
    pub fn build(keypair: &Keypair, transactions: Vec<Transaction>) -> Result<Self, TransactionError> {
        if transactions.is_empty() {
            return Err(TransactionError::Empty);
        }
        let header = BatchHeader {
            signer_public_key: keypair.public_key(),
            transaction_ids: transactions.iter().map(Transaction::id).collect(),
        };
        let header = encode(&header)?;
        let header_signature = Signer::sign(keypair, &header);

        Ok(Self {
            header,
            header_signature,
            transactions,
        })
    }

    pub fn id(&self) -> String {
        self.header_signature.to_hex()
    }

    pub fn header(&self) -> Result<BatchHeader, TransactionError> {
        Ok(decode(&self.header)?)
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// Verify the batch signature and every transaction it carries.
    ///
    /// Returns the transaction headers in batch order.
    pub fn verify(&self) -> Result<Vec<TransactionHeader>, TransactionError> {
        let header = self.header()?;
        if !Signer::verify(&header.signer_public_key, &self.header, &self.header_signature) {
            return Err(TransactionError::BadSignature(self.id()));
        }
        if self.transactions.is_empty() {
            return Err(TransactionError::Empty);
        }

        let mut headers = Vec::with_capacity(self.transactions.len());
        for (i, txn) in self.transactions.iter().enumerate() {
            let id = txn.id();
            if header.transaction_ids.get(i) != Some(&id) {
                return Err(TransactionError::UnlistedTransaction(id));
            }
            let txn_header = txn.verify()?;
            if txn_header.batcher_public_key != header.signer_public_key {
                return Err(TransactionError::ForeignSigner(id));
            }
            headers.push(txn_header);
        }
        if header.transaction_ids.len() != self.transactions.len() {
            return Err(TransactionError::UnlistedTransaction(
                header.transaction_ids[self.transactions.len()..].join(","),
            ));
        }
        Ok(headers)
    }
}

/// What actually goes over the wire to the ingress endpoint
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchList {
    pub batches: Vec<Batch>,
}

impl BatchList {
    pub fn new(batches: Vec<Batch>) -> Self {
        Self { batches }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, CodecError> {
        encode(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        decode(bytes)
    }
}
