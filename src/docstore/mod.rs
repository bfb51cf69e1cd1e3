// Docstore module - OFF-LEDGER DOCUMENTS
// Ciphertext rows keyed by content hash, plus the share-request table

mod model;
mod store;

pub use model::{DataRecord, RequestStatus, ShareRequest};
pub use store::{DocumentStore, RequestStore, SledDocumentStore, StoreError, StoreStats};
