// Workflow module - SHARING AND REQUESTS
// Create / share / request / approve, composing crypto, the client session
// and the document store

mod batch;
mod config;
mod error;
mod patient;
mod requests;
mod sweep;

pub use batch::{rows_from_csv, BatchSheet, ACCESS_TYPE_COLUMN, TRUSTED_PARTY_COLUMN};
pub use config::WorkflowConfig;
pub use error::{BatchItemError, WorkflowError};
pub use patient::{Document, IdentitySummary, PatientClient};
pub use sweep::remove_expired_data;
