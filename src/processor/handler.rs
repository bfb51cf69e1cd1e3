// TransactionHandler - applies CreateUser / CreateUserData to ledger state
//
// No state survives between executions. Each apply() builds a fresh
// StorageState whose cache is dropped when the execution ends; the ledger
// runtime serializes executions per address, so nothing here locks.

use crate::crypto::PublicKey;
use crate::ledger::{identity_address, CodecError, DataInfo, IdentityRecord, LedgerStateError};
use crate::processor::context::StateContext;
use crate::processor::payload::{Action, Payload};
use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;

/// Transaction family this processor handles
pub const FAMILY_NAME: &str = "healthcare-system";
pub const FAMILY_VERSION: &str = "1.0";

/// Errors raised while validating or applying an action
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProcessorError {
    #[error("Identity already exists at {0}")]
    AlreadyExists(String),

    #[error("No identity at {0}")]
    NotFound(String),

    #[error("State error: {0}")]
    State(#[from] LedgerStateError),

    #[error("Invalid action: {0}")]
    InvalidAction(u32),

    #[error("Invalid transaction: {0}")]
    InvalidTransaction(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<CodecError> for ProcessorError {
    fn from(e: CodecError) -> Self {
        ProcessorError::InvalidTransaction(e.to_string())
    }
}

/// Per-execution view of identity records, cache first then ledger read
pub struct StorageState<'a> {
    context: &'a mut dyn StateContext,
    cache: HashMap<String, Vec<u8>>,
}

impl<'a> StorageState<'a> {
    pub fn new(context: &'a mut dyn StateContext) -> Self {
        Self {
            context,
            cache: HashMap::new(),
        }
    }

    fn read(&mut self, address: &str) -> Result<Option<Vec<u8>>, ProcessorError> {
        if let Some(bytes) = self.cache.get(address) {
            return Ok(Some(bytes.clone()));
        }

        let mut found = self.context.get_state(&[address.to_string()])?;
        match found.remove(address) {
            Some(bytes) if !bytes.is_empty() => {
                self.cache.insert(address.to_string(), bytes.clone());
                Ok(Some(bytes))
            }
            _ => Ok(None),
        }
    }

    fn write(&mut self, address: &str, bytes: Vec<u8>) -> Result<(), ProcessorError> {
        self.cache.insert(address.to_string(), bytes.clone());
        let set = self.context.set_state(vec![(address.to_string(), bytes)])?;
        if !set.iter().any(|a| a == address) {
            return Err(ProcessorError::Internal(format!("state at {} was not set", address)));
        }
        Ok(())
    }

    pub fn get_identity(&mut self, address: &str) -> Result<Option<IdentityRecord>, ProcessorError> {
        match self.read(address)? {
            Some(bytes) => Ok(Some(IdentityRecord::from_bytes(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn save_identity(&mut self, record: &IdentityRecord) -> Result<(), ProcessorError> {
        let bytes = record.to_bytes()?;
        self.write(&record.address(), bytes)
    }

    /// Write a fresh identity with an empty root
    pub fn create_user(&mut self, name: &str, signer: &PublicKey) -> Result<String, ProcessorError> {
        let address = identity_address(name, signer);
        if self.read(&address)?.is_some() {
            return Err(ProcessorError::AlreadyExists(address));
        }

        let record = IdentityRecord::generate(name, *signer);
        self.save_identity(&record)?;
        Ok(address)
    }

    /// Register a data inode in the signer's root
    pub fn create_user_data(
        &mut self,
        name: &str,
        signer: &PublicKey,
        info: &DataInfo,
    ) -> Result<String, ProcessorError> {
        let address = identity_address(name, signer);
        let mut record = self
            .get_identity(&address)?
            .ok_or_else(|| ProcessorError::NotFound(address.clone()))?;

        if !record.verify_public_key(signer) {
            return Err(ProcessorError::InvalidTransaction(format!(
                "signer does not own {}",
                address
            )));
        }

        record.root_mut().create_data(info)?;
        self.save_identity(&record)?;
        Ok(address)
    }
}

/// Stateless handler for the healthcare transaction family
#[derive(Clone, Debug)]
pub struct TransactionHandler {
    family_name: String,
    family_versions: Vec<String>,
}

impl Default for TransactionHandler {
    fn default() -> Self {
        Self {
            family_name: FAMILY_NAME.to_string(),
            family_versions: vec![FAMILY_VERSION.to_string()],
        }
    }
}

impl TransactionHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn family_name(&self) -> &str {
        &self.family_name
    }

    pub fn family_versions(&self) -> &[String] {
        &self.family_versions
    }

    /// Namespace prefixes this family writes under
    pub fn namespaces(&self) -> Vec<String> {
        vec![crate::ledger::namespace()]
    }

    /// Decode and apply one transaction payload signed by `signer`
    pub fn apply(
        &self,
        signer: &PublicKey,
        payload: &[u8],
        context: &mut dyn StateContext,
    ) -> Result<(), ProcessorError> {
        let payload = Payload::from_bytes(payload)?;
        let mut state = StorageState::new(context);

        match Action::from_code(payload.action) {
            Some(Action::CreateUser) => {
                let name = match payload.target.first() {
                    Some(name) if !name.is_empty() => name,
                    _ => return Err(ProcessorError::InvalidTransaction("username is empty".into())),
                };
                let address = state.create_user(name, signer)?;
                debug!(name = %name, address = %address, "identity created");
                Ok(())
            }
            Some(Action::CreateUserData) => {
                if payload.name.is_empty() {
                    return Err(ProcessorError::InvalidTransaction("username is empty".into()));
                }
                let info = payload
                    .data_info
                    .as_ref()
                    .ok_or_else(|| ProcessorError::InvalidTransaction("missing data info".into()))?;
                let address = state.create_user_data(&payload.name, signer, info)?;
                debug!(name = %payload.name, address = %address, hash = %info.hash, "data registered");
                Ok(())
            }
            None => Err(ProcessorError::InvalidAction(payload.action)),
        }
    }
}
