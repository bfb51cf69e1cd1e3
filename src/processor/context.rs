// StateContext - the ledger runtime's view of global state during one execution

use crate::processor::ProcessorError;
use std::collections::{BTreeMap, HashMap};

/// Read/write access to ledger state for a single transaction execution.
///
/// The runtime serializes executions per address, so implementations need
/// no locking of their own.
pub trait StateContext {
    /// Fetch the values at `addresses`; absent addresses are omitted
    fn get_state(&mut self, addresses: &[String]) -> Result<HashMap<String, Vec<u8>>, ProcessorError>;

    /// Write entries, returning the addresses that were set
    fn set_state(&mut self, entries: Vec<(String, Vec<u8>)>) -> Result<Vec<String>, ProcessorError>;
}

/// In-memory state, used by the local ledger and in tests
#[derive(Clone, Debug, Default)]
pub struct MemoryContext {
    state: BTreeMap<String, Vec<u8>>,
    touched: Vec<String>,
}

impl MemoryContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_state(state: BTreeMap<String, Vec<u8>>) -> Self {
        Self {
            state,
            touched: Vec::new(),
        }
    }

    pub fn get(&self, address: &str) -> Option<&Vec<u8>> {
        self.state.get(address)
    }

    /// Addresses written since construction, in write order, without repeats
    pub fn touched(&self) -> &[String] {
        &self.touched
    }

    pub fn into_state(self) -> BTreeMap<String, Vec<u8>> {
        self.state
    }
}

impl StateContext for MemoryContext {
    fn get_state(&mut self, addresses: &[String]) -> Result<HashMap<String, Vec<u8>>, ProcessorError> {
        Ok(addresses
            .iter()
            .filter_map(|a| self.state.get(a).map(|v| (a.clone(), v.clone())))
            .collect())
    }

    fn set_state(&mut self, entries: Vec<(String, Vec<u8>)>) -> Result<Vec<String>, ProcessorError> {
        let mut set = Vec::with_capacity(entries.len());
        for (address, value) in entries {
            if !self.touched.contains(&address) {
                self.touched.push(address.clone());
            }
            self.state.insert(address.clone(), value);
            set.push(address);
        }
        Ok(set)
    }
}
