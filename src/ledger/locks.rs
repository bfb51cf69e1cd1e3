// RootLocks - per-root update locks kept outside the entities themselves

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// One async lock per root address.
///
/// Hold the guard across a read-modify-submit sequence on a root.
#[derive(Clone, Default)]
pub struct RootLocks {
    locks: Arc<Mutex<HashMap<String, Arc<AsyncMutex<()>>>>>,
}

impl RootLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, address: &str) -> Arc<AsyncMutex<()>> {
        let mut locks = match self.locks.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        locks
            .entry(address.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }

    /// Wait for exclusive access to the root at `address`
    pub async fn lock(&self, address: &str) -> OwnedMutexGuard<()> {
        self.slot(address).lock_owned().await
    }

    /// Exclusive access if nobody holds it right now
    pub fn try_lock(&self, address: &str) -> Option<OwnedMutexGuard<()>> {
        self.slot(address).try_lock_owned().ok()
    }

    /// Number of roots that have been locked at least once
    pub fn tracked(&self) -> usize {
        match self.locks.lock() {
            Ok(guard) => guard.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }
}
