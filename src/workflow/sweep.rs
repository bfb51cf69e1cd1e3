// Expiration sweep - drop ciphertext rows whose time box has passed
//
// Ledger inodes pointing at swept rows stay in place; readers get NotFound
// when they try to open them.

use crate::docstore::DocumentStore;
use crate::workflow::error::WorkflowError;
use crate::workflow::patient::PatientClient;
use tracing::info;

/// Delete every row with a nonzero expiration at or before `now`
pub async fn remove_expired_data(store: &dyn DocumentStore, now: i64) -> Result<usize, WorkflowError> {
    let expired = store.find_expired(now).await?;
    if expired.is_empty() {
        return Ok(0);
    }

    let ids: Vec<String> = expired.into_iter().map(|r| r.id).collect();
    let deleted = store.delete_by_ids(&ids).await?;
    info!(deleted, now, "expired documents removed");
    Ok(deleted)
}

impl PatientClient {
    pub async fn remove_expired_data(&self) -> Result<usize, WorkflowError> {
        remove_expired_data(self.store.as_ref(), chrono::Utc::now().timestamp()).await
    }
}
