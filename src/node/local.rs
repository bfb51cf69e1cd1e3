// LocalLedger - in-process ledger for development and tests
//
// Batches are applied one at a time under a single lock, which gives the
// processor the one-execution-per-address guarantee it relies on. Each batch
// runs against a copy of state and is committed only if every transaction in
// it succeeds.

use crate::client::{
    Batch, BatchList, BatchStatus, ChangeKind, ClientError, Event, EventList, EventSource,
    LedgerIngress, StateChange, StatePage, Subscription,
};
use crate::processor::{MemoryContext, ProcessorError, StateContext, TransactionHandler};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, warn};

/// Frames buffered per subscriber before the ledger waits on it
pub const DEFAULT_EVENT_BUFFER: usize = 64;

/// How long a submitter waits on a full subscriber before dropping the frame
pub const DEFAULT_DELIVERY_TIMEOUT: Duration = Duration::from_secs(5);

struct Subscriber {
    filter: String,
    frames: mpsc::Sender<Vec<u8>>,
}

#[derive(Default)]
struct LedgerInner {
    state: BTreeMap<String, Vec<u8>>,
    statuses: HashMap<String, BatchStatus>,
    subscribers: HashMap<String, Subscriber>,
    height: u64,
}

pub struct LocalLedger {
    inner: Mutex<LedgerInner>,
    handler: TransactionHandler,
    event_buffer: usize,
    delivery_timeout: Duration,
}

impl Default for LocalLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalLedger {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(LedgerInner::default()),
            handler: TransactionHandler::new(),
            event_buffer: DEFAULT_EVENT_BUFFER,
            delivery_timeout: DEFAULT_DELIVERY_TIMEOUT,
        }
    }

    pub fn with_event_buffer(mut self, frames: usize) -> Self {
        self.event_buffer = frames.max(1);
        self
    }

    pub fn with_delivery_timeout(mut self, timeout: Duration) -> Self {
        self.delivery_timeout = timeout;
        self
    }

    /// Number of committed batches
    pub async fn height(&self) -> u64 {
        self.inner.lock().await.height
    }

    pub async fn subscriber_count(&self) -> usize {
        self.inner.lock().await.subscribers.len()
    }

    /// Addresses currently holding state
    pub async fn addresses(&self) -> Vec<String> {
        self.inner.lock().await.state.keys().cloned().collect()
    }

    /// Verify and apply one batch against a copy of `state`
    fn execute(&self, state: &BTreeMap<String, Vec<u8>>, batch: &Batch) -> Result<MemoryContext, String> {
        let headers = batch.verify().map_err(|e| e.to_string())?;
        let mut context = MemoryContext::from_state(state.clone());

        for (txn, header) in batch.transactions().iter().zip(headers.iter()) {
            if header.family_name != self.handler.family_name() {
                return Err(format!("unknown transaction family {}", header.family_name));
            }
            if !self.handler.family_versions().contains(&header.family_version) {
                return Err(format!(
                    "unsupported {} version {}",
                    header.family_name, header.family_version
                ));
            }

            let mut scoped = ScopedContext::new(&mut context, &header.inputs, &header.outputs);
            self.handler
                .apply(&header.signer_public_key, txn.payload(), &mut scoped)
                .map_err(|e| format!("transaction {}: {}", txn.id(), e))?;
        }
        Ok(context)
    }
}

#[async_trait]
impl LedgerIngress for LocalLedger {
    async fn submit_batch(&self, batch_list: Vec<u8>) -> Result<String, ClientError> {
        let list = BatchList::from_bytes(&batch_list)
            .map_err(|e| ClientError::Validation(format!("malformed batch list: {}", e)))?;
        let first = list
            .batches
            .first()
            .map(Batch::id)
            .ok_or_else(|| ClientError::Validation("empty batch list".to_string()))?;

        let mut deliveries = Vec::new();
        {
            let mut inner = self.inner.lock().await;
            for batch in &list.batches {
                let batch_id = batch.id();
                match self.execute(&inner.state, batch) {
                    Ok(context) => {
                        let changes: Vec<StateChange> = context
                            .touched()
                            .iter()
                            .filter_map(|address| {
                                context.get(address).map(|value| StateChange {
                                    address: address.clone(),
                                    value: value.clone(),
                                    kind: ChangeKind::Set,
                                })
                            })
                            .collect();

                        inner.state = context.into_state();
                        inner.height += 1;
                        inner.statuses.insert(batch_id.clone(), BatchStatus::Committed);
                        debug!(batch_id = %batch_id, height = inner.height, changes = changes.len(), "batch committed");

                        for (id, sub) in inner.subscribers.iter() {
                            let matching: Vec<StateChange> = changes
                                .iter()
                                .filter(|c| c.address.starts_with(&sub.filter))
                                .cloned()
                                .collect();
                            if matching.is_empty() {
                                continue;
                            }
                            let frame = Event::state_delta(matching).and_then(|event| {
                                EventList {
                                    events: vec![event],
                                }
                                .to_bytes()
                            });
                            match frame {
                                Ok(frame) => deliveries.push((id.clone(), sub.frames.clone(), frame)),
                                Err(e) => {
                                    warn!(batch_id = %batch_id, correlation_id = %id, error = %e, "failed to encode event frame")
                                }
                            }
                        }
                    }
                    Err(reason) => {
                        warn!(batch_id = %batch_id, reason = %reason, "batch invalid");
                        inner.statuses.insert(batch_id, BatchStatus::Invalid(reason));
                    }
                }
            }
        }

        for (correlation_id, frames, frame) in deliveries {
            match tokio::time::timeout(self.delivery_timeout, frames.send(frame)).await {
                Ok(Ok(())) => {}
                Ok(Err(_)) => debug!(correlation_id = %correlation_id, "subscriber went away before delivery"),
                Err(_) => warn!(correlation_id = %correlation_id, "subscriber stalled, event frame dropped"),
            }
        }
        Ok(first)
    }

    async fn get_batch_status(&self, batch_id: &str) -> Result<BatchStatus, ClientError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .statuses
            .get(batch_id)
            .cloned()
            .unwrap_or(BatchStatus::Unknown))
    }

    async fn get_state(&self, address: &str) -> Result<Option<Vec<u8>>, ClientError> {
        Ok(self.inner.lock().await.state.get(address).cloned())
    }

    async fn list_by_prefix(
        &self,
        prefix: &str,
        cursor: Option<&str>,
        limit: usize,
    ) -> Result<StatePage, ClientError> {
        let inner = self.inner.lock().await;
        let start = cursor.unwrap_or(prefix).to_string();
        let mut matching = inner
            .state
            .range(start..)
            .take_while(|(address, _)| address.starts_with(prefix));

        let entries: Vec<(String, Vec<u8>)> = matching
            .by_ref()
            .take(limit.max(1))
            .map(|(a, v)| (a.clone(), v.clone()))
            .collect();
        let next = matching.next().map(|(a, _)| a.clone());
        Ok(StatePage { entries, next })
    }
}

#[async_trait]
impl EventSource for LocalLedger {
    async fn subscribe(&self, address_filter: &str) -> Result<Subscription, ClientError> {
        let correlation_id = uuid::Uuid::new_v4().to_string();
        let (tx, rx) = mpsc::channel(self.event_buffer);

        self.inner.lock().await.subscribers.insert(
            correlation_id.clone(),
            Subscriber {
                filter: address_filter.to_string(),
                frames: tx,
            },
        );
        info!(correlation_id = %correlation_id, filter = %address_filter, "subscribed");
        Ok(Subscription::new(correlation_id, rx))
    }

    async fn unsubscribe(&self, correlation_id: &str) -> Result<(), ClientError> {
        match self.inner.lock().await.subscribers.remove(correlation_id) {
            Some(_) => {
                info!(correlation_id = %correlation_id, "unsubscribed");
                Ok(())
            }
            None => Err(ClientError::Transport(format!(
                "no subscription {}",
                correlation_id
            ))),
        }
    }
}

// ============================================================================
// SCOPED CONTEXT
// ============================================================================

/// Restricts a transaction to the addresses its header declared.
///
/// A declared entry authorizes every address it is a prefix of.
pub struct ScopedContext<'a> {
    inner: &'a mut dyn StateContext,
    inputs: &'a [String],
    outputs: &'a [String],
}

impl<'a> ScopedContext<'a> {
    pub fn new(inner: &'a mut dyn StateContext, inputs: &'a [String], outputs: &'a [String]) -> Self {
        Self {
            inner,
            inputs,
            outputs,
        }
    }

    fn covered(declared: &[String], address: &str) -> bool {
        declared.iter().any(|d| address.starts_with(d.as_str()))
    }
}

impl StateContext for ScopedContext<'_> {
    fn get_state(&mut self, addresses: &[String]) -> Result<HashMap<String, Vec<u8>>, ProcessorError> {
        if let Some(address) = addresses.iter().find(|a| !Self::covered(self.inputs, a)) {
            return Err(ProcessorError::InvalidTransaction(format!(
                "read of undeclared address {}",
                address
            )));
        }
        self.inner.get_state(addresses)
    }

    fn set_state(&mut self, entries: Vec<(String, Vec<u8>)>) -> Result<Vec<String>, ProcessorError> {
        if let Some((address, _)) = entries.iter().find(|(a, _)| !Self::covered(self.outputs, a)) {
            return Err(ProcessorError::InvalidTransaction(format!(
                "write to undeclared address {}",
                address
            )));
        }
        self.inner.set_state(entries)
    }
}
