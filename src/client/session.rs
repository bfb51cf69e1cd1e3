// ClientSession - one identity's connection to the ledger
//
// A session owns exactly one event subscription for its identity address and
// one listener task pumping that subscription into two slots:
//
//   commit slot  a oneshot sender, present only while a commit wait is armed.
//                The listener takes and fires it; with nobody waiting the
//                signal is dropped.
//   state slot   mpsc with capacity 1. Every state change for the address is
//                pushed here. Once a consumer has taken the receiver the
//                listener blocks until it reads; before that the slot only
//                keeps the latest value.

use crate::client::events::{ChangeKind, EventList, EventSource, Subscription};
use crate::client::ingress::{BatchStatus, LedgerIngress};
use crate::client::transaction::{Batch, BatchList, Transaction};
use crate::client::ClientError;
use crate::crypto::{Keypair, PublicKey};
use crate::ledger::identity_address;
use crate::processor::{Payload, FAMILY_NAME, FAMILY_VERSION};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

pub const DEFAULT_COMMIT_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_PAGE_SIZE: usize = 20;

// ============================================================================
// CLIENT CONFIG
// ============================================================================

#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub family_name: String,
    pub family_version: String,
    /// How long a commit wait blocks before giving up
    pub commit_timeout: Duration,
    /// Page size for prefix listings
    pub page_size: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            family_name: FAMILY_NAME.to_string(),
            family_version: FAMILY_VERSION.to_string(),
            commit_timeout: DEFAULT_COMMIT_TIMEOUT,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_family(mut self, name: &str, version: &str) -> Self {
        self.family_name = name.to_string();
        self.family_version = version.to_string();
        self
    }

    pub fn with_commit_timeout(mut self, timeout: Duration) -> Self {
        self.commit_timeout = timeout;
        self
    }

    pub fn with_page_size(mut self, size: usize) -> Self {
        self.page_size = size.max(1);
        self
    }
}

// ============================================================================
// CLIENT SESSION
// ============================================================================

type CommitSlot = Arc<Mutex<Option<oneshot::Sender<()>>>>;

/// Receiver half of the state slot, held here until a consumer claims it
type UnclaimedState = Arc<std::sync::Mutex<Option<mpsc::Receiver<Vec<u8>>>>>;

pub struct ClientSession {
    name: String,
    keypair: Keypair,
    address: String,
    config: ClientConfig,
    ingress: Arc<dyn LedgerIngress>,
    events: Arc<dyn EventSource>,
    correlation_id: String,
    commit_slot: CommitSlot,
    state_updates: UnclaimedState,
    shutdown: watch::Sender<bool>,
    listener: Mutex<Option<JoinHandle<()>>>,
    closed: AtomicBool,
}

impl ClientSession {
    /// Subscribe to the identity's address and start the listener.
    ///
    /// Consumers of state pushes claim them with `take_state_updates` and
    /// must keep reading. A session nobody claims keeps only the latest push,
    /// so commits are still observed.
    pub async fn open(
        name: &str,
        keypair: Keypair,
        ingress: Arc<dyn LedgerIngress>,
        events: Arc<dyn EventSource>,
        config: ClientConfig,
    ) -> Result<Self, ClientError> {
        let address = identity_address(name, &keypair.public_key());
        let subscription = events.subscribe(&address).await?;
        let correlation_id = subscription.correlation_id().to_string();

        let commit_slot: CommitSlot = Arc::new(Mutex::new(None));
        let (state_tx, state_rx) = mpsc::channel(1);
        let (shutdown, shutdown_rx) = watch::channel(false);
        let state_updates: UnclaimedState = Arc::new(std::sync::Mutex::new(Some(state_rx)));

        let listener = tokio::spawn(listen(
            address.clone(),
            subscription,
            commit_slot.clone(),
            state_tx,
            state_updates.clone(),
            shutdown_rx,
        ));

        info!(name = %name, address = %address, correlation_id = %correlation_id, "session opened");

        Ok(Self {
            name: name.to_string(),
            keypair,
            address,
            config,
            ingress,
            events,
            correlation_id,
            commit_slot,
            state_updates,
            shutdown,
            listener: Mutex::new(Some(listener)),
            closed: AtomicBool::new(false),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn public_key(&self) -> PublicKey {
        self.keypair.public_key()
    }

    pub fn keypair(&self) -> &Keypair {
        &self.keypair
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// The receiving end of the state slot. Only the first caller gets it.
    pub fn take_state_updates(&self) -> Option<mpsc::Receiver<Vec<u8>>> {
        match self.state_updates.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        }
    }

    /// Sign `payloads` into one batch and hand it to the ingress endpoint
    pub async fn submit(
        &self,
        payloads: &[Payload],
        inputs: &[String],
        outputs: &[String],
    ) -> Result<String, ClientError> {
        if self.is_closed() {
            return Err(ClientError::Closed);
        }

        let mut transactions = Vec::with_capacity(payloads.len());
        for payload in payloads {
            transactions.push(Transaction::build(
                &self.keypair,
                &self.config.family_name,
                &self.config.family_version,
                inputs,
                outputs,
                payload.to_bytes()?,
            )?);
        }
        let batch = Batch::build(&self.keypair, transactions)?;
        let bytes = BatchList::new(vec![batch]).to_bytes()?;

        let batch_id = self.ingress.submit_batch(bytes).await?;
        debug!(address = %self.address, batch_id = %batch_id, transactions = payloads.len(), "batch submitted");
        Ok(batch_id)
    }

    /// Block until the next commit touching this identity, or `timeout`
    pub async fn wait_for_commit(&self, timeout: Duration) -> Result<(), ClientError> {
        let waiter = self.arm().await?;
        self.await_commit(waiter, timeout).await
    }

    /// Submit and wait for the commit.
    ///
    /// The waiter is armed before submission so a fast commit is not missed.
    /// A batch the ledger already marked invalid fails with `Validation`.
    pub async fn submit_and_wait(
        &self,
        payloads: &[Payload],
        inputs: &[String],
        outputs: &[String],
    ) -> Result<String, ClientError> {
        let waiter = self.arm().await?;

        let batch_id = match self.submit(payloads, inputs, outputs).await {
            Ok(id) => id,
            Err(e) => {
                self.disarm().await;
                return Err(e);
            }
        };

        match self.ingress.get_batch_status(&batch_id).await {
            Ok(BatchStatus::Invalid(reason)) => {
                self.disarm().await;
                warn!(batch_id = %batch_id, reason = %reason, "batch rejected");
                return Err(ClientError::Validation(reason));
            }
            Ok(_) => {}
            Err(e) => {
                self.disarm().await;
                return Err(e);
            }
        }

        match self.await_commit(waiter, self.config.commit_timeout).await {
            Ok(()) => {
                debug!(batch_id = %batch_id, "batch committed");
                Ok(batch_id)
            }
            Err(ClientError::Timeout(msg)) => match self.ingress.get_batch_status(&batch_id).await? {
                BatchStatus::Invalid(reason) => Err(ClientError::Validation(reason)),
                status => {
                    warn!(batch_id = %batch_id, status = %status, "commit not observed");
                    Err(ClientError::Timeout(msg))
                }
            },
            Err(e) => Err(e),
        }
    }

    /// Value at `address`, read fresh from the ledger
    pub async fn get_state(&self, address: &str) -> Result<Option<Vec<u8>>, ClientError> {
        self.ingress.get_state(address).await
    }

    /// Every entry under `prefix`, paging through the ingress endpoint
    pub async fn list_state(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>, ClientError> {
        let mut entries = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let page = self
                .ingress
                .list_by_prefix(prefix, cursor.as_deref(), self.config.page_size.max(1))
                .await?;
            entries.extend(page.entries);
            match page.next {
                Some(next) => cursor = Some(next),
                None => return Ok(entries),
            }
        }
    }

    /// Unsubscribe, then stop the listener. A pending commit wait ends with
    /// `Timeout`.
    pub async fn close(&self) -> Result<(), ClientError> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        let unsubscribed = self.events.unsubscribe(&self.correlation_id).await;
        let _ = self.shutdown.send(true);
        self.commit_slot.lock().await.take();

        if let Some(handle) = self.listener.lock().await.take() {
            if let Err(e) = handle.await {
                warn!(address = %self.address, error = %e, "listener task failed");
            }
        }

        info!(name = %self.name, correlation_id = %self.correlation_id, "session closed");
        unsubscribed
    }

    async fn arm(&self) -> Result<oneshot::Receiver<()>, ClientError> {
        if self.is_closed() {
            return Err(ClientError::Closed);
        }
        let mut slot = self.commit_slot.lock().await;
        if slot.as_ref().is_some_and(|tx| !tx.is_closed()) {
            return Err(ClientError::WaitInProgress);
        }
        let (tx, rx) = oneshot::channel();
        *slot = Some(tx);
        Ok(rx)
    }

    async fn disarm(&self) {
        self.commit_slot.lock().await.take();
    }

    async fn await_commit(&self, waiter: oneshot::Receiver<()>, timeout: Duration) -> Result<(), ClientError> {
        match tokio::time::timeout(timeout, waiter).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(_)) => Err(ClientError::Timeout("session closed while waiting".to_string())),
            Err(_) => {
                self.disarm().await;
                Err(ClientError::Timeout(format!("no commit within {:?}", timeout)))
            }
        }
    }
}

/// Empty the state slot if no consumer has claimed it yet.
///
/// Returns false once the receiver has been taken.
fn drain_unclaimed(state_updates: &UnclaimedState) -> bool {
    let mut guard = match state_updates.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    match guard.as_mut() {
        Some(rx) => {
            while rx.try_recv().is_ok() {}
            true
        }
        None => false,
    }
}

/// Listener loop: one per session, sole writer to both slots
async fn listen(
    address: String,
    mut subscription: Subscription,
    commit_slot: CommitSlot,
    state_tx: mpsc::Sender<Vec<u8>>,
    state_updates: UnclaimedState,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        let frame = tokio::select! {
            _ = shutdown.changed() => break,
            frame = subscription.receive() => frame,
        };
        let frame = match frame {
            Some(frame) => frame,
            None => {
                debug!(address = %address, "event stream ended");
                break;
            }
        };

        let changes = match EventList::from_bytes(&frame).and_then(|list| list.state_changes_for(&address)) {
            Ok(changes) => changes,
            Err(e) => {
                warn!(address = %address, error = %e, "skipping undecodable event frame");
                continue;
            }
        };
        if changes.is_empty() {
            continue;
        }

        if let Some(waiter) = commit_slot.lock().await.take() {
            let _ = waiter.send(());
        }

        for change in changes.into_iter().filter(|c| c.kind == ChangeKind::Set) {
            if drain_unclaimed(&state_updates) {
                // sole writer and the slot is empty, so this cannot be full
                if state_tx.try_send(change.value).is_err() {
                    debug!(address = %address, "state slot closed");
                }
                continue;
            }
            tokio::select! {
                _ = shutdown.changed() => return,
                sent = state_tx.send(change.value) => {
                    if sent.is_err() {
                        debug!(address = %address, "state consumer gone");
                    }
                }
            }
        }
    }
}
