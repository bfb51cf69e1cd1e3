// PatientClient - one identity's view of the system
//
// Own data is read from a cached IdentityRecord that a background task keeps
// current from the session's state pushes. Other identities' roots are
// always re-read from the ledger before a sharing query.

use crate::client::ClientSession;
use crate::crypto::{decrypt_content, encrypt_content, unwrap_key, wrap_key, PublicKey, SymmetricKey};
use crate::docstore::{DocumentStore, RequestStore};
use crate::ledger::{
    AccessTier, AddressKind, DataInfo, DataNode, DataPointer, IdentityRecord, RootLocks,
};
use crate::processor::Payload;
use crate::workflow::config::WorkflowConfig;
use crate::workflow::error::WorkflowError;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// A decrypted document together with its ledger pointer
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Document {
    pub pointer: DataPointer,
    pub plaintext: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IdentitySummary {
    pub name: String,
    pub public_key: PublicKey,
    pub address: String,
}

/// A ciphertext sealed for one recipient, ready to store and register
pub(super) struct Sealed {
    pub info: DataInfo,
    pub ciphertext: Vec<u8>,
    pub expiration: i64,
}

type CachedIdentity = Arc<Mutex<Option<IdentityRecord>>>;

pub struct PatientClient {
    pub(super) session: Arc<ClientSession>,
    pub(super) store: Arc<dyn DocumentStore>,
    pub(super) requests: Arc<dyn RequestStore>,
    pub(super) config: WorkflowConfig,
    identity: CachedIdentity,
    users: Mutex<HashMap<String, IdentityRecord>>,
    locks: RootLocks,
    sync_task: Mutex<Option<JoinHandle<()>>>,
}

/// Repos only grow, so a record with fewer inodes than the cached one is stale
fn is_current(cached: &Option<IdentityRecord>, incoming: &IdentityRecord) -> bool {
    match cached {
        Some(cached) => incoming.root().repo().len() >= cached.root().repo().len(),
        None => true,
    }
}

async fn sync_state(mut updates: mpsc::Receiver<Vec<u8>>, identity: CachedIdentity) {
    while let Some(bytes) = updates.recv().await {
        match IdentityRecord::from_bytes(&bytes) {
            Ok(record) => {
                let mut cached = identity.lock().await;
                if is_current(&cached, &record) {
                    debug!(name = %record.name(), inodes = record.root().repo().len(), "identity state pushed");
                    *cached = Some(record);
                }
            }
            Err(e) => warn!(error = %e, "failed to decode pushed identity state"),
        }
    }
}

impl PatientClient {
    /// Wrap an open session. Loads the identity if it is already registered
    /// and starts consuming the session's state pushes.
    pub async fn open(
        session: ClientSession,
        store: Arc<dyn DocumentStore>,
        requests: Arc<dyn RequestStore>,
        config: WorkflowConfig,
    ) -> Result<Self, WorkflowError> {
        let session = Arc::new(session);
        let identity: CachedIdentity = Arc::new(Mutex::new(None));

        if let Some(bytes) = session.get_state(session.address()).await? {
            let record = IdentityRecord::from_bytes(&bytes)?;
            info!(name = %record.name(), "identity loaded");
            *identity.lock().await = Some(record);
        }

        let sync_task = session
            .take_state_updates()
            .map(|updates| tokio::spawn(sync_state(updates, identity.clone())));

        Ok(Self {
            session,
            store,
            requests,
            config,
            identity,
            users: Mutex::new(HashMap::new()),
            locks: RootLocks::new(),
            sync_task: Mutex::new(sync_task),
        })
    }

    pub fn name(&self) -> &str {
        self.session.name()
    }

    pub fn address(&self) -> &str {
        self.session.address()
    }

    pub fn session(&self) -> &ClientSession {
        &self.session
    }

    pub fn whoami(&self) -> IdentitySummary {
        IdentitySummary {
            name: self.name().to_string(),
            public_key: self.session.public_key(),
            address: self.address().to_string(),
        }
    }

    /// Register this identity on the ledger and load its record.
    ///
    /// Names are unique across the namespace: a name already registered
    /// under another key is refused with `Validation`.
    pub async fn register(&self) -> Result<IdentityRecord, WorkflowError> {
        let address = self.address().to_string();
        let _guard = self.locks.lock(&address).await;

        if let Some((taken, _)) = self
            .list_users()
            .await?
            .into_iter()
            .find(|(other, record)| record.name() == self.name() && *other != address)
        {
            return Err(WorkflowError::Validation(format!(
                "name {} is already registered at {}",
                self.name(),
                taken
            )));
        }

        self.session
            .submit_and_wait(&[Payload::create_user(self.name())], &[address.clone()], &[address.clone()])
            .await?;
        info!(name = %self.name(), address = %address, public_key = %self.session.public_key(), "identity registered");
        self.sync().await
    }

    /// Reload this identity's record from the ledger
    pub async fn sync(&self) -> Result<IdentityRecord, WorkflowError> {
        let bytes = self
            .session
            .get_state(self.address())
            .await?
            .ok_or_else(|| WorkflowError::NotFound(format!("identity {}", self.name())))?;
        let record = IdentityRecord::from_bytes(&bytes)?;
        *self.identity.lock().await = Some(record.clone());
        Ok(record)
    }

    /// Cached record, falling back to a ledger read
    pub async fn identity(&self) -> Result<IdentityRecord, WorkflowError> {
        if let Some(record) = self.identity.lock().await.clone() {
            return Ok(record);
        }
        self.sync().await
    }

    async fn remember(&self, record: IdentityRecord) {
        let mut cached = self.identity.lock().await;
        if is_current(&cached, &record) {
            *cached = Some(record);
        }
    }

    // ========================================================================
    // OWN DATA
    // ========================================================================

    /// Encrypt `plaintext` under a fresh key, store it, and register it in
    /// this identity's root. Returns once the registration is committed.
    pub async fn create_patient_data(
        &self,
        name: &str,
        plaintext: &[u8],
        access_tier: AccessTier,
    ) -> Result<DataPointer, WorkflowError> {
        let sealed = self.seal(name, plaintext, &self.session.public_key(), self.name(), access_tier, 0)?;
        let mut pointers = self.commit(vec![sealed]).await?;
        pointers
            .pop()
            .ok_or_else(|| WorkflowError::NotFound(format!("data {}", name)))
    }

    /// Data inodes in this identity's repo addressed to itself
    pub async fn list_patient_data(&self) -> Result<Vec<DataNode>, WorkflowError> {
        let record = self.identity().await?;
        Ok(record.root().data_addressed_to(self.name()).cloned().collect())
    }

    pub async fn get_patient_data(&self, hash: &str) -> Result<Document, WorkflowError> {
        let record = self.identity().await?;
        let pointer = record
            .root()
            .get_data(hash, self.name())?
            .ok_or_else(|| WorkflowError::NotFound(format!("data {}", hash)))?;
        self.open_pointer(pointer).await
    }

    /// Re-encrypt one of this identity's documents for `recipient`.
    ///
    /// The copy gets a new key and a new content hash and is registered in
    /// this identity's root, addressed to the recipient.
    pub async fn share_data(&self, hash: &str, recipient: &str) -> Result<DataPointer, WorkflowError> {
        let document = self.get_patient_data(hash).await?;
        let (_, recipient) = self.get_user(recipient).await?;

        let sealed = self.seal_copy(&document, &recipient, 0)?;
        let mut pointers = self.commit(vec![sealed]).await?;
        let pointer = pointers
            .pop()
            .ok_or_else(|| WorkflowError::NotFound(format!("data {}", hash)))?;
        info!(hash = %hash, recipient = %recipient.name(), shared_hash = %pointer.hash, "data shared");
        Ok(pointer)
    }

    // ========================================================================
    // IDENTITY DISCOVERY
    // ========================================================================

    /// Every registered identity, keyed by address
    pub async fn list_users(&self) -> Result<Vec<(String, IdentityRecord)>, WorkflowError> {
        let entries = self
            .session
            .list_state(&AddressKind::Identity.namespace_prefix())
            .await?;

        let mut users = self.users.lock().await;
        let mut out = Vec::with_capacity(entries.len());
        for (address, bytes) in entries {
            match IdentityRecord::from_bytes(&bytes) {
                Ok(record) => {
                    users.insert(address.clone(), record.clone());
                    out.push((address, record));
                }
                Err(e) => warn!(address = %address, error = %e, "skipping undecodable identity"),
            }
        }
        Ok(out)
    }

    /// Resolve a name to (address, record), listing the ledger on a cache miss.
    ///
    /// A name carried by more than one record is ambiguous and fails with
    /// `Validation`; no key is ever picked for it.
    pub async fn get_user(&self, name: &str) -> Result<(String, IdentityRecord), WorkflowError> {
        let mut found = self.cached_users(name).await;
        if found.is_empty() {
            self.list_users().await?;
            found = self.cached_users(name).await;
        }

        match found.len() {
            0 => Err(WorkflowError::NotFound(format!("user {}", name))),
            1 => Ok(found.remove(0)),
            n => {
                warn!(name = %name, records = n, "name is registered under several keys");
                Err(WorkflowError::Validation(format!(
                    "user {} is ambiguous: {} identities carry the name",
                    name, n
                )))
            }
        }
    }

    async fn cached_users(&self, name: &str) -> Vec<(String, IdentityRecord)> {
        self.users
            .lock()
            .await
            .iter()
            .filter(|(_, record)| record.name() == name)
            .map(|(address, record)| (address.clone(), record.clone()))
            .collect()
    }

    /// `name`'s record read fresh from the ledger
    pub(super) async fn fresh_identity(&self, name: &str) -> Result<IdentityRecord, WorkflowError> {
        let (address, _) = self.get_user(name).await?;
        let bytes = self
            .session
            .get_state(&address)
            .await?
            .ok_or_else(|| WorkflowError::NotFound(format!("user {}", name)))?;
        let record = IdentityRecord::from_bytes(&bytes)?;
        self.users.lock().await.insert(address, record.clone());
        Ok(record)
    }

    // ========================================================================
    // SHARED DATA
    // ========================================================================

    /// Data `source` has shared with this identity whose ciphertext is still
    /// in the document store
    pub async fn list_shared_patient_data(&self, source: &str) -> Result<Vec<DataNode>, WorkflowError> {
        let record = self.fresh_identity(source).await?;
        self.visible_shared(&record).await
    }

    pub async fn get_shared_patient_data(&self, hash: &str, source: &str) -> Result<Document, WorkflowError> {
        let record = self.fresh_identity(source).await?;
        let pointer = record
            .root()
            .get_data(hash, self.name())?
            .ok_or_else(|| WorkflowError::NotFound(format!("data {} shared by {}", hash, source)))?;
        self.open_pointer(pointer).await
    }

    async fn visible_shared(&self, record: &IdentityRecord) -> Result<Vec<DataNode>, WorkflowError> {
        let nodes: Vec<DataNode> = record.root().data_addressed_to(self.name()).cloned().collect();
        if nodes.is_empty() {
            return Ok(nodes);
        }

        let hashes: Vec<String> = nodes.iter().map(|n| n.hash.clone()).collect();
        let present: HashSet<String> = self
            .store
            .find_by_hashes(&hashes)
            .await?
            .into_iter()
            .map(|r| r.hash)
            .collect();
        Ok(nodes.into_iter().filter(|n| present.contains(&n.hash)).collect())
    }

    /// Re-disclose what `source` shared with this identity to `target`, for
    /// records `required_tier` admits. The copies expire after the
    /// configured third-party window. An Unset tier discloses nothing.
    pub async fn open_shared_data_to_third_party(
        &self,
        source: &str,
        target: &str,
        required_tier: AccessTier,
    ) -> Result<Vec<DataPointer>, WorkflowError> {
        if required_tier == AccessTier::Unset {
            return Ok(Vec::new());
        }

        let record = self.fresh_identity(source).await?;
        let shared = self.visible_shared(&record).await?;
        let (_, target) = self.get_user(target).await?;
        let expiration = chrono::Utc::now().timestamp() + self.config.third_party_expiration_secs();

        let mut sealed = Vec::new();
        for node in shared.iter().filter(|n| required_tier.admits(n.access_tier)) {
            let pointer = record
                .root()
                .get_data(&node.hash, self.name())?
                .ok_or_else(|| WorkflowError::NotFound(format!("data {}", node.hash)))?;
            let document = self.open_pointer(pointer).await?;
            sealed.push(self.seal_copy(&document, &target, expiration)?);
        }

        let pointers = self.commit(sealed).await?;
        info!(source = %source, recipient = %target.name(), tier = %required_tier, disclosed = pointers.len(), "third-party disclosure");
        Ok(pointers)
    }

    /// Re-disclose all of this identity's own data to `target`, without
    /// expiration or tier filtering
    pub async fn open_shared_data_to_trusted_party(&self, target: &str) -> Result<Vec<DataPointer>, WorkflowError> {
        let own = self.list_patient_data().await?;
        let (_, target) = self.get_user(target).await?;

        let mut sealed = Vec::with_capacity(own.len());
        for node in &own {
            let document = self.get_patient_data(&node.hash).await?;
            sealed.push(self.seal_copy(&document, &target, 0)?);
        }

        let pointers = self.commit(sealed).await?;
        info!(recipient = %target.name(), disclosed = pointers.len(), "trusted-party disclosure");
        Ok(pointers)
    }

    // ========================================================================
    // SEAL / OPEN / COMMIT
    // ========================================================================

    fn seal(
        &self,
        name: &str,
        plaintext: &[u8],
        recipient_key: &PublicKey,
        recipient_name: &str,
        access_tier: AccessTier,
        expiration: i64,
    ) -> Result<Sealed, WorkflowError> {
        let key = SymmetricKey::generate(self.config.key_bits)?;
        let (hash, ciphertext) = encrypt_content(plaintext, &key)?;
        let wrapped = wrap_key(recipient_key, &key.to_hex())?;

        Ok(Sealed {
            info: DataInfo {
                name: name.to_string(),
                size: plaintext.len() as u64,
                hash,
                wrapped_key: hex::encode(wrapped),
                addr: recipient_name.to_string(),
                access_tier,
            },
            ciphertext,
            expiration,
        })
    }

    fn seal_copy(
        &self,
        document: &Document,
        recipient: &IdentityRecord,
        expiration: i64,
    ) -> Result<Sealed, WorkflowError> {
        let name = format!("shared_by_{}_{}", self.name(), document.pointer.name);
        self.seal(
            &name,
            &document.plaintext,
            recipient.public_key(),
            recipient.name(),
            document.pointer.access_tier,
            expiration,
        )
    }

    /// Unwrap the pointer's key and decrypt its ciphertext
    async fn open_pointer(&self, pointer: DataPointer) -> Result<Document, WorkflowError> {
        let wrapped = hex::decode(&pointer.wrapped_key).map_err(crate::crypto::CryptoError::from)?;
        let raw = unwrap_key(self.session.keypair().secret_key(), &wrapped)?;
        let key = SymmetricKey::from_hex(&raw)?;

        let record = self
            .store
            .find_by_hashes(&[pointer.hash.clone()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| WorkflowError::NotFound(format!("document {} is not in the store", pointer.hash)))?;
        let plaintext = decrypt_content(&record.ciphertext, &key)?;
        Ok(Document { pointer, plaintext })
    }

    /// Register sealed documents in this identity's root as one batch.
    ///
    /// Every inode is applied to a copy of the cached root first, so a
    /// duplicate fails before anything is stored or submitted.
    async fn commit(&self, sealed: Vec<Sealed>) -> Result<Vec<DataPointer>, WorkflowError> {
        if sealed.is_empty() {
            return Ok(Vec::new());
        }
        let address = self.address().to_string();
        let _guard = self.locks.lock(&address).await;

        let mut record = self.identity().await?;
        for item in &sealed {
            record.root_mut().create_data(&item.info)?;
        }
        for item in &sealed {
            self.store
                .save(&item.info.hash, &item.ciphertext, item.expiration)
                .await?;
        }

        let payloads: Vec<Payload> = sealed
            .iter()
            .map(|item| Payload::create_user_data(self.name(), item.info.clone()))
            .collect();
        let batch_id = self
            .session
            .submit_and_wait(&payloads, &[address.clone()], &[address.clone()])
            .await?;
        debug!(batch_id = %batch_id, inodes = sealed.len(), "data committed");

        let mut pointers = Vec::with_capacity(sealed.len());
        for item in &sealed {
            let pointer = record
                .root()
                .get_data(&item.info.hash, &item.info.addr)?
                .ok_or_else(|| WorkflowError::NotFound(format!("data {}", item.info.hash)))?;
            pointers.push(pointer);
        }
        self.remember(record).await;
        Ok(pointers)
    }

    /// Close the session and wait for the state consumer to drain
    pub async fn close(&self) -> Result<(), WorkflowError> {
        self.session.close().await?;
        if let Some(task) = self.sync_task.lock().await.take() {
            if let Err(e) = task.await {
                warn!(error = %e, "state sync task failed");
            }
        }
        Ok(())
    }
}
