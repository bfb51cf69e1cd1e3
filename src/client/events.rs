// Event subscription - push notifications of committed state changes

use crate::client::ClientError;
use crate::ledger::{decode, encode, CodecError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Event type carrying the state changes of one committed batch
pub const STATE_DELTA_EVENT: &str = "healthledger/state-delta";

/// Attribute naming an address touched by the batch
pub const ADDRESS_ATTRIBUTE: &str = "address";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeKind {
    Set,
    Delete,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateChange {
    pub address: String,
    pub value: Vec<u8>,
    pub kind: ChangeKind,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateChangeList {
    pub changes: Vec<StateChange>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub event_type: String,
    pub attributes: Vec<(String, String)>,
    pub data: Vec<u8>,
}

impl Event {
    /// A state-delta event covering `changes`
    pub fn state_delta(changes: Vec<StateChange>) -> Result<Self, CodecError> {
        let attributes = changes
            .iter()
            .map(|c| (ADDRESS_ATTRIBUTE.to_string(), c.address.clone()))
            .collect();
        Ok(Self {
            event_type: STATE_DELTA_EVENT.to_string(),
            attributes,
            data: encode(&StateChangeList { changes })?,
        })
    }

    pub fn mentions(&self, address: &str) -> bool {
        self.attributes
            .iter()
            .any(|(k, v)| k == ADDRESS_ATTRIBUTE && v == address)
    }
}

/// One frame as delivered to a subscriber
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventList {
    pub events: Vec<Event>,
}

impl EventList {
    pub fn to_bytes(&self) -> Result<Vec<u8>, CodecError> {
        encode(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        decode(bytes)
    }

    /// State changes at exactly `address`, across every state-delta event
    pub fn state_changes_for(&self, address: &str) -> Result<Vec<StateChange>, CodecError> {
        let mut out = Vec::new();
        for event in &self.events {
            if event.event_type != STATE_DELTA_EVENT || !event.mentions(address) {
                continue;
            }
            let list: StateChangeList = decode(&event.data)?;
            out.extend(list.changes.into_iter().filter(|c| c.address == address));
        }
        Ok(out)
    }
}

/// A live subscription; frames arrive in commit order
pub struct Subscription {
    correlation_id: String,
    frames: mpsc::Receiver<Vec<u8>>,
}

impl Subscription {
    pub fn new(correlation_id: String, frames: mpsc::Receiver<Vec<u8>>) -> Self {
        Self {
            correlation_id,
            frames,
        }
    }

    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }

    /// Next raw frame; `None` once the source has dropped the subscription
    pub async fn receive(&mut self) -> Option<Vec<u8>> {
        self.frames.recv().await
    }
}

#[async_trait]
pub trait EventSource: Send + Sync {
    /// Subscribe to state-delta events touching `address_filter`
    async fn subscribe(&self, address_filter: &str) -> Result<Subscription, ClientError>;

    async fn unsubscribe(&self, correlation_id: &str) -> Result<(), ClientError>;
}
