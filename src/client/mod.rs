// Client module - THE COMMIT PROTOCOL
// Builds and signs transactions, submits batches, and tracks commits through
// a push-event subscription

mod error;
mod events;
mod ingress;
mod session;
mod transaction;

pub use error::ClientError;
pub use events::{
    ChangeKind, Event, EventList, EventSource, StateChange, StateChangeList, Subscription,
    ADDRESS_ATTRIBUTE, STATE_DELTA_EVENT,
};
pub use ingress::{BatchStatus, LedgerIngress, StatePage};
pub use session::{ClientConfig, ClientSession};
pub use transaction::{
    Batch, BatchHeader, BatchList, Transaction, TransactionError, TransactionHeader,
};
