// Node module - LOCAL LEDGER
// A single-process ledger that validates batches, runs the transaction
// processor, and pushes state-delta events to subscribers

mod local;

pub use local::{LocalLedger, ScopedContext, DEFAULT_DELIVERY_TIMEOUT, DEFAULT_EVENT_BUFFER};
