// Processor module - THE STATE MACHINE
// Validates actions and applies them to ledger state inside the ledger runtime

mod context;
mod handler;
mod payload;

pub use context::{MemoryContext, StateContext};
pub use handler::{ProcessorError, StorageState, TransactionHandler, FAMILY_NAME, FAMILY_VERSION};
pub use payload::{Action, Payload};
