// Ledger module - THE OWNERSHIP TREE
// Addresses, per-identity roots, key tables and the encoding they are stored in

mod address;
mod codec;
mod identity;
mod inode;
mod keytable;
mod locks;
mod root;

pub use address::{
    group_address, identity_address, make_address, namespace, AddressKind, ADDRESS_LENGTH,
    FAMILY_NAMESPACE_SEED,
};
pub use codec::{decode, encode, CodecError, FORMAT_VERSION, MAGIC};
pub use identity::IdentityRecord;
pub use inode::{AccessTier, DataNode, INode, Repo};
pub use keytable::{KeyEntry, KeyTable};
pub use locks::RootLocks;
pub use root::{DataInfo, DataPointer, LedgerStateError, Root};
