// healthledger - encrypted health records anchored on an append-only ledger
//
// Module map (leaves first):
// - crypto:    content encryption, key wrapping, digests, signing keys
// - ledger:    addresses, key table, repo/inode tree, identity records
// - processor: validates and applies actions inside the ledger runtime
// - client:    transaction construction, submission, commit tracking
// - docstore:  off-ledger ciphertext rows and share requests
// - node:      single-process ledger used for development and tests
// - workflow:  create / share / request / approve orchestration

pub mod client;
pub mod crypto;
pub mod docstore;
pub mod ledger;
pub mod node;
pub mod processor;
pub mod workflow;
