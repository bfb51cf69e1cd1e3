// IdentityRecord - what lives at an identity address

use crate::crypto::PublicKey;
use crate::ledger::address::identity_address;
use crate::ledger::codec::{decode, encode, CodecError};
use crate::ledger::root::Root;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityRecord {
    name: String,
    public_key: PublicKey,
    root: Root,
}

impl IdentityRecord {
    /// New identity with a freshly generated root
    pub fn generate(name: &str, public_key: PublicKey) -> Self {
        Self {
            name: name.to_string(),
            public_key,
            root: Root::generate(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    pub fn root(&self) -> &Root {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Root {
        &mut self.root
    }

    pub fn address(&self) -> String {
        identity_address(&self.name, &self.public_key)
    }

    pub fn verify_public_key(&self, public_key: &PublicKey) -> bool {
        &self.public_key == public_key
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, CodecError> {
        encode(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        decode(bytes)
    }
}
