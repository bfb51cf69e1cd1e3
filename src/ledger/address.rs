// Ledger addresses
//
// Layout: namespace (6 hex) || kind prefix (4 hex) || name digest (60 hex)
//
// Identity addresses salt the name digest with the public key bytes; group
// addresses hash the name alone. Both forms are part of the externally
// visible address contract and must stay as they are.

use crate::crypto::{digest_hex, sha256, PublicKey};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Seed string the family namespace is derived from
pub const FAMILY_NAMESPACE_SEED: &str = "Healthcare";

/// Total hex length of an address
pub const ADDRESS_LENGTH: usize = 70;

const NAMESPACE_LEN: usize = 6;
const KIND_PREFIX_LEN: usize = 4;
const NAME_DIGEST_LEN: usize = 60;

/// The kind of entity an address points at
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AddressKind {
    Identity,
    Group,
}

impl AddressKind {
    fn seed(&self) -> &'static str {
        match self {
            Self::Identity => "User",
            Self::Group => "Group",
        }
    }

    /// 4-hex prefix distinguishing the kind inside the family namespace
    pub fn prefix(&self) -> String {
        hex::encode(sha256(self.seed().as_bytes()))[..KIND_PREFIX_LEN].to_string()
    }

    /// namespace || kind prefix, for prefix listings
    pub fn namespace_prefix(&self) -> String {
        format!("{}{}", namespace(), self.prefix())
    }
}

impl fmt::Display for AddressKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Identity => write!(f, "identity"),
            Self::Group => write!(f, "group"),
        }
    }
}

/// 6-hex family namespace
pub fn namespace() -> String {
    digest_hex(FAMILY_NAMESPACE_SEED.as_bytes())[..NAMESPACE_LEN].to_string()
}

/// Derive an address. `public_key` is only mixed in for identity addresses.
pub fn make_address(kind: AddressKind, name: &str, public_key: Option<&PublicKey>) -> String {
    let digest = match kind {
        AddressKind::Identity => {
            let mut material = name.as_bytes().to_vec();
            if let Some(pk) = public_key {
                material.extend_from_slice(&pk.to_bytes());
            }
            digest_hex(&material)
        }
        AddressKind::Group => digest_hex(name.as_bytes()),
    };
    format!("{}{}{}", namespace(), kind.prefix(), &digest[..NAME_DIGEST_LEN])
}

pub fn identity_address(name: &str, public_key: &PublicKey) -> String {
    make_address(AddressKind::Identity, name, Some(public_key))
}

pub fn group_address(name: &str) -> String {
    make_address(AddressKind::Group, name, None)
}
