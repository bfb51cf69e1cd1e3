// Payload - the action a transaction asks the processor to perform

use crate::ledger::{decode, encode, CodecError, DataInfo};
use serde::{Deserialize, Serialize};

/// Known action codes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Action {
    CreateUser,
    CreateUserData,
}

impl Action {
    pub const UNSET: u32 = 0;
    pub const CREATE_USER: u32 = 1;
    pub const CREATE_USER_DATA: u32 = 10;

    pub fn code(&self) -> u32 {
        match self {
            Self::CreateUser => Self::CREATE_USER,
            Self::CreateUserData => Self::CREATE_USER_DATA,
        }
    }

    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            Self::CREATE_USER => Some(Self::CreateUser),
            Self::CREATE_USER_DATA => Some(Self::CreateUserData),
            _ => None,
        }
    }
}

/// Serialized form carried in a transaction.
///
/// The action stays a raw code so unknown actions still decode and can be
/// rejected by code.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payload {
    pub action: u32,
    pub name: String,
    pub target: Vec<String>,
    pub data_info: Option<DataInfo>,
}

impl Payload {
    /// Register `name` under the signer's public key
    pub fn create_user(name: &str) -> Self {
        Self {
            action: Action::CREATE_USER,
            name: String::new(),
            target: vec![name.to_string()],
            data_info: None,
        }
    }

    /// Append a data inode to `name`'s root
    pub fn create_user_data(name: &str, info: DataInfo) -> Self {
        Self {
            action: Action::CREATE_USER_DATA,
            name: name.to_string(),
            target: Vec::new(),
            data_info: Some(info),
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, CodecError> {
        encode(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        decode(bytes)
    }
}
