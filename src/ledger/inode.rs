// INodes - entries of an identity's repo
//
// An inode is either a data pointer or a nested repo container. Entities are
// plain data; concurrent mutation is guarded by RootLocks, not by the values.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Classification that governs re-disclosure to third parties
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AccessTier {
    #[default]
    Unset,
    Regular,
    Critical,
}

impl AccessTier {
    pub fn code(&self) -> u8 {
        match self {
            Self::Unset => 0,
            Self::Regular => 1,
            Self::Critical => 2,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Unset),
            1 => Some(Self::Regular),
            2 => Some(Self::Critical),
            _ => None,
        }
    }

    /// Whether a record of tier `record` may be re-disclosed under a request
    /// of this tier.
    ///
    /// Regular admits only Regular records, Critical admits Regular and
    /// Critical, Unset admits nothing.
    pub fn admits(&self, record: AccessTier) -> bool {
        match self {
            Self::Unset => false,
            Self::Regular => record == AccessTier::Regular,
            Self::Critical => record != AccessTier::Unset,
        }
    }
}

impl fmt::Display for AccessTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for AccessTier {
    type Err = String;

    /// Accepts the numeric code or the tier name
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(code) = trimmed.parse::<u8>() {
            return Self::from_code(code).ok_or_else(|| format!("access tier out of range: {}", code));
        }
        match trimmed.to_ascii_lowercase().as_str() {
            "unset" => Ok(Self::Unset),
            "regular" => Ok(Self::Regular),
            "critical" => Ok(Self::Critical),
            _ => Err(format!("unknown access tier: {}", trimmed)),
        }
    }
}

/// Pointer to one encrypted document in the external store
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataNode {
    pub name: String,
    pub hash: String,
    pub size: u64,
    pub key_index: String,
    /// Identity the wrapped key was produced for
    pub addr: String,
    pub access_tier: AccessTier,
}

/// Append-only ordered collection of inodes
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repo {
    pub name: String,
    pub inodes: Vec<INode>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum INode {
    Data(DataNode),
    Repo(Repo),
}

impl INode {
    pub fn name(&self) -> &str {
        match self {
            Self::Data(d) => &d.name,
            Self::Repo(r) => &r.name,
        }
    }

    /// Byte size; a repo reports the sum of its children
    pub fn size(&self) -> u64 {
        match self {
            Self::Data(d) => d.size,
            Self::Repo(r) => r.size(),
        }
    }

    /// Content hash; containers have none
    pub fn hash(&self) -> Option<&str> {
        match self {
            Self::Data(d) => Some(&d.hash),
            Self::Repo(_) => None,
        }
    }

    pub fn addr(&self) -> Option<&str> {
        match self {
            Self::Data(d) => Some(&d.addr),
            Self::Repo(_) => None,
        }
    }

    /// Key-table indexes referenced by this inode and its children
    pub fn key_refs(&self) -> Vec<&str> {
        match self {
            Self::Data(d) => vec![d.key_index.as_str()],
            Self::Repo(r) => r.key_refs(),
        }
    }

    pub fn as_data(&self) -> Option<&DataNode> {
        match self {
            Self::Data(d) => Some(d),
            Self::Repo(_) => None,
        }
    }
}

impl Repo {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            inodes: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.inodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inodes.is_empty()
    }

    pub fn size(&self) -> u64 {
        self.inodes.iter().map(INode::size).sum()
    }

    pub fn key_refs(&self) -> Vec<&str> {
        self.inodes.iter().flat_map(INode::key_refs).collect()
    }

    /// Direct data children, in insertion order
    pub fn data_nodes(&self) -> impl Iterator<Item = &DataNode> {
        self.inodes.iter().filter_map(INode::as_data)
    }

    pub fn find_data(&self, hash: &str, addr: &str) -> Option<&DataNode> {
        self.data_nodes().find(|d| d.hash == hash && d.addr == addr)
    }

    pub(crate) fn append(&mut self, inode: INode) {
        self.inodes.push(inode);
    }
}
