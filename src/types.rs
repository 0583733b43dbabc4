// Core data types shared across the ring, storage node and router.
//
// Mirrors the node-address / vnode-id / preference-list vocabulary of the
// specification: a node is identified purely by `(host, port)`, compared by
// exact equality, and never carries routing metadata of its own.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, StorageNodeError};

/// Physical node address. Equality is exact `(host, port)` comparison.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeAddress {
    pub host: String,
    pub port: u16,
}

impl NodeAddress {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Base URL used for RPC calls to this node (e.g. `http://host:port`).
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

impl fmt::Display for NodeAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

impl FromStr for NodeAddress {
    type Err = StorageNodeError;

    fn from_str(s: &str) -> Result<Self> {
        let (host, port) = s
            .rsplit_once(':')
            .ok_or_else(|| StorageNodeError::InvalidInput(format!("not a host:port pair: {s}")))?;
        let port: u16 = port
            .parse()
            .map_err(|_| StorageNodeError::InvalidInput(format!("invalid port in {s}")))?;
        Ok(Self::new(host, port))
    }
}

/// Virtual-node identifier: a physical node plus its vnode index `[0, V)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VNodeId {
    pub node: NodeAddress,
    pub vnode_index: u32,
}

impl VNodeId {
    pub fn new(node: NodeAddress, vnode_index: u32) -> Self {
        Self { node, vnode_index }
    }

    /// The string hashed onto the ring: `"{host}_{port}_{vnode_index}"`.
    pub fn ring_label(&self) -> String {
        format!("{}_{}_{}", self.node.host, self.node.port, self.vnode_index)
    }
}

/// Preference list: distinct physical nodes, coordinator first.
pub type PreferenceList = Vec<NodeAddress>;

/// Per-vnode routing table for one physical node: `table[i]` is the
/// preference list obtained walking clockwise from vnode `i`'s ring
/// position.
pub type RoutingTable = Vec<PreferenceList>;

/// Outcome of a successful `put`, before being encoded onto the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PutOutcome {
    /// The key already existed in the coordinator's local store at entry.
    Updated,
    /// The key was new to the coordinator's local store.
    Created,
}

impl PutOutcome {
    pub fn status_code(self) -> i32 {
        match self {
            PutOutcome::Updated => 0,
            PutOutcome::Created => 1,
        }
    }

    pub fn from_existed(existed: bool) -> Self {
        if existed {
            PutOutcome::Updated
        } else {
            PutOutcome::Created
        }
    }
}

/// Outcome of a `get`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GetOutcome {
    Found(String),
    NotFound,
    QuorumFailure,
}

impl GetOutcome {
    pub fn status_code(&self) -> i32 {
        match self {
            GetOutcome::Found(_) => 0,
            GetOutcome::NotFound => 1,
            GetOutcome::QuorumFailure => -1,
        }
    }

    pub fn into_parts(self) -> (Option<String>, i32) {
        let status = self.status_code();
        match self {
            GetOutcome::Found(v) => (Some(v), status),
            GetOutcome::NotFound | GetOutcome::QuorumFailure => (None, status),
        }
    }
}

/// Key grammar: printable ASCII, no `[` or `]`, at most 128 bytes.
pub fn validate_key(key: &str) -> Result<()> {
    validate_grammar(key, 128, true)
}

/// Value grammar: printable ASCII, at most 2048 bytes.
pub fn validate_value(value: &str) -> Result<()> {
    validate_grammar(value, 2048, false)
}

fn validate_grammar(s: &str, max_len: usize, reject_brackets: bool) -> Result<()> {
    if s.is_empty() || s.len() > max_len {
        return Err(StorageNodeError::InvalidInput(format!(
            "length {} outside allowed range (1..={max_len})",
            s.len()
        )));
    }
    for c in s.chars() {
        let code = c as u32;
        if !(32..=126).contains(&code) {
            return Err(StorageNodeError::InvalidInput(format!(
                "non-printable-ASCII character {c:?}"
            )));
        }
        if reject_brackets && (c == '[' || c == ']') {
            return Err(StorageNodeError::InvalidInput(
                "keys may not contain '[' or ']'".to_string(),
            ));
        }
    }
    Ok(())
}
