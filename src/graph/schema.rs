//! Graph schema definitions for txscope
//!
//! Defines the node and edge payloads held by a [`GraphSession`](super::GraphSession)
//! and handed to the rendering layer through [`GraphSnapshot`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// Raw database `type` value that marks an address as abnormal
pub const ABNORMAL_TYPE_TAG: i64 = 1;

/// Classification of an address
///
/// Fixed the first time an address is observed in a session. Later
/// observations carrying a different classification are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AddressKind {
    #[default]
    Normal,
    Abnormal,
}

impl AddressKind {
    /// Map the raw database `type` tag to a kind.
    ///
    /// Only `1` is abnormal; every other value is normal.
    pub fn from_type_tag(tag: i64) -> Self {
        if tag == ABNORMAL_TYPE_TAG {
            AddressKind::Abnormal
        } else {
            AddressKind::Normal
        }
    }

    /// Raw database `type` tag for this kind
    pub fn type_tag(self) -> i64 {
        match self {
            AddressKind::Normal => 0,
            AddressKind::Abnormal => ABNORMAL_TYPE_TAG,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AddressKind::Normal => "normal",
            AddressKind::Abnormal => "abnormal",
        }
    }
}

impl fmt::Display for AddressKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Address node payload
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address {
    /// Lowercase hex account identifier, treated as an opaque key
    pub id: String,
    pub kind: AddressKind,
}

impl Address {
    pub fn new(id: impl Into<String>, kind: AddressKind) -> Self {
        Self {
            id: id.into(),
            kind,
        }
    }
}

/// Aggregated transfer edge
///
/// `source` is always the paying party and `target` the recipient,
/// regardless of the traversal direction the database used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub source: String,
    pub target: String,
    /// Number of underlying transactions
    pub count: u64,
    /// Total value moved from source to target, in ETH
    pub total_amount: f64,
}

/// Read-only view of a session handed to the rendering layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct GraphSnapshot {
    /// Nodes in discovery order
    pub nodes: Vec<Address>,
    /// Edges in append order
    pub edges: Vec<Edge>,
}

impl GraphSnapshot {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }
}

/// Per-direction transfer totals for one selected address
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct AddressDetail {
    pub total_received: f64,
    pub total_sent: f64,
    pub num_received: u64,
    pub num_sent: u64,
}

impl AddressDetail {
    /// True when the address has no recorded transfers in either direction
    pub fn is_zero(&self) -> bool {
        self.num_received == 0 && self.num_sent == 0
    }
}
