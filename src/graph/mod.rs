//! In-memory graph session: the accumulation engine
//!
//! A [`GraphSession`] holds the deduplicated addresses and the edge log of one
//! exploration session. Batches are merged in one of two modes:
//!
//! - **replace**: the session is discarded and rebuilt from the batch
//! - **expand**: only addresses not yet in the session are added, and only
//!   edges touching an address added by the same merge are appended
//!
//! # Guarantees
//!
//! - Address ids are unique; the first observation of an id fixes its kind
//! - Every edge endpoint is an address in the session after a merge; a
//!   [`NormalizedBatch`] cannot be built with a dangling endpoint
//! - Merge order is row order; nothing is re-sorted, so renderers see a
//!   stable insertion order
//! - Merges take an already-normalized batch and cannot fail halfway

pub mod canonical;
pub mod detail;
pub mod export;
pub mod normalize;
mod schema;

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

pub use canonical::{canonicalize, canonicalize_records};
pub use detail::{aggregate, aggregate_rows, parse_detail_rows, DetailPolicy, DirectionalTotal};
pub use export::{export_snapshot, ExportConfig, ExportFormat};
pub use normalize::{normalize_rows, NormalizedBatch};
pub use schema::{Address, AddressDetail, AddressKind, Edge, GraphSnapshot, ABNORMAL_TYPE_TAG};

/// How edges with an already-seen `(source, target)` pair are stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgePolicy {
    /// Every accepted row appends its own edge; parallel duplicates allowed
    #[default]
    AppendLog,
    /// One edge per pair; `count` and `total_amount` are summed on collision
    MergeByPair,
}

/// Which merge produced a report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeMode {
    Replace,
    Expand,
}

/// What a merge changed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergeReport {
    pub mode: MergeMode,
    /// Addresses inserted by this merge, in insertion order
    pub added_nodes: Vec<Address>,
    /// Edges appended as new entries
    pub edges_appended: usize,
    /// Edges folded into an existing entry (`MergeByPair` only)
    pub edges_merged: usize,
    /// Edges dropped because neither endpoint was new (expand only)
    pub edges_skipped: usize,
}

impl MergeReport {
    fn new(mode: MergeMode) -> Self {
        Self {
            mode,
            added_nodes: Vec::new(),
            edges_appended: 0,
            edges_merged: 0,
            edges_skipped: 0,
        }
    }

    /// True when the merge left the session as it was
    pub fn is_noop(&self) -> bool {
        self.added_nodes.is_empty() && self.edges_appended == 0 && self.edges_merged == 0
    }
}

/// Authoritative node set and edge log of one exploration session
#[derive(Debug, Clone, Default)]
pub struct GraphSession {
    edge_policy: EdgePolicy,
    /// Addresses in discovery order
    nodes: Vec<Address>,
    /// id -> position in `nodes`
    node_index: HashMap<String, usize>,
    edges: Vec<Edge>,
    /// (source, target) -> position in `edges`, maintained for `MergeByPair`
    edge_index: HashMap<(String, String), usize>,
}

impl GraphSession {
    pub fn new(edge_policy: EdgePolicy) -> Self {
        Self {
            edge_policy,
            ..Default::default()
        }
    }

    /// Discard the session and rebuild it from `batch`.
    ///
    /// Nodes are deduplicated by id with the first occurrence winning.
    pub fn replace(&mut self, batch: NormalizedBatch) -> MergeReport {
        let mut fresh = GraphSession::new(self.edge_policy);
        let mut report = MergeReport::new(MergeMode::Replace);
        let (nodes, edges) = batch.into_parts();

        for address in nodes {
            if let Some(added) = fresh.insert_node(address) {
                report.added_nodes.push(added);
            }
        }
        for edge in edges {
            fresh.push_edge(edge, &mut report);
        }

        *self = fresh;
        report
    }

    /// Merge the neighborhood of a node already in the session.
    ///
    /// Addresses already present are skipped and keep their kind. An edge is
    /// appended only when at least one endpoint was added by this merge; when
    /// nothing new was found the session is left untouched.
    pub fn expand_from_node(&mut self, batch: NormalizedBatch) -> MergeReport {
        let mut report = MergeReport::new(MergeMode::Expand);
        let mut added_ids: HashSet<String> = HashSet::new();
        let (nodes, edges) = batch.into_parts();

        for address in nodes {
            if let Some(added) = self.insert_node(address) {
                added_ids.insert(added.id.clone());
                report.added_nodes.push(added);
            }
        }

        if added_ids.is_empty() {
            report.edges_skipped = edges.len();
            return report;
        }

        for edge in edges {
            if added_ids.contains(&edge.source) || added_ids.contains(&edge.target) {
                self.push_edge(edge, &mut report);
            } else {
                report.edges_skipped += 1;
            }
        }

        report
    }

    /// Insert an address if its id is unseen; returns the inserted address.
    fn insert_node(&mut self, address: Address) -> Option<Address> {
        if self.node_index.contains_key(&address.id) {
            return None;
        }
        self.node_index.insert(address.id.clone(), self.nodes.len());
        self.nodes.push(address.clone());
        Some(address)
    }

    fn push_edge(&mut self, edge: Edge, report: &mut MergeReport) {
        match self.edge_policy {
            EdgePolicy::AppendLog => {
                self.edges.push(edge);
                report.edges_appended += 1;
            }
            EdgePolicy::MergeByPair => {
                let key = (edge.source.clone(), edge.target.clone());
                if let Some(&position) = self.edge_index.get(&key) {
                    let existing = &mut self.edges[position];
                    existing.count = existing.count.saturating_add(edge.count);
                    existing.total_amount += edge.total_amount;
                    report.edges_merged += 1;
                } else {
                    self.edge_index.insert(key, self.edges.len());
                    self.edges.push(edge);
                    report.edges_appended += 1;
                }
            }
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.node_index.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&Address> {
        self.node_index.get(id).map(|&position| &self.nodes[position])
    }

    /// Addresses in discovery order
    pub fn nodes(&self) -> &[Address] {
        &self.nodes
    }

    /// Edges in append order
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Owned copy for the rendering layer
    pub fn snapshot(&self) -> GraphSnapshot {
        GraphSnapshot {
            nodes: self.nodes.clone(),
            edges: self.edges.clone(),
        }
    }

    /// Edges whose source or target is not a session address
    pub fn dangling_edges(&self) -> Vec<&Edge> {
        self.edges
            .iter()
            .filter(|e| !self.contains(&e.source) || !self.contains(&e.target))
            .collect()
    }
}

#[cfg(test)]
mod tests;
