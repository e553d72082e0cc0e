//! Result normalization
//!
//! Turns raw neighborhood rows into address and edge batches ready to merge.
//! A batch is normalized completely before anything touches the session, so a
//! malformed row rejects the whole batch and the session stays as it was.
//!
//! Every edge endpoint of a batch is one of its nodes. The fields are private
//! so the only ways to build a batch are [`normalize_rows`] and the checked
//! [`NormalizedBatch::from_parts`].

use serde::Serialize;
use std::collections::HashSet;

use crate::error::InvalidRecordError;
use crate::query::{columns, RawRow, RowReader};

use super::canonical::canonicalize_records;
use super::{Address, Edge};

/// Addresses and edges extracted from one query result
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct NormalizedBatch {
    /// Canonical source then target of every row; may repeat ids
    nodes: Vec<Address>,
    /// One canonicalized edge per row, in row order
    edges: Vec<Edge>,
}

impl NormalizedBatch {
    /// Build a batch from parts, rejecting an edge whose endpoint is not
    /// among `nodes`. The reported row is the edge's position.
    pub fn from_parts(nodes: Vec<Address>, edges: Vec<Edge>) -> Result<Self, InvalidRecordError> {
        let ids: HashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
        for (row, edge) in edges.iter().enumerate() {
            for endpoint in [&edge.source, &edge.target] {
                if !ids.contains(endpoint.as_str()) {
                    return Err(InvalidRecordError::DanglingEndpoint {
                        row,
                        address: endpoint.clone(),
                    });
                }
            }
        }
        Ok(Self { nodes, edges })
    }

    pub fn nodes(&self) -> &[Address] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub(crate) fn into_parts(self) -> (Vec<Address>, Vec<Edge>) {
        (self.nodes, self.edges)
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    /// Number of rows the batch was built from
    pub fn row_count(&self) -> usize {
        self.edges.len()
    }
}

/// Normalize a neighborhood query result.
///
/// # Arguments
/// * `rows` - Rows with `source`, `r`, `isFromSource` and `target` columns
///
/// # Returns
/// The batch, or the first malformed row found
pub fn normalize_rows(rows: &[RawRow]) -> Result<NormalizedBatch, InvalidRecordError> {
    let mut batch = NormalizedBatch {
        nodes: Vec::with_capacity(rows.len() * 2),
        edges: Vec::with_capacity(rows.len()),
    };

    for (index, row) in rows.iter().enumerate() {
        let reader = RowReader::new(index, row);
        let left = reader.node(columns::SOURCE)?;
        let right = reader.node(columns::TARGET)?;
        let left_is_source = reader.scalar_bool(columns::IS_FROM_SOURCE)?;
        let relationship = reader.relationship(columns::RELATIONSHIP)?;
        let count = reader.count_field(columns::RELATIONSHIP, relationship)?;
        let total_amount = reader.amount_field(columns::RELATIONSHIP, relationship)?;

        let (source, target) = canonicalize_records(reader.index(), left, right, left_is_source)?;
        batch.edges.push(Edge {
            source: source.id.clone(),
            target: target.id.clone(),
            count,
            total_amount,
        });
        batch.nodes.push(source);
        batch.nodes.push(target);
    }

    Ok(batch)
}
