//! In-memory transfer dataset and executor
//!
//! The dataset is a JSON document listing addresses and aggregated transfers:
//!
//! ```json
//! {
//!   "addresses": [{ "addr": "0xaa..", "type": 1 }, { "addr": "0xbb..", "type": 0 }],
//!   "transfers": [{ "from": "0xaa..", "to": "0xbb..", "count": 3, "total_amount": 1.5 }]
//! }
//! ```
//!
//! [`MemoryExecutor`] answers every [`QueryKind`] the way the graph-database
//! templates do: neighborhoods match transfers in either direction and report
//! the anchor as `source` with `isFromSource` telling the stored direction.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;

use crate::error::QueryExecutionError;
use crate::graph::ABNORMAL_TYPE_TAG;

use super::{QueryExecutor, QueryKind, QueryParams, RawRow, RawValue};

/// One address with its classification tag
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddressRecord {
    pub addr: String,
    /// 1 marks an abnormal address; anything else is normal
    #[serde(rename = "type", default)]
    pub type_tag: i64,
}

/// Aggregated transfers from one address to another
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferRecord {
    pub from: String,
    pub to: String,
    pub count: u64,
    pub total_amount: f64,
}

/// Addresses and transfers loaded from JSON
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransferDataset {
    #[serde(default)]
    pub addresses: Vec<AddressRecord>,
    #[serde(default)]
    pub transfers: Vec<TransferRecord>,
}

impl TransferDataset {
    /// Parse, lowercase and check a dataset
    pub fn from_json_str(json: &str) -> Result<Self> {
        let mut dataset: TransferDataset =
            serde_json::from_str(json).context("Failed to parse transfer dataset")?;
        dataset.lowercase();
        dataset.check()?;
        Ok(dataset)
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read dataset {}", path.display()))?;
        Self::from_json_str(&json).with_context(|| format!("Invalid dataset {}", path.display()))
    }

    fn lowercase(&mut self) {
        for address in &mut self.addresses {
            address.addr.make_ascii_lowercase();
        }
        for transfer in &mut self.transfers {
            transfer.from.make_ascii_lowercase();
            transfer.to.make_ascii_lowercase();
        }
    }

    /// Addresses must be unique and every transfer endpoint must be listed
    pub fn check(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for address in &self.addresses {
            if !seen.insert(address.addr.as_str()) {
                anyhow::bail!("Duplicate address in dataset: {}", address.addr);
            }
        }
        for (index, transfer) in self.transfers.iter().enumerate() {
            for endpoint in [&transfer.from, &transfer.to] {
                if !seen.contains(endpoint.as_str()) {
                    anyhow::bail!("Transfer {} references unknown address {}", index, endpoint);
                }
            }
            if !transfer.total_amount.is_finite() {
                anyhow::bail!("Transfer {} has a non-finite total_amount", index);
            }
        }
        Ok(())
    }
}

/// Executor answering queries from a [`TransferDataset`]
#[derive(Debug, Clone, Default)]
pub struct MemoryExecutor {
    dataset: TransferDataset,
    /// addr -> type tag
    types: HashMap<String, i64>,
}

impl MemoryExecutor {
    pub fn new(dataset: TransferDataset) -> Self {
        let types = dataset
            .addresses
            .iter()
            .map(|a| (a.addr.clone(), a.type_tag))
            .collect();
        Self { dataset, types }
    }

    pub fn dataset(&self) -> &TransferDataset {
        &self.dataset
    }

    fn node(&self, addr: &str) -> RawValue {
        RawValue::address_node(addr, self.types.get(addr).copied().unwrap_or_default())
    }

    /// Rows for every transfer touching `anchor`, in dataset order
    fn incident_rows(&self, anchor: &str, out: &mut Vec<(i64, RawRow)>) {
        for transfer in &self.dataset.transfers {
            let (is_from_source, other) = if transfer.from == anchor {
                (true, &transfer.to)
            } else if transfer.to == anchor {
                (false, &transfer.from)
            } else {
                continue;
            };
            let other_type = self.types.get(other.as_str()).copied().unwrap_or_default();
            out.push((
                other_type,
                RawRow::neighborhood(
                    self.node(anchor),
                    RawValue::sent(transfer.count, transfer.total_amount),
                    is_from_source,
                    self.node(other),
                ),
            ));
        }
    }

    fn rows(&self, kind: QueryKind, params: &QueryParams) -> Result<Vec<RawRow>, QueryExecutionError> {
        let mut rows: Vec<(i64, RawRow)> = Vec::new();
        match kind {
            QueryKind::AbnormalSeed => {
                for address in &self.dataset.addresses {
                    if address.type_tag == ABNORMAL_TYPE_TAG {
                        self.incident_rows(&address.addr, &mut rows);
                    }
                }
                // abnormal targets first; stable so dataset order breaks ties
                rows.sort_by(|a, b| b.0.cmp(&a.0));
            }
            QueryKind::AllAddresses => {
                for address in &self.dataset.addresses {
                    self.incident_rows(&address.addr, &mut rows);
                }
            }
            QueryKind::ByAddress | QueryKind::NodeNeighborhood => {
                self.incident_rows(required_address(kind, params)?, &mut rows);
            }
            QueryKind::NodeDetail => return self.detail(params),
        }
        Ok(rows
            .into_iter()
            .take(params.row_cap())
            .map(|(_, row)| row)
            .collect())
    }

    fn detail(&self, params: &QueryParams) -> Result<Vec<RawRow>, QueryExecutionError> {
        let anchor = required_address(QueryKind::NodeDetail, params)?;
        let mut sent = (0u64, 0.0f64, false);
        let mut received = (0u64, 0.0f64, false);
        for transfer in &self.dataset.transfers {
            if transfer.from == anchor {
                sent = (sent.0.saturating_add(transfer.count), sent.1 + transfer.total_amount, true);
            } else if transfer.to == anchor {
                received = (
                    received.0.saturating_add(transfer.count),
                    received.1 + transfer.total_amount,
                    true,
                );
            }
        }

        let mut rows = Vec::with_capacity(2);
        if sent.2 {
            rows.push(RawRow::detail(true, sent.0, sent.1));
        }
        if received.2 {
            rows.push(RawRow::detail(false, received.0, received.1));
        }
        Ok(rows)
    }
}

fn required_address(kind: QueryKind, params: &QueryParams) -> Result<&str, QueryExecutionError> {
    params
        .address
        .as_deref()
        .ok_or_else(|| QueryExecutionError::Backend(format!("{} query without an address", kind)))
}

#[async_trait]
impl QueryExecutor for MemoryExecutor {
    async fn run(&self, kind: QueryKind, params: &QueryParams) -> Result<Vec<RawRow>, QueryExecutionError> {
        self.rows(kind, params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{columns, RecordLimit};

    const DATASET: &str = r#"{
        "addresses": [
            { "addr": "0xAA", "type": 1 },
            { "addr": "0xbb", "type": 0 },
            { "addr": "0xcc", "type": 1 },
            { "addr": "0xdd" }
        ],
        "transfers": [
            { "from": "0xaa", "to": "0xbb", "count": 3, "total_amount": 1.5 },
            { "from": "0xdd", "to": "0xaa", "count": 2, "total_amount": 0.75 },
            { "from": "0xaa", "to": "0xcc", "count": 1, "total_amount": 0.25 }
        ]
    }"#;

    fn executor() -> MemoryExecutor {
        MemoryExecutor::new(TransferDataset::from_json_str(DATASET).unwrap())
    }

    fn limit(n: u32) -> RecordLimit {
        RecordLimit::new(n).unwrap()
    }

    fn flag(row: &RawRow) -> bool {
        match row.get(columns::IS_FROM_SOURCE) {
            Some(RawValue::Scalar { value }) => value.as_bool().unwrap(),
            other => panic!("unexpected flag {:?}", other),
        }
    }

    fn addr_of(row: &RawRow, column: &str) -> String {
        match row.get(column) {
            Some(RawValue::Node { properties }) => properties["addr"].as_str().unwrap().to_string(),
            other => panic!("unexpected node {:?}", other),
        }
    }

    #[test]
    fn test_dataset_is_lowercased_and_defaults_type() {
        let dataset = TransferDataset::from_json_str(DATASET).unwrap();
        assert_eq!(dataset.addresses[0].addr, "0xaa");
        assert_eq!(dataset.addresses[3].type_tag, 0);
    }

    #[test]
    fn test_dataset_rejects_unknown_endpoint() {
        let json = r#"{ "addresses": [{ "addr": "0xaa" }],
                        "transfers": [{ "from": "0xaa", "to": "0xee", "count": 1, "total_amount": 1.0 }] }"#;
        let err = TransferDataset::from_json_str(json).unwrap_err();
        assert!(err.to_string().contains("0xee"));
    }

    #[test]
    fn test_dataset_rejects_duplicate_address() {
        let json = r#"{ "addresses": [{ "addr": "0xaa" }, { "addr": "0xAA" }] }"#;
        assert!(TransferDataset::from_json_str(json).is_err());
    }

    #[tokio::test]
    async fn test_by_address_matches_both_directions() {
        let rows = executor()
            .run(QueryKind::ByAddress, &QueryParams::for_address("0xaa").with_limit(limit(50)))
            .await
            .unwrap();
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|r| addr_of(r, columns::SOURCE) == "0xaa"));
        assert!(flag(&rows[0]));
        assert!(!flag(&rows[1]));
        assert_eq!(addr_of(&rows[1], columns::TARGET), "0xdd");
    }

    #[tokio::test]
    async fn test_unknown_address_gives_no_rows() {
        let rows = executor()
            .run(QueryKind::ByAddress, &QueryParams::for_address("0x01").with_limit(limit(50)))
            .await
            .unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_seed_orders_abnormal_targets_first_and_limits() {
        let exec = executor();
        let rows = exec
            .run(QueryKind::AbnormalSeed, &QueryParams::limited(limit(10)))
            .await
            .unwrap();
        // 0xaa has three transfers, 0xcc one
        assert_eq!(rows.len(), 4);
        let targets: Vec<String> = rows.iter().map(|r| addr_of(r, columns::TARGET)).collect();
        assert_eq!(targets, vec!["0xcc", "0xaa", "0xbb", "0xdd"]);

        let rows = exec
            .run(QueryKind::AbnormalSeed, &QueryParams::limited(limit(1)))
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn test_detail_sums_per_direction() {
        let rows = executor()
            .run(QueryKind::NodeDetail, &QueryParams::for_address("0xaa"))
            .await
            .unwrap();
        assert_eq!(rows, vec![RawRow::detail(true, 4, 1.75), RawRow::detail(false, 2, 0.75)]);
    }

    #[tokio::test]
    async fn test_detail_omits_empty_direction() {
        let rows = executor()
            .run(QueryKind::NodeDetail, &QueryParams::for_address("0xbb"))
            .await
            .unwrap();
        assert_eq!(rows, vec![RawRow::detail(false, 3, 1.5)]);
    }

    #[tokio::test]
    async fn test_missing_address_is_backend_error() {
        let result = executor()
            .run(QueryKind::NodeNeighborhood, &QueryParams::limited(limit(5)))
            .await;
        assert!(matches!(result, Err(QueryExecutionError::Backend(_))));
    }
}
