//! Query layer: the boundary to the external graph database
//!
//! The core never talks to a database directly. It issues a [`QueryKind`] plus
//! [`QueryParams`] to an injected [`QueryExecutor`] and receives raw rows back.
//! Two executors ship with the crate: [`MemoryExecutor`] over an in-memory
//! dataset and [`SqliteExecutor`] over a SQLite file. [`collect`] builds a
//! dataset from raw per-block transactions.

pub mod collect;
pub mod memory;
mod row;
pub mod sqlite;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroU32;
use std::str::FromStr;

use crate::error::{ExploreError, QueryExecutionError};

pub use collect::{aggregate_transactions, CollectOptions, CollectStats, TransactionLog};
pub use memory::{AddressRecord, MemoryExecutor, TransferDataset, TransferRecord};
pub use row::{columns, properties, Properties, RawRow, RawValue};
pub(crate) use row::{read_address, RowReader};
pub use sqlite::SqliteExecutor;

/// Default cap on rows returned by bounded queries
pub const DEFAULT_RECORD_LIMIT: u32 = 1000;

/// The query kinds the core can issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryKind {
    /// Neighborhoods of all abnormal addresses
    AbnormalSeed,
    /// Neighborhood of one searched address
    ByAddress,
    /// Neighborhoods of every address
    AllAddresses,
    /// Neighborhood of a node already in the session
    NodeNeighborhood,
    /// Per-direction transfer totals of one address
    NodeDetail,
}

impl QueryKind {
    pub const ALL: [QueryKind; 5] = [
        QueryKind::AbnormalSeed,
        QueryKind::ByAddress,
        QueryKind::AllAddresses,
        QueryKind::NodeNeighborhood,
        QueryKind::NodeDetail,
    ];

    /// Whether the kind must carry a record limit
    pub fn requires_limit(self) -> bool {
        !matches!(self, QueryKind::NodeDetail)
    }

    /// Whether the kind must carry an address
    pub fn requires_address(self) -> bool {
        matches!(
            self,
            QueryKind::ByAddress | QueryKind::NodeNeighborhood | QueryKind::NodeDetail
        )
    }

    /// Graph-database query text for this kind.
    ///
    /// Neighborhood queries return the columns `source`, `r`, `isFromSource`,
    /// `target`; the detail query returns `isFromSource`, `count`,
    /// `total_amount`. Parameters are `$address` and `$limit`.
    pub fn cypher(self) -> &'static str {
        match self {
            QueryKind::AbnormalSeed => {
                "MATCH (source:Address {type: 1})-[r:SENT]-(target:Address) \
                 RETURN source, r, (startNode(r) = source) as isFromSource, target \
                 ORDER BY source.type DESC, target.type DESC \
                 LIMIT $limit"
            }
            QueryKind::ByAddress | QueryKind::NodeNeighborhood => {
                "MATCH (source:Address {addr: $address})-[r:SENT]-(target:Address) \
                 RETURN source, r, (startNode(r) = source) as isFromSource, target \
                 LIMIT $limit"
            }
            QueryKind::AllAddresses => {
                "MATCH (source:Address)-[r:SENT]-(target:Address) \
                 RETURN source, r, (startNode(r) = source) as isFromSource, target \
                 LIMIT $limit"
            }
            QueryKind::NodeDetail => {
                "MATCH (source:Address {addr: $address})-[r:SENT]-(:Address) \
                 RETURN (startNode(r) = source) as isFromSource, \
                 sum(r.count) as count, sum(r.total_amount) as total_amount"
            }
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            QueryKind::AbnormalSeed => "abnormal_seed",
            QueryKind::ByAddress => "by_address",
            QueryKind::AllAddresses => "all_addresses",
            QueryKind::NodeNeighborhood => "node_neighborhood",
            QueryKind::NodeDetail => "node_detail",
        }
    }
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Positive cap on the number of rows a query may return
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordLimit(NonZeroU32);

impl RecordLimit {
    /// Returns None for zero
    pub fn new(limit: u32) -> Option<Self> {
        NonZeroU32::new(limit).map(RecordLimit)
    }

    pub fn get(self) -> u32 {
        self.0.get()
    }

    pub fn as_usize(self) -> usize {
        self.0.get() as usize
    }
}

const DEFAULT_LIMIT: NonZeroU32 = match NonZeroU32::new(DEFAULT_RECORD_LIMIT) {
    Some(limit) => limit,
    None => panic!("default record limit must be non-zero"),
};

impl Default for RecordLimit {
    fn default() -> Self {
        RecordLimit(DEFAULT_LIMIT)
    }
}

impl fmt::Display for RecordLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RecordLimit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: u32 = s
            .trim()
            .parse()
            .map_err(|_| format!("limit must be a positive integer: {}", s))?;
        RecordLimit::new(value).ok_or_else(|| "limit must be greater than zero".to_string())
    }
}

/// Parameters attached to a query
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QueryParams {
    /// Normalized (lowercase) address the query is anchored on
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<RecordLimit>,
}

impl QueryParams {
    pub fn limited(limit: RecordLimit) -> Self {
        Self {
            address: None,
            limit: Some(limit),
        }
    }

    pub fn for_address(address: impl Into<String>) -> Self {
        Self {
            address: Some(address.into()),
            limit: None,
        }
    }

    pub fn with_limit(mut self, limit: RecordLimit) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Check that the parameters carry what `kind` requires.
    pub fn check(&self, kind: QueryKind) -> Result<(), ExploreError> {
        if kind.requires_limit() && self.limit.is_none() {
            return Err(ExploreError::InvalidParams {
                kind,
                reason: "a positive record limit is required",
            });
        }
        if kind.requires_address() {
            match self.address.as_deref() {
                None => {
                    return Err(ExploreError::InvalidParams {
                        kind,
                        reason: "an address is required",
                    })
                }
                Some(addr) if addr.trim().is_empty() => {
                    return Err(ExploreError::InvalidParams {
                        kind,
                        reason: "the address is empty",
                    })
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    /// Limit as a row count, unbounded when absent
    pub(crate) fn row_cap(&self) -> usize {
        self.limit.map(RecordLimit::as_usize).unwrap_or(usize::MAX)
    }
}

/// Capability that runs queries against the external graph database.
///
/// Connection lifecycle belongs to the implementor. Failures are reported as
/// [`QueryExecutionError`]; an empty result is `Ok(vec![])`, not an error.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn run(
        &self,
        kind: QueryKind,
        params: &QueryParams,
    ) -> Result<Vec<RawRow>, QueryExecutionError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_limit_rejects_zero() {
        assert!(RecordLimit::new(0).is_none());
        assert_eq!(RecordLimit::new(50).unwrap().get(), 50);
        assert_eq!(RecordLimit::default().get(), DEFAULT_RECORD_LIMIT);
    }

    #[test]
    fn test_record_limit_from_str() {
        assert_eq!("25".parse::<RecordLimit>().unwrap().get(), 25);
        assert!("0".parse::<RecordLimit>().is_err());
        assert!("-3".parse::<RecordLimit>().is_err());
        assert!("abc".parse::<RecordLimit>().is_err());
    }

    #[test]
    fn test_params_check_requires_limit() {
        let params = QueryParams::default();
        let err = params.check(QueryKind::AllAddresses).unwrap_err();
        assert!(matches!(
            err,
            ExploreError::InvalidParams {
                kind: QueryKind::AllAddresses,
                ..
            }
        ));
    }

    #[test]
    fn test_params_check_requires_address() {
        let limit = RecordLimit::new(10).unwrap();
        assert!(QueryParams::limited(limit).check(QueryKind::ByAddress).is_err());
        assert!(QueryParams::limited(limit).check(QueryKind::AbnormalSeed).is_ok());
        assert!(QueryParams::for_address("0xab").check(QueryKind::NodeDetail).is_ok());
        assert!(QueryParams::for_address(" ")
            .with_limit(limit)
            .check(QueryKind::NodeNeighborhood)
            .is_err());
    }

    #[test]
    fn test_cypher_templates_bind_parameters() {
        for kind in QueryKind::ALL {
            let text = kind.cypher();
            assert_eq!(text.contains("$limit"), kind.requires_limit(), "{}", kind);
            assert_eq!(text.contains("$address"), kind.requires_address(), "{}", kind);
            assert!(text.contains("isFromSource"), "{}", kind);
        }
        assert!(QueryKind::AbnormalSeed.cypher().contains("{type: 1}"));
    }
}
