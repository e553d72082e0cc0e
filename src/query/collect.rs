//! Raw transaction collection
//!
//! Aggregates per-block transaction records into a [`TransferDataset`]:
//!
//! ```json
//! {
//!   "abnormal": ["0xaa.."],
//!   "blocks": [{ "number": "0x10", "transactions": [
//!     { "from": "0xaa..", "to": "0xbb..", "hash": "0x01..", "value": "0xde0b6b3a7640000" }
//!   ]}],
//!   "transactions": []
//! }
//! ```
//!
//! Transactions are read from `blocks` in order, then from the top-level
//! `transactions` list. Each one is kept or skipped with this precedence:
//! 1. Duplicate hash (the first occurrence is kept)
//! 2. Zero value, unless [`CollectOptions::skip_zero_value`] is off
//! 3. Contract creation (`to` is null or empty)
//!
//! Kept values are summed in wei per ordered `(from, to)` pair and converted
//! to ETH once, so rounding does not accumulate. Pairs and addresses keep
//! first-seen order.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::debug;

use crate::graph::ABNORMAL_TYPE_TAG;

use super::{AddressRecord, TransferDataset, TransferRecord};

pub const WEI_PER_ETH: u128 = 1_000_000_000_000_000_000;

/// Transaction value in wei
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Deserialize)]
#[serde(try_from = "WeiLiteral")]
pub struct Wei(pub u128);

impl Wei {
    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Whole ETH and the remainder are converted separately to keep
    /// precision for large sums
    pub fn to_eth(self) -> f64 {
        (self.0 / WEI_PER_ETH) as f64 + (self.0 % WEI_PER_ETH) as f64 / WEI_PER_ETH as f64
    }
}

/// JSON forms accepted for a value: an integer, a decimal string or a
/// `0x` hex string
#[derive(Deserialize)]
#[serde(untagged)]
enum WeiLiteral {
    Integer(u64),
    Text(String),
}

impl TryFrom<WeiLiteral> for Wei {
    type Error = String;

    fn try_from(literal: WeiLiteral) -> Result<Self, Self::Error> {
        match literal {
            WeiLiteral::Integer(value) => Ok(Wei(u128::from(value))),
            WeiLiteral::Text(text) => {
                let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
                    Some(digits) => u128::from_str_radix(digits, 16),
                    None => text.parse::<u128>(),
                };
                parsed
                    .map(Wei)
                    .map_err(|e| format!("invalid wei value `{}`: {}", text, e))
            }
        }
    }
}

/// One transaction as reported by a block explorer
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawTransaction {
    pub from: String,
    /// Null for contract creations
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub hash: Option<String>,
    pub value: Wei,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Block {
    #[serde(default)]
    pub transactions: Vec<RawTransaction>,
}

/// Crawled transactions plus the addresses flagged abnormal
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TransactionLog {
    #[serde(default)]
    pub abnormal: Vec<String>,
    #[serde(default)]
    pub blocks: Vec<Block>,
    #[serde(default)]
    pub transactions: Vec<RawTransaction>,
}

impl TransactionLog {
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse transaction log")
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read transaction log {}", path.display()))?;
        Self::from_json_str(&json).with_context(|| format!("Invalid transaction log {}", path.display()))
    }

    fn iter(&self) -> impl Iterator<Item = &RawTransaction> {
        self.blocks
            .iter()
            .flat_map(|block| block.transactions.iter())
            .chain(self.transactions.iter())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectOptions {
    pub skip_zero_value: bool,
}

impl Default for CollectOptions {
    fn default() -> Self {
        Self { skip_zero_value: true }
    }
}

/// Why a transaction was left out of the aggregate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    DuplicateHash,
    ZeroValue,
    ContractCreation,
}

impl SkipReason {
    pub fn description(&self) -> &'static str {
        match self {
            SkipReason::DuplicateHash => "duplicate transaction hash",
            SkipReason::ZeroValue => "zero value",
            SkipReason::ContractCreation => "contract creation",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CollectStats {
    /// Transactions read, skipped ones included
    pub transactions: usize,
    pub skipped_duplicate: usize,
    pub skipped_zero_value: usize,
    pub skipped_contract_creation: usize,
    /// Distinct ordered pairs in the result
    pub transfers: usize,
}

impl CollectStats {
    fn record_skip(&mut self, reason: SkipReason) {
        match reason {
            SkipReason::DuplicateHash => self.skipped_duplicate += 1,
            SkipReason::ZeroValue => self.skipped_zero_value += 1,
            SkipReason::ContractCreation => self.skipped_contract_creation += 1,
        }
    }
}

struct PairTotal {
    from: String,
    to: String,
    count: u64,
    wei: u128,
}

/// Recipient of a kept transaction, or why it is skipped
fn kept_recipient<'a>(
    tx: &'a RawTransaction,
    seen_hashes: &mut HashSet<String>,
    options: CollectOptions,
) -> Result<&'a str, SkipReason> {
    if let Some(hash) = &tx.hash {
        if !seen_hashes.insert(hash.to_ascii_lowercase()) {
            return Err(SkipReason::DuplicateHash);
        }
    }
    if options.skip_zero_value && tx.value.is_zero() {
        return Err(SkipReason::ZeroValue);
    }
    match tx.to.as_deref() {
        Some(to) if !to.is_empty() => Ok(to),
        _ => Err(SkipReason::ContractCreation),
    }
}

/// Aggregate a transaction log into a checked dataset.
///
/// # Returns
/// The dataset and counts of what was kept and skipped, or an error when a
/// pair's wei total overflows
pub fn aggregate_transactions(
    log: &TransactionLog,
    options: CollectOptions,
) -> Result<(TransferDataset, CollectStats)> {
    let mut stats = CollectStats::default();
    let mut seen_hashes = HashSet::new();
    let mut pairs: Vec<PairTotal> = Vec::new();
    let mut pair_index: HashMap<(String, String), usize> = HashMap::new();

    for tx in log.iter() {
        stats.transactions += 1;
        let to = match kept_recipient(tx, &mut seen_hashes, options) {
            Ok(to) => to.to_ascii_lowercase(),
            Err(reason) => {
                debug!(hash = ?tx.hash, reason = reason.description(), "transaction skipped");
                stats.record_skip(reason);
                continue;
            }
        };
        let from = tx.from.to_ascii_lowercase();

        let key = (from, to);
        if let Some(&position) = pair_index.get(&key) {
            let pair = &mut pairs[position];
            pair.count = pair.count.saturating_add(1);
            pair.wei = pair.wei.checked_add(tx.value.0).with_context(|| {
                format!("Wei total overflows for transfers {} -> {}", pair.from, pair.to)
            })?;
        } else {
            pair_index.insert(key.clone(), pairs.len());
            pairs.push(PairTotal {
                from: key.0,
                to: key.1,
                count: 1,
                wei: tx.value.0,
            });
        }
    }

    let abnormal: HashSet<String> = log.abnormal.iter().map(|a| a.to_ascii_lowercase()).collect();
    let mut addresses = Vec::new();
    let mut known = HashSet::new();
    let mut add_address = |addr: &str| {
        if known.insert(addr.to_string()) {
            addresses.push(AddressRecord {
                addr: addr.to_string(),
                type_tag: if abnormal.contains(addr) { ABNORMAL_TYPE_TAG } else { 0 },
            });
        }
    };
    for pair in &pairs {
        add_address(&pair.from);
        add_address(&pair.to);
    }
    for addr in &log.abnormal {
        add_address(&addr.to_ascii_lowercase());
    }

    let transfers: Vec<TransferRecord> = pairs
        .into_iter()
        .map(|pair| TransferRecord {
            from: pair.from,
            to: pair.to,
            count: pair.count,
            total_amount: Wei(pair.wei).to_eth(),
        })
        .collect();
    stats.transfers = transfers.len();

    let dataset = TransferDataset { addresses, transfers };
    dataset.check()?;
    Ok((dataset, stats))
}
