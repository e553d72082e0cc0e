//! Per-address transfer totals
//!
//! The detail query pre-sums `count` and `total_amount` per direction, so a
//! well-formed result has at most one row per direction.

use serde::{Deserialize, Serialize};

use crate::error::InvalidRecordError;
use crate::query::{columns, RawRow, RowReader};

use super::AddressDetail;

/// What to do when two rows report the same direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetailPolicy {
    /// Later row replaces the accumulator
    #[default]
    Overwrite,
    /// Rows for the same direction are added up
    Sum,
}

/// One direction's totals as read from a detail row
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalTotal {
    /// Transfers initiated by the selected address
    pub outgoing: bool,
    pub count: u64,
    pub total_amount: f64,
}

/// Read the detail rows of a `NodeDetail` result
pub fn parse_detail_rows(rows: &[RawRow]) -> Result<Vec<DirectionalTotal>, InvalidRecordError> {
    rows.iter()
        .enumerate()
        .map(|(index, row)| {
            let reader = RowReader::new(index, row);
            Ok(DirectionalTotal {
                outgoing: reader.scalar_bool(columns::IS_FROM_SOURCE)?,
                count: reader.scalar_count(columns::COUNT)?,
                total_amount: reader.scalar_amount(columns::TOTAL_AMOUNT)?,
            })
        })
        .collect()
}

/// Fold directional totals into an [`AddressDetail`]. No rows gives zeros.
pub fn aggregate(totals: &[DirectionalTotal], policy: DetailPolicy) -> AddressDetail {
    let mut detail = AddressDetail::default();
    for total in totals {
        let (amount, count) = if total.outgoing {
            (&mut detail.total_sent, &mut detail.num_sent)
        } else {
            (&mut detail.total_received, &mut detail.num_received)
        };
        match policy {
            DetailPolicy::Overwrite => {
                *amount = total.total_amount;
                *count = total.count;
            }
            DetailPolicy::Sum => {
                *amount += total.total_amount;
                *count = count.saturating_add(total.count);
            }
        }
    }
    detail
}

/// Parse and aggregate in one step
pub fn aggregate_rows(rows: &[RawRow], policy: DetailPolicy) -> Result<AddressDetail, InvalidRecordError> {
    let totals = parse_detail_rows(rows)?;
    Ok(aggregate(&totals, policy))
}
