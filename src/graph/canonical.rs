//! Canonical edge direction
//!
//! Neighborhood queries match `SENT` relationships without direction, so a
//! row's `source` column is the anchor of the match and not necessarily the
//! paying party. The `isFromSource` flag says which side started the transfer.

use crate::error::InvalidRecordError;
use crate::query::{columns, read_address, Properties};

use super::Address;

/// Order a pair so the initiating side comes first.
pub fn canonicalize<T>(left: T, right: T, left_is_source: bool) -> (T, T) {
    if left_is_source {
        (left, right)
    } else {
        (right, left)
    }
}

/// Parse both node records of a row and return them as `(source, target)`.
///
/// # Arguments
/// * `row` - Row index, used in error messages
/// * `left` - Record from the `source` column
/// * `right` - Record from the `target` column
/// * `left_is_source` - Value of the row's `isFromSource` flag
pub fn canonicalize_records(
    row: usize,
    left: &Properties,
    right: &Properties,
    left_is_source: bool,
) -> Result<(Address, Address), InvalidRecordError> {
    let left = read_address(row, columns::SOURCE, left)?;
    let right = read_address(row, columns::TARGET, right)?;
    Ok(canonicalize(left, right, left_is_source))
}
