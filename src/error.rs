//! Error taxonomy for exploration sessions
//!
//! Failures abort the current action only. A failed action never leaves a
//! partially merged batch behind.

use crate::error_codes::*;
use crate::query::QueryKind;
use crate::validation::AddressValidationError;

/// A result row does not match the shape the query layer promised.
///
/// Raised by the normalizer and the detail aggregator; the whole batch is
/// rejected.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum InvalidRecordError {
    #[error("row {row}: missing column `{column}`")]
    MissingColumn { row: usize, column: String },

    #[error("row {row}: column `{column}` is not a {expected}")]
    WrongColumnType {
        row: usize,
        column: String,
        expected: &'static str,
    },

    #[error("row {row}: `{column}` has no `{field}` property")]
    MissingField {
        row: usize,
        column: String,
        field: String,
    },

    #[error("row {row}: `{column}.{field}` is not a {expected}")]
    WrongFieldType {
        row: usize,
        column: String,
        field: String,
        expected: &'static str,
    },

    #[error("row {row}: edge endpoint `{address}` is not in the batch")]
    DanglingEndpoint { row: usize, address: String },
}

/// The external query executor failed.
#[derive(Debug, thiserror::Error)]
pub enum QueryExecutionError {
    /// Transport or database fault reported by the backend
    #[error("query backend failure: {0}")]
    Backend(String),

    /// The blocking task running the query panicked or was cancelled
    #[error("query task failed: {0}")]
    Task(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// Errors surfaced by the session controller
#[derive(Debug, thiserror::Error)]
pub enum ExploreError {
    #[error("invalid address: {0}")]
    InvalidAddress(#[from] AddressValidationError),

    #[error("address not in the current session: {0}")]
    UnknownAddress(String),

    #[error("invalid record: {0}")]
    InvalidRecord(#[from] InvalidRecordError),

    #[error("query failed: {0}")]
    QueryExecution(#[from] QueryExecutionError),

    #[error("invalid parameters for {kind} query: {reason}")]
    InvalidParams {
        kind: QueryKind,
        reason: &'static str,
    },

    #[error("a query is already in flight ({in_flight} pending)")]
    Busy { in_flight: usize },

    #[error("previous failure not acknowledged: {0}")]
    Unacknowledged(String),
}

impl ExploreError {
    /// Stable error code (see [`crate::error_codes`])
    pub fn code(&self) -> &'static str {
        match self {
            ExploreError::InvalidAddress(_) => TXS_ADR_001_INVALID_ADDRESS,
            ExploreError::UnknownAddress(_) => TXS_ADR_002_UNKNOWN_ADDRESS,
            ExploreError::InvalidRecord(_) => TXS_REC_001_INVALID_RECORD,
            ExploreError::QueryExecution(_) => TXS_QRY_001_EXECUTION_FAILED,
            ExploreError::InvalidParams { .. } => TXS_QRY_002_INVALID_PARAMS,
            ExploreError::Busy { .. } => TXS_QRY_003_BUSY,
            ExploreError::Unacknowledged(_) => TXS_QRY_004_UNACKNOWLEDGED,
        }
    }

    /// Short category name used in JSON error responses
    pub fn category(&self) -> &'static str {
        match self {
            ExploreError::InvalidAddress(_) => "invalid_address",
            ExploreError::UnknownAddress(_) => "unknown_address",
            ExploreError::InvalidRecord(_) => "invalid_record",
            ExploreError::QueryExecution(_) => "query_execution",
            ExploreError::InvalidParams { .. } => "invalid_params",
            ExploreError::Busy { .. } => "busy",
            ExploreError::Unacknowledged(_) => "unacknowledged",
        }
    }

    /// True when the error was raised before any query was issued
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            ExploreError::InvalidAddress(_)
                | ExploreError::UnknownAddress(_)
                | ExploreError::InvalidParams { .. }
                | ExploreError::Busy { .. }
                | ExploreError::Unacknowledged(_)
        )
    }
}
