//! txscope error and notice codes
//!
//! Codes follow the pattern: TXS-{CATEGORY}-{3-digit number}
//!
//! Categories (1-3 uppercase letters):
//! - ADR: Address-related errors (validation, unknown node)
//! - QRY: Query-related errors (executor failure, parameters, busy)
//! - REC: Record errors (result rows that do not match the expected schema)
//! - N: Informational notices (not failures)
//!
//! Each code is stable and should not be reused.

/// Address failed format validation
pub const TXS_ADR_001_INVALID_ADDRESS: &str = "TXS-ADR-001";

/// Address is not part of the current session
pub const TXS_ADR_002_UNKNOWN_ADDRESS: &str = "TXS-ADR-002";

/// Query executor failed (transport or database fault)
pub const TXS_QRY_001_EXECUTION_FAILED: &str = "TXS-QRY-001";

/// Query parameters missing or invalid for the query kind
pub const TXS_QRY_002_INVALID_PARAMS: &str = "TXS-QRY-002";

/// Another query is already in flight
pub const TXS_QRY_003_BUSY: &str = "TXS-QRY-003";

/// Previous failure has not been acknowledged
pub const TXS_QRY_004_UNACKNOWLEDGED: &str = "TXS-QRY-004";

/// Result row is missing a column or property, or has the wrong type
pub const TXS_REC_001_INVALID_RECORD: &str = "TXS-REC-001";

/// Query succeeded but returned no rows
pub const TXS_N_001_EMPTY_RESULT: &str = "TXS-N-001";

/// Expand returned rows but none introduced a new address
pub const TXS_N_002_NO_NEW_CONNECTIONS: &str = "TXS-N-002";

/// Error code documentation
///
/// # Address Errors (TXS-ADR-*)
///
/// | Code | Description | Remediation |
/// |------|-------------|-------------|
/// | TXS-ADR-001 | Invalid address | Use `0x` followed by 40 hex digits |
/// | TXS-ADR-002 | Unknown address | Load or search the address before expanding or selecting it |
///
/// # Query Errors (TXS-QRY-*)
///
/// | Code | Description | Remediation |
/// |------|-------------|-------------|
/// | TXS-QRY-001 | Executor failure | Check database connectivity; re-issue the action |
/// | TXS-QRY-002 | Invalid parameters | Provide a positive limit and an address where required |
/// | TXS-QRY-003 | Busy | Wait for the in-flight query to finish |
/// | TXS-QRY-004 | Unacknowledged failure | Acknowledge the previous error first |
///
/// # Record Errors (TXS-REC-*)
///
/// | Code | Description | Remediation |
/// |------|-------------|-------------|
/// | TXS-REC-001 | Invalid record | Query layer and schema disagree; check the query text |
///
/// # Notices (TXS-N-*)
///
/// | Code | Description |
/// |------|-------------|
/// | TXS-N-001 | No results |
/// | TXS-N-002 | No new connections found |
pub const ERROR_CODE_DOCUMENTATION: &str = "Error code documentation available in source";
