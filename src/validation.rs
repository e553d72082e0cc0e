//! Address validation and normalization.
//!
//! User-supplied addresses MUST pass an [`AddressValidator`] before any query
//! is issued for them. The default [`HexAddressValidator`] checks the shape of
//! the identifier only; mixed-case checksum verification is an external
//! capability that can be plugged in by implementing the trait.

/// Length of an account identifier in bytes
pub const ADDRESS_BYTES: usize = 20;

/// Prefix every account identifier carries
pub const ADDRESS_PREFIX: &str = "0x";

/// Error types for address validation.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum AddressValidationError {
    /// Input is empty or whitespace
    #[error("address is empty")]
    Empty,

    /// Input does not start with `0x`
    #[error("address must start with 0x: {0}")]
    MissingPrefix(String),

    /// Wrong number of hex digits after the prefix
    #[error("address must have 40 hex digits, found {len}: {address}")]
    WrongLength { address: String, len: usize },

    /// Contains characters outside [0-9a-fA-F]
    #[error("address contains non-hex characters: {0}")]
    NotHex(String),

    /// Rejected by an injected checksum validator
    #[error("address checksum mismatch: {0}")]
    ChecksumMismatch(String),
}

/// Boundary capability that accepts or rejects user-supplied addresses.
///
/// On success returns the canonical (lowercase) form used as the session key.
pub trait AddressValidator: Send + Sync {
    fn validate(&self, raw: &str) -> Result<String, AddressValidationError>;
}

/// Structural validator: `0x` followed by 40 hex digits, any case.
#[derive(Debug, Clone, Copy, Default)]
pub struct HexAddressValidator;

impl AddressValidator for HexAddressValidator {
    fn validate(&self, raw: &str) -> Result<String, AddressValidationError> {
        validate_address(raw)
    }
}

/// Normalize an address to its session key form (trimmed, lowercase).
pub fn normalize_address(raw: &str) -> String {
    raw.trim().to_ascii_lowercase()
}

/// Validate the shape of an address and return its normalized form.
///
/// # Arguments
/// * `raw` - Address as typed by the user
///
/// # Returns
/// Lowercase address, or the first structural problem found
pub fn validate_address(raw: &str) -> Result<String, AddressValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AddressValidationError::Empty);
    }

    let digits = trimmed
        .strip_prefix(ADDRESS_PREFIX)
        .or_else(|| trimmed.strip_prefix("0X"))
        .ok_or_else(|| AddressValidationError::MissingPrefix(trimmed.to_string()))?;

    if digits.len() != ADDRESS_BYTES * 2 {
        return Err(AddressValidationError::WrongLength {
            address: trimmed.to_string(),
            len: digits.len(),
        });
    }

    hex::decode(digits).map_err(|_| AddressValidationError::NotHex(trimmed.to_string()))?;

    Ok(normalize_address(trimmed))
}
