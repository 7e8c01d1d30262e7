//! Domain models for watched chain data.
//!
//! These models are storage-agnostic and represent the canonical form of
//! observed data within the domain layer. Addresses, hashes and values
//! stay in the chain's native hex encodings - the watcher never does
//! arithmetic on them, so nothing is decoded to numeric types except
//! block heights.

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

// =============================================================================
// Transactions
// =============================================================================

/// A transaction observed on the chain.
///
/// All fields are opaque hex strings as returned by the node. `to` is
/// absent for contract-creation transactions and must never be treated
/// as an address in that case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Transaction hash.
    pub hash: String,
    /// Sender address.
    pub from: String,
    /// Recipient address (None for contract creation).
    pub to: Option<String>,
    /// Transferred value (hex-encoded wei).
    pub value: String,
}

// =============================================================================
// Block Heights
// =============================================================================

/// Hex encoding helpers for block heights.
///
/// The wire format is a `0x`-prefixed lowercase hex integer with no
/// leading zeros beyond a single `0`.
pub mod height {
    use super::*;

    /// Parse a hex-encoded block height.
    pub fn parse_hex(s: &str) -> DomainResult<u64> {
        let digits = s
            .strip_prefix("0x")
            .ok_or_else(|| DomainError::InvalidHeight(s.to_string()))?;

        u64::from_str_radix(digits, 16).map_err(|_| DomainError::InvalidHeight(s.to_string()))
    }

    /// Format a block height in the wire encoding.
    pub fn format_hex(height: u64) -> String {
        format!("0x{:x}", height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn height_parse_roundtrip() {
        assert_eq!(height::parse_hex("0x0").unwrap(), 0);
        assert_eq!(height::parse_hex("0x2a").unwrap(), 42);
        assert_eq!(height::parse_hex(&height::format_hex(1_437_700)).unwrap(), 1_437_700);
    }

    #[test]
    fn height_format_has_no_leading_zeros() {
        assert_eq!(height::format_hex(0), "0x0");
        assert_eq!(height::format_hex(255), "0xff");
    }

    #[test]
    fn height_parse_requires_prefix() {
        assert!(height::parse_hex("2a").is_err());
        assert!(height::parse_hex("latest").is_err());
    }

    #[test]
    fn height_parse_rejects_garbage() {
        assert!(height::parse_hex("0x").is_err());
        assert!(height::parse_hex("0xzz").is_err());
    }

    #[test]
    fn transaction_serde_roundtrip() {
        let tx = Transaction {
            hash: "0x1".into(),
            from: "0xaaa".into(),
            to: None,
            value: "0x0".into(),
        };
        let json = serde_json::to_string(&tx).unwrap();
        let back: Transaction = serde_json::from_str(&json).unwrap();
        assert_eq!(back, tx);
    }
}
