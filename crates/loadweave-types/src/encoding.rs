//! Encoding utilities for hex and digests.
//!
//! Shared helpers used by the CLI and tests for printing and comparing
//! unit bytes.

use sha2::{Digest, Sha256};

// =============================================================================
// Hex
// =============================================================================

/// Encode bytes as 0x-prefixed lowercase hex.
pub fn to_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

// =============================================================================
// Digests
// =============================================================================

/// SHA-256 digest of `bytes`, hex encoded without prefix.
///
/// Used to compare unit payloads in reports without dumping them.
///
/// # Examples
///
/// ```
/// use loadweave_types::encoding::sha256_hex;
///
/// assert_eq!(
///     sha256_hex(b""),
///     "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
/// );
/// ```
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_hex() {
        assert_eq!(to_hex(&[0xde, 0xad]), "0xdead");
        assert_eq!(to_hex(&[]), "0x");
    }

    #[test]
    fn test_sha256_differs_per_payload() {
        assert_ne!(sha256_hex(b"a"), sha256_hex(b"b"));
        assert_eq!(sha256_hex(b"a").len(), 64);
    }
}
