//! # Identity Utilities
//!
//! Pure functions over identity strings and key bytes:
//!
//! - `derive_address`: last 20 bytes of Keccak-256 over the 64 coordinate
//!   bytes of an uncompressed key
//! - `verify_did_format`: the `did:<method>:<id>` grammar
//! - `canonicalize`: case normalization of hex renderings

use super::ecdsa::keccak256;
use super::value_objects::{strip_hex_prefix, Address, PublicKey, ADDRESS_LEN, PUBLIC_KEY_LEN};
use crate::errors::RegistryError;

/// Number of hex digits in an address.
const ADDRESS_HEX_LEN: usize = ADDRESS_LEN * 2;

/// Derive the address controlled by an uncompressed public key.
#[must_use]
pub fn derive_address(key: &PublicKey) -> Address {
    let hash = keccak256(&key.as_bytes()[1..]);
    let mut address = [0u8; ADDRESS_LEN];
    address.copy_from_slice(&hash[12..]);
    Address::new(address)
}

/// Derive an address from raw key bytes, validating the key first.
pub fn derive_address_from_bytes(bytes: &[u8]) -> Result<Address, RegistryError> {
    if bytes.len() != PUBLIC_KEY_LEN {
        return Err(RegistryError::InvalidKey(format!(
            "expected {PUBLIC_KEY_LEN} bytes, got {}",
            bytes.len()
        )));
    }
    PublicKey::from_slice(bytes)
        .map(|key| derive_address(&key))
        .ok_or_else(|| RegistryError::InvalidKey("not an uncompressed key".into()))
}

/// True iff `s` is `did:<method>:<id>` with non-empty method and id.
///
/// An id starting with `0x` must be followed by exactly 40 hex digits.
#[must_use]
pub fn verify_did_format(s: &str) -> bool {
    let mut parts = s.split(':');
    let (Some(scheme), Some(method), Some(id), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return false;
    };
    if scheme != "did" || method.is_empty() || id.is_empty() {
        return false;
    }
    match id.strip_prefix("0x") {
        Some(digits) => is_hex_address(digits),
        None => true,
    }
}

/// True for `0x` + 40 hex digits, or 40 bare hex digits.
#[must_use]
pub fn is_address_id(id: &str) -> bool {
    is_hex_address(id.strip_prefix("0x").unwrap_or(id))
}

fn is_hex_address(digits: &str) -> bool {
    digits.len() == ADDRESS_HEX_LEN && digits.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Lowercase hex digits, keeping a `0x` prefix if one was present.
#[must_use]
pub fn canonicalize(hex_str: &str) -> String {
    let digits = strip_hex_prefix(hex_str);
    if digits.len() == hex_str.len() {
        digits.to_ascii_lowercase()
    } else {
        format!("0x{}", digits.to_ascii_lowercase())
    }
}

/// Case-insensitive equality of two hex renderings, ignoring `0x`.
#[must_use]
pub fn hex_eq(a: &str, b: &str) -> bool {
    strip_hex_prefix(a).eq_ignore_ascii_case(strip_hex_prefix(b))
}

// =============================================================================
// TESTS
// =============================================================================
