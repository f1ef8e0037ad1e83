//! # Value Objects
//!
//! Immutable identity primitives: addresses, public keys, the key-data
//! union the registry stores, and validated DID strings.
//!
//! All hex renderings are lowercase, so two values compare equal iff their
//! canonical hex forms are equal regardless of the case they were parsed
//! from.

use super::codec::{Decodable, Encodable, ZeroCopySink, ZeroCopySource};
use super::identity;
use crate::errors::{CodecError, RegistryError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A 32-byte Keccak-256 digest.
pub type Hash = [u8; 32];

/// Length of an address in bytes.
pub const ADDRESS_LEN: usize = 20;

/// Length of an uncompressed secp256k1 public key in bytes.
pub const PUBLIC_KEY_LEN: usize = 65;

/// Strip an optional `0x` / `0X` prefix.
pub(crate) fn strip_hex_prefix(s: &str) -> &str {
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s)
}

// =============================================================================
// ADDRESS (20 bytes)
// =============================================================================

/// A 20-byte address derived from a public key.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Address(pub [u8; ADDRESS_LEN]);

impl Address {
    /// The zero address.
    pub const ZERO: Self = Self([0u8; ADDRESS_LEN]);

    #[must_use]
    pub const fn new(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }

    /// Creates an address from a slice. Returns None if wrong length.
    #[must_use]
    pub fn from_slice(slice: &[u8]) -> Option<Self> {
        <[u8; ADDRESS_LEN]>::try_from(slice).ok().map(Self)
    }

    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }

    /// Lowercase hex without prefix.
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

impl FromStr for Address {
    type Err = RegistryError;

    /// Parses 40 hex characters of any case, with or without `0x`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = strip_hex_prefix(s);
        let mut bytes = [0u8; ADDRESS_LEN];
        hex::decode_to_slice(digits, &mut bytes)
            .map_err(|e| RegistryError::InvalidKey(format!("address {s:?}: {e}")))?;
        Ok(Self(bytes))
    }
}

impl From<[u8; ADDRESS_LEN]> for Address {
    fn from(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }
}

impl From<Address> for String {
    fn from(addr: Address) -> Self {
        addr.to_string()
    }
}

impl TryFrom<String> for Address {
    type Error = RegistryError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl Encodable for Address {
    fn encode(&self, sink: &mut ZeroCopySink) {
        sink.write_fixed(&self.0);
    }
}

impl Decodable for Address {
    fn decode(source: &mut ZeroCopySource<'_>) -> Result<Self, CodecError> {
        Ok(Self(source.read_fixed()?))
    }
}

// =============================================================================
// PUBLIC KEY (65 bytes, uncompressed SEC1)
// =============================================================================

/// An uncompressed secp256k1 public key: `0x04 || x || y`.
///
/// Construction checks that the point lies on the curve.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct PublicKey([u8; PUBLIC_KEY_LEN]);

impl PublicKey {
    /// Validates and wraps 65 uncompressed key bytes.
    #[must_use]
    pub fn from_slice(slice: &[u8]) -> Option<Self> {
        let bytes = <[u8; PUBLIC_KEY_LEN]>::try_from(slice).ok()?;
        if bytes[0] != 0x04 {
            return None;
        }
        k256::PublicKey::from_sec1_bytes(&bytes).ok()?;
        Some(Self(bytes))
    }

    /// Wraps a k256 verifying key.
    #[must_use]
    pub fn from_verifying_key(key: &k256::ecdsa::VerifyingKey) -> Self {
        let point = key.to_encoded_point(false);
        let mut bytes = [0u8; PUBLIC_KEY_LEN];
        bytes.copy_from_slice(point.as_bytes());
        Self(bytes)
    }

    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; PUBLIC_KEY_LEN] {
        &self.0
    }

    /// The address this key controls.
    #[must_use]
    pub fn address(&self) -> Address {
        identity::derive_address(self)
    }

    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey(0x{}..)", &self.to_hex()[..16])
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

impl FromStr for PublicKey {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(strip_hex_prefix(s))
            .map_err(|e| RegistryError::InvalidKey(format!("public key {s:?}: {e}")))?;
        Self::from_slice(&bytes)
            .ok_or_else(|| RegistryError::InvalidKey(format!("not an uncompressed key: {s:?}")))
    }
}

impl From<PublicKey> for String {
    fn from(key: PublicKey) -> Self {
        key.to_string()
    }
}

impl TryFrom<String> for PublicKey {
    type Error = RegistryError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

// =============================================================================
// KEY DATA
// =============================================================================

/// Key material held by a public key entry.
///
/// Documents store either form. Membership checks compare by the
/// derived address, so a key and its own address are the same signer.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum KeyData {
    /// 65-byte uncompressed public key.
    PublicKey(PublicKey),
    /// 20-byte derived address.
    Address(Address),
}

impl KeyData {
    /// Interpret raw bytes by length: 20 for an address, 65 for a key.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, RegistryError> {
        match bytes.len() {
            ADDRESS_LEN => Address::from_slice(bytes)
                .map(Self::Address)
                .ok_or_else(|| RegistryError::InvalidKey("bad address".into())),
            PUBLIC_KEY_LEN => PublicKey::from_slice(bytes)
                .map(Self::PublicKey)
                .ok_or_else(|| RegistryError::InvalidKey("not an uncompressed key".into())),
            n => Err(RegistryError::InvalidKey(format!(
                "expected {ADDRESS_LEN} or {PUBLIC_KEY_LEN} bytes, got {n}"
            ))),
        }
    }

    /// The signer address behind this key data.
    #[must_use]
    pub fn address(&self) -> Address {
        match self {
            Self::PublicKey(key) => key.address(),
            Self::Address(addr) => *addr,
        }
    }

    #[must_use]
    pub fn is_address(&self) -> bool {
        matches!(self, Self::Address(_))
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::PublicKey(key) => key.as_bytes(),
            Self::Address(addr) => addr.as_bytes(),
        }
    }

    /// Lowercase hex of the raw bytes, without prefix.
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.as_bytes())
    }

    /// True if both refer to the same signer.
    #[must_use]
    pub fn same_signer(&self, other: &KeyData) -> bool {
        self.address() == other.address()
    }
}

impl fmt::Debug for KeyData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PublicKey(key) => write!(f, "{key:?}"),
            Self::Address(addr) => write!(f, "Address({addr:?})"),
        }
    }
}

impl fmt::Display for KeyData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

impl FromStr for KeyData {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(strip_hex_prefix(s))
            .map_err(|e| RegistryError::InvalidKey(format!("{s:?}: {e}")))?;
        Self::from_bytes(&bytes)
    }
}

impl From<PublicKey> for KeyData {
    fn from(key: PublicKey) -> Self {
        Self::PublicKey(key)
    }
}

impl From<Address> for KeyData {
    fn from(addr: Address) -> Self {
        Self::Address(addr)
    }
}

impl From<KeyData> for String {
    fn from(key: KeyData) -> Self {
        key.to_string()
    }
}

impl TryFrom<String> for KeyData {
    type Error = RegistryError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl Encodable for KeyData {
    fn encode(&self, sink: &mut ZeroCopySink) {
        sink.write_bytes(self.as_bytes());
    }
}

impl Decodable for KeyData {
    fn decode(source: &mut ZeroCopySource<'_>) -> Result<Self, CodecError> {
        let bytes = source.read_bytes()?;
        Self::from_bytes(bytes).map_err(|e| CodecError::InvalidValue {
            what: "key data",
            reason: e.to_string(),
        })
    }
}

// =============================================================================
// DID
// =============================================================================

/// A validated decentralized identifier, `did:<method>:<id>`.
///
/// Address-form ids (`0x` + 40 hex, or bare 40 hex) are stored with
/// lowercase hex digits so that differently-cased spellings name the same
/// document.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Did(String);

impl Did {
    /// Validate and canonicalize a DID string.
    pub fn parse(s: &str) -> Result<Self, RegistryError> {
        if !identity::verify_did_format(s) {
            return Err(RegistryError::MalformedDid(s.to_owned()));
        }
        let (prefix, id) = s
            .rsplit_once(':')
            .ok_or_else(|| RegistryError::MalformedDid(s.to_owned()))?;
        if identity::is_address_id(id) {
            Ok(Self(format!("{prefix}:{}", identity::canonicalize(id))))
        } else {
            Ok(Self(s.to_owned()))
        }
    }

    /// The conventional DID for an address: `did:<method>:0x<hex>`.
    #[must_use]
    pub fn for_address(method: &str, address: &Address) -> Option<Self> {
        Self::parse(&format!("did:{method}:{address}")).ok()
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The method segment.
    #[must_use]
    pub fn method(&self) -> &str {
        self.0.split(':').nth(1).unwrap_or_default()
    }

    /// The method-specific id segment.
    #[must_use]
    pub fn method_specific_id(&self) -> &str {
        self.0.split(':').nth(2).unwrap_or_default()
    }

    /// The address named by an address-form id.
    #[must_use]
    pub fn address(&self) -> Option<Address> {
        let id = self.method_specific_id();
        if identity::is_address_id(id) {
            id.parse().ok()
        } else {
            None
        }
    }
}

impl fmt::Debug for Did {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Did({})", self.0)
    }
}

impl fmt::Display for Did {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Did {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for Did {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<Did> for String {
    fn from(did: Did) -> Self {
        did.0
    }
}

impl TryFrom<String> for Did {
    type Error = RegistryError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl Encodable for Did {
    fn encode(&self, sink: &mut ZeroCopySink) {
        sink.write_string(&self.0);
    }
}

impl Decodable for Did {
    fn decode(source: &mut ZeroCopySource<'_>) -> Result<Self, CodecError> {
        let raw = source.read_string()?;
        Self::parse(&raw).map_err(|_| CodecError::InvalidValue {
            what: "did",
            reason: raw,
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================
