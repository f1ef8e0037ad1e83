//! # Domain Entities
//!
//! Records held inside a DID document and the views returned by read
//! queries.

use super::codec::{Decodable, Encodable, ZeroCopySink, ZeroCopySource};
use super::value_objects::{Address, Did, KeyData};
use crate::errors::CodecError;
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// KEY TYPE
// =============================================================================

/// Verification method type of a public key entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum KeyType {
    /// secp256k1 key usable with public-key recovery.
    #[default]
    #[serde(rename = "EcdsaSecp256k1RecoveryMethod2020")]
    EcdsaSecp256k1Recovery,
}

impl KeyType {
    /// The W3C verification method type label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::EcdsaSecp256k1Recovery => "EcdsaSecp256k1RecoveryMethod2020",
        }
    }

    const fn tag(self) -> u8 {
        match self {
            Self::EcdsaSecp256k1Recovery => 0,
        }
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Encodable for KeyType {
    fn encode(&self, sink: &mut ZeroCopySink) {
        sink.write_byte(self.tag());
    }
}

impl Decodable for KeyType {
    fn decode(source: &mut ZeroCopySource<'_>) -> Result<Self, CodecError> {
        match source.read_byte()? {
            0 => Ok(Self::EcdsaSecp256k1Recovery),
            tag => Err(CodecError::InvalidTag {
                what: "key type",
                tag,
            }),
        }
    }
}

// =============================================================================
// PUBLIC KEY ENTRY
// =============================================================================

/// A public key owned by one document.
///
/// Entries are never removed from the document. Revocation clears
/// `is_active` in place so positions stay stable.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKeyEntry {
    pub key: KeyData,
    pub key_type: KeyType,
    /// DIDs listed as controllers of this particular key.
    pub controllers: Vec<Did>,
    /// False once the key has been revoked.
    pub is_active: bool,
}

impl PublicKeyEntry {
    #[must_use]
    pub fn new(key: KeyData, controllers: Vec<Did>) -> Self {
        Self {
            key,
            key_type: KeyType::default(),
            controllers,
            is_active: true,
        }
    }

    /// The signer address behind this entry.
    #[must_use]
    pub fn address(&self) -> Address {
        self.key.address()
    }
}

impl Encodable for PublicKeyEntry {
    fn encode(&self, sink: &mut ZeroCopySink) {
        self.key.encode(sink);
        self.key_type.encode(sink);
        self.controllers.encode(sink);
        sink.write_bool(self.is_active);
    }
}

impl Decodable for PublicKeyEntry {
    fn decode(source: &mut ZeroCopySource<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            key: KeyData::decode(source)?,
            key_type: KeyType::decode(source)?,
            controllers: Vec::decode(source)?,
            is_active: source.read_bool()?,
        })
    }
}

// =============================================================================
// AUTH KEY ENTRY
// =============================================================================

/// An authentication grant for one public key entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthKeyEntry {
    /// Position of the referenced entry in the document's public key list.
    pub key_index: u32,
    /// Issued from the document's counter; never reused.
    pub auth_index: u64,
    pub is_active: bool,
}

impl Encodable for AuthKeyEntry {
    fn encode(&self, sink: &mut ZeroCopySink) {
        sink.write_u32(self.key_index);
        sink.write_u64(self.auth_index);
        sink.write_bool(self.is_active);
    }
}

impl Decodable for AuthKeyEntry {
    fn decode(source: &mut ZeroCopySource<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            key_index: source.read_u32()?,
            auth_index: source.read_u64()?,
            is_active: source.read_bool()?,
        })
    }
}

// =============================================================================
// SERVICE ENTRY
// =============================================================================

/// A service endpoint advertised by a document.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceEntry {
    pub service_id: String,
    pub service_type: String,
    pub service_endpoint: String,
}

impl ServiceEntry {
    pub fn new(
        service_id: impl Into<String>,
        service_type: impl Into<String>,
        service_endpoint: impl Into<String>,
    ) -> Self {
        Self {
            service_id: service_id.into(),
            service_type: service_type.into(),
            service_endpoint: service_endpoint.into(),
        }
    }
}

impl Encodable for ServiceEntry {
    fn encode(&self, sink: &mut ZeroCopySink) {
        sink.write_string(&self.service_id);
        sink.write_string(&self.service_type);
        sink.write_string(&self.service_endpoint);
    }
}

impl Decodable for ServiceEntry {
    fn decode(source: &mut ZeroCopySource<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            service_id: source.read_string()?,
            service_type: source.read_string()?,
            service_endpoint: source.read_string()?,
        })
    }
}

// =============================================================================
// VIEWS
// =============================================================================

/// An active authentication key as returned by `get_all_auth_key`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthKeyView {
    pub key: KeyData,
    pub key_type: KeyType,
    pub controllers: Vec<Did>,
    pub auth_index: u64,
}

/// Storage logic generation a document is served by.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum LogicVersion {
    /// Original layout.
    #[default]
    V1,
    /// Adds a per-document version counter in its own namespace.
    V2,
}

impl LogicVersion {
    #[must_use]
    pub const fn tag(&self) -> &'static str {
        match self {
            Self::V1 => "v1.0.0",
            Self::V2 => "v2.0.0",
        }
    }

    /// True if this logic tracks a per-document version id.
    #[must_use]
    pub const fn tracks_versions(&self) -> bool {
        matches!(self, Self::V2)
    }
}

/// Document-level metadata.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMetadata {
    pub did: Did,
    pub deactivated: bool,
    /// Number of committed mutations under version-tracking logic.
    pub version_id: Option<u64>,
    pub logic_version: LogicVersion,
}

/// Identity of the party invoking an operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CallContext {
    /// Address of the account originating the call.
    pub sender: Address,
}

impl CallContext {
    #[must_use]
    pub const fn new(sender: Address) -> Self {
        Self { sender }
    }
}

impl From<Address> for CallContext {
    fn from(sender: Address) -> Self {
        Self { sender }
    }
}

// =============================================================================
// TESTS
// =============================================================================
