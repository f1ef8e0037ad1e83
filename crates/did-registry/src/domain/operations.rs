//! # Operations
//!
//! Every mutation a document accepts after registration, as one tagged
//! union. The same value drives authorization (its encoding is the signed
//! payload) and the state transition.
//!
//! ## Signed Payload
//!
//! ```text
//! keccak256( string("did-registry/v1") || did || option(delegate) || tag || fields )
//! ```

use super::codec::{Decodable, Encodable, ZeroCopySink, ZeroCopySource};
use super::ecdsa::keccak256;
use super::entities::ServiceEntry;
use super::value_objects::{Did, Hash, KeyData};
use crate::errors::CodecError;
use serde::{Deserialize, Serialize};

/// Domain separator prefixed to every signed payload.
pub const SIGNING_DOMAIN: &str = "did-registry/v1";

/// A state-changing request against an existing document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    /// Append a non-authentication public key.
    AddKey { key: KeyData, controllers: Vec<Did> },
    /// Grant authentication to an existing public key.
    SetAuthKey { key: KeyData },
    /// Withdraw authentication from a key.
    DeactivateAuthKey { key: KeyData },
    /// `AddKey` followed by `SetAuthKey`.
    AddNewAuthKey { key: KeyData, controllers: Vec<Did> },
    /// Revoke a public key, and its authentication grant if it has one.
    DeactivateKey { key: KeyData },
    AddController { controller: Did },
    RemoveController { controller: Did },
    AddContext { contexts: Vec<String> },
    RemoveContext { contexts: Vec<String> },
    AddService { service: ServiceEntry },
    UpdateService { service: ServiceEntry },
    RemoveService { service_id: String },
    /// Permanently deactivate the document.
    DeactivateId,
}

impl Operation {
    /// Operation name; key operations use the `Addr` spelling when given
    /// an address.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::AddKey { key, .. } if key.is_address() => "AddAddr",
            Self::AddKey { .. } => "AddKey",
            Self::SetAuthKey { key } if key.is_address() => "SetAuthAddr",
            Self::SetAuthKey { .. } => "SetAuthKey",
            Self::DeactivateAuthKey { key } if key.is_address() => "DeactivateAuthAddr",
            Self::DeactivateAuthKey { .. } => "DeactivateAuthKey",
            Self::AddNewAuthKey { key, .. } if key.is_address() => "AddNewAuthAddr",
            Self::AddNewAuthKey { .. } => "AddNewAuthKey",
            Self::DeactivateKey { key } if key.is_address() => "DeactivateAddr",
            Self::DeactivateKey { .. } => "DeactivateKey",
            Self::AddController { .. } => "AddController",
            Self::RemoveController { .. } => "RemoveController",
            Self::AddContext { .. } => "AddContext",
            Self::RemoveContext { .. } => "RemoveContext",
            Self::AddService { .. } => "AddService",
            Self::UpdateService { .. } => "UpdateService",
            Self::RemoveService { .. } => "RemoveService",
            Self::DeactivateId => "DeactivateId",
        }
    }

    /// Size of the list argument, for per-call limits.
    #[must_use]
    pub fn item_count(&self) -> usize {
        match self {
            Self::AddKey { controllers, .. } | Self::AddNewAuthKey { controllers, .. } => {
                controllers.len()
            }
            Self::AddContext { contexts } | Self::RemoveContext { contexts } => contexts.len(),
            _ => 1,
        }
    }

    /// Digest a signer must sign to authorize this operation on `did`,
    /// optionally through the controller `delegate`.
    #[must_use]
    pub fn signing_digest(&self, did: &Did, delegate: Option<&Did>) -> Hash {
        let mut sink = ZeroCopySink::new();
        sink.write_string(SIGNING_DOMAIN);
        did.encode(&mut sink);
        delegate.cloned().encode(&mut sink);
        self.encode(&mut sink);
        keccak256(sink.as_bytes())
    }

    const fn tag(&self) -> u8 {
        match self {
            Self::AddKey { .. } => 1,
            Self::SetAuthKey { .. } => 2,
            Self::DeactivateAuthKey { .. } => 3,
            Self::AddNewAuthKey { .. } => 4,
            Self::DeactivateKey { .. } => 5,
            Self::AddController { .. } => 6,
            Self::RemoveController { .. } => 7,
            Self::AddContext { .. } => 8,
            Self::RemoveContext { .. } => 9,
            Self::AddService { .. } => 10,
            Self::UpdateService { .. } => 11,
            Self::RemoveService { .. } => 12,
            Self::DeactivateId => 13,
        }
    }
}

impl Encodable for Operation {
    fn encode(&self, sink: &mut ZeroCopySink) {
        sink.write_byte(self.tag());
        match self {
            Self::AddKey { key, controllers } | Self::AddNewAuthKey { key, controllers } => {
                key.encode(sink);
                controllers.encode(sink);
            }
            Self::SetAuthKey { key }
            | Self::DeactivateAuthKey { key }
            | Self::DeactivateKey { key } => key.encode(sink),
            Self::AddController { controller } | Self::RemoveController { controller } => {
                controller.encode(sink);
            }
            Self::AddContext { contexts } | Self::RemoveContext { contexts } => {
                contexts.encode(sink);
            }
            Self::AddService { service } | Self::UpdateService { service } => {
                service.encode(sink);
            }
            Self::RemoveService { service_id } => sink.write_string(service_id),
            Self::DeactivateId => {}
        }
    }
}

impl Decodable for Operation {
    fn decode(source: &mut ZeroCopySource<'_>) -> Result<Self, CodecError> {
        let op = match source.read_byte()? {
            1 => Self::AddKey {
                key: KeyData::decode(source)?,
                controllers: Vec::decode(source)?,
            },
            2 => Self::SetAuthKey {
                key: KeyData::decode(source)?,
            },
            3 => Self::DeactivateAuthKey {
                key: KeyData::decode(source)?,
            },
            4 => Self::AddNewAuthKey {
                key: KeyData::decode(source)?,
                controllers: Vec::decode(source)?,
            },
            5 => Self::DeactivateKey {
                key: KeyData::decode(source)?,
            },
            6 => Self::AddController {
                controller: Did::decode(source)?,
            },
            7 => Self::RemoveController {
                controller: Did::decode(source)?,
            },
            8 => Self::AddContext {
                contexts: Vec::decode(source)?,
            },
            9 => Self::RemoveContext {
                contexts: Vec::decode(source)?,
            },
            10 => Self::AddService {
                service: ServiceEntry::decode(source)?,
            },
            11 => Self::UpdateService {
                service: ServiceEntry::decode(source)?,
            },
            12 => Self::RemoveService {
                service_id: source.read_string()?,
            },
            13 => Self::DeactivateId,
            tag => {
                return Err(CodecError::InvalidTag {
                    what: "operation",
                    tag,
                })
            }
        };
        Ok(op)
    }
}

// =============================================================================
// TESTS
// =============================================================================
