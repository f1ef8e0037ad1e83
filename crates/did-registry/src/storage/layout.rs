//! # Slot Layout
//!
//! Every slot key is a sequence of length-prefixed parts, so no two
//! distinct part lists produce the same key.
//!
//! | Slot | Parts | Value |
//! |------|-------|-------|
//! | document meta | `doc`, did, `meta` | deactivated flag + next auth index |
//! | public keys | `doc`, did, `pubkeys` | encoded `Vec<PublicKeyEntry>` |
//! | auth keys | `doc`, did, `authkeys` | encoded `Vec<AuthKeyEntry>` |
//! | controllers | `doc`, did, `controllers` | enumerable map namespace |
//! | contexts | `doc`, did, `contexts` | enumerable map namespace |
//! | services | `doc`, did, `services` | enumerable map namespace |
//! | registry index | `registry`, `dids` | enumerable map namespace |
//! | version id | `v2`, did, `version` | `u64` |
//! | proxy version | `proxy`, `version` | string |
//! | proxy history | `proxy`, `history` | enumerable map namespace |
//!
//! New logic versions add fields under fresh leading parts (like `v2`)
//! rather than changing existing slots.

use crate::domain::value_objects::Did;
use crate::domain::codec::ZeroCopySink;

/// Build a slot key from its parts.
pub fn slot_key(parts: &[&[u8]]) -> Vec<u8> {
    let mut sink = ZeroCopySink::with_capacity(parts.iter().map(|p| p.len() + 1).sum());
    for part in parts {
        sink.write_bytes(part);
    }
    sink.into_bytes()
}

/// Slot keys and namespaces used by the registry.
pub struct SlotKeys;

impl SlotKeys {
    fn doc(did: &Did, field: &[u8]) -> Vec<u8> {
        slot_key(&[b"doc", did.as_str().as_bytes(), field])
    }

    pub fn meta(did: &Did) -> Vec<u8> {
        Self::doc(did, b"meta")
    }

    pub fn public_keys(did: &Did) -> Vec<u8> {
        Self::doc(did, b"pubkeys")
    }

    pub fn auth_keys(did: &Did) -> Vec<u8> {
        Self::doc(did, b"authkeys")
    }

    pub fn controllers(did: &Did) -> Vec<u8> {
        Self::doc(did, b"controllers")
    }

    pub fn contexts(did: &Did) -> Vec<u8> {
        Self::doc(did, b"contexts")
    }

    pub fn services(did: &Did) -> Vec<u8> {
        Self::doc(did, b"services")
    }

    pub fn registry_index() -> Vec<u8> {
        slot_key(&[b"registry", b"dids"])
    }

    /// Per-document version counter introduced by the second logic version.
    pub fn version_id(did: &Did) -> Vec<u8> {
        slot_key(&[b"v2", did.as_str().as_bytes(), b"version"])
    }

    pub fn proxy_version() -> Vec<u8> {
        slot_key(&[b"proxy", b"version"])
    }

    pub fn proxy_history() -> Vec<u8> {
        slot_key(&[b"proxy", b"history"])
    }
}
