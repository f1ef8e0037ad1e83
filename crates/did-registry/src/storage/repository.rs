//! # Document Repository
//!
//! Reconstructs documents from slots and writes them back, touching only
//! the slots whose content changed.

use super::enumerable::{corrupted, read_u64, EnumerableMap};
use super::layout::SlotKeys;
use super::overlay::WriteOverlay;
use crate::domain::codec::{Decodable, Encodable, ZeroCopySink, ZeroCopySource};
use crate::domain::document::Document;
use crate::domain::entities::{AuthKeyEntry, PublicKeyEntry, ServiceEntry};
use crate::domain::value_objects::Did;
use crate::errors::{CodecError, StoreError};
use crate::ports::outbound::SlotStore;
use tracing::debug;

/// Fields kept in the document meta slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DocumentMeta {
    deactivated: bool,
    next_auth_index: u64,
}

impl Encodable for DocumentMeta {
    fn encode(&self, sink: &mut ZeroCopySink) {
        sink.write_bool(self.deactivated);
        sink.write_u64(self.next_auth_index);
    }
}

impl Decodable for DocumentMeta {
    fn decode(source: &mut ZeroCopySource<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            deactivated: source.read_bool()?,
            next_auth_index: source.read_u64()?,
        })
    }
}

fn decode_slot<T: Decodable>(bytes: &[u8], what: &str) -> Result<T, StoreError> {
    T::from_bytes(bytes).map_err(|e| corrupted(&format!("{what}: {e}")))
}

/// Slot-level persistence of documents.
pub struct DocumentRepository;

impl DocumentRepository {
    fn registry() -> EnumerableMap {
        EnumerableMap::new(SlotKeys::registry_index())
    }

    fn controllers(did: &Did) -> EnumerableMap {
        EnumerableMap::new(SlotKeys::controllers(did))
    }

    fn contexts(did: &Did) -> EnumerableMap {
        EnumerableMap::new(SlotKeys::contexts(did))
    }

    fn services(did: &Did) -> EnumerableMap {
        EnumerableMap::new(SlotKeys::services(did))
    }

    /// True if a document exists for `did`.
    pub fn exists<S: SlotStore + ?Sized>(
        slots: &WriteOverlay<'_, S>,
        did: &Did,
    ) -> Result<bool, StoreError> {
        slots.exists(&SlotKeys::meta(did))
    }

    /// Load the document for `did`, if registered.
    pub fn load<S: SlotStore + ?Sized>(
        slots: &WriteOverlay<'_, S>,
        did: &Did,
    ) -> Result<Option<Document>, StoreError> {
        let Some(meta_bytes) = slots.get(&SlotKeys::meta(did))? else {
            return Ok(None);
        };
        let meta: DocumentMeta = decode_slot(&meta_bytes, "meta")?;

        let public_keys: Vec<PublicKeyEntry> = match slots.get(&SlotKeys::public_keys(did))? {
            Some(bytes) => decode_slot(&bytes, "public keys")?,
            None => return Err(corrupted("document without public keys")),
        };
        let auth_keys: Vec<AuthKeyEntry> = match slots.get(&SlotKeys::auth_keys(did))? {
            Some(bytes) => decode_slot(&bytes, "auth keys")?,
            None => return Err(corrupted("document without auth keys")),
        };

        let controllers = Self::controllers(did)
            .keys(slots)?
            .into_iter()
            .map(|key| {
                let raw = String::from_utf8(key).map_err(|_| corrupted("controller not utf-8"))?;
                Did::parse(&raw).map_err(|e| corrupted(&e.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let contexts = Self::contexts(did)
            .keys(slots)?
            .into_iter()
            .map(|key| String::from_utf8(key).map_err(|_| corrupted("context not utf-8")))
            .collect::<Result<Vec<_>, _>>()?;

        let services = Self::services(did)
            .entries(slots)?
            .into_iter()
            .map(|(_, value)| decode_slot::<ServiceEntry>(&value, "service"))
            .collect::<Result<Vec<_>, _>>()?;

        let doc = Document {
            did: did.clone(),
            public_keys,
            auth_keys,
            controllers,
            contexts,
            services,
            deactivated: meta.deactivated,
            next_auth_index: meta.next_auth_index,
        };
        doc.check_references()
            .map_err(|e| corrupted(&e.to_string()))?;
        Ok(Some(doc))
    }

    /// Write `doc`, diffing against `previous` (`None` for a new document).
    pub fn save<S: SlotStore + ?Sized>(
        slots: &mut WriteOverlay<'_, S>,
        previous: Option<&Document>,
        doc: &Document,
    ) -> Result<(), StoreError> {
        let did = doc.did();
        let before = slots.pending();

        let meta = DocumentMeta {
            deactivated: doc.deactivated,
            next_auth_index: doc.next_auth_index,
        };
        let old_meta = previous.map(|p| DocumentMeta {
            deactivated: p.deactivated,
            next_auth_index: p.next_auth_index,
        });
        if old_meta != Some(meta) {
            slots.put(SlotKeys::meta(did), meta.to_bytes());
        }
        if previous.map(|p| &p.public_keys) != Some(&doc.public_keys) {
            slots.put(SlotKeys::public_keys(did), doc.public_keys.to_bytes());
        }
        if previous.map(|p| &p.auth_keys) != Some(&doc.auth_keys) {
            slots.put(SlotKeys::auth_keys(did), doc.auth_keys.to_bytes());
        }

        if previous.map(|p| &p.controllers) != Some(&doc.controllers) {
            let target: Vec<(Vec<u8>, Vec<u8>)> = doc
                .controllers
                .iter()
                .map(|c| (c.as_str().as_bytes().to_vec(), Vec::new()))
                .collect();
            Self::controllers(did).sync(slots, &target)?;
        }
        if previous.map(|p| &p.contexts) != Some(&doc.contexts) {
            let target: Vec<(Vec<u8>, Vec<u8>)> = doc
                .contexts
                .iter()
                .map(|c| (c.as_bytes().to_vec(), Vec::new()))
                .collect();
            Self::contexts(did).sync(slots, &target)?;
        }
        if previous.map(|p| &p.services) != Some(&doc.services) {
            let target: Vec<(Vec<u8>, Vec<u8>)> = doc
                .services
                .iter()
                .map(|s| (s.service_id.as_bytes().to_vec(), s.to_bytes()))
                .collect();
            Self::services(did).sync(slots, &target)?;
        }

        if previous.is_none() {
            Self::registry().set(slots, did.as_str().as_bytes(), &[])?;
        }

        debug!(did = %did, slots = slots.pending() - before, "staged document writes");
        Ok(())
    }

    /// Every registered DID, in registration order.
    pub fn list_dids<S: SlotStore + ?Sized>(
        slots: &WriteOverlay<'_, S>,
    ) -> Result<Vec<Did>, StoreError> {
        Self::registry()
            .keys(slots)?
            .into_iter()
            .map(|key| {
                let raw = String::from_utf8(key).map_err(|_| corrupted("did not utf-8"))?;
                Did::parse(&raw).map_err(|e| corrupted(&e.to_string()))
            })
            .collect()
    }

    /// Version counter, if any version-tracking logic has written one.
    pub fn version_id<S: SlotStore + ?Sized>(
        slots: &WriteOverlay<'_, S>,
        did: &Did,
    ) -> Result<Option<u64>, StoreError> {
        read_u64(slots, &SlotKeys::version_id(did))
    }

    /// Increment the version counter, returning the new value.
    pub fn bump_version<S: SlotStore + ?Sized>(
        slots: &mut WriteOverlay<'_, S>,
        did: &Did,
    ) -> Result<u64, StoreError> {
        let next = Self::version_id(slots, did)?.unwrap_or(0) + 1;
        slots.put(SlotKeys::version_id(did), next.to_bytes());
        Ok(next)
    }
}
