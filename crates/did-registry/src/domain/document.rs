//! # DID Document State Machine
//!
//! The document aggregate and every transition it accepts.
//!
//! ## Invariants
//!
//! | Invariant | Enforcement |
//! |-----------|-------------|
//! | Every auth entry references a public key of the same document | `set_auth_key()`, `decode()` |
//! | `next_auth_index` exceeds every issued auth index | `set_auth_key()`, `decode()` |
//! | At least one active auth key while the document is active | `deactivate_auth_key()`, `deactivate_key()` |
//! | A deactivated document rejects every mutation | `apply()` |
//! | Public key entries are never removed | no removal path exists |
//!
//! [`Document::apply`] is all-or-nothing: the transition runs on a copy
//! and replaces `self` only on success.
//!
//! Key membership is decided by derived address, so a public key and its
//! own address name the same entry.

use super::codec::{Decodable, Encodable, ZeroCopySink, ZeroCopySource};
use super::entities::{AuthKeyEntry, AuthKeyView, PublicKeyEntry, ServiceEntry};
use super::operations::Operation;
use super::value_objects::{Address, Did, KeyData};
use crate::errors::{CodecError, RegistryError};
use crate::events::EventPayload;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Auth index issued to the registration key.
pub const FIRST_AUTH_INDEX: u64 = 1;

/// The identity record stored under one DID.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub(crate) did: Did,
    pub(crate) public_keys: Vec<PublicKeyEntry>,
    pub(crate) auth_keys: Vec<AuthKeyEntry>,
    pub(crate) controllers: Vec<Did>,
    pub(crate) contexts: Vec<String>,
    pub(crate) services: Vec<ServiceEntry>,
    pub(crate) deactivated: bool,
    pub(crate) next_auth_index: u64,
}

impl Document {
    // =========================================================================
    // CREATION
    // =========================================================================

    /// A fresh document: `key` as the default public key and first auth
    /// key, plus the default context.
    pub fn register(did: Did, key: KeyData, default_context: &str) -> (Self, EventPayload) {
        let doc = Self {
            did,
            public_keys: vec![PublicKeyEntry::new(key, Vec::new())],
            auth_keys: vec![AuthKeyEntry {
                key_index: 0,
                auth_index: FIRST_AUTH_INDEX,
                is_active: true,
            }],
            controllers: Vec::new(),
            contexts: vec![default_context.to_owned()],
            services: Vec::new(),
            deactivated: false,
            next_auth_index: FIRST_AUTH_INDEX + 1,
        };
        (doc, EventPayload::Register { key })
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    pub fn did(&self) -> &Did {
        &self.did
    }

    pub fn is_deactivated(&self) -> bool {
        self.deactivated
    }

    /// Every public key entry ever added, revoked ones included.
    pub fn public_keys(&self) -> &[PublicKeyEntry] {
        &self.public_keys
    }

    /// Every auth grant ever issued, inactive ones included.
    pub fn auth_keys(&self) -> &[AuthKeyEntry] {
        &self.auth_keys
    }

    pub fn controllers(&self) -> &[Did] {
        &self.controllers
    }

    pub fn contexts(&self) -> &[String] {
        &self.contexts
    }

    pub fn services(&self) -> &[ServiceEntry] {
        &self.services
    }

    pub fn next_auth_index(&self) -> u64 {
        self.next_auth_index
    }

    /// Non-revoked public keys, in insertion order.
    pub fn active_public_keys(&self) -> Vec<PublicKeyEntry> {
        self.public_keys
            .iter()
            .filter(|entry| entry.is_active)
            .cloned()
            .collect()
    }

    /// Active authentication keys by increasing auth index.
    pub fn active_auth_keys(&self) -> Vec<AuthKeyView> {
        let mut views: Vec<AuthKeyView> = self
            .auth_keys
            .iter()
            .filter(|auth| auth.is_active)
            .filter_map(|auth| {
                let entry = self.public_keys.get(auth.key_index as usize)?;
                Some(AuthKeyView {
                    key: entry.key,
                    key_type: entry.key_type,
                    controllers: entry.controllers.clone(),
                    auth_index: auth.auth_index,
                })
            })
            .collect();
        views.sort_by_key(|view| view.auth_index);
        views
    }

    /// True if `address` is an active authentication key.
    pub fn is_auth_key(&self, address: &Address) -> bool {
        self.find_key(address)
            .is_some_and(|index| self.active_auth_position(index).is_some())
    }

    pub fn has_controller(&self, controller: &Did) -> bool {
        self.controllers.contains(controller)
    }

    pub fn service(&self, service_id: &str) -> Option<&ServiceEntry> {
        self.services.iter().find(|s| s.service_id == service_id)
    }

    fn find_key(&self, address: &Address) -> Option<usize> {
        self.public_keys
            .iter()
            .position(|entry| entry.address() == *address)
    }

    fn active_auth_position(&self, key_index: usize) -> Option<usize> {
        self.auth_keys
            .iter()
            .position(|auth| auth.is_active && auth.key_index as usize == key_index)
    }

    fn active_auth_count(&self) -> usize {
        self.auth_keys.iter().filter(|auth| auth.is_active).count()
    }

    // =========================================================================
    // TRANSITIONS
    // =========================================================================

    /// Apply `op`, returning one event per effective change.
    ///
    /// On error the document is left untouched.
    pub fn apply(&mut self, op: &Operation) -> Result<Vec<EventPayload>, RegistryError> {
        if self.deactivated {
            return Err(RegistryError::Deactivated(self.did.clone()));
        }
        let mut next = self.clone();
        let events = next.transition(op)?;
        *self = next;
        Ok(events)
    }

    fn transition(&mut self, op: &Operation) -> Result<Vec<EventPayload>, RegistryError> {
        match op {
            Operation::AddKey { key, controllers } => {
                self.add_key(*key, controllers)?;
                Ok(vec![EventPayload::AddKey {
                    key: *key,
                    controllers: controllers.clone(),
                }])
            }
            Operation::SetAuthKey { key } => {
                let auth_index = self.set_auth_key(key)?;
                Ok(vec![EventPayload::SetAuthKey {
                    key: *key,
                    auth_index,
                }])
            }
            Operation::DeactivateAuthKey { key } => {
                let auth_index = self.deactivate_auth_key(key)?;
                Ok(vec![EventPayload::DeactivateAuthKey {
                    key: *key,
                    auth_index,
                }])
            }
            Operation::AddNewAuthKey { key, controllers } => {
                self.add_key(*key, controllers)?;
                let auth_index = self.set_auth_key(key)?;
                Ok(vec![EventPayload::AddNewAuthKey {
                    key: *key,
                    controllers: controllers.clone(),
                    auth_index,
                }])
            }
            Operation::DeactivateKey { key } => {
                let deactivated_auth_index = self.deactivate_key(key)?;
                Ok(vec![EventPayload::DeactivateKey {
                    key: *key,
                    deactivated_auth_index,
                }])
            }
            Operation::AddController { controller } => Ok(self
                .add_controller(controller)?
                .then(|| EventPayload::AddController {
                    controller: controller.clone(),
                })
                .into_iter()
                .collect()),
            Operation::RemoveController { controller } => {
                self.remove_controller(controller)?;
                Ok(vec![EventPayload::RemoveController {
                    controller: controller.clone(),
                }])
            }
            Operation::AddContext { contexts } => Ok(self
                .add_contexts(contexts)?
                .into_iter()
                .map(|context| EventPayload::AddContext { context })
                .collect()),
            Operation::RemoveContext { contexts } => Ok(self
                .remove_contexts(contexts)?
                .into_iter()
                .map(|context| EventPayload::RemoveContext { context })
                .collect()),
            Operation::AddService { service } => {
                self.add_service(service)?;
                Ok(vec![EventPayload::AddService {
                    service: service.clone(),
                }])
            }
            Operation::UpdateService { service } => {
                self.update_service(service)?;
                Ok(vec![EventPayload::UpdateService {
                    service: service.clone(),
                }])
            }
            Operation::RemoveService { service_id } => {
                self.remove_service(service_id)?;
                Ok(vec![EventPayload::RemoveService {
                    service_id: service_id.clone(),
                }])
            }
            Operation::DeactivateId => {
                self.deactivated = true;
                Ok(vec![EventPayload::Deactivate])
            }
        }
    }

    fn add_key(&mut self, key: KeyData, controllers: &[Did]) -> Result<(), RegistryError> {
        if let Some(index) = self.find_key(&key.address()) {
            return Err(if self.public_keys[index].is_active {
                RegistryError::DuplicateKey(key.to_string())
            } else {
                RegistryError::KeyRevoked(key.to_string())
            });
        }
        let mut unique: Vec<Did> = Vec::with_capacity(controllers.len());
        for controller in controllers {
            if !unique.contains(controller) {
                unique.push(controller.clone());
            }
        }
        self.public_keys.push(PublicKeyEntry::new(key, unique));
        Ok(())
    }

    fn set_auth_key(&mut self, key: &KeyData) -> Result<u64, RegistryError> {
        let index = self
            .find_key(&key.address())
            .ok_or_else(|| RegistryError::NotFound(format!("public key {key}")))?;
        if !self.public_keys[index].is_active {
            return Err(RegistryError::KeyRevoked(key.to_string()));
        }
        if self.active_auth_position(index).is_some() {
            return Err(RegistryError::AlreadyActive(format!("auth key {key}")));
        }
        let key_index = u32::try_from(index)
            .map_err(|_| RegistryError::InvalidArgument("public key list is full".into()))?;
        let auth_index = self.next_auth_index;
        self.auth_keys.push(AuthKeyEntry {
            key_index,
            auth_index,
            is_active: true,
        });
        self.next_auth_index += 1;
        Ok(auth_index)
    }

    fn deactivate_auth_key(&mut self, key: &KeyData) -> Result<u64, RegistryError> {
        let index = self
            .find_key(&key.address())
            .ok_or_else(|| RegistryError::NotFound(format!("public key {key}")))?;
        let position = self
            .active_auth_position(index)
            .ok_or_else(|| RegistryError::AlreadyInactive(format!("auth key {key}")))?;
        if self.active_auth_count() == 1 {
            return Err(RegistryError::LastAuthKey(self.did.clone()));
        }
        let auth = &mut self.auth_keys[position];
        auth.is_active = false;
        Ok(auth.auth_index)
    }

    fn deactivate_key(&mut self, key: &KeyData) -> Result<Option<u64>, RegistryError> {
        let index = self
            .find_key(&key.address())
            .ok_or_else(|| RegistryError::NotFound(format!("public key {key}")))?;
        if index == 0 {
            return Err(RegistryError::DefaultKey(self.did.clone()));
        }
        if !self.public_keys[index].is_active {
            return Err(RegistryError::AlreadyInactive(format!("public key {key}")));
        }
        let auth_index = match self.active_auth_position(index) {
            Some(_) if self.active_auth_count() == 1 => {
                return Err(RegistryError::LastAuthKey(self.did.clone()));
            }
            Some(position) => {
                let auth = &mut self.auth_keys[position];
                auth.is_active = false;
                Some(auth.auth_index)
            }
            None => None,
        };
        self.public_keys[index].is_active = false;
        Ok(auth_index)
    }

    /// Returns false when the controller was already present.
    fn add_controller(&mut self, controller: &Did) -> Result<bool, RegistryError> {
        if *controller == self.did {
            return Err(RegistryError::InvalidArgument(
                "a document cannot control itself".into(),
            ));
        }
        if self.controllers.contains(controller) {
            return Ok(false);
        }
        self.controllers.push(controller.clone());
        Ok(true)
    }

    fn remove_controller(&mut self, controller: &Did) -> Result<(), RegistryError> {
        let position = self
            .controllers
            .iter()
            .position(|c| c == controller)
            .ok_or_else(|| RegistryError::NotFound(format!("controller {controller}")))?;
        self.controllers.swap_remove(position);
        Ok(())
    }

    /// Returns the contexts actually added.
    fn add_contexts(&mut self, contexts: &[String]) -> Result<Vec<String>, RegistryError> {
        if contexts.iter().any(String::is_empty) {
            return Err(RegistryError::InvalidArgument("empty context".into()));
        }
        let mut added = Vec::new();
        for context in contexts {
            if !self.contexts.contains(context) {
                self.contexts.push(context.clone());
                added.push(context.clone());
            }
        }
        Ok(added)
    }

    /// Every listed context must be present; returns the distinct ones removed.
    fn remove_contexts(&mut self, contexts: &[String]) -> Result<Vec<String>, RegistryError> {
        if let Some(missing) = contexts.iter().find(|c| !self.contexts.contains(c)) {
            return Err(RegistryError::UnknownContext(missing.clone()));
        }
        let mut removed = Vec::new();
        for context in contexts {
            if let Some(position) = self.contexts.iter().position(|c| c == context) {
                self.contexts.swap_remove(position);
                removed.push(context.clone());
            }
        }
        Ok(removed)
    }

    fn add_service(&mut self, service: &ServiceEntry) -> Result<(), RegistryError> {
        if service.service_id.is_empty() {
            return Err(RegistryError::InvalidArgument("empty service id".into()));
        }
        if self.service(&service.service_id).is_some() {
            return Err(RegistryError::DuplicateServiceId(service.service_id.clone()));
        }
        self.services.push(service.clone());
        Ok(())
    }

    fn update_service(&mut self, service: &ServiceEntry) -> Result<(), RegistryError> {
        let existing = self
            .services
            .iter_mut()
            .find(|s| s.service_id == service.service_id)
            .ok_or_else(|| RegistryError::UnknownServiceId(service.service_id.clone()))?;
        *existing = service.clone();
        Ok(())
    }

    fn remove_service(&mut self, service_id: &str) -> Result<(), RegistryError> {
        let position = self
            .services
            .iter()
            .position(|s| s.service_id == service_id)
            .ok_or_else(|| RegistryError::UnknownServiceId(service_id.to_owned()))?;
        self.services.swap_remove(position);
        Ok(())
    }

    // =========================================================================
    // RENDERING
    // =========================================================================

    fn key_fragment(&self, key_index: usize) -> String {
        format!("{}#keys-{}", self.did, key_index + 1)
    }

    /// W3C-style JSON rendering of the active document state.
    pub fn to_json(&self) -> Value {
        let verification_methods: Vec<Value> = self
            .public_keys
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.is_active)
            .map(|(index, entry)| {
                let mut method = json!({
                    "id": self.key_fragment(index),
                    "type": entry.key_type.label(),
                    "controller": self.did,
                });
                match entry.key {
                    KeyData::PublicKey(key) => method["publicKeyHex"] = json!(key.to_hex()),
                    KeyData::Address(addr) => method["ethereumAddress"] = json!(addr),
                }
                method
            })
            .collect();

        let mut auth: Vec<&AuthKeyEntry> =
            self.auth_keys.iter().filter(|auth| auth.is_active).collect();
        auth.sort_by_key(|auth| auth.auth_index);
        let authentication: Vec<String> = auth
            .iter()
            .map(|auth| self.key_fragment(auth.key_index as usize))
            .collect();

        let services: Vec<Value> = self
            .services
            .iter()
            .map(|service| {
                json!({
                    "id": format!("{}#{}", self.did, service.service_id),
                    "type": service.service_type,
                    "serviceEndpoint": service.service_endpoint,
                })
            })
            .collect();

        let mut doc = json!({
            "@context": self.contexts,
            "id": self.did,
            "controller": self.controllers,
            "verificationMethod": verification_methods,
            "authentication": authentication,
            "service": services,
        });
        if self.deactivated {
            doc["deactivated"] = json!(true);
        }
        doc
    }
}

// =============================================================================
// CODEC
// =============================================================================

impl Encodable for Document {
    fn encode(&self, sink: &mut ZeroCopySink) {
        self.did.encode(sink);
        self.public_keys.encode(sink);
        self.auth_keys.encode(sink);
        self.controllers.encode(sink);
        self.contexts.encode(sink);
        self.services.encode(sink);
        sink.write_bool(self.deactivated);
        sink.write_u64(self.next_auth_index);
    }
}

impl Decodable for Document {
    fn decode(source: &mut ZeroCopySource<'_>) -> Result<Self, CodecError> {
        let doc = Self {
            did: Did::decode(source)?,
            public_keys: Vec::decode(source)?,
            auth_keys: Vec::decode(source)?,
            controllers: Vec::decode(source)?,
            contexts: Vec::decode(source)?,
            services: Vec::decode(source)?,
            deactivated: source.read_bool()?,
            next_auth_index: source.read_u64()?,
        };
        doc.check_references()?;
        Ok(doc)
    }
}

impl Document {
    /// Auth entries must point at existing keys and sit below the counter.
    pub(crate) fn check_references(&self) -> Result<(), CodecError> {
        for auth in &self.auth_keys {
            if auth.key_index as usize >= self.public_keys.len() {
                return Err(CodecError::InvalidValue {
                    what: "auth key",
                    reason: format!("key index {} out of range", auth.key_index),
                });
            }
            if auth.auth_index >= self.next_auth_index {
                return Err(CodecError::InvalidValue {
                    what: "auth key",
                    reason: format!(
                        "auth index {} not below counter {}",
                        auth.auth_index, self.next_auth_index
                    ),
                });
            }
        }
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
