//! # Registry Events
//!
//! One event per effective state change. Rejected operations emit nothing,
//! and idempotent no-ops (re-adding a context or controller) emit nothing.
//!
//! | Event | Emitted by |
//! |-------|-----------|
//! | `Register` | registration |
//! | `AddKey` / `AddAddr` | `AddKey` |
//! | `SetAuthKey` / `SetAuthAddr` | `SetAuthKey` |
//! | `DeactivateAuthKey` / `DeactivateAuthAddr` | `DeactivateAuthKey` |
//! | `AddNewAuthKey` / `AddNewAuthAddr` | `AddNewAuthKey` |
//! | `DeactivateKey` / `DeactivateAddr` | `DeactivateKey` |
//! | `AddController` / `RemoveController` | controller set changes |
//! | `AddContext` / `RemoveContext` | once per context actually changed |
//! | `AddService` / `UpdateService` / `RemoveService` | service map changes |
//! | `Deactivate` | `DeactivateId` |

use crate::domain::entities::ServiceEntry;
use crate::domain::value_objects::{Did, KeyData};
use serde::{Deserialize, Serialize};

/// What changed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum EventPayload {
    Register { key: KeyData },
    AddKey { key: KeyData, controllers: Vec<Did> },
    SetAuthKey { key: KeyData, auth_index: u64 },
    DeactivateAuthKey { key: KeyData, auth_index: u64 },
    AddNewAuthKey {
        key: KeyData,
        controllers: Vec<Did>,
        auth_index: u64,
    },
    /// `deactivated_auth_index` is set when the key also lost an auth grant.
    DeactivateKey {
        key: KeyData,
        deactivated_auth_index: Option<u64>,
    },
    AddController { controller: Did },
    RemoveController { controller: Did },
    AddContext { context: String },
    RemoveContext { context: String },
    AddService { service: ServiceEntry },
    UpdateService { service: ServiceEntry },
    RemoveService { service_id: String },
    Deactivate,
}

impl EventPayload {
    /// Event name, with `Addr` spellings for address-form keys.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Register { .. } => "Register",
            Self::AddKey { key, .. } if key.is_address() => "AddAddr",
            Self::AddKey { .. } => "AddKey",
            Self::SetAuthKey { key, .. } if key.is_address() => "SetAuthAddr",
            Self::SetAuthKey { .. } => "SetAuthKey",
            Self::DeactivateAuthKey { key, .. } if key.is_address() => "DeactivateAuthAddr",
            Self::DeactivateAuthKey { .. } => "DeactivateAuthKey",
            Self::AddNewAuthKey { key, .. } if key.is_address() => "AddNewAuthAddr",
            Self::AddNewAuthKey { .. } => "AddNewAuthKey",
            Self::DeactivateKey { key, .. } if key.is_address() => "DeactivateAddr",
            Self::DeactivateKey { .. } => "DeactivateKey",
            Self::AddController { .. } => "AddController",
            Self::RemoveController { .. } => "RemoveController",
            Self::AddContext { .. } => "AddContext",
            Self::RemoveContext { .. } => "RemoveContext",
            Self::AddService { .. } => "AddService",
            Self::UpdateService { .. } => "UpdateService",
            Self::RemoveService { .. } => "RemoveService",
            Self::Deactivate => "Deactivate",
        }
    }
}

/// An event bound to the document it changed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryEvent {
    pub did: Did,
    /// Controller DID through which the change was authorized.
    pub controller: Option<Did>,
    pub payload: EventPayload,
}

impl RegistryEvent {
    #[must_use]
    pub fn new(did: Did, controller: Option<Did>, payload: EventPayload) -> Self {
        Self {
            did,
            controller,
            payload,
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.payload.name()
    }
}
