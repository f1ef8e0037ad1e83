//! # DID Registry
//!
//! A registry of decentralized identifier documents over a generic
//! key/value slot store. Each document holds public keys, authentication
//! keys, controllers, contexts and service endpoints, and changes only
//! through authorized operations that commit atomically.
//!
//! ## Layout
//!
//! | Layer | Location | Purpose |
//! |-------|----------|---------|
//! | Domain | `domain/` | codec, identity, ECDSA recovery, authorization, document state machine |
//! | Storage | `storage/` | slot layout, enumerable maps, write overlay, document repository |
//! | Ports | `ports/` | `DidRegistryApi` (inbound), `SlotStore` (outbound) |
//! | Adapters | `adapters/` | in-memory, file-backed and shared stores, upgrade proxy |
//! | Service | `service.rs` | transaction pipeline, stats, logging |
//!
//! ## Authorization Modes
//!
//! | Mode | Request | Checked against |
//! |------|---------|-----------------|
//! | Direct | `AuthRequest::Direct` | caller address, target's auth keys |
//! | Signed | `AuthRequest::Signed` | recovered signer, target's auth keys |
//! | Delegated | `AuthRequest::Delegated` | caller or signer, controller's auth keys |
//!
//! ## Usage Example
//!
//! ```ignore
//! use did_registry::prelude::*;
//!
//! let mut registry = DidRegistryService::with_defaults(InMemorySlotStore::new());
//! registry.register(CallContext::new(owner), "did:example:alice", key.into())?;
//! registry.add_context(
//!     CallContext::new(owner),
//!     "did:example:alice",
//!     vec!["https://example.org/ctx".into()],
//!     AuthRequest::Direct,
//! )?;
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

// =============================================================================
// MODULES
// =============================================================================

pub mod adapters;
pub mod config;
pub mod domain;
pub mod errors;
pub mod events;
pub mod ports;
pub mod service;
pub mod storage;

// =============================================================================
// PRELUDE
// =============================================================================

/// Convenient re-exports for common usage.
pub mod prelude {
    // Domain
    pub use crate::domain::auth::{AuthRequest, Proof, SignedProof};
    pub use crate::domain::codec::{Decodable, Encodable};
    pub use crate::domain::document::Document;
    pub use crate::domain::ecdsa::{keccak256, sign_digest, RecoverableSignature};
    pub use crate::domain::entities::{
        AuthKeyView, CallContext, DocumentMetadata, KeyType, LogicVersion, PublicKeyEntry,
        ServiceEntry,
    };
    pub use crate::domain::identity::{canonicalize, derive_address, verify_did_format};
    pub use crate::domain::operations::Operation;
    pub use crate::domain::value_objects::{Address, Did, Hash, KeyData, PublicKey};

    // Ports
    pub use crate::ports::inbound::{DidRegistryApi, Receipt};
    pub use crate::ports::outbound::{BatchOperation, SlotStore};

    // Events
    pub use crate::events::{EventPayload, RegistryEvent};

    // Errors
    pub use crate::errors::{AuthFailure, CodecError, ConfigError, RegistryError, StoreError};

    // Adapters
    pub use crate::adapters::{FileBackedSlotStore, InMemorySlotStore, SharedSlotStore, UpgradeProxy};

    // Service
    pub use crate::config::RegistryConfig;
    pub use crate::service::{DidRegistryService, ServiceStats};
}

// =============================================================================
// CRATE INFO
// =============================================================================

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
