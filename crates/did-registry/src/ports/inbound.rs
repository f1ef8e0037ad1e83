//! # Driving Ports (API - Inbound)
//!
//! The operation surface of the registry. Both the service and the upgrade
//! proxy implement [`DidRegistryApi`], so callers never see which logic
//! version is serving them.
//!
//! Mutations go through two required entry points, `register` and
//! `execute`; the named operations (`add_key`, `set_auth_addr`,
//! `deactivate_auth_key_by_controller`, ...) are provided methods that
//! build the matching [`Operation`] and [`AuthRequest`].

use crate::domain::auth::{AuthRequest, Proof};
use crate::domain::document::Document;
use crate::domain::entities::{
    AuthKeyView, CallContext, DocumentMetadata, LogicVersion, PublicKeyEntry, ServiceEntry,
};
use crate::domain::operations::Operation;
use crate::domain::value_objects::{Address, Did, Hash, KeyData, PublicKey};
use crate::errors::RegistryError;
use crate::events::RegistryEvent;

// =============================================================================
// RECEIPT
// =============================================================================

/// Result of a committed mutation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Receipt {
    pub did: Did,
    /// Controller through which the call was authorized.
    pub controller: Option<Did>,
    /// Auth key that authorized the call. `None` for registration.
    pub authorized_by: Option<Address>,
    /// Events in emission order. Empty for idempotent no-ops.
    pub events: Vec<RegistryEvent>,
}

impl Receipt {
    /// Names of the emitted events.
    #[must_use]
    pub fn event_names(&self) -> Vec<&'static str> {
        self.events.iter().map(RegistryEvent::name).collect()
    }
}

// =============================================================================
// REGISTRY API (Primary Driving Port)
// =============================================================================

/// Primary API of the DID registry.
///
/// Every mutation is all-or-nothing: on error no slot is written and no
/// event is returned.
pub trait DidRegistryApi: Send {
    /// Create a document for `did` with `key` as its first auth key.
    fn register(
        &mut self,
        ctx: CallContext,
        did: &str,
        key: KeyData,
    ) -> Result<Receipt, RegistryError>;

    /// Authorize `auth` for `op` on `did`, then apply it.
    fn execute(
        &mut self,
        ctx: CallContext,
        did: &str,
        op: Operation,
        auth: AuthRequest,
    ) -> Result<Receipt, RegistryError>;

    /// The full document, deactivated or not.
    fn get_document(&self, did: &str) -> Result<Document, RegistryError>;

    fn get_document_metadata(&self, did: &str) -> Result<DocumentMetadata, RegistryError>;

    /// Codec encoding of the document.
    fn export_document(&self, did: &str) -> Result<Vec<u8>, RegistryError>;

    /// Run the direct or signed check against `did`'s own auth keys.
    fn verify_signature(
        &self,
        caller: Address,
        did: &str,
        proof: &Proof,
        digest: &Hash,
    ) -> Result<bool, RegistryError>;

    /// Run the delegated check: `controller` controls `did` and `proof`
    /// passes against the controller's auth keys.
    fn verify_controller(
        &self,
        caller: Address,
        did: &str,
        controller: &str,
        proof: &Proof,
        digest: &Hash,
    ) -> Result<bool, RegistryError>;

    /// Every registered DID, in registration order.
    fn registered_dids(&self) -> Result<Vec<Did>, RegistryError>;

    fn logic_version(&self) -> LogicVersion;

    // ===== READ QUERIES =====

    /// Non-revoked public keys in insertion order.
    fn get_all_pub_key(&self, did: &str) -> Result<Vec<PublicKeyEntry>, RegistryError> {
        Ok(self.get_document(did)?.active_public_keys())
    }

    /// Active auth keys ordered by auth index.
    fn get_all_auth_key(&self, did: &str) -> Result<Vec<AuthKeyView>, RegistryError> {
        Ok(self.get_document(did)?.active_auth_keys())
    }

    fn get_context(&self, did: &str) -> Result<Vec<String>, RegistryError> {
        Ok(self.get_document(did)?.contexts().to_vec())
    }

    fn get_controller(&self, did: &str) -> Result<Vec<Did>, RegistryError> {
        Ok(self.get_document(did)?.controllers().to_vec())
    }

    fn get_all_service(&self, did: &str) -> Result<Vec<ServiceEntry>, RegistryError> {
        Ok(self.get_document(did)?.services().to_vec())
    }

    // ===== KEY OPERATIONS =====

    fn add_key(
        &mut self,
        ctx: CallContext,
        did: &str,
        key: PublicKey,
        controllers: Vec<Did>,
        auth: AuthRequest,
    ) -> Result<Receipt, RegistryError> {
        let op = Operation::AddKey {
            key: key.into(),
            controllers,
        };
        self.execute(ctx, did, op, auth)
    }

    fn add_addr(
        &mut self,
        ctx: CallContext,
        did: &str,
        addr: Address,
        controllers: Vec<Did>,
        auth: AuthRequest,
    ) -> Result<Receipt, RegistryError> {
        let op = Operation::AddKey {
            key: addr.into(),
            controllers,
        };
        self.execute(ctx, did, op, auth)
    }

    fn set_auth_key(
        &mut self,
        ctx: CallContext,
        did: &str,
        key: PublicKey,
        auth: AuthRequest,
    ) -> Result<Receipt, RegistryError> {
        self.execute(ctx, did, Operation::SetAuthKey { key: key.into() }, auth)
    }

    fn set_auth_addr(
        &mut self,
        ctx: CallContext,
        did: &str,
        addr: Address,
        auth: AuthRequest,
    ) -> Result<Receipt, RegistryError> {
        self.execute(ctx, did, Operation::SetAuthKey { key: addr.into() }, auth)
    }

    fn deactivate_auth_key(
        &mut self,
        ctx: CallContext,
        did: &str,
        key: PublicKey,
        auth: AuthRequest,
    ) -> Result<Receipt, RegistryError> {
        self.execute(ctx, did, Operation::DeactivateAuthKey { key: key.into() }, auth)
    }

    fn deactivate_auth_addr(
        &mut self,
        ctx: CallContext,
        did: &str,
        addr: Address,
        auth: AuthRequest,
    ) -> Result<Receipt, RegistryError> {
        self.execute(ctx, did, Operation::DeactivateAuthKey { key: addr.into() }, auth)
    }

    fn add_new_auth_key(
        &mut self,
        ctx: CallContext,
        did: &str,
        key: PublicKey,
        controllers: Vec<Did>,
        auth: AuthRequest,
    ) -> Result<Receipt, RegistryError> {
        let op = Operation::AddNewAuthKey {
            key: key.into(),
            controllers,
        };
        self.execute(ctx, did, op, auth)
    }

    fn add_new_auth_addr(
        &mut self,
        ctx: CallContext,
        did: &str,
        addr: Address,
        controllers: Vec<Did>,
        auth: AuthRequest,
    ) -> Result<Receipt, RegistryError> {
        let op = Operation::AddNewAuthKey {
            key: addr.into(),
            controllers,
        };
        self.execute(ctx, did, op, auth)
    }

    fn deactivate_key(
        &mut self,
        ctx: CallContext,
        did: &str,
        key: PublicKey,
        auth: AuthRequest,
    ) -> Result<Receipt, RegistryError> {
        self.execute(ctx, did, Operation::DeactivateKey { key: key.into() }, auth)
    }

    fn deactivate_addr(
        &mut self,
        ctx: CallContext,
        did: &str,
        addr: Address,
        auth: AuthRequest,
    ) -> Result<Receipt, RegistryError> {
        self.execute(ctx, did, Operation::DeactivateKey { key: addr.into() }, auth)
    }

    // ===== CONTROLLER-DELEGATED KEY OPERATIONS =====

    fn add_new_auth_key_by_controller(
        &mut self,
        ctx: CallContext,
        did: &str,
        key: PublicKey,
        controllers: Vec<Did>,
        controller: Did,
        proof: Proof,
    ) -> Result<Receipt, RegistryError> {
        let auth = AuthRequest::Delegated { controller, proof };
        self.add_new_auth_key(ctx, did, key, controllers, auth)
    }

    fn add_new_auth_addr_by_controller(
        &mut self,
        ctx: CallContext,
        did: &str,
        addr: Address,
        controllers: Vec<Did>,
        controller: Did,
        proof: Proof,
    ) -> Result<Receipt, RegistryError> {
        let auth = AuthRequest::Delegated { controller, proof };
        self.add_new_auth_addr(ctx, did, addr, controllers, auth)
    }

    fn set_auth_key_by_controller(
        &mut self,
        ctx: CallContext,
        did: &str,
        key: PublicKey,
        controller: Did,
        proof: Proof,
    ) -> Result<Receipt, RegistryError> {
        let auth = AuthRequest::Delegated { controller, proof };
        self.set_auth_key(ctx, did, key, auth)
    }

    fn set_auth_addr_by_controller(
        &mut self,
        ctx: CallContext,
        did: &str,
        addr: Address,
        controller: Did,
        proof: Proof,
    ) -> Result<Receipt, RegistryError> {
        let auth = AuthRequest::Delegated { controller, proof };
        self.set_auth_addr(ctx, did, addr, auth)
    }

    fn deactivate_auth_key_by_controller(
        &mut self,
        ctx: CallContext,
        did: &str,
        key: PublicKey,
        controller: Did,
        proof: Proof,
    ) -> Result<Receipt, RegistryError> {
        let auth = AuthRequest::Delegated { controller, proof };
        self.deactivate_auth_key(ctx, did, key, auth)
    }

    fn deactivate_auth_addr_by_controller(
        &mut self,
        ctx: CallContext,
        did: &str,
        addr: Address,
        controller: Did,
        proof: Proof,
    ) -> Result<Receipt, RegistryError> {
        let auth = AuthRequest::Delegated { controller, proof };
        self.deactivate_auth_addr(ctx, did, addr, auth)
    }

    // ===== CONTROLLERS, CONTEXTS, SERVICES =====

    fn add_controller(
        &mut self,
        ctx: CallContext,
        did: &str,
        controller: Did,
        auth: AuthRequest,
    ) -> Result<Receipt, RegistryError> {
        self.execute(ctx, did, Operation::AddController { controller }, auth)
    }

    fn remove_controller(
        &mut self,
        ctx: CallContext,
        did: &str,
        controller: Did,
        auth: AuthRequest,
    ) -> Result<Receipt, RegistryError> {
        self.execute(ctx, did, Operation::RemoveController { controller }, auth)
    }

    fn add_context(
        &mut self,
        ctx: CallContext,
        did: &str,
        contexts: Vec<String>,
        auth: AuthRequest,
    ) -> Result<Receipt, RegistryError> {
        self.execute(ctx, did, Operation::AddContext { contexts }, auth)
    }

    fn remove_context(
        &mut self,
        ctx: CallContext,
        did: &str,
        contexts: Vec<String>,
        auth: AuthRequest,
    ) -> Result<Receipt, RegistryError> {
        self.execute(ctx, did, Operation::RemoveContext { contexts }, auth)
    }

    fn add_service(
        &mut self,
        ctx: CallContext,
        did: &str,
        service: ServiceEntry,
        auth: AuthRequest,
    ) -> Result<Receipt, RegistryError> {
        self.execute(ctx, did, Operation::AddService { service }, auth)
    }

    fn update_service(
        &mut self,
        ctx: CallContext,
        did: &str,
        service: ServiceEntry,
        auth: AuthRequest,
    ) -> Result<Receipt, RegistryError> {
        self.execute(ctx, did, Operation::UpdateService { service }, auth)
    }

    fn remove_service(
        &mut self,
        ctx: CallContext,
        did: &str,
        service_id: String,
        auth: AuthRequest,
    ) -> Result<Receipt, RegistryError> {
        self.execute(ctx, did, Operation::RemoveService { service_id }, auth)
    }

    /// Permanently deactivate `did`.
    fn deactivate_id(
        &mut self,
        ctx: CallContext,
        did: &str,
        auth: AuthRequest,
    ) -> Result<Receipt, RegistryError> {
        self.execute(ctx, did, Operation::DeactivateId, auth)
    }
}
