//! # DID Registry Service
//!
//! Runs every operation as one transaction over the slot store:
//!
//! 1. Parse the DID and check list limits
//! 2. Load the target (and, when delegated, the controller) document
//! 3. Authorize against the operation's signing digest
//! 4. Apply the transition to a copy of the document
//! 5. Stage the changed slots in a write overlay
//! 6. Commit the overlay with a single `atomic_batch_write`
//!
//! Any error before step 6 drops the overlay, so a rejected call writes
//! nothing and returns no events.

use crate::config::RegistryConfig;
use crate::domain::auth::{
    authorize, check_proof, check_registration_binding, AuthContext, AuthRequest, Proof,
};
use crate::domain::document::Document;
use crate::domain::entities::{CallContext, DocumentMetadata, LogicVersion};
use crate::domain::operations::Operation;
use crate::domain::value_objects::{Address, Did, Hash, KeyData};
use crate::errors::{ConfigError, RegistryError};
use crate::events::RegistryEvent;
use crate::ports::inbound::{DidRegistryApi, Receipt};
use crate::ports::outbound::SlotStore;
use crate::storage::{DocumentRepository, WriteOverlay};
use tracing::{debug, info, instrument, warn};

/// Counters kept by a running service.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ServiceStats {
    /// Operations committed, registrations included.
    pub operations_committed: u64,
    /// Calls refused by the authorization engine.
    pub rejected_authorizations: u64,
    /// Calls that failed for any other reason.
    pub failed_operations: u64,
    /// Events returned by committed operations.
    pub events_emitted: u64,
}

/// The registry logic over one slot store.
pub struct DidRegistryService<S: SlotStore> {
    config: RegistryConfig,
    store: S,
    stats: ServiceStats,
}

impl<S: SlotStore> DidRegistryService<S> {
    /// Create a service, rejecting an invalid configuration.
    pub fn new(store: S, config: RegistryConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        info!(
            logic = config.logic_version.tag(),
            bind_address_dids = config.bind_address_dids,
            "DID registry service created"
        );
        Ok(Self {
            config,
            store,
            stats: ServiceStats::default(),
        })
    }

    /// Create a service with the default configuration.
    pub fn with_defaults(store: S) -> Self {
        Self {
            config: RegistryConfig::default(),
            store,
            stats: ServiceStats::default(),
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    pub fn stats(&self) -> ServiceStats {
        self.stats
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Release the underlying store.
    pub fn into_store(self) -> S {
        self.store
    }

    fn record(&mut self, result: &Result<Receipt, RegistryError>) {
        match result {
            Ok(receipt) => {
                self.stats.operations_committed += 1;
                self.stats.events_emitted += receipt.events.len() as u64;
            }
            Err(e) if e.is_auth_rejection() => self.stats.rejected_authorizations += 1,
            Err(_) => self.stats.failed_operations += 1,
        }
    }

    fn load(&self, did: &Did) -> Result<Document, RegistryError> {
        let slots = WriteOverlay::new(&self.store);
        DocumentRepository::load(&slots, did)?
            .ok_or_else(|| RegistryError::NotFound(did.to_string()))
    }

    fn try_register(&mut self, did: &str, key: KeyData) -> Result<Receipt, RegistryError> {
        let did = Did::parse(did)?;
        let mut slots = WriteOverlay::new(&self.store);

        if DocumentRepository::exists(&slots, &did)? {
            return Err(RegistryError::AlreadyRegistered(did));
        }
        if self.config.bind_address_dids {
            check_registration_binding(&did, &key)?;
        }

        let (doc, payload) = Document::register(did.clone(), key, &self.config.default_context);
        DocumentRepository::save(&mut slots, None, &doc)?;
        if self.config.logic_version.tracks_versions() {
            DocumentRepository::bump_version(&mut slots, &did)?;
        }

        let batch = slots.into_batch();
        debug!(did = %did, writes = batch.len(), "committing registration");
        self.store.atomic_batch_write(batch)?;

        Ok(Receipt {
            events: vec![RegistryEvent::new(did.clone(), None, payload)],
            did,
            controller: None,
            authorized_by: None,
        })
    }

    fn try_execute(
        &mut self,
        ctx: CallContext,
        did: &str,
        op: &Operation,
        auth: &AuthRequest,
    ) -> Result<Receipt, RegistryError> {
        let did = Did::parse(did)?;
        let max = self.config.max_items_per_call;
        if op.item_count() > max {
            return Err(RegistryError::TooManyItems {
                got: op.item_count(),
                max,
            });
        }

        let mut slots = WriteOverlay::new(&self.store);
        let previous = DocumentRepository::load(&slots, &did)?
            .ok_or_else(|| RegistryError::NotFound(did.to_string()))?;
        if previous.is_deactivated() {
            return Err(RegistryError::Deactivated(did));
        }

        let controller_doc = match auth.delegate() {
            Some(controller) => DocumentRepository::load(&slots, controller)?,
            None => None,
        };
        let auth_ctx = AuthContext {
            caller: ctx.sender,
            digest: op.signing_digest(&did, auth.delegate()),
        };
        let authorization = authorize(&previous, controller_doc.as_ref(), auth, &auth_ctx)
            .into_result()
            .map_err(|failure| {
                warn!(
                    did = %did,
                    op = op.name(),
                    mode = auth.mode(),
                    reason = %failure,
                    "authorization rejected"
                );
                RegistryError::from(failure)
            })?;

        if let Operation::AddController { controller } = op {
            match DocumentRepository::load(&slots, controller)? {
                None => return Err(RegistryError::NotFound(controller.to_string())),
                Some(doc) if doc.is_deactivated() => {
                    return Err(RegistryError::Deactivated(controller.clone()))
                }
                Some(_) => {}
            }
        }

        let mut doc = previous.clone();
        let payloads = doc.apply(op)?;
        if doc != previous {
            DocumentRepository::save(&mut slots, Some(&previous), &doc)?;
            if self.config.logic_version.tracks_versions() {
                DocumentRepository::bump_version(&mut slots, &did)?;
            }
        }

        let batch = slots.into_batch();
        if !batch.is_empty() {
            debug!(did = %did, writes = batch.len(), "committing operation");
            self.store.atomic_batch_write(batch)?;
        }

        let events = payloads
            .into_iter()
            .map(|payload| RegistryEvent::new(did.clone(), authorization.via.clone(), payload))
            .collect();
        Ok(Receipt {
            did,
            controller: authorization.via,
            authorized_by: Some(authorization.signer),
            events,
        })
    }
}

impl<S: SlotStore> DidRegistryApi for DidRegistryService<S> {
    #[instrument(skip(self, key), fields(sender = %ctx.sender))]
    fn register(
        &mut self,
        ctx: CallContext,
        did: &str,
        key: KeyData,
    ) -> Result<Receipt, RegistryError> {
        let result = self.try_register(did, key);
        self.record(&result);
        match &result {
            Ok(receipt) => info!(did = %receipt.did, key = %key, "registered"),
            Err(e) => debug!(error = %e, "registration failed"),
        }
        result
    }

    #[instrument(skip(self, op, auth), fields(op = op.name(), mode = auth.mode()))]
    fn execute(
        &mut self,
        ctx: CallContext,
        did: &str,
        op: Operation,
        auth: AuthRequest,
    ) -> Result<Receipt, RegistryError> {
        let result = self.try_execute(ctx, did, &op, &auth);
        self.record(&result);
        match &result {
            Ok(receipt) => {
                info!(
                    did = %receipt.did,
                    events = receipt.events.len(),
                    "operation committed"
                );
                for event in &receipt.events {
                    info!(did = %event.did, event = event.name(), "event emitted");
                }
            }
            Err(e) => debug!(error = %e, "operation failed"),
        }
        result
    }

    fn get_document(&self, did: &str) -> Result<Document, RegistryError> {
        self.load(&Did::parse(did)?)
    }

    fn get_document_metadata(&self, did: &str) -> Result<DocumentMetadata, RegistryError> {
        let did = Did::parse(did)?;
        let doc = self.load(&did)?;
        let version_id = if self.config.logic_version.tracks_versions() {
            let slots = WriteOverlay::new(&self.store);
            Some(DocumentRepository::version_id(&slots, &did)?.unwrap_or(0))
        } else {
            None
        };
        Ok(DocumentMetadata {
            did,
            deactivated: doc.is_deactivated(),
            version_id,
            logic_version: self.config.logic_version,
        })
    }

    fn export_document(&self, did: &str) -> Result<Vec<u8>, RegistryError> {
        use crate::domain::codec::Encodable;
        Ok(self.get_document(did)?.to_bytes())
    }

    fn verify_signature(
        &self,
        caller: Address,
        did: &str,
        proof: &Proof,
        digest: &Hash,
    ) -> Result<bool, RegistryError> {
        let doc = self.get_document(did)?;
        if doc.is_deactivated() {
            return Ok(false);
        }
        let ctx = AuthContext {
            caller,
            digest: *digest,
        };
        let result = check_proof(&doc, proof, &ctx);
        if let Err(failure) = &result {
            debug!(did = %doc.did(), reason = %failure, "signature check failed");
        }
        Ok(result.is_ok())
    }

    fn verify_controller(
        &self,
        caller: Address,
        did: &str,
        controller: &str,
        proof: &Proof,
        digest: &Hash,
    ) -> Result<bool, RegistryError> {
        let doc = self.get_document(did)?;
        if doc.is_deactivated() {
            return Ok(false);
        }
        let controller = Did::parse(controller)?;
        let slots = WriteOverlay::new(&self.store);
        let controller_doc = DocumentRepository::load(&slots, &controller)?;
        let request = AuthRequest::Delegated {
            controller,
            proof: proof.clone(),
        };
        let ctx = AuthContext {
            caller,
            digest: *digest,
        };
        let decision = authorize(&doc, controller_doc.as_ref(), &request, &ctx);
        Ok(decision.is_authorized())
    }

    fn registered_dids(&self) -> Result<Vec<Did>, RegistryError> {
        let slots = WriteOverlay::new(&self.store);
        Ok(DocumentRepository::list_dids(&slots)?)
    }

    fn logic_version(&self) -> LogicVersion {
        self.config.logic_version
    }
}
