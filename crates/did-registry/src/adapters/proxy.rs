//! # Upgrade Proxy
//!
//! Forwards every registry call to the current logic and swaps the logic on
//! `upgrade_to`. The proxy never touches document slots, so documents
//! written by one logic version are served unchanged by the next as long
//! as both run over the same store (see `SharedSlotStore`).
//!
//! The current version tag and every tag ever installed are recorded in
//! the proxy's own namespace of the admin store. A tag can be installed
//! once; rolling back to an earlier tag is rejected.

use crate::domain::auth::{AuthRequest, Proof};
use crate::domain::codec::{Decodable, Encodable};
use crate::domain::document::Document;
use crate::domain::entities::{CallContext, DocumentMetadata, LogicVersion};
use crate::domain::operations::Operation;
use crate::domain::value_objects::{Address, Did, Hash, KeyData};
use crate::errors::RegistryError;
use crate::ports::inbound::{DidRegistryApi, Receipt};
use crate::ports::outbound::SlotStore;
use crate::storage::{EnumerableMap, SlotKeys, WriteOverlay};
use tracing::info;

/// Dispatches registry calls to a replaceable logic implementation.
pub struct UpgradeProxy<S: SlotStore> {
    admin: S,
    logic: Box<dyn DidRegistryApi>,
    version: String,
}

impl<S: SlotStore> UpgradeProxy<S> {
    /// Install `logic` under `version`.
    ///
    /// Reopening a store whose current version is already `version` is
    /// accepted; any other previously installed tag is rejected.
    pub fn new(
        admin: S,
        version: &str,
        logic: Box<dyn DidRegistryApi>,
    ) -> Result<Self, RegistryError> {
        let current = Self::read_version(&admin)?;
        let mut proxy = Self {
            admin,
            logic,
            version: version.to_owned(),
        };
        if current.as_deref() != Some(version) {
            proxy.record_version(version)?;
        }
        info!(version, "upgrade proxy ready");
        Ok(proxy)
    }

    /// Replace the logic, recording `version` as the new current tag.
    pub fn upgrade_to(
        &mut self,
        version: &str,
        logic: Box<dyn DidRegistryApi>,
    ) -> Result<(), RegistryError> {
        self.record_version(version)?;
        info!(
            from = %self.version,
            to = version,
            logic = logic.logic_version().tag(),
            "logic upgraded"
        );
        self.logic = logic;
        self.version = version.to_owned();
        Ok(())
    }

    /// The current version tag.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Every installed version tag, oldest first.
    pub fn history(&self) -> Result<Vec<String>, RegistryError> {
        let slots = WriteOverlay::new(&self.admin);
        Self::history_map()
            .keys(&slots)?
            .into_iter()
            .map(|tag| {
                String::from_utf8(tag)
                    .map_err(|_| RegistryError::Upgrade("version history is not utf-8".into()))
            })
            .collect()
    }

    /// The logic currently serving calls.
    pub fn logic(&self) -> &dyn DidRegistryApi {
        self.logic.as_ref()
    }

    fn history_map() -> EnumerableMap {
        EnumerableMap::new(SlotKeys::proxy_history())
    }

    fn read_version(admin: &S) -> Result<Option<String>, RegistryError> {
        match admin.get(&SlotKeys::proxy_version())? {
            Some(bytes) => Ok(Some(String::from_bytes(&bytes)?)),
            None => Ok(None),
        }
    }

    fn record_version(&mut self, version: &str) -> Result<(), RegistryError> {
        if version.is_empty() {
            return Err(RegistryError::Upgrade("empty version tag".into()));
        }
        let mut slots = WriteOverlay::new(&self.admin);
        let history = Self::history_map();
        if history.contains(&slots, version.as_bytes())? {
            return Err(RegistryError::Upgrade(format!(
                "version {version} was already installed"
            )));
        }
        history.set(&mut slots, version.as_bytes(), &[])?;
        slots.put(SlotKeys::proxy_version(), version.to_owned().to_bytes());

        let batch = slots.into_batch();
        self.admin.atomic_batch_write(batch)?;
        Ok(())
    }
}

impl<S: SlotStore> DidRegistryApi for UpgradeProxy<S> {
    fn register(
        &mut self,
        ctx: CallContext,
        did: &str,
        key: KeyData,
    ) -> Result<Receipt, RegistryError> {
        self.logic.register(ctx, did, key)
    }

    fn execute(
        &mut self,
        ctx: CallContext,
        did: &str,
        op: Operation,
        auth: AuthRequest,
    ) -> Result<Receipt, RegistryError> {
        self.logic.execute(ctx, did, op, auth)
    }

    fn get_document(&self, did: &str) -> Result<Document, RegistryError> {
        self.logic.get_document(did)
    }

    fn get_document_metadata(&self, did: &str) -> Result<DocumentMetadata, RegistryError> {
        self.logic.get_document_metadata(did)
    }

    fn export_document(&self, did: &str) -> Result<Vec<u8>, RegistryError> {
        self.logic.export_document(did)
    }

    fn verify_signature(
        &self,
        caller: Address,
        did: &str,
        proof: &Proof,
        digest: &Hash,
    ) -> Result<bool, RegistryError> {
        self.logic.verify_signature(caller, did, proof, digest)
    }

    fn verify_controller(
        &self,
        caller: Address,
        did: &str,
        controller: &str,
        proof: &Proof,
        digest: &Hash,
    ) -> Result<bool, RegistryError> {
        self.logic
            .verify_controller(caller, did, controller, proof, digest)
    }

    fn registered_dids(&self) -> Result<Vec<Did>, RegistryError> {
        self.logic.registered_dids()
    }

    fn logic_version(&self) -> LogicVersion {
        self.logic.logic_version()
    }
}
