//! # Registry Configuration
//!
//! ## Environment Variables
//!
//! - `DID_REGISTRY_DEFAULT_CONTEXT`: context seeded on registration
//!   (default: `https://www.w3.org/ns/did/v1`)
//! - `DID_REGISTRY_BIND_ADDRESS_DIDS`: require address-form DIDs to be
//!   registered by their own key (default: true)
//! - `DID_REGISTRY_MAX_ITEMS_PER_CALL`: list length limit per call
//!   (default: 64)
//!
//! Unparseable values are logged and the default kept.

use crate::domain::entities::LogicVersion;
use crate::errors::ConfigError;
use std::env;
use tracing::warn;

/// Context every new document starts with.
pub const DEFAULT_CONTEXT: &str = "https://www.w3.org/ns/did/v1";

/// Default bound on list arguments.
pub const DEFAULT_MAX_ITEMS_PER_CALL: usize = 64;

/// Configuration for a registry service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Context seeded into every new document.
    pub default_context: String,

    /// When true, a DID whose method-specific id is an address can only be
    /// registered with a key deriving to that address.
    pub bind_address_dids: bool,

    /// Maximum contexts or key controllers in one call.
    pub max_items_per_call: usize,

    /// Logic generation the service runs.
    pub logic_version: LogicVersion,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            default_context: DEFAULT_CONTEXT.to_string(),
            bind_address_dids: true,
            max_items_per_call: DEFAULT_MAX_ITEMS_PER_CALL,
            logic_version: LogicVersion::V1,
        }
    }
}

impl RegistryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overridden from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(context) = lookup("DID_REGISTRY_DEFAULT_CONTEXT") {
            if context.is_empty() {
                warn!("DID_REGISTRY_DEFAULT_CONTEXT is empty, keeping default");
            } else {
                config.default_context = context;
            }
        }

        if let Some(raw) = lookup("DID_REGISTRY_BIND_ADDRESS_DIDS") {
            match raw.to_lowercase().as_str() {
                "true" | "1" => config.bind_address_dids = true,
                "false" | "0" => config.bind_address_dids = false,
                _ => warn!(value = %raw, "DID_REGISTRY_BIND_ADDRESS_DIDS must be true or false"),
            }
        }

        if let Some(raw) = lookup("DID_REGISTRY_MAX_ITEMS_PER_CALL") {
            match raw.parse::<usize>() {
                Ok(limit) if limit > 0 => config.max_items_per_call = limit,
                _ => warn!(
                    value = %raw,
                    "DID_REGISTRY_MAX_ITEMS_PER_CALL must be a positive integer"
                ),
            }
        }

        config
    }

    pub fn with_default_context(mut self, context: impl Into<String>) -> Self {
        self.default_context = context.into();
        self
    }

    pub fn with_bind_address_dids(mut self, bind: bool) -> Self {
        self.bind_address_dids = bind;
        self
    }

    pub fn with_max_items_per_call(mut self, limit: usize) -> Self {
        self.max_items_per_call = limit;
        self
    }

    pub fn with_logic_version(mut self, version: LogicVersion) -> Self {
        self.logic_version = version;
        self
    }

    /// Reject configurations the service cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_context.is_empty() {
            return Err(ConfigError::EmptyDefaultContext);
        }
        if self.max_items_per_call == 0 {
            return Err(ConfigError::ZeroItemLimit);
        }
        Ok(())
    }
}
