//! # Error Types
//!
//! All error types for the DID registry.
//!
//! Every error aborts the whole operation: mutations are staged in a write
//! overlay and only committed after authorization and the state transition
//! both succeed, so a returned error never leaves partial state behind.

use crate::domain::value_objects::{Address, Did};
use thiserror::Error;

// =============================================================================
// CODEC ERRORS
// =============================================================================

/// Errors raised while decoding a zero-copy byte stream.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// A read asked for more bytes than remain after the cursor.
    #[error("decode truncated: needed {needed} bytes, {available} available")]
    DecodeTruncated { needed: usize, available: usize },

    /// A varint used a wider form than its value requires.
    #[error("non-canonical varint encoding")]
    NonCanonicalVarint,

    /// A boolean byte other than 0 or 1.
    #[error("invalid boolean byte: 0x{0:02x}")]
    InvalidBool(u8),

    /// A string field was not valid UTF-8.
    #[error("invalid utf-8 in string field")]
    InvalidUtf8,

    /// An enum discriminant that no variant uses.
    #[error("invalid {what} tag: {tag}")]
    InvalidTag { what: &'static str, tag: u8 },

    /// A decoded value violates its type's invariants.
    #[error("invalid {what}: {reason}")]
    InvalidValue { what: &'static str, reason: String },

    /// Bytes were left over after a complete value was decoded.
    #[error("{0} trailing bytes after decoded value")]
    TrailingBytes(usize),
}

// =============================================================================
// STORE ERRORS
// =============================================================================

/// Errors from the persistent slot store.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Key absent from an enumerable map, or index out of range.
    #[error("storage key not found")]
    NotFound,

    /// Backend I/O failure.
    #[error("storage I/O error: {message}")]
    Io { message: String },

    /// A slot holds bytes that do not match the layout.
    #[error("storage corrupted: {message}")]
    Corrupted { message: String },
}

// =============================================================================
// SIGNATURE ERRORS
// =============================================================================

/// Errors that can occur while recovering a signer from a signature.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SignatureError {
    /// The signature format is invalid (wrong length, scalar out of range).
    #[error("invalid signature format")]
    InvalidFormat,

    /// Signature has high S value (EIP-2 malleability protection).
    #[error("malleable signature (high S value)")]
    MalleableSignature,

    /// Invalid recovery ID (v must be 0, 1, 27, or 28).
    #[error("invalid recovery ID: {0}")]
    InvalidRecoveryId(u8),

    /// Failed to recover public key from signature.
    #[error("failed to recover public key")]
    RecoveryFailed,
}

// =============================================================================
// AUTHORIZATION FAILURES
// =============================================================================

/// Why the authorization engine refused a request.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthFailure {
    /// The acting address is not an active authentication key.
    #[error("{address:?} is not an active authentication key of {did}")]
    NotAuthKey { did: Did, address: Address },

    /// A valid signature from a key that is not an active authentication key.
    #[error("signer {address:?} is not an active authentication key of {did}")]
    SignerNotAuthKey { did: Did, address: Address },

    /// The signature does not recover to the declared signer.
    #[error("signature recovers to {recovered:?}, declared signer is {declared:?}")]
    SignerMismatch { declared: Address, recovered: Address },

    /// The signature could not be parsed or recovered.
    #[error("bad signature: {0}")]
    BadSignature(#[from] SignatureError),

    /// The named DID is not a controller of the target.
    #[error("{controller} is not a controller of {did}")]
    NotController { did: Did, controller: Did },

    /// The controller DID has no document.
    #[error("controller {0} is not registered")]
    ControllerMissing(Did),

    /// The controller document has been deactivated.
    #[error("controller {0} is deactivated")]
    ControllerDeactivated(Did),

    /// An address-form DID was registered with a key of another address.
    #[error("{did} is bound to {expected:?}, key derives to {actual:?}")]
    DidKeyMismatch {
        did: Did,
        expected: Address,
        actual: Address,
    },
}

impl AuthFailure {
    /// Returns true if the failure came from the signature itself rather
    /// than from the signer's standing in the document.
    #[must_use]
    pub fn is_signature_failure(&self) -> bool {
        matches!(
            self,
            Self::SignerMismatch { .. } | Self::BadSignature(_) | Self::SignerNotAuthKey { .. }
        )
    }
}

// =============================================================================
// CONFIG ERRORS
// =============================================================================

/// Configuration validation errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The default context is empty.
    #[error("default context must not be empty")]
    EmptyDefaultContext,

    /// The per-call item limit is zero.
    #[error("max items per call must be at least 1")]
    ZeroItemLimit,
}

// =============================================================================
// REGISTRY ERRORS
// =============================================================================

/// Errors returned by registry operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// The DID string fails the `did:<method>:<id>` grammar.
    #[error("malformed DID: {0:?}")]
    MalformedDid(String),

    /// A document already exists for this DID.
    #[error("{0} is already registered")]
    AlreadyRegistered(Did),

    /// DID, key, controller, or service absent.
    #[error("not found: {0}")]
    NotFound(String),

    /// Redundant activation (the key is already an active auth key).
    #[error("already active: {0}")]
    AlreadyActive(String),

    /// Redundant deactivation.
    #[error("already inactive: {0}")]
    AlreadyInactive(String),

    /// Deactivating the sole remaining active authentication key.
    #[error("{0} would be left without an active authentication key")]
    LastAuthKey(Did),

    /// The authorization engine rejected the caller.
    #[error("unauthorized: {0}")]
    Unauthorized(AuthFailure),

    /// Malformed or non-recovering signature.
    #[error("invalid signature: {0}")]
    InvalidSignature(AuthFailure),

    /// A codec read ran past the end of its buffer.
    #[error("decode truncated: needed {needed} bytes, {available} available")]
    DecodeTruncated { needed: usize, available: usize },

    /// `AddService` with a service id already in use.
    #[error("duplicate service id: {0}")]
    DuplicateServiceId(String),

    /// `UpdateService` / `RemoveService` with an unknown service id.
    #[error("unknown service id: {0}")]
    UnknownServiceId(String),

    /// `RemoveContext` with a context the document does not hold.
    #[error("unknown context: {0}")]
    UnknownContext(String),

    /// The document has been deactivated; no mutation is possible.
    #[error("{0} is deactivated")]
    Deactivated(Did),

    /// The key is already a public key of the document.
    #[error("duplicate key: {0}")]
    DuplicateKey(String),

    /// The public key entry has been revoked and cannot be reused.
    #[error("key revoked: {0}")]
    KeyRevoked(String),

    /// The default key entry cannot be revoked.
    #[error("the default key of {0} cannot be revoked")]
    DefaultKey(Did),

    /// Key bytes of the wrong length or form.
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// An empty id, empty context, or similar argument error.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Too many items in a single call.
    #[error("too many items: {got} > {max}")]
    TooManyItems { got: usize, max: usize },

    /// Any other codec failure.
    #[error("codec error: {0}")]
    Codec(CodecError),

    /// Storage backend failure.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Upgrade proxy rejected a version change.
    #[error("upgrade rejected: {0}")]
    Upgrade(String),
}

impl From<CodecError> for RegistryError {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::DecodeTruncated { needed, available } => {
                Self::DecodeTruncated { needed, available }
            }
            other => Self::Codec(other),
        }
    }
}

impl From<AuthFailure> for RegistryError {
    fn from(failure: AuthFailure) -> Self {
        if failure.is_signature_failure() {
            Self::InvalidSignature(failure)
        } else {
            Self::Unauthorized(failure)
        }
    }
}

impl RegistryError {
    /// Returns true for authorization rejections (either kind).
    #[must_use]
    pub fn is_auth_rejection(&self) -> bool {
        matches!(self, Self::Unauthorized(_) | Self::InvalidSignature(_))
    }
}

// =============================================================================
// TESTS
// =============================================================================
