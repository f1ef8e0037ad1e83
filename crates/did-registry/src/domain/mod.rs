//! # Domain Layer
//!
//! Pure registry logic with no storage or I/O.

pub mod auth;
pub mod codec;
pub mod document;
pub mod ecdsa;
pub mod entities;
pub mod identity;
pub mod operations;
pub mod value_objects;

pub use auth::{authorize, AuthContext, AuthDecision, AuthRequest, Authorization, Proof, SignedProof};
pub use codec::{Decodable, Encodable, ZeroCopySink, ZeroCopySource};
pub use document::Document;
pub use ecdsa::{keccak256, recover_address, sign_digest, RecoverableSignature};
pub use entities::{
    AuthKeyEntry, AuthKeyView, CallContext, DocumentMetadata, KeyType, LogicVersion,
    PublicKeyEntry, ServiceEntry,
};
pub use identity::{canonicalize, derive_address, verify_did_format};
pub use operations::Operation;
pub use value_objects::{Address, Did, Hash, KeyData, PublicKey};
