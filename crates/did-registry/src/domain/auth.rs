//! # Authorization Engine
//!
//! Decides whether a request may mutate a target document. Pure: it reads
//! the target (and, for delegation, the controller) document and never
//! touches storage.
//!
//! ## Modes
//!
//! | Mode | Check |
//! |------|-------|
//! | Direct | caller address is an active auth key of the target |
//! | Signed | signature over the operation digest recovers to the declared signer, who is an active auth key of the target |
//! | Delegated | target lists the controller; the controller document is registered and active; Direct or Signed passes against the controller's own keys |
//!
//! Delegation recurses exactly one level: a controller's controllers carry
//! no authority over the target.

use super::document::Document;
use super::ecdsa::{recover_address, RecoverableSignature};
use super::value_objects::{Address, Did, Hash, KeyData};
use crate::errors::AuthFailure;
use serde::{Deserialize, Serialize};

// =============================================================================
// REQUESTS
// =============================================================================

/// An explicit signer plus a signature over the operation digest.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedProof {
    /// Declared signing key or address.
    pub signer: KeyData,
    pub signature: RecoverableSignature,
}

/// How the acting key proves itself to the document whose keys are checked.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Proof {
    /// The call originates from the key's address.
    Direct,
    Signed(SignedProof),
}

/// Authorization mode of a mutating call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthRequest {
    Direct,
    Signed(SignedProof),
    /// Prove against the controller's document instead of the target's.
    Delegated { controller: Did, proof: Proof },
}

impl AuthRequest {
    /// Signed mode with the given signer and signature.
    #[must_use]
    pub fn signed(signer: impl Into<KeyData>, signature: RecoverableSignature) -> Self {
        Self::Signed(SignedProof {
            signer: signer.into(),
            signature,
        })
    }

    /// Delegated mode with the caller acting directly for the controller.
    #[must_use]
    pub fn by_controller(controller: Did) -> Self {
        Self::Delegated {
            controller,
            proof: Proof::Direct,
        }
    }

    /// Delegated mode with a signature from one of the controller's keys.
    #[must_use]
    pub fn by_controller_signed(
        controller: Did,
        signer: impl Into<KeyData>,
        signature: RecoverableSignature,
    ) -> Self {
        Self::Delegated {
            controller,
            proof: Proof::Signed(SignedProof {
                signer: signer.into(),
                signature,
            }),
        }
    }

    /// The controller DID for delegated requests.
    #[must_use]
    pub fn delegate(&self) -> Option<&Did> {
        match self {
            Self::Delegated { controller, .. } => Some(controller),
            Self::Direct | Self::Signed(_) => None,
        }
    }

    /// True if the request carries a signature anywhere.
    #[must_use]
    pub fn is_signed(&self) -> bool {
        matches!(
            self,
            Self::Signed(_)
                | Self::Delegated {
                    proof: Proof::Signed(_),
                    ..
                }
        )
    }

    #[must_use]
    pub fn mode(&self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::Signed(_) => "signed",
            Self::Delegated { .. } => "delegated",
        }
    }
}

/// Everything about the call besides the documents.
#[derive(Clone, Copy, Debug)]
pub struct AuthContext {
    /// Originator of the call, checked in direct mode.
    pub caller: Address,
    /// Digest the signature must cover, checked in signed mode.
    pub digest: Hash,
}

// =============================================================================
// DECISIONS
// =============================================================================

/// A granted authorization.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Authorization {
    /// Address of the auth key that authorized the call.
    pub signer: Address,
    /// Controller document the key belongs to, when delegated.
    pub via: Option<Did>,
}

/// Outcome of [`authorize`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuthDecision {
    Authorized(Authorization),
    Unauthorized(AuthFailure),
}

impl AuthDecision {
    #[must_use]
    pub fn is_authorized(&self) -> bool {
        matches!(self, Self::Authorized(_))
    }

    pub fn into_result(self) -> Result<Authorization, AuthFailure> {
        match self {
            Self::Authorized(auth) => Ok(auth),
            Self::Unauthorized(failure) => Err(failure),
        }
    }
}

impl From<Result<Authorization, AuthFailure>> for AuthDecision {
    fn from(result: Result<Authorization, AuthFailure>) -> Self {
        match result {
            Ok(auth) => Self::Authorized(auth),
            Err(failure) => Self::Unauthorized(failure),
        }
    }
}

// =============================================================================
// ENGINE
// =============================================================================

/// Run the authorization check for `request` against `target`.
///
/// `controller_doc` is the document of the request's delegate, if the
/// caller could load one; it is ignored for non-delegated requests.
#[must_use]
pub fn authorize(
    target: &Document,
    controller_doc: Option<&Document>,
    request: &AuthRequest,
    ctx: &AuthContext,
) -> AuthDecision {
    let result = match request {
        AuthRequest::Direct => check_proof(target, &Proof::Direct, ctx),
        AuthRequest::Signed(proof) => check_signed(target, proof, &ctx.digest),
        AuthRequest::Delegated { controller, proof } => {
            check_delegated(target, controller, controller_doc, proof, ctx)
        }
    };
    result
        .map(|signer| Authorization {
            signer,
            via: request.delegate().cloned(),
        })
        .into()
}

fn check_delegated(
    target: &Document,
    controller: &Did,
    controller_doc: Option<&Document>,
    proof: &Proof,
    ctx: &AuthContext,
) -> Result<Address, AuthFailure> {
    if !target.has_controller(controller) {
        return Err(AuthFailure::NotController {
            did: target.did().clone(),
            controller: controller.clone(),
        });
    }
    let doc = controller_doc
        .filter(|doc| doc.did() == controller)
        .ok_or_else(|| AuthFailure::ControllerMissing(controller.clone()))?;
    if doc.is_deactivated() {
        return Err(AuthFailure::ControllerDeactivated(controller.clone()));
    }
    check_proof(doc, proof, ctx)
}

/// Direct or signed check against one document's auth keys.
pub fn check_proof(doc: &Document, proof: &Proof, ctx: &AuthContext) -> Result<Address, AuthFailure> {
    match proof {
        Proof::Direct => {
            if doc.is_auth_key(&ctx.caller) {
                Ok(ctx.caller)
            } else {
                Err(AuthFailure::NotAuthKey {
                    did: doc.did().clone(),
                    address: ctx.caller,
                })
            }
        }
        Proof::Signed(signed) => check_signed(doc, signed, &ctx.digest),
    }
}

fn check_signed(doc: &Document, proof: &SignedProof, digest: &Hash) -> Result<Address, AuthFailure> {
    let recovered = recover_address(digest, &proof.signature)?;
    let declared = proof.signer.address();
    if recovered != declared {
        return Err(AuthFailure::SignerMismatch {
            declared,
            recovered,
        });
    }
    if !doc.is_auth_key(&declared) {
        return Err(AuthFailure::SignerNotAuthKey {
            did: doc.did().clone(),
            address: declared,
        });
    }
    Ok(declared)
}

/// Address-form DIDs belong to the account whose key registers them.
pub fn check_registration_binding(did: &Did, key: &KeyData) -> Result<(), AuthFailure> {
    match did.address() {
        Some(expected) if expected != key.address() => Err(AuthFailure::DidKeyMismatch {
            did: did.clone(),
            expected,
            actual: key.address(),
        }),
        _ => Ok(()),
    }
}

// =============================================================================
// TESTS
// =============================================================================
