//! # ECDSA Recovery (secp256k1)
//!
//! Signer recovery for signed-mode authorization.
//!
//! ## Security Notes
//!
//! - **Malleability Prevention (EIP-2)**: S must be strictly less than half
//!   the curve order
//! - **Scalar Range Validation**: R and S must be in [1, n-1]
//! - **Constant-Time Comparisons**: scalar range checks use `subtle`

use super::codec::{Decodable, Encodable, ZeroCopySink, ZeroCopySource};
use super::value_objects::{Address, Hash, PublicKey};
use crate::errors::{CodecError, SignatureError};
use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};
use subtle::{Choice, ConstantTimeEq};

/// secp256k1 curve order n.
const SECP256K1_ORDER: [u8; 32] = [
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFE,
    0xBA, 0xAE, 0xDC, 0xE6, 0xAF, 0x48, 0xA0, 0x3B, 0xBF, 0xD2, 0x5E, 0x8C, 0xD0, 0x36, 0x41, 0x41,
];

/// n/2, the EIP-2 upper bound (exclusive) for S.
const SECP256K1_HALF_ORDER: [u8; 32] = [
    0x7F, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
    0x5D, 0x57, 0x6E, 0x73, 0x57, 0xA4, 0x50, 0x1D, 0xDF, 0xE9, 0x2F, 0x46, 0x68, 0x1B, 0x20, 0xA0,
];

/// Serialized signature length: `r || s || v`.
pub const SIGNATURE_LEN: usize = 65;

// =============================================================================
// SIGNATURE
// =============================================================================

/// A recoverable secp256k1 signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecoverableSignature {
    pub r: [u8; 32],
    pub s: [u8; 32],
    /// Recovery id: 0, 1, 27 or 28.
    pub v: u8,
}

impl RecoverableSignature {
    /// Parse `r || s || v`.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, SignatureError> {
        if bytes.len() != SIGNATURE_LEN {
            return Err(SignatureError::InvalidFormat);
        }
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[..32]);
        s.copy_from_slice(&bytes[32..64]);
        Ok(Self { r, s, v: bytes[64] })
    }

    #[must_use]
    pub fn to_bytes(&self) -> [u8; SIGNATURE_LEN] {
        let mut out = [0u8; SIGNATURE_LEN];
        out[..32].copy_from_slice(&self.r);
        out[32..64].copy_from_slice(&self.s);
        out[64] = self.v;
        out
    }
}

impl Encodable for RecoverableSignature {
    fn encode(&self, sink: &mut ZeroCopySink) {
        sink.write_fixed(&self.to_bytes());
    }
}

impl Decodable for RecoverableSignature {
    fn decode(source: &mut ZeroCopySource<'_>) -> Result<Self, CodecError> {
        let bytes: [u8; SIGNATURE_LEN] = source.read_fixed()?;
        Self::from_slice(&bytes).map_err(|e| CodecError::InvalidValue {
            what: "signature",
            reason: e.to_string(),
        })
    }
}

// =============================================================================
// RECOVERY
// =============================================================================

/// Keccak256 hash function.
#[must_use]
pub fn keccak256(data: &[u8]) -> Hash {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&result);
    hash
}

/// Recover the public key that produced `signature` over `digest`.
///
/// Rejects out-of-range scalars and high-S signatures before recovery.
pub fn recover_public_key(
    digest: &Hash,
    signature: &RecoverableSignature,
) -> Result<PublicKey, SignatureError> {
    if !is_valid_scalar(&signature.r) || !is_valid_scalar(&signature.s) {
        return Err(SignatureError::InvalidFormat);
    }
    if !is_low_s(&signature.s) {
        return Err(SignatureError::MalleableSignature);
    }
    let recovery_id = parse_recovery_id(signature.v)?;

    let mut sig_bytes = [0u8; 64];
    sig_bytes[..32].copy_from_slice(&signature.r);
    sig_bytes[32..].copy_from_slice(&signature.s);
    let sig = Signature::from_slice(&sig_bytes).map_err(|_| SignatureError::InvalidFormat)?;

    let recovered = VerifyingKey::recover_from_prehash(digest, &sig, recovery_id)
        .map_err(|_| SignatureError::RecoveryFailed)?;

    Ok(PublicKey::from_verifying_key(&recovered))
}

/// Recover the signer's address from a signature.
pub fn recover_address(
    digest: &Hash,
    signature: &RecoverableSignature,
) -> Result<Address, SignatureError> {
    recover_public_key(digest, signature).map(|key| key.address())
}

/// Sign a 32-byte digest, producing a low-S signature with `v` in {27, 28}.
pub fn sign_digest(
    signing_key: &SigningKey,
    digest: &Hash,
) -> Result<RecoverableSignature, SignatureError> {
    let (sig, recid) = signing_key
        .sign_prehash_recoverable(digest)
        .map_err(|_| SignatureError::InvalidFormat)?;

    let bytes = sig.to_bytes();
    let mut r = [0u8; 32];
    let mut s = [0u8; 32];
    r.copy_from_slice(&bytes[..32]);
    s.copy_from_slice(&bytes[32..]);

    // Flipping S to n - S mirrors R's y-parity, so the recovery id flips too.
    let (s, parity) = if is_low_s(&s) {
        (s, recid.to_byte() & 1)
    } else {
        (invert_s(&s), (recid.to_byte() & 1) ^ 1)
    };

    Ok(RecoverableSignature { r, s, v: 27 + parity })
}

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// Constant-time `a < b` over big-endian 32-byte integers.
fn ct_less_than(a: &[u8; 32], b: &[u8; 32]) -> Choice {
    let mut less = Choice::from(0u8);
    let mut greater = Choice::from(0u8);

    for i in 0..32 {
        let not_decided = !(less | greater);
        less |= not_decided & Choice::from(u8::from(a[i] < b[i]));
        greater |= not_decided & Choice::from(u8::from(a[i] > b[i]));
    }

    less
}

/// S strictly below n/2 (EIP-2).
fn is_low_s(s: &[u8; 32]) -> bool {
    ct_less_than(s, &SECP256K1_HALF_ORDER).into()
}

/// Scalar in [1, n-1].
fn is_valid_scalar(scalar: &[u8; 32]) -> bool {
    let mut is_zero = Choice::from(1u8);
    for byte in scalar {
        is_zero &= byte.ct_eq(&0u8);
    }
    (!is_zero & ct_less_than(scalar, &SECP256K1_ORDER)).into()
}

/// Valid v values: 0, 1, 27, 28.
fn parse_recovery_id(v: u8) -> Result<RecoveryId, SignatureError> {
    let id = match v {
        0 | 27 => 0,
        1 | 28 => 1,
        _ => return Err(SignatureError::InvalidRecoveryId(v)),
    };
    RecoveryId::try_from(id).map_err(|_| SignatureError::InvalidRecoveryId(v))
}

/// s' = n - s
fn invert_s(s: &[u8; 32]) -> [u8; 32] {
    let mut result = [0u8; 32];
    let mut borrow: i16 = 0;

    for i in (0..32).rev() {
        let diff = i16::from(SECP256K1_ORDER[i]) - i16::from(s[i]) - borrow;
        if diff < 0 {
            result[i] = (diff + 256) as u8;
            borrow = 1;
        } else {
            result[i] = diff as u8;
            borrow = 0;
        }
    }

    result
}

// =============================================================================
// TESTS
// =============================================================================
