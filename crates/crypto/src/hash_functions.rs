//! Hash functions used by the signature codec
//!
//! Keccak-256 (the pre-standard SHA-3 variant used by Ethereum) and the
//! `personal_sign` prefixing applied to a 32-byte digest before signing.

use sha3::{Digest, Keccak256};

/// Prefix prepended to a 32-byte digest before it is signed.
pub const SIGNED_MESSAGE_PREFIX: &[u8] = b"\x19Ethereum Signed Message:\n32";

/// Hash input data with Keccak-256.
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    let hash = hasher.finalize();
    let mut result = [0u8; 32];
    result.copy_from_slice(&hash);
    result
}

/// Digest that is actually signed for a 32-byte message digest:
/// `keccak256(SIGNED_MESSAGE_PREFIX || digest)`.
pub fn eth_signed_message_hash(digest: &[u8; 32]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(SIGNED_MESSAGE_PREFIX);
    hasher.update(digest);
    let hash = hasher.finalize();
    let mut result = [0u8; 32];
    result.copy_from_slice(&hash);
    result
}
