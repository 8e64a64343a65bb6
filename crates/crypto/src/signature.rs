//! Recoverable secp256k1 signature codec
//!
//! A raw signature is 65 bytes: `r` (32) || `s` (32) || one trailing byte.
//! Where the recovery byte `v` is read from is governed by
//! [`SignatureLayout`].

use crate::hash_functions::{eth_signed_message_hash, keccak256};
use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use seedcert_types::{Address, ADDRESS_BYTES};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Length of a raw recoverable signature.
pub const SIGNATURE_LENGTH: usize = 65;

/// Signature codec errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    #[error("invalid signature length: expected {SIGNATURE_LENGTH} bytes, got {actual}")]
    InvalidLength { actual: usize },
    #[error("unknown signature layout: {0:?}")]
    UnknownLayout(String),
}

/// Byte offset the recovery byte `v` is taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignatureLayout {
    /// `v` is the trailing byte at offset 64.
    #[default]
    Standard,
    /// `v` is the byte at offset 0, i.e. the leading byte of `r`. Registries
    /// deployed before the trailing-byte layout was adopted read `v` here.
    Legacy,
}

impl SignatureLayout {
    fn v_offset(self) -> usize {
        match self {
            SignatureLayout::Standard => 64,
            SignatureLayout::Legacy => 0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SignatureLayout::Standard => "standard",
            SignatureLayout::Legacy => "legacy",
        }
    }
}

impl fmt::Display for SignatureLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignatureLayout {
    type Err = SignatureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "standard" => Ok(SignatureLayout::Standard),
            "legacy" => Ok(SignatureLayout::Legacy),
            other => Err(SignatureError::UnknownLayout(other.to_string())),
        }
    }
}

/// The `(v, r, s)` components of a raw signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignatureParts {
    pub v: u8,
    pub r: [u8; 32],
    pub s: [u8; 32],
}

impl SignatureParts {
    /// Map `v` to a secp256k1 recovery id. Only 27 and 28 are accepted.
    pub fn recovery_id(&self) -> Option<RecoveryId> {
        match self.v {
            27 | 28 => RecoveryId::from_byte(self.v - 27),
            _ => None,
        }
    }
}

/// Split a 65-byte signature into `(v, r, s)`.
pub fn split_signature(
    signature: &[u8],
    layout: SignatureLayout,
) -> Result<SignatureParts, SignatureError> {
    if signature.len() != SIGNATURE_LENGTH {
        return Err(SignatureError::InvalidLength {
            actual: signature.len(),
        });
    }

    let mut r = [0u8; 32];
    let mut s = [0u8; 32];
    r.copy_from_slice(&signature[0..32]);
    s.copy_from_slice(&signature[32..64]);

    Ok(SignatureParts {
        v: signature[layout.v_offset()],
        r,
        s,
    })
}

/// Recover the address that signed `digest`.
///
/// The signed payload is the prefixed digest from
/// [`eth_signed_message_hash`]. A signature of the wrong length is an error;
/// any other failure to recover a public key yields [`Address::ZERO`].
pub fn recover_signer(
    digest: &[u8; 32],
    signature: &[u8],
    layout: SignatureLayout,
) -> Result<Address, SignatureError> {
    let parts = split_signature(signature, layout)?;
    let prefixed = eth_signed_message_hash(digest);

    match recover_verifying_key(&prefixed, &parts) {
        Some(key) => Ok(address_of(&key)),
        None => {
            debug!(v = parts.v, %layout, "signature did not recover to a public key");
            Ok(Address::ZERO)
        }
    }
}

fn recover_verifying_key(prehash: &[u8; 32], parts: &SignatureParts) -> Option<VerifyingKey> {
    let recovery_id = parts.recovery_id()?;

    let mut rs = [0u8; 64];
    rs[..32].copy_from_slice(&parts.r);
    rs[32..].copy_from_slice(&parts.s);
    let signature = Signature::from_slice(&rs).ok()?;

    VerifyingKey::recover_from_prehash(prehash, &signature, recovery_id).ok()
}

/// Address of a public key: the last 20 bytes of the Keccak-256 hash of its
/// uncompressed encoding, without the `0x04` tag.
pub fn address_of(key: &VerifyingKey) -> Address {
    let encoded = key.as_affine().to_encoded_point(false);
    let hash = keccak256(&encoded.as_bytes()[1..]);
    let mut bytes = [0u8; ADDRESS_BYTES];
    bytes.copy_from_slice(&hash[32 - ADDRESS_BYTES..]);
    Address(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::KeyPair;

    fn sample_signature() -> [u8; SIGNATURE_LENGTH] {
        let mut signature = [0u8; SIGNATURE_LENGTH];
        for (i, byte) in signature.iter_mut().enumerate() {
            *byte = i as u8;
        }
        signature
    }

    #[test]
    fn standard_layout_reads_trailing_v() {
        let parts = split_signature(&sample_signature(), SignatureLayout::Standard).unwrap();
        assert_eq!(parts.v, 64);
        assert_eq!(parts.r[0], 0);
        assert_eq!(parts.r[31], 31);
        assert_eq!(parts.s[0], 32);
        assert_eq!(parts.s[31], 63);
    }

    #[test]
    fn legacy_layout_reads_leading_byte_of_r() {
        let mut signature = sample_signature();
        signature[0] = 0xAA;
        let parts = split_signature(&signature, SignatureLayout::Legacy).unwrap();
        assert_eq!(parts.v, 0xAA);
        assert_eq!(parts.r[0], 0xAA);
    }

    #[test]
    fn wrong_length_is_rejected() {
        for len in [0usize, 64, 66, 130] {
            let err = split_signature(&vec![0u8; len], SignatureLayout::Standard).unwrap_err();
            assert_eq!(err, SignatureError::InvalidLength { actual: len });
        }
    }

    #[test]
    fn only_27_and_28_map_to_recovery_ids() {
        let mut parts = split_signature(&sample_signature(), SignatureLayout::Standard).unwrap();
        for v in 0u8..=255 {
            parts.v = v;
            assert_eq!(parts.recovery_id().is_some(), v == 27 || v == 28, "v = {v}");
        }
    }

    #[test]
    fn recovers_signer_address() {
        let key_pair = KeyPair::from_secret_bytes(&[7u8; 32]).unwrap();
        let digest = keccak256(b"certificate payload");
        let signature = key_pair.sign_digest(&digest).unwrap();

        let signer = recover_signer(&digest, &signature, SignatureLayout::Standard).unwrap();
        assert_eq!(signer, key_pair.address());
    }

    #[test]
    fn different_digest_recovers_different_address() {
        let key_pair = KeyPair::from_secret_bytes(&[7u8; 32]).unwrap();
        let signature = key_pair.sign_digest(&keccak256(b"one")).unwrap();

        let signer =
            recover_signer(&keccak256(b"two"), &signature, SignatureLayout::Standard).unwrap();
        assert_ne!(signer, key_pair.address());
    }

    #[test]
    fn unrecoverable_signature_yields_zero_address() {
        let digest = keccak256(b"anything");

        let zeroed = [0u8; SIGNATURE_LENGTH];
        assert_eq!(
            recover_signer(&digest, &zeroed, SignatureLayout::Standard).unwrap(),
            Address::ZERO
        );

        let mut bad_v = KeyPair::from_secret_bytes(&[9u8; 32])
            .unwrap()
            .sign_digest(&digest)
            .unwrap();
        bad_v[64] = 5;
        assert_eq!(
            recover_signer(&digest, &bad_v, SignatureLayout::Standard).unwrap(),
            Address::ZERO
        );
    }

    #[test]
    fn layout_parses_from_lowercase_label() {
        assert_eq!("legacy".parse::<SignatureLayout>(), Ok(SignatureLayout::Legacy));
        assert_eq!(
            "standard".parse::<SignatureLayout>(),
            Ok(SignatureLayout::Standard)
        );
        assert!("Legacy".parse::<SignatureLayout>().is_err());
    }
}
