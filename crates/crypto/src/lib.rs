//! Signature codec for the seed certification registry
//!
//! Certificates carry a 65-byte recoverable secp256k1 signature over the
//! prefixed Keccak-256 digest of a message. This crate splits such signatures,
//! recovers the signing address, and provides a key pair for producing them.

use anyhow::{anyhow, Result};
use k256::ecdsa::{SigningKey, VerifyingKey};
use rand_core::OsRng;
use seedcert_types::Address;

pub mod hash_functions;
pub mod signature;

pub use hash_functions::{eth_signed_message_hash, keccak256, SIGNED_MESSAGE_PREFIX};
pub use signature::{
    address_of, recover_signer, split_signature, SignatureError, SignatureLayout, SignatureParts,
    SIGNATURE_LENGTH,
};

/// secp256k1 key pair able to sign certificate digests
#[derive(Debug, Clone)]
pub struct KeyPair {
    signing_key: SigningKey,
    verifying_key: VerifyingKey,
}

impl KeyPair {
    /// Generate a new key pair
    pub fn generate() -> Self {
        let signing_key = SigningKey::random(&mut OsRng);
        let verifying_key = *signing_key.verifying_key();

        Self {
            signing_key,
            verifying_key,
        }
    }

    /// Restore a key pair from a 32-byte secret scalar
    pub fn from_secret_bytes(secret: &[u8]) -> Result<Self> {
        let signing_key =
            SigningKey::from_slice(secret).map_err(|_| anyhow!("invalid secp256k1 secret key"))?;
        let verifying_key = *signing_key.verifying_key();

        Ok(Self {
            signing_key,
            verifying_key,
        })
    }

    /// Get the secret key as bytes
    pub fn secret_bytes(&self) -> [u8; 32] {
        let mut secret = [0u8; 32];
        secret.copy_from_slice(&self.signing_key.to_bytes());
        secret
    }

    /// Address derived from the public key
    pub fn address(&self) -> Address {
        address_of(&self.verifying_key)
    }

    /// Sign a 32-byte digest.
    ///
    /// The digest is prefixed with [`SIGNED_MESSAGE_PREFIX`] and hashed before
    /// signing. Output layout is `r || s || v` with `v = 27 + recovery id`.
    pub fn sign_digest(&self, digest: &[u8; 32]) -> Result<[u8; SIGNATURE_LENGTH]> {
        let prehash = eth_signed_message_hash(digest);
        let (signature, recovery_id) = self
            .signing_key
            .sign_prehash_recoverable(&prehash)
            .map_err(|e| anyhow!("signing failed: {e}"))?;

        let mut out = [0u8; SIGNATURE_LENGTH];
        out[..64].copy_from_slice(&signature.to_bytes());
        out[64] = 27 + recovery_id.to_byte();
        Ok(out)
    }
}
