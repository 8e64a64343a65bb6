//! Registry records: entities, seed batches and certificates

use crate::{Address, Mode, Status};
use serde::{Deserialize, Serialize};

/// Dense, zero-based identifier of a seed batch.
pub type SeedBatchId = u64;
/// Dense, zero-based identifier of a certificate.
pub type CertificateId = u64;

/// Default capacity reserved for an entity's certificate list.
pub const MAX_CERTIFICATIONS: usize = 2;

/// A registered participant with a fixed role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub id: Address,
    pub mode: Mode,
    pub certificate_ids: Vec<CertificateId>,
}

impl Entity {
    /// Create an entity with an empty certificate list reserved to `capacity`.
    pub fn new(id: Address, mode: Mode, capacity: usize) -> Self {
        Self {
            id,
            mode,
            certificate_ids: Vec::with_capacity(capacity),
        }
    }

    pub fn is_issuer(&self) -> bool {
        self.mode == Mode::Issuer
    }

    pub fn is_prover(&self) -> bool {
        self.mode == Mode::Prover
    }
}

/// A manufactured lot tracked under a brand and manufacturer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedBatch {
    pub id: SeedBatchId,
    pub brand: String,
    pub manufacturer: Address,
    /// Certificates issued against this batch, in issuance order.
    pub certificate_ids: Vec<CertificateId>,
}

impl SeedBatch {
    pub fn new(id: SeedBatchId, brand: impl Into<String>, manufacturer: Address) -> Self {
        Self {
            id,
            brand: brand.into(),
            manufacturer,
            certificate_ids: Vec::new(),
        }
    }
}

/// Signed attestation binding an issuer and a prover to a custody status.
///
/// `issuer` and `prover` are copies of the entity records taken when the
/// certificate was issued; re-registering either address later does not
/// touch them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Certificate {
    pub id: CertificateId,
    pub issuer: Entity,
    pub prover: Entity,
    #[serde(with = "hex_bytes")]
    pub signature: Vec<u8>,
    pub status: Status,
    pub seed_batch_id: SeedBatchId,
}

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(bytes)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(deserializer)?;
        let payload = text.strip_prefix("0x").unwrap_or(&text);
        hex::decode(payload).map_err(serde::de::Error::custom)
    }
}
