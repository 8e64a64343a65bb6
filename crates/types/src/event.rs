use crate::{Address, CertificateId, SeedBatchId};
use serde::{Deserialize, Serialize};

/// Observable record of a successful registry mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RegistryEvent {
    EntityAdded {
        id: Address,
        mode_label: String,
    },
    SeedBatchAdded {
        id: SeedBatchId,
        manufacturer: Address,
    },
    CertificateIssued {
        issuer: Address,
        prover: Address,
        id: CertificateId,
    },
}
