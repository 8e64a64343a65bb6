use seedcert_crypto::SignatureLayout;
use seedcert_types::MAX_CERTIFICATIONS;
use serde::{Deserialize, Serialize};

/// Registry behaviour knobs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Where `v` is read from when recovering certificate signers
    pub signature_layout: SignatureLayout,
    /// Require the seed batch named at issuance to exist, and record the new
    /// certificate on that batch
    pub enforce_seed_batch_links: bool,
    /// Capacity reserved for each entity's certificate list
    pub max_certifications: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            signature_layout: SignatureLayout::Standard,
            enforce_seed_batch_links: true,
            max_certifications: MAX_CERTIFICATIONS,
        }
    }
}
