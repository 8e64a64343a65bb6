//! Scripted registry runs
//!
//! A scenario is a JSON document listing registry operations. Each step runs
//! against the same registry; a failing step is reported and the run moves on.

use anyhow::{anyhow, Result};
use seedcert_registry::CertificateRegistry;
use seedcert_storage::RegistryStore;
use seedcert_types::{Address, CertificateId, SeedBatchId};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Deserialize)]
pub struct Scenario {
    pub steps: Vec<Step>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    AddEntity {
        address: Address,
        mode: String,
    },
    AddSeedBatch {
        brand: String,
        manufacturer: Address,
    },
    IssueCertificate {
        issuer: Address,
        prover: Address,
        status: String,
        seed_batch_id: SeedBatchId,
        /// Hex, with or without `0x`
        signature: String,
    },
    IsMatchingSignature {
        /// 32-byte hex digest
        digest: String,
        certificate_id: CertificateId,
        claimed_issuer: Address,
    },
}

impl Step {
    fn op(&self) -> &'static str {
        match self {
            Step::AddEntity { .. } => "add_entity",
            Step::AddSeedBatch { .. } => "add_seed_batch",
            Step::IssueCertificate { .. } => "issue_certificate",
            Step::IsMatchingSignature { .. } => "is_matching_signature",
        }
    }
}

/// Outcome of one scenario step
#[derive(Debug, Serialize)]
pub struct StepReport {
    pub step: usize,
    pub op: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub fn decode_hex(text: &str) -> Result<Vec<u8>> {
    let payload = text.strip_prefix("0x").unwrap_or(text);
    hex::decode(payload).map_err(|e| anyhow!("invalid hex {text:?}: {e}"))
}

pub fn decode_digest(text: &str) -> Result<[u8; 32]> {
    decode_hex(text)?
        .try_into()
        .map_err(|bytes: Vec<u8>| anyhow!("digest must be 32 bytes, got {}", bytes.len()))
}

fn execute<S: RegistryStore>(registry: &CertificateRegistry<S>, step: &Step) -> Result<Value> {
    let value = match step {
        Step::AddEntity { address, mode } => {
            registry.add_entity(*address, mode)?;
            Value::Null
        }
        Step::AddSeedBatch {
            brand,
            manufacturer,
        } => json!(registry.add_seed_batch(brand, *manufacturer)?),
        Step::IssueCertificate {
            issuer,
            prover,
            status,
            seed_batch_id,
            signature,
        } => {
            let signature = decode_hex(signature)?;
            json!(registry.issue_certificate(*issuer, *prover, status, *seed_batch_id, &signature)?)
        }
        Step::IsMatchingSignature {
            digest,
            certificate_id,
            claimed_issuer,
        } => {
            let digest = decode_digest(digest)?;
            json!(registry.is_matching_signature(&digest, *certificate_id, claimed_issuer)?)
        }
    };
    Ok(value)
}

pub fn run_scenario<S: RegistryStore>(
    registry: &CertificateRegistry<S>,
    scenario: &Scenario,
) -> Vec<StepReport> {
    scenario
        .steps
        .iter()
        .enumerate()
        .map(|(step, op)| match execute(registry, op) {
            Ok(result) => StepReport {
                step,
                op: op.op(),
                result: Some(result),
                error: None,
            },
            Err(err) => {
                tracing::warn!(step, op = op.op(), error = %err, "scenario step failed");
                StepReport {
                    step,
                    op: op.op(),
                    result: None,
                    error: Some(err.to_string()),
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use seedcert_crypto::{keccak256, KeyPair};
    use seedcert_storage::MemoryStorage;

    #[test]
    fn runs_issue_and_verify_flow() {
        let issuer = KeyPair::from_secret_bytes(&[5u8; 32]).unwrap();
        let prover = Address([6u8; 20]);
        let digest = keccak256(b"scenario");
        let signature = issuer.sign_digest(&digest).unwrap();

        let document = json!({
            "steps": [
                { "op": "add_entity", "address": issuer.address(), "mode": "ISSUER" },
                { "op": "add_entity", "address": prover, "mode": "PROVER" },
                { "op": "add_seed_batch", "brand": "brandX", "manufacturer": prover },
                {
                    "op": "issue_certificate",
                    "issuer": issuer.address(),
                    "prover": prover,
                    "status": "MANUFACTURED",
                    "seed_batch_id": 0,
                    "signature": format!("0x{}", hex::encode(signature)),
                },
                {
                    "op": "is_matching_signature",
                    "digest": hex::encode(digest),
                    "certificate_id": 0,
                    "claimed_issuer": issuer.address(),
                },
                {
                    "op": "is_matching_signature",
                    "digest": hex::encode(digest),
                    "certificate_id": 0,
                    "claimed_issuer": prover,
                },
            ]
        });
        let scenario: Scenario = serde_json::from_value(document).unwrap();

        let registry = CertificateRegistry::new(MemoryStorage::new());
        let reports = run_scenario(&registry, &scenario);

        assert_eq!(reports.len(), 6);
        assert_eq!(reports[2].result, Some(json!(0)));
        assert_eq!(reports[3].result, Some(json!(0)));
        assert_eq!(reports[4].result, Some(json!(true)));
        assert!(reports[5].error.as_deref().unwrap().contains("Issuer mismatch"));
        assert_eq!(registry.events().unwrap().len(), 4);
    }

    #[test]
    fn bad_digest_is_reported_per_step() {
        assert!(decode_digest("0x1234").is_err());
        assert!(decode_hex("zz").is_err());
        assert_eq!(decode_digest(&"ab".repeat(32)).unwrap(), [0xab; 32]);
    }
}
