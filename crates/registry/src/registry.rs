//! Certificate registry service
//!
//! Orchestrates entity registration, seed batch registration, certificate
//! issuance and issuer verification over an injected [`RegistryStore`].

use crate::config::RegistryConfig;
use crate::errors::*;
use parking_lot::RwLock;
use seedcert_crypto::recover_signer;
use seedcert_storage::RegistryStore;
use seedcert_types::{
    Address, Certificate, CertificateId, Entity, Mode, RegistryEvent, SeedBatch, SeedBatchId,
    Status,
};
use tracing::{debug, info, warn};

/// Certificate registry
///
/// Mutating operations hold the write side of `guard`, check every
/// precondition first and then hand the store a single commit, so a failed
/// call leaves the store untouched. Reads hold the read side and only ever
/// observe whole commits.
#[derive(Debug)]
pub struct CertificateRegistry<S> {
    store: S,
    config: RegistryConfig,
    guard: RwLock<()>,
}

impl<S: RegistryStore> CertificateRegistry<S> {
    /// Create a registry over `store` with default configuration
    pub fn new(store: S) -> Self {
        Self::with_config(store, RegistryConfig::default())
    }

    pub fn with_config(store: S, config: RegistryConfig) -> Self {
        Self {
            store,
            config,
            guard: RwLock::new(()),
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Register (or re-register) an entity under `id` with the given role.
    ///
    /// An existing record at `id` is replaced. Certificates already issued keep
    /// their own copy of the previous record.
    pub fn add_entity(&self, id: Address, mode_label: &str) -> Result<()> {
        let mode = Mode::parse(mode_label).map_err(|err| {
            warn!(%id, mode_label, "rejected entity with unknown mode");
            err
        })?;

        let _guard = self.guard.write();

        let entity = Entity::new(id, mode, self.config.max_certifications);
        self.store.commit_entity(
            entity,
            RegistryEvent::EntityAdded {
                id,
                mode_label: mode_label.to_string(),
            },
        )?;

        info!(%id, %mode, "entity added");
        Ok(())
    }

    /// Record a new seed batch and return its id.
    ///
    /// The manufacturer does not need to be a registered entity.
    pub fn add_seed_batch(&self, brand: &str, manufacturer: Address) -> Result<SeedBatchId> {
        let _guard = self.guard.write();

        let id = self.store.next_seed_batch_id()?;
        self.store.commit_seed_batch(
            SeedBatch::new(id, brand, manufacturer),
            RegistryEvent::SeedBatchAdded { id, manufacturer },
        )?;

        info!(id, %manufacturer, brand, "seed batch added");
        Ok(id)
    }

    /// Issue a certificate from `issuer` to `prover` with the given status.
    ///
    /// The issuer must be registered as `ISSUER` and the prover as `PROVER`.
    /// Both records are copied into the certificate as they stand now. The
    /// signature is stored verbatim; its shape is only checked when it is
    /// verified.
    pub fn issue_certificate(
        &self,
        issuer: Address,
        prover: Address,
        status_label: &str,
        seed_batch_id: SeedBatchId,
        signature: &[u8],
    ) -> Result<CertificateId> {
        let _guard = self.guard.write();

        let issuer_record = self
            .store
            .get_entity(&issuer)?
            .filter(Entity::is_issuer)
            .ok_or_else(|| {
                warn!(%issuer, "certificate refused: not a registered issuer");
                RegistryError::NotAnIssuer(issuer)
            })?;

        let prover_record = self
            .store
            .get_entity(&prover)?
            .filter(Entity::is_prover)
            .ok_or_else(|| {
                warn!(%prover, "certificate refused: not a registered prover");
                RegistryError::NotAProver(prover)
            })?;

        let status = Status::parse(status_label)?;

        if self.config.enforce_seed_batch_links
            && self.store.get_seed_batch(seed_batch_id)?.is_none()
        {
            warn!(seed_batch_id, "certificate refused: unknown seed batch");
            return Err(RegistryError::SeedBatchNotFound(seed_batch_id));
        }

        let id = self.store.next_certificate_id()?;
        let link = self
            .config
            .enforce_seed_batch_links
            .then_some(seed_batch_id);
        self.store.commit_certificate(
            Certificate {
                id,
                issuer: issuer_record,
                prover: prover_record,
                signature: signature.to_vec(),
                status,
                seed_batch_id,
            },
            link,
            RegistryEvent::CertificateIssued { issuer, prover, id },
        )?;

        info!(id, %issuer, %prover, %status, seed_batch_id, "certificate issued");
        Ok(id)
    }

    /// Check that the certificate's signature over `digest` was made by its
    /// issuer.
    ///
    /// `claimed_issuer` must be the issuer stored on the certificate, otherwise
    /// the call fails with [`RegistryError::IssuerMismatch`]. A signature that
    /// does not recover to any key, or recovers to another key, yields
    /// `Ok(false)`.
    pub fn is_matching_signature(
        &self,
        digest: &[u8; 32],
        certificate_id: CertificateId,
        claimed_issuer: &Address,
    ) -> Result<bool> {
        let certificate = self
            .certificate(certificate_id)?
            .ok_or(RegistryError::CertificateNotFound(certificate_id))?;

        let stored = certificate.issuer.id;
        if *claimed_issuer != stored {
            warn!(certificate_id, claimed = %claimed_issuer, %stored, "issuer mismatch");
            return Err(RegistryError::IssuerMismatch {
                claimed: *claimed_issuer,
                stored,
            });
        }

        let signer = recover_signer(digest, &certificate.signature, self.config.signature_layout)?;
        let matches = !signer.is_zero() && signer == stored;

        debug!(certificate_id, %signer, matches, "verified certificate signature");
        Ok(matches)
    }

    pub fn entity(&self, id: &Address) -> Result<Option<Entity>> {
        let _guard = self.guard.read();
        Ok(self.store.get_entity(id)?)
    }

    pub fn seed_batch(&self, id: SeedBatchId) -> Result<Option<SeedBatch>> {
        let _guard = self.guard.read();
        Ok(self.store.get_seed_batch(id)?)
    }

    pub fn certificate(&self, id: CertificateId) -> Result<Option<Certificate>> {
        let _guard = self.guard.read();
        Ok(self.store.get_certificate(id)?)
    }

    pub fn entities(&self) -> Result<Vec<Entity>> {
        let _guard = self.guard.read();
        Ok(self.store.list_entities()?)
    }

    pub fn seed_batches(&self) -> Result<Vec<SeedBatch>> {
        let _guard = self.guard.read();
        Ok(self.store.list_seed_batches()?)
    }

    pub fn certificates(&self) -> Result<Vec<Certificate>> {
        let _guard = self.guard.read();
        Ok(self.store.list_certificates()?)
    }

    pub fn seed_batch_count(&self) -> Result<u64> {
        let _guard = self.guard.read();
        Ok(self.store.next_seed_batch_id()?)
    }

    pub fn certificate_count(&self) -> Result<u64> {
        let _guard = self.guard.read();
        Ok(self.store.next_certificate_id()?)
    }

    /// Events emitted so far, oldest first
    pub fn events(&self) -> Result<Vec<RegistryEvent>> {
        let _guard = self.guard.read();
        Ok(self.store.events()?)
    }
}
