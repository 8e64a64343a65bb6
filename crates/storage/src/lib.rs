use anyhow::Result;
use parking_lot::RwLock;
use seedcert_types::{
    Address, Certificate, CertificateId, Entity, RegistryEvent, SeedBatch, SeedBatchId,
};
use std::collections::HashMap;
use std::sync::Arc;

/// Storage errors
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum StorageError {
    #[error("{table} id out of sequence: expected {expected}, got {actual}")]
    OutOfSequence {
        table: &'static str,
        expected: u64,
        actual: u64,
    },
    #[error("Seed batch not found: {0}")]
    SeedBatchNotFound(SeedBatchId),
}

/// Abstract registry store.
///
/// Entities are keyed by address and overwritten on commit. Seed batches and
/// certificates live in append-only sequences whose ids are dense and
/// zero-based; a commit carrying any id other than the matching `next_*_id`
/// is refused.
///
/// Each `commit_*` call is one unit: the record, any batch link and the event
/// are all stored, or the call fails and nothing is.
pub trait RegistryStore: Send + Sync {
    fn get_entity(&self, id: &Address) -> Result<Option<Entity>>;
    fn list_entities(&self) -> Result<Vec<Entity>>;
    fn commit_entity(&self, entity: Entity, event: RegistryEvent) -> Result<()>;

    fn next_seed_batch_id(&self) -> Result<SeedBatchId>;
    fn get_seed_batch(&self, id: SeedBatchId) -> Result<Option<SeedBatch>>;
    fn list_seed_batches(&self) -> Result<Vec<SeedBatch>>;
    fn commit_seed_batch(&self, batch: SeedBatch, event: RegistryEvent) -> Result<()>;

    fn next_certificate_id(&self) -> Result<CertificateId>;
    fn get_certificate(&self, id: CertificateId) -> Result<Option<Certificate>>;
    fn list_certificates(&self) -> Result<Vec<Certificate>>;
    /// Store a certificate, append its id to the `link` batch when given, and
    /// record the event
    fn commit_certificate(
        &self,
        certificate: Certificate,
        link: Option<SeedBatchId>,
        event: RegistryEvent,
    ) -> Result<()>;

    fn events(&self) -> Result<Vec<RegistryEvent>>;
}

impl<S: RegistryStore + ?Sized> RegistryStore for Arc<S> {
    fn get_entity(&self, id: &Address) -> Result<Option<Entity>> {
        (**self).get_entity(id)
    }
    fn list_entities(&self) -> Result<Vec<Entity>> {
        (**self).list_entities()
    }
    fn commit_entity(&self, entity: Entity, event: RegistryEvent) -> Result<()> {
        (**self).commit_entity(entity, event)
    }
    fn next_seed_batch_id(&self) -> Result<SeedBatchId> {
        (**self).next_seed_batch_id()
    }
    fn get_seed_batch(&self, id: SeedBatchId) -> Result<Option<SeedBatch>> {
        (**self).get_seed_batch(id)
    }
    fn list_seed_batches(&self) -> Result<Vec<SeedBatch>> {
        (**self).list_seed_batches()
    }
    fn commit_seed_batch(&self, batch: SeedBatch, event: RegistryEvent) -> Result<()> {
        (**self).commit_seed_batch(batch, event)
    }
    fn next_certificate_id(&self) -> Result<CertificateId> {
        (**self).next_certificate_id()
    }
    fn get_certificate(&self, id: CertificateId) -> Result<Option<Certificate>> {
        (**self).get_certificate(id)
    }
    fn list_certificates(&self) -> Result<Vec<Certificate>> {
        (**self).list_certificates()
    }
    fn commit_certificate(
        &self,
        certificate: Certificate,
        link: Option<SeedBatchId>,
        event: RegistryEvent,
    ) -> Result<()> {
        (**self).commit_certificate(certificate, link, event)
    }
    fn events(&self) -> Result<Vec<RegistryEvent>> {
        (**self).events()
    }
}

/// In-memory backend. Clones share the same tables.
///
/// Commits take their write guards in table order (entities, seed batches,
/// certificates, events) and validate before touching anything.
#[derive(Debug, Clone)]
pub struct MemoryStorage {
    entities: Arc<RwLock<HashMap<Address, Entity>>>,
    seed_batches: Arc<RwLock<Vec<SeedBatch>>>,
    certificates: Arc<RwLock<Vec<Certificate>>>,
    events: Arc<RwLock<Vec<RegistryEvent>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self {
            entities: Arc::new(RwLock::new(HashMap::new())),
            seed_batches: Arc::new(RwLock::new(Vec::new())),
            certificates: Arc::new(RwLock::new(Vec::new())),
            events: Arc::new(RwLock::new(Vec::new())),
        }
    }
}

fn check_sequence(table: &'static str, expected: usize, actual: u64) -> Result<()> {
    if expected as u64 != actual {
        return Err(StorageError::OutOfSequence {
            table,
            expected: expected as u64,
            actual,
        }
        .into());
    }
    Ok(())
}

impl RegistryStore for MemoryStorage {
    fn get_entity(&self, id: &Address) -> Result<Option<Entity>> {
        Ok(self.entities.read().get(id).cloned())
    }

    fn list_entities(&self) -> Result<Vec<Entity>> {
        let mut entities: Vec<Entity> = self.entities.read().values().cloned().collect();
        entities.sort_by_key(|e| e.id);
        Ok(entities)
    }

    fn commit_entity(&self, entity: Entity, event: RegistryEvent) -> Result<()> {
        let mut entities = self.entities.write();
        let mut events = self.events.write();
        entities.insert(entity.id, entity);
        events.push(event);
        Ok(())
    }

    fn next_seed_batch_id(&self) -> Result<SeedBatchId> {
        Ok(self.seed_batches.read().len() as SeedBatchId)
    }

    fn get_seed_batch(&self, id: SeedBatchId) -> Result<Option<SeedBatch>> {
        let batches = self.seed_batches.read();
        Ok(usize::try_from(id)
            .ok()
            .and_then(|idx| batches.get(idx))
            .cloned())
    }

    fn list_seed_batches(&self) -> Result<Vec<SeedBatch>> {
        Ok(self.seed_batches.read().clone())
    }

    fn commit_seed_batch(&self, batch: SeedBatch, event: RegistryEvent) -> Result<()> {
        let mut batches = self.seed_batches.write();
        let mut events = self.events.write();
        check_sequence("seed batch", batches.len(), batch.id)?;
        tracing::trace!(id = batch.id, "stored seed batch");
        batches.push(batch);
        events.push(event);
        Ok(())
    }

    fn next_certificate_id(&self) -> Result<CertificateId> {
        Ok(self.certificates.read().len() as CertificateId)
    }

    fn get_certificate(&self, id: CertificateId) -> Result<Option<Certificate>> {
        let certificates = self.certificates.read();
        Ok(usize::try_from(id)
            .ok()
            .and_then(|idx| certificates.get(idx))
            .cloned())
    }

    fn list_certificates(&self) -> Result<Vec<Certificate>> {
        Ok(self.certificates.read().clone())
    }

    fn commit_certificate(
        &self,
        certificate: Certificate,
        link: Option<SeedBatchId>,
        event: RegistryEvent,
    ) -> Result<()> {
        let mut batches = self.seed_batches.write();
        let mut certificates = self.certificates.write();
        let mut events = self.events.write();

        check_sequence("certificate", certificates.len(), certificate.id)?;
        let linked_batch = match link {
            Some(batch) => Some(
                usize::try_from(batch)
                    .ok()
                    .and_then(|idx| batches.get_mut(idx))
                    .ok_or(StorageError::SeedBatchNotFound(batch))?,
            ),
            None => None,
        };

        if let Some(entry) = linked_batch {
            entry.certificate_ids.push(certificate.id);
        }
        tracing::trace!(id = certificate.id, ?link, "stored certificate");
        certificates.push(certificate);
        events.push(event);
        Ok(())
    }

    fn events(&self) -> Result<Vec<RegistryEvent>> {
        Ok(self.events.read().clone())
    }
}
