//! Registry behaviour when the backing store fails or is slow to commit.

use anyhow::{anyhow, Result};
use parking_lot::Mutex;
use seedcert_registry::{CertificateRegistry, ErrorKind, RegistryError};
use seedcert_storage::{MemoryStorage, RegistryStore};
use seedcert_types::{
    Address, Certificate, CertificateId, Entity, RegistryEvent, SeedBatch, SeedBatchId,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

/// Memory store whose commits can be switched off, and whose certificate
/// commits can be held until released.
struct TestStore {
    inner: MemoryStorage,
    fail_commits: AtomicBool,
    gate: Option<(Mutex<Sender<()>>, Mutex<Receiver<()>>)>,
}

impl TestStore {
    fn new() -> Self {
        Self {
            inner: MemoryStorage::new(),
            fail_commits: AtomicBool::new(false),
            gate: None,
        }
    }

    fn gated(entered: Sender<()>, release: Receiver<()>) -> Self {
        Self {
            gate: Some((Mutex::new(entered), Mutex::new(release))),
            ..Self::new()
        }
    }

    fn set_failing(&self, failing: bool) {
        self.fail_commits.store(failing, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<()> {
        if self.fail_commits.load(Ordering::SeqCst) {
            return Err(anyhow!("backend unavailable"));
        }
        Ok(())
    }
}

impl RegistryStore for TestStore {
    fn get_entity(&self, id: &Address) -> Result<Option<Entity>> {
        self.inner.get_entity(id)
    }
    fn list_entities(&self) -> Result<Vec<Entity>> {
        self.inner.list_entities()
    }
    fn commit_entity(&self, entity: Entity, event: RegistryEvent) -> Result<()> {
        self.check_available()?;
        self.inner.commit_entity(entity, event)
    }
    fn next_seed_batch_id(&self) -> Result<SeedBatchId> {
        self.inner.next_seed_batch_id()
    }
    fn get_seed_batch(&self, id: SeedBatchId) -> Result<Option<SeedBatch>> {
        self.inner.get_seed_batch(id)
    }
    fn list_seed_batches(&self) -> Result<Vec<SeedBatch>> {
        self.inner.list_seed_batches()
    }
    fn commit_seed_batch(&self, batch: SeedBatch, event: RegistryEvent) -> Result<()> {
        self.check_available()?;
        self.inner.commit_seed_batch(batch, event)
    }
    fn next_certificate_id(&self) -> Result<CertificateId> {
        self.inner.next_certificate_id()
    }
    fn get_certificate(&self, id: CertificateId) -> Result<Option<Certificate>> {
        self.inner.get_certificate(id)
    }
    fn list_certificates(&self) -> Result<Vec<Certificate>> {
        self.inner.list_certificates()
    }
    fn commit_certificate(
        &self,
        certificate: Certificate,
        link: Option<SeedBatchId>,
        event: RegistryEvent,
    ) -> Result<()> {
        self.check_available()?;
        if let Some((entered, release)) = &self.gate {
            entered.lock().send(())?;
            release.lock().recv()?;
        }
        self.inner.commit_certificate(certificate, link, event)
    }
    fn events(&self) -> Result<Vec<RegistryEvent>> {
        self.inner.events()
    }
}

fn addr(byte: u8) -> Address {
    Address([byte; 20])
}

fn seeded<S: RegistryStore>(registry: &CertificateRegistry<S>) {
    registry.add_entity(addr(1), "ISSUER").unwrap();
    registry.add_entity(addr(2), "PROVER").unwrap();
    registry.add_seed_batch("brandX", addr(2)).unwrap();
}

fn assert_storage_error(err: RegistryError) {
    assert!(matches!(err, RegistryError::Storage(_)), "{err}");
    assert_eq!(err.kind(), ErrorKind::Storage);
}

#[test]
fn failed_entity_commit_leaves_registry_unchanged() {
    let registry = CertificateRegistry::new(TestStore::new());
    seeded(&registry);
    let events_before = registry.events().unwrap();

    registry.store().set_failing(true);
    assert_storage_error(registry.add_entity(addr(1), "VERIFIER").unwrap_err());
    assert_storage_error(registry.add_entity(addr(3), "PROVER").unwrap_err());

    assert!(registry.entity(&addr(1)).unwrap().unwrap().is_issuer());
    assert!(registry.entity(&addr(3)).unwrap().is_none());
    assert_eq!(registry.entities().unwrap().len(), 2);
    assert_eq!(registry.events().unwrap(), events_before);
}

#[test]
fn failed_seed_batch_commit_does_not_consume_an_id() {
    let registry = CertificateRegistry::new(TestStore::new());
    seeded(&registry);
    let events_before = registry.events().unwrap();

    registry.store().set_failing(true);
    assert_storage_error(registry.add_seed_batch("brandY", addr(2)).unwrap_err());
    assert_eq!(registry.seed_batch_count().unwrap(), 1);
    assert!(registry.seed_batch(1).unwrap().is_none());
    assert_eq!(registry.events().unwrap(), events_before);

    registry.store().set_failing(false);
    assert_eq!(registry.add_seed_batch("brandY", addr(2)).unwrap(), 1);
}

#[test]
fn failed_certificate_commit_stores_no_certificate_link_or_event() {
    let registry = CertificateRegistry::new(TestStore::new());
    seeded(&registry);
    let events_before = registry.events().unwrap();

    registry.store().set_failing(true);
    let err = registry
        .issue_certificate(addr(1), addr(2), "MANUFACTURED", 0, &[0u8; 65])
        .unwrap_err();
    assert_storage_error(err);

    assert_eq!(registry.certificate_count().unwrap(), 0);
    assert!(registry.certificate(0).unwrap().is_none());
    assert!(registry
        .seed_batch(0)
        .unwrap()
        .unwrap()
        .certificate_ids
        .is_empty());
    assert_eq!(registry.events().unwrap(), events_before);

    registry.store().set_failing(false);
    let id = registry
        .issue_certificate(addr(1), addr(2), "MANUFACTURED", 0, &[0u8; 65])
        .unwrap();
    assert_eq!(id, 0);
    assert_eq!(registry.seed_batch(0).unwrap().unwrap().certificate_ids, vec![0]);
    assert_eq!(registry.events().unwrap().len(), events_before.len() + 1);
}

#[test]
fn readers_wait_for_an_issuance_in_progress() {
    let (entered_tx, entered_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel();
    let registry = CertificateRegistry::new(TestStore::gated(entered_tx, release_rx));
    seeded(&registry);
    let registry = &registry;

    thread::scope(|scope| {
        let writer = scope.spawn(move || {
            registry.issue_certificate(addr(1), addr(2), "STORED", 0, &[0u8; 65])
        });
        entered_rx.recv().unwrap();

        let (seen_tx, seen_rx) = mpsc::channel();
        scope.spawn(move || {
            let certificate = registry.certificate(0).unwrap();
            let links = registry.seed_batch(0).unwrap().unwrap().certificate_ids;
            let issued = registry
                .events()
                .unwrap()
                .iter()
                .filter(|event| matches!(event, RegistryEvent::CertificateIssued { .. }))
                .count();
            seen_tx.send((certificate, links, issued)).unwrap();
        });

        // the reader stays blocked while the commit is held open
        let early = seen_rx.recv_timeout(Duration::from_millis(100)).ok();
        release_tx.send(()).unwrap();
        assert!(early.is_none(), "reader saw {early:?} mid-issuance");

        let (certificate, links, issued) = seen_rx.recv().unwrap();
        assert_eq!(certificate.map(|c| c.id), Some(0));
        assert_eq!(links, vec![0]);
        assert_eq!(issued, 1);
        assert_eq!(writer.join().unwrap().unwrap(), 0);
    });
}
