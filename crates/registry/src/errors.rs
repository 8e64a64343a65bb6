//! Error types for the certificate registry

use seedcert_crypto::SignatureError;
use seedcert_types::{Address, CertificateId, LabelError, SeedBatchId};
use thiserror::Error;

/// Broad class of a registry failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed input: signature length, unknown labels
    Validation,
    /// Caller lacks the role or identity the operation requires
    Authorization,
    /// Referenced record does not exist
    NotFound,
    /// Backend failure
    Storage,
}

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Invalid signature length: expected 65 bytes, got {actual}")]
    InvalidSignatureLength { actual: usize },

    #[error("Invalid signature layout: {0:?}")]
    InvalidSignatureLayout(String),

    #[error("Invalid mode label: {0:?}")]
    InvalidMode(String),

    #[error("Invalid status label: {0:?}")]
    InvalidStatus(String),

    #[error("Not an issuer: {0}")]
    NotAnIssuer(Address),

    #[error("Not a prover: {0}")]
    NotAProver(Address),

    #[error("Issuer mismatch: claimed {claimed}, certificate issued by {stored}")]
    IssuerMismatch { claimed: Address, stored: Address },

    #[error("Certificate not found: {0}")]
    CertificateNotFound(CertificateId),

    #[error("Seed batch not found: {0}")]
    SeedBatchNotFound(SeedBatchId),

    #[error("Registry storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

impl RegistryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RegistryError::InvalidSignatureLength { .. }
            | RegistryError::InvalidSignatureLayout(_)
            | RegistryError::InvalidMode(_)
            | RegistryError::InvalidStatus(_) => ErrorKind::Validation,
            RegistryError::NotAnIssuer(_)
            | RegistryError::NotAProver(_)
            | RegistryError::IssuerMismatch { .. } => ErrorKind::Authorization,
            RegistryError::CertificateNotFound(_) | RegistryError::SeedBatchNotFound(_) => {
                ErrorKind::NotFound
            }
            RegistryError::Storage(_) => ErrorKind::Storage,
        }
    }
}

impl From<LabelError> for RegistryError {
    fn from(err: LabelError) -> Self {
        match err {
            LabelError::UnknownMode(label) => RegistryError::InvalidMode(label),
            LabelError::UnknownStatus(label) => RegistryError::InvalidStatus(label),
        }
    }
}

impl From<SignatureError> for RegistryError {
    fn from(err: SignatureError) -> Self {
        match err {
            SignatureError::InvalidLength { actual } => {
                RegistryError::InvalidSignatureLength { actual }
            }
            SignatureError::UnknownLayout(label) => RegistryError::InvalidSignatureLayout(label),
        }
    }
}

pub type Result<T> = std::result::Result<T, RegistryError>;
