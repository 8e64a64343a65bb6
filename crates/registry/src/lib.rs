//! Seed certification registry
//!
//! Entities register with a fixed role, manufacturers' seed batches are
//! recorded under dense ids, and issuers attach signed custody certificates to
//! provers. A verifier can then check that a certificate's signature over a
//! digest recovers to the issuer stored on the certificate.

pub mod config;
pub mod errors;
pub mod registry;

pub use config::RegistryConfig;
pub use errors::*;
pub use registry::CertificateRegistry;
