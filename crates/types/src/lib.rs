//! Core types for the seed certification registry
//!
//! Entities, seed batches and certificates, the closed label sets used to
//! describe them, and the events a registry emits when they are created.

pub mod address;
pub mod event;
pub mod labels;
pub mod records;

pub use address::*;
pub use event::*;
pub use labels::*;
pub use records::*;
