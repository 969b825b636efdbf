//! Abstraction seams consumed by the coordinator.
//!
//! The coordinator never talks to a concrete backend: generation models sit
//! behind `Capability`, large payloads behind `ArtifactStore`. v1 ships
//! in-memory implementations under `impls`; hosted backends are the seam's
//! point, not its concern.

mod artifact_store;
mod capability;

pub use artifact_store::ArtifactStore;
pub use capability::Capability;
