//! artisan-core
//!
//! Core building blocks for the Artisan content orchestrator: a bounded,
//! cancellable coordinator that fans one job out to named generation
//! capabilities (story, image, video, ...) and collects every outcome into a
//! single envelope.
//!
//! # Module layout
//! - **domain**: domain model (ids, job, artifact, outcome, envelope, errors)
//! - **ports**: abstraction seams (Capability, ArtifactStore)
//! - **config**: explicit coordinator configuration (no ambient env reads)
//! - **registry**: capability registration (name -> capability, no duplicates)
//! - **retry**: bounded retry with exponential backoff and cancellation
//! - **aggregator**: write-once outcome collection and status derivation
//! - **coordinator**: fan-out, per-task timeout, job deadline, envelope return
//! - **impls**: in-memory implementations for development and tests

pub mod aggregator;
pub mod config;
pub mod coordinator;
pub mod domain;
pub mod impls;
pub mod ports;
pub mod registry;
pub mod retry;

pub use aggregator::ResultAggregator;
pub use config::{CoordinatorConfig, TaskOptions};
pub use coordinator::Coordinator;
pub use registry::{CapabilityRegistry, TaskSpec};
pub use retry::{RetryError, RetryPolicy};
