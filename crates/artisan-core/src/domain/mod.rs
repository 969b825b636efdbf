//! Domain model (ids, job, artifact, outcome, envelope, errors).

pub mod artifact;
pub mod envelope;
pub mod errors;
pub mod ids;
pub mod job;
pub mod outcome;

pub use artifact::Artifact;
pub use envelope::{JobStatus, ResultEnvelope};
pub use errors::{CapabilityError, CoordinatorError, ErrorKind, StoreError};
pub use ids::JobId;
pub use job::{ArtifactRef, Job, TaskName};
pub use outcome::{OutcomeStatus, TaskOutcome};
