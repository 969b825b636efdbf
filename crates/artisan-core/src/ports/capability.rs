//! Capability port: one slow, fallible generation backend.

use async_trait::async_trait;

use crate::domain::{Artifact, CapabilityError, Job};

/// A unit of delegated work: "produce an artifact or text given input".
///
/// Implementations wrap whatever backend does the actual generation (a
/// hosted text model, an image enhancer, a video synthesizer). Calls may
/// take seconds to minutes and may fail transiently (rate limits) or
/// permanently (bad input, auth); the error variant carries the
/// classification.
///
/// Design intent:
/// - The coordinator owns timeout and retry; implementations just do the
///   call and report honestly.
/// - Timed-out invocations are abandoned by dropping the future, so
///   implementations must not hold state that a drop would corrupt.
#[async_trait]
pub trait Capability: Send + Sync {
    async fn invoke(
        &self,
        job: &Job,
        params: &serde_json::Value,
    ) -> Result<Artifact, CapabilityError>;
}
