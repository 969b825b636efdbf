//! Error taxonomy.
//!
//! Only `CoordinatorError` may escape `Coordinator::run`; capability
//! failures are always contained into per-task outcomes.

use thiserror::Error;

use super::job::TaskName;

/// Classification of a capability failure: does retrying make sense?
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Expected to resolve itself on retry (rate limit, flaky upstream).
    Transient,

    /// Will not resolve by retrying (bad input, auth failure).
    Permanent,
}

/// Failure reported by a capability call.
#[derive(Debug, Clone, Error)]
pub enum CapabilityError {
    #[error("transient capability failure: {0}")]
    Transient(String),

    #[error("permanent capability failure: {0}")]
    Permanent(String),
}

impl CapabilityError {
    pub fn transient(msg: impl Into<String>) -> Self {
        Self::Transient(msg.into())
    }

    pub fn permanent(msg: impl Into<String>) -> Self {
        Self::Permanent(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Transient(_) => ErrorKind::Transient,
            Self::Permanent(_) => ErrorKind::Permanent,
        }
    }
}

/// Errors raised by the coordinator itself (never by a sub-task failing).
#[derive(Debug, Error)]
pub enum CoordinatorError {
    /// Zero enabled sub-tasks: nothing to dispatch.
    #[error("no sub-tasks configured for dispatch")]
    NoTasksConfigured,

    /// Two capabilities registered under the same name.
    #[error("duplicate sub-task name: {0}")]
    DuplicateTask(TaskName),

    /// Blank sub-task name at registration.
    #[error("invalid sub-task name: {0:?}")]
    InvalidTaskName(String),

    /// Request failed sanity checks before dispatch.
    #[error("invalid job: {0}")]
    InvalidJob(String),

    /// Envelope read before every sub-task settled. Contract violation.
    #[error("aggregation is incomplete: {settled} of {expected} sub-tasks settled")]
    IncompleteAggregation { settled: usize, expected: usize },

    /// A sub-task slot was written twice. Contract violation.
    #[error("sub-task {0} already settled")]
    SlotAlreadySettled(TaskName),

    /// An outcome was recorded for a name that was never dispatched.
    #[error("unknown sub-task: {0}")]
    UnknownTask(TaskName),
}

/// Errors from the artifact store port.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("artifact not found: {0}")]
    NotFound(String),

    #[error("invalid artifact locator: {0}")]
    InvalidLocator(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capability_error_kind_matches_variant() {
        assert_eq!(
            CapabilityError::transient("429").kind(),
            ErrorKind::Transient
        );
        assert_eq!(
            CapabilityError::permanent("bad input").kind(),
            ErrorKind::Permanent
        );
    }

    #[test]
    fn errors_render_human_readable_detail() {
        let e = CoordinatorError::DuplicateTask(TaskName::new("story"));
        assert_eq!(e.to_string(), "duplicate sub-task name: story");

        let e = CoordinatorError::IncompleteAggregation {
            settled: 1,
            expected: 3,
        };
        assert!(e.to_string().contains("1 of 3"));
    }
}
