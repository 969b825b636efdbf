//! Outcome model: the terminal result of running one sub-task.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::artifact::Artifact;

/// Terminal status of one sub-task.
///
/// Serialized SCREAMING_SNAKE_CASE: SUCCEEDED / FAILED / TIMED_OUT.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutcomeStatus {
    Succeeded,
    Failed,
    TimedOut,
}

/// Result of running one sub-task against one job.
///
/// Invariant: exactly one of `payload` / `error` is populated. Construct via
/// `succeeded` / `failed` / `timed_out`; fields are private so the invariant
/// cannot be broken after the fact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskOutcome {
    status: OutcomeStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    payload: Option<Artifact>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,

    /// Wall-clock time from dispatch to settlement.
    elapsed: Duration,

    /// Retry attempts consumed beyond the first invocation.
    retries: u32,
}

impl TaskOutcome {
    pub fn succeeded(payload: Artifact, elapsed: Duration, retries: u32) -> Self {
        Self {
            status: OutcomeStatus::Succeeded,
            payload: Some(payload),
            error: None,
            elapsed,
            retries,
        }
    }

    pub fn failed(error: impl Into<String>, elapsed: Duration, retries: u32) -> Self {
        Self {
            status: OutcomeStatus::Failed,
            payload: None,
            error: Some(error.into()),
            elapsed,
            retries,
        }
    }

    pub fn timed_out(error: impl Into<String>, elapsed: Duration, retries: u32) -> Self {
        Self {
            status: OutcomeStatus::TimedOut,
            payload: None,
            error: Some(error.into()),
            elapsed,
            retries,
        }
    }

    pub fn status(&self) -> OutcomeStatus {
        self.status
    }

    pub fn is_success(&self) -> bool {
        self.status == OutcomeStatus::Succeeded
    }

    /// Present iff the sub-task succeeded.
    pub fn payload(&self) -> Option<&Artifact> {
        self.payload.as_ref()
    }

    /// Human-readable detail, present iff the sub-task failed or timed out.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn retries(&self) -> u32 {
        self.retries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serializes_as_required_names() {
        let s = serde_json::to_string(&OutcomeStatus::Succeeded).unwrap();
        assert_eq!(s, "\"SUCCEEDED\"");
        let s = serde_json::to_string(&OutcomeStatus::TimedOut).unwrap();
        assert_eq!(s, "\"TIMED_OUT\"");
    }

    #[test]
    fn payload_xor_error_holds_for_every_constructor() {
        let ok = TaskOutcome::succeeded(Artifact::text("story"), Duration::from_secs(2), 0);
        assert!(ok.payload().is_some() && ok.error().is_none());

        let failed = TaskOutcome::failed("quota exceeded", Duration::from_secs(1), 3);
        assert!(failed.payload().is_none() && failed.error().is_some());

        let timed = TaskOutcome::timed_out("ceiling 5s exceeded", Duration::from_secs(5), 1);
        assert!(timed.payload().is_none() && timed.error().is_some());
    }

    #[test]
    fn outcome_roundtrip_json() {
        let o = TaskOutcome::failed("oops", Duration::from_millis(250), 2);
        let s = serde_json::to_string(&o).unwrap();
        let back: TaskOutcome = serde_json::from_str(&s).unwrap();
        assert_eq!(back, o);
        assert_eq!(back.retries(), 2);
    }
}
