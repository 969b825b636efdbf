//! ResultEnvelope: the aggregate returned to the caller, one entry per
//! configured sub-task.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::JobId;
use super::job::TaskName;
use super::outcome::TaskOutcome;

/// Overall status of a job, derived from its sub-task outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    /// Every considered sub-task succeeded.
    Succeeded,

    /// At least one succeeded and at least one failed or timed out.
    Partial,

    /// No considered sub-task succeeded.
    Failed,
}

impl JobStatus {
    /// Derive the overall status from the considered outcomes (the required
    /// sub-tasks; callers fall back to all sub-tasks when none is required).
    pub fn derive<'a, I>(outcomes: I) -> Self
    where
        I: IntoIterator<Item = &'a TaskOutcome>,
    {
        let mut any_success = false;
        let mut any_failure = false;
        for outcome in outcomes {
            if outcome.is_success() {
                any_success = true;
            } else {
                any_failure = true;
            }
        }
        match (any_success, any_failure) {
            (true, false) => Self::Succeeded,
            (true, true) => Self::Partial,
            _ => Self::Failed,
        }
    }
}

/// Aggregate of all sub-task outcomes for one job.
///
/// Owned by the coordinator until returned; immutable thereafter. Always
/// enumerates every configured sub-task by name, never silently omits a
/// failed one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultEnvelope {
    job_id: JobId,
    status: JobStatus,
    outcomes: HashMap<TaskName, TaskOutcome>,
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
}

impl ResultEnvelope {
    pub(crate) fn new(
        job_id: JobId,
        status: JobStatus,
        outcomes: HashMap<TaskName, TaskOutcome>,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
    ) -> Self {
        Self {
            job_id,
            status,
            outcomes,
            started_at,
            finished_at,
        }
    }

    pub fn job_id(&self) -> JobId {
        self.job_id
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    pub fn outcome(&self, name: &TaskName) -> Option<&TaskOutcome> {
        self.outcomes.get(name)
    }

    pub fn outcomes(&self) -> impl Iterator<Item = (&TaskName, &TaskOutcome)> {
        self.outcomes.iter()
    }

    /// Number of sub-task entries (always equals the configured count).
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn finished_at(&self) -> DateTime<Utc> {
        self.finished_at
    }
}
