//! Result aggregator: write-once outcome collection for one job.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::domain::{
    CoordinatorError, JobId, JobStatus, ResultEnvelope, TaskName, TaskOutcome,
};

struct AggregatorState {
    /// Which names may settle, and whether each gates the overall status.
    expected: HashMap<TaskName, bool>,

    /// Settled outcomes (each name written exactly once).
    slots: HashMap<TaskName, TaskOutcome>,

    /// Monotonic completion counter; equals `slots.len()` but is the one
    /// value the "are we done" check reads.
    settled: usize,

    /// Set by `finalize`; the envelope is unreadable before then.
    status: Option<JobStatus>,

    finished_at: Option<DateTime<Utc>>,
}

/// Incrementally builds the `ResultEnvelope` as sub-tasks settle.
///
/// Safe to update concurrently from settling sub-tasks: one mutation per
/// sub-task name, each name written exactly once. Reading before `finalize`
/// is a contract violation (`IncompleteAggregation`).
pub struct ResultAggregator {
    job_id: JobId,
    started_at: DateTime<Utc>,
    state: Mutex<AggregatorState>,
}

impl ResultAggregator {
    pub fn new(job_id: JobId, tasks: impl IntoIterator<Item = (TaskName, bool)>) -> Self {
        let expected: HashMap<TaskName, bool> = tasks.into_iter().collect();
        Self {
            job_id,
            started_at: Utc::now(),
            state: Mutex::new(AggregatorState {
                slots: HashMap::with_capacity(expected.len()),
                expected,
                settled: 0,
                status: None,
                finished_at: None,
            }),
        }
    }

    /// Record the terminal outcome of one sub-task.
    pub async fn record(
        &self,
        name: &TaskName,
        outcome: TaskOutcome,
    ) -> Result<(), CoordinatorError> {
        let mut state = self.state.lock().await;
        if !state.expected.contains_key(name) {
            return Err(CoordinatorError::UnknownTask(name.clone()));
        }
        if state.slots.contains_key(name) {
            return Err(CoordinatorError::SlotAlreadySettled(name.clone()));
        }
        state.slots.insert(name.clone(), outcome);
        state.settled += 1;
        Ok(())
    }

    /// Number of sub-tasks that have settled so far.
    pub async fn settled(&self) -> usize {
        self.state.lock().await.settled
    }

    /// Settled and expected counts, for diagnostics.
    pub async fn progress(&self) -> (usize, usize) {
        let state = self.state.lock().await;
        (state.settled, state.expected.len())
    }

    /// Close the aggregate: fill every still-empty slot with a timed-out
    /// outcome in one pass (the job deadline expired on them), then derive
    /// the overall status.
    ///
    /// Required sub-tasks drive the status; when none is marked required the
    /// derivation falls back to all of them.
    pub async fn finalize(&self) {
        let mut state = self.state.lock().await;
        if state.status.is_some() {
            return; // already finalized
        }

        let elapsed = (Utc::now() - self.started_at)
            .to_std()
            .unwrap_or_default();
        let missing: Vec<TaskName> = state
            .expected
            .keys()
            .filter(|name| !state.slots.contains_key(*name))
            .cloned()
            .collect();
        for name in missing {
            state.slots.insert(
                name,
                TaskOutcome::timed_out("job deadline expired before sub-task settled", elapsed, 0),
            );
            state.settled += 1;
        }

        let required: Vec<&TaskOutcome> = state
            .expected
            .iter()
            .filter(|(_, required)| **required)
            .map(|(name, _)| &state.slots[name])
            .collect();
        let status = if required.is_empty() {
            JobStatus::derive(state.slots.values())
        } else {
            JobStatus::derive(required)
        };

        state.status = Some(status);
        state.finished_at = Some(Utc::now());
    }

    /// Consume the aggregator and hand the envelope to the caller.
    pub async fn into_envelope(self) -> Result<ResultEnvelope, CoordinatorError> {
        let state = self.state.into_inner();
        let Some(status) = state.status else {
            return Err(CoordinatorError::IncompleteAggregation {
                settled: state.settled,
                expected: state.expected.len(),
            });
        };
        Ok(ResultEnvelope::new(
            self.job_id,
            status,
            state.slots,
            self.started_at,
            state.finished_at.unwrap_or_else(Utc::now),
        ))
    }
}
