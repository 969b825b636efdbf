//! Task coordinator: fan-out, per-task timeout, job deadline, envelope return.

use std::sync::Arc;
use std::time::Instant;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, info_span, warn, Instrument};

use crate::aggregator::ResultAggregator;
use crate::config::CoordinatorConfig;
use crate::domain::{CapabilityError, CoordinatorError, Job, ResultEnvelope, TaskOutcome};
use crate::registry::{CapabilityRegistry, TaskSpec};
use crate::retry::{RetryError, RetryPolicy};

/// Dispatches one job to every enabled capability and collects the outcomes.
///
/// Contract:
/// - Every enabled sub-task gets exactly one entry in the envelope.
/// - A sub-task failing or timing out never fails the job; callers inspect
///   the envelope's overall status.
/// - Only configuration and aggregation-contract errors escape as `Err`.
/// - Holds no state across jobs.
pub struct Coordinator {
    registry: CapabilityRegistry,
    config: CoordinatorConfig,
}

impl Coordinator {
    pub fn new(registry: CapabilityRegistry, config: CoordinatorConfig) -> Self {
        Self { registry, config }
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    /// Run one job to completion and return its envelope.
    ///
    /// Returns once every sub-task has settled or the job deadline elapses,
    /// whichever comes first; never blocks indefinitely on any one sub-task
    /// beyond its configured ceiling.
    pub async fn run(&self, job: Job) -> Result<ResultEnvelope, CoordinatorError> {
        job.validate()?;
        let specs = self.registry.specs(&self.config);
        if specs.is_empty() {
            return Err(CoordinatorError::NoTasksConfigured);
        }

        let span = info_span!("job", id = %job.id, tasks = specs.len());
        self.dispatch(job, specs).instrument(span).await
    }

    async fn dispatch(
        &self,
        job: Job,
        specs: Vec<TaskSpec>,
    ) -> Result<ResultEnvelope, CoordinatorError> {
        let aggregator = Arc::new(ResultAggregator::new(
            job.id,
            specs.iter().map(|s| (s.name.clone(), s.required)),
        ));
        let job = Arc::new(job);
        let cancel = CancellationToken::new();

        // Job-level deadline: one watchdog fires the token for everyone.
        let watchdog: Option<JoinHandle<()>> = self.config.job_deadline.map(|deadline| {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                tokio::time::sleep(deadline).await;
                warn!(deadline_ms = deadline.as_millis() as u64, "job deadline expired");
                cancel.cancel();
            })
        });

        let mut handles = Vec::with_capacity(specs.len());
        for spec in specs {
            let job = Arc::clone(&job);
            let aggregator = Arc::clone(&aggregator);
            let cancel = cancel.clone();
            let retry = RetryPolicy::new(
                spec.max_retries,
                self.config.retry_base_delay,
                self.config.retry_max_delay,
            );

            handles.push(tokio::spawn(async move {
                let name = spec.name.clone();
                let started = Instant::now();
                // Biased: once the deadline fires, no sub-task may settle as
                // succeeded, even if its result is also ready.
                let outcome = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => TaskOutcome::timed_out(
                        "job deadline expired before sub-task settled",
                        started.elapsed(),
                        0,
                    ),
                    outcome = run_task(&job, &spec, &retry, &cancel) => outcome,
                };

                info!(task = %name, status = ?outcome.status(), elapsed_ms = outcome.elapsed().as_millis() as u64, "sub-task settled");
                if let Err(e) = aggregator.record(&name, outcome).await {
                    // Unreachable by construction (one write per spawned task).
                    warn!(task = %name, error = %e, "failed to record outcome");
                }
            }));
        }

        // Each handle resolves promptly after the token fires, so this join
        // is bounded by the deadline plus scheduling slack.
        for handle in handles {
            let _ = handle.await;
        }
        if let Some(watchdog) = watchdog {
            watchdog.abort();
        }

        aggregator.finalize().await;
        match Arc::try_unwrap(aggregator) {
            Ok(aggregator) => aggregator.into_envelope().await,
            // Every task handle was joined, so no clone should survive; if
            // one does, report where the aggregation actually stands.
            Err(aggregator) => {
                let (settled, expected) = aggregator.progress().await;
                Err(CoordinatorError::IncompleteAggregation { settled, expected })
            }
        }
    }
}

/// Run one sub-task: per-task timeout around the retry-wrapped capability
/// call. The timed-out future is dropped (abandoned), never blocked on.
async fn run_task(
    job: &Job,
    spec: &TaskSpec,
    retry: &RetryPolicy,
    cancel: &CancellationToken,
) -> TaskOutcome {
    let params = job.params_for(&spec.name);
    let started = Instant::now();

    let attempts_guess = std::sync::atomic::AtomicU32::new(0);
    let call = retry.run(cancel, CapabilityError::kind, |attempt| {
        attempts_guess.store(attempt, std::sync::atomic::Ordering::Relaxed);
        spec.capability.invoke(job, &params)
    });

    let result = tokio::time::timeout(spec.timeout, call).await;
    let elapsed = started.elapsed();
    let attempts = attempts_guess.load(std::sync::atomic::Ordering::Relaxed);
    let retries = attempts.saturating_sub(1);

    match result {
        Ok(Ok(artifact)) => TaskOutcome::succeeded(artifact, elapsed, retries),
        Ok(Err(RetryError::Exhausted { attempts, last })) => TaskOutcome::failed(
            format!("retries exhausted after {attempts} attempts: {last}"),
            elapsed,
            attempts.saturating_sub(1),
        ),
        Ok(Err(RetryError::Permanent { error, .. })) => {
            TaskOutcome::failed(error.to_string(), elapsed, retries)
        }
        Ok(Err(RetryError::Cancelled)) => TaskOutcome::timed_out(
            "job deadline expired before sub-task settled",
            elapsed,
            retries,
        ),
        Err(_elapsed) => TaskOutcome::timed_out(
            format!(
                "sub-task ceiling of {}ms exceeded",
                spec.timeout.as_millis()
            ),
            elapsed,
            retries,
        ),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::config::TaskOptions;
    use crate::domain::{Artifact, ArtifactRef, JobStatus, OutcomeStatus, TaskName};
    use crate::ports::Capability;

    struct SlowText {
        delay: Duration,
        text: &'static str,
    }

    #[async_trait]
    impl Capability for SlowText {
        async fn invoke(
            &self,
            _job: &Job,
            _params: &serde_json::Value,
        ) -> Result<Artifact, CapabilityError> {
            tokio::time::sleep(self.delay).await;
            Ok(Artifact::text(self.text))
        }
    }

    struct AlwaysFailing {
        calls: Arc<AtomicU32>,
        permanent: bool,
    }

    #[async_trait]
    impl Capability for AlwaysFailing {
        async fn invoke(
            &self,
            _job: &Job,
            _params: &serde_json::Value,
        ) -> Result<Artifact, CapabilityError> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            if self.permanent {
                Err(CapabilityError::permanent("unsupported image format"))
            } else {
                Err(CapabilityError::transient("rate limited"))
            }
        }
    }

    fn job() -> Job {
        Job::new(
            "hand-carved wooden bowl",
            ArtifactRef::new("ref://img1"),
        )
    }

    fn fast_config() -> CoordinatorConfig {
        CoordinatorConfig {
            default_timeout: Duration::from_secs(5),
            default_max_retries: 3,
            retry_base_delay: Duration::from_millis(1),
            retry_max_delay: Duration::from_millis(4),
            job_deadline: None,
            tasks: Default::default(),
        }
    }

    #[tokio::test]
    async fn zero_registered_tasks_is_a_configuration_error() {
        let coordinator = Coordinator::new(CapabilityRegistry::new(), fast_config());
        let err = coordinator.run(job()).await.unwrap_err();
        assert!(matches!(err, CoordinatorError::NoTasksConfigured));
    }

    #[tokio::test]
    async fn all_tasks_disabled_is_a_configuration_error() {
        let mut registry = CapabilityRegistry::new();
        registry
            .register(
                "story",
                Arc::new(SlowText {
                    delay: Duration::ZERO,
                    text: "s",
                }),
            )
            .unwrap();
        let config = fast_config().with_task("story", TaskOptions::disabled());

        let err = Coordinator::new(registry, config).run(job()).await.unwrap_err();
        assert!(matches!(err, CoordinatorError::NoTasksConfigured));
    }

    #[tokio::test]
    async fn invalid_job_is_rejected_before_dispatch() {
        let calls = Arc::new(AtomicU32::new(0));
        let mut registry = CapabilityRegistry::new();
        registry
            .register(
                "story",
                Arc::new(AlwaysFailing {
                    calls: Arc::clone(&calls),
                    permanent: false,
                }),
            )
            .unwrap();

        let bad = Job::new("", ArtifactRef::new("ref://img1"));
        let err = Coordinator::new(registry, fast_config()).run(bad).await.unwrap_err();
        assert!(matches!(err, CoordinatorError::InvalidJob(_)));
        assert_eq!(calls.load(Ordering::Relaxed), 0);
    }

    #[tokio::test]
    async fn envelope_has_one_entry_per_task_regardless_of_outcome() {
        let mut registry = CapabilityRegistry::new();
        registry
            .register(
                "story",
                Arc::new(SlowText {
                    delay: Duration::ZERO,
                    text: "s",
                }),
            )
            .unwrap();
        registry
            .register(
                "image",
                Arc::new(AlwaysFailing {
                    calls: Arc::new(AtomicU32::new(0)),
                    permanent: true,
                }),
            )
            .unwrap();
        registry
            .register(
                "emails",
                Arc::new(AlwaysFailing {
                    calls: Arc::new(AtomicU32::new(0)),
                    permanent: false,
                }),
            )
            .unwrap();

        let env = Coordinator::new(registry, fast_config())
            .run(job())
            .await
            .unwrap();

        assert_eq!(env.len(), 3);
        assert_eq!(env.status(), JobStatus::Partial);
        for (_, outcome) in env.outcomes() {
            // payload XOR error
            assert_ne!(outcome.payload().is_some(), outcome.error().is_some());
        }
    }

    #[tokio::test]
    async fn transient_failures_consume_exactly_one_plus_r_calls() {
        let calls = Arc::new(AtomicU32::new(0));
        let mut registry = CapabilityRegistry::new();
        registry
            .register(
                "story",
                Arc::new(AlwaysFailing {
                    calls: Arc::clone(&calls),
                    permanent: false,
                }),
            )
            .unwrap();

        let env = Coordinator::new(registry, fast_config())
            .run(job())
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::Relaxed), 4);
        let outcome = env.outcome(&TaskName::new("story")).unwrap();
        assert_eq!(outcome.status(), OutcomeStatus::Failed);
        assert_eq!(outcome.retries(), 3);
    }

    #[tokio::test]
    async fn permanent_failure_is_not_retried() {
        let calls = Arc::new(AtomicU32::new(0));
        let mut registry = CapabilityRegistry::new();
        registry
            .register(
                "image",
                Arc::new(AlwaysFailing {
                    calls: Arc::clone(&calls),
                    permanent: true,
                }),
            )
            .unwrap();

        let env = Coordinator::new(registry, fast_config())
            .run(job())
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::Relaxed), 1);
        let outcome = env.outcome(&TaskName::new("image")).unwrap();
        assert_eq!(outcome.status(), OutcomeStatus::Failed);
        assert!(outcome.error().unwrap().contains("unsupported image format"));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_task_times_out_at_its_ceiling() {
        let mut registry = CapabilityRegistry::new();
        registry
            .register(
                "story",
                Arc::new(SlowText {
                    delay: Duration::from_secs(2),
                    text: "a warm story",
                }),
            )
            .unwrap();
        registry
            .register(
                "video",
                Arc::new(SlowText {
                    delay: Duration::from_secs(60),
                    text: "never seen",
                }),
            )
            .unwrap();

        let config = CoordinatorConfig {
            default_timeout: Duration::from_secs(5),
            ..fast_config()
        };
        let env = Coordinator::new(registry, config).run(job()).await.unwrap();

        let story = env.outcome(&TaskName::new("story")).unwrap();
        assert_eq!(story.status(), OutcomeStatus::Succeeded);
        assert_eq!(story.payload(), Some(&Artifact::text("a warm story")));

        let video = env.outcome(&TaskName::new("video")).unwrap();
        assert_eq!(video.status(), OutcomeStatus::TimedOut);
        assert!(video.error().unwrap().contains("5000ms"));

        assert_eq!(env.status(), JobStatus::Partial);
    }

    #[tokio::test(start_paused = true)]
    async fn job_deadline_times_out_every_pending_task() {
        let mut registry = CapabilityRegistry::new();
        for name in ["story", "image", "video"] {
            registry
                .register(
                    name,
                    Arc::new(SlowText {
                        delay: Duration::from_secs(3600),
                        text: "never",
                    }),
                )
                .unwrap();
        }

        let config = CoordinatorConfig {
            default_timeout: Duration::from_secs(7200),
            job_deadline: Some(Duration::from_secs(10)),
            ..fast_config()
        };

        let started = tokio::time::Instant::now();
        let env = Coordinator::new(registry, config).run(job()).await.unwrap();

        // Returned at the deadline, not at any task's ceiling.
        assert!(started.elapsed() < Duration::from_secs(60));
        assert_eq!(env.len(), 3);
        assert_eq!(env.status(), JobStatus::Failed);
        for (_, outcome) in env.outcomes() {
            assert_eq!(outcome.status(), OutcomeStatus::TimedOut);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_does_not_clip_tasks_that_already_settled() {
        let mut registry = CapabilityRegistry::new();
        registry
            .register(
                "story",
                Arc::new(SlowText {
                    delay: Duration::from_secs(2),
                    text: "done early",
                }),
            )
            .unwrap();
        registry
            .register(
                "video",
                Arc::new(SlowText {
                    delay: Duration::from_secs(3600),
                    text: "never",
                }),
            )
            .unwrap();

        let config = CoordinatorConfig {
            default_timeout: Duration::from_secs(7200),
            job_deadline: Some(Duration::from_secs(10)),
            ..fast_config()
        };
        let env = Coordinator::new(registry, config).run(job()).await.unwrap();

        assert_eq!(
            env.outcome(&TaskName::new("story")).unwrap().status(),
            OutcomeStatus::Succeeded
        );
        assert_eq!(
            env.outcome(&TaskName::new("video")).unwrap().status(),
            OutcomeStatus::TimedOut
        );
        assert_eq!(env.status(), JobStatus::Partial);
    }

    #[tokio::test]
    async fn coordinator_holds_no_state_across_jobs() {
        let mut registry = CapabilityRegistry::new();
        registry
            .register(
                "story",
                Arc::new(SlowText {
                    delay: Duration::ZERO,
                    text: "s",
                }),
            )
            .unwrap();
        let coordinator = Coordinator::new(registry, fast_config());

        let first = coordinator.run(job()).await.unwrap();
        let second = coordinator.run(job()).await.unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 1);
        assert_ne!(first.job_id(), second.job_id());
    }
}
