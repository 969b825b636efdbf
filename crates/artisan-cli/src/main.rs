//! Demo: wire three stub capabilities into the coordinator and run one job.
//!
//! The stubs stand in for hosted generation backends: the story capability
//! answers after a short delay, the image capability round-trips bytes
//! through the in-memory artifact store, and the video capability sleeps
//! past its ceiling so the envelope shows a timed-out slot.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::sleep;
use tracing::info;
use tracing_subscriber::EnvFilter;

use artisan_core::config::{CoordinatorConfig, TaskOptions};
use artisan_core::coordinator::Coordinator;
use artisan_core::domain::{Artifact, ArtifactRef, CapabilityError, Job};
use artisan_core::impls::MemoryStore;
use artisan_core::ports::{ArtifactStore, Capability};
use artisan_core::registry::CapabilityRegistry;

/// Stub story generator: delay, then a paragraph built from the job.
struct StoryStub {
    delay: Duration,
}

#[async_trait]
impl Capability for StoryStub {
    async fn invoke(
        &self,
        job: &Job,
        params: &serde_json::Value,
    ) -> Result<Artifact, CapabilityError> {
        sleep(self.delay).await;
        let tone = params["tone"].as_str().unwrap_or("warm");
        Ok(Artifact::text(format!(
            "In a small workshop, the {} was born. ({} telling)",
            job.description, tone
        )))
    }
}

/// Stub image enhancer: resolves the reference image and stores an
/// "enhanced" copy, returning its locator.
struct ImageStub {
    store: Arc<MemoryStore>,
}

#[async_trait]
impl Capability for ImageStub {
    async fn invoke(
        &self,
        job: &Job,
        _params: &serde_json::Value,
    ) -> Result<Artifact, CapabilityError> {
        let bytes = self
            .store
            .resolve(&job.artifact)
            .await
            .map_err(|e| CapabilityError::permanent(e.to_string()))?;
        let enhanced = self
            .store
            .store(bytes)
            .await
            .map_err(|e| CapabilityError::transient(e.to_string()))?;
        Ok(Artifact::Locator(enhanced))
    }
}

/// Stub video synthesizer: deliberately slower than its ceiling.
struct VideoStub;

#[async_trait]
impl Capability for VideoStub {
    async fn invoke(
        &self,
        _job: &Job,
        _params: &serde_json::Value,
    ) -> Result<Artifact, CapabilityError> {
        sleep(Duration::from_secs(30)).await;
        Ok(Artifact::locator("mem://artisan/never-reached"))
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Seed the artifact store with a fake reference image.
    let store = Arc::new(MemoryStore::new());
    let reference: ArtifactRef = store
        .store(b"\x89PNG fake image bytes".to_vec())
        .await
        .expect("memory store never fails to store");

    let mut registry = CapabilityRegistry::new();
    registry
        .register("story", Arc::new(StoryStub { delay: Duration::from_millis(200) }))
        .expect("fresh registry");
    registry
        .register("image", Arc::new(ImageStub { store: Arc::clone(&store) }))
        .expect("fresh registry");
    registry
        .register("video", Arc::new(VideoStub))
        .expect("fresh registry");

    let config = CoordinatorConfig {
        default_timeout: Duration::from_secs(10),
        default_max_retries: 2,
        retry_base_delay: Duration::from_millis(200),
        retry_max_delay: Duration::from_secs(2),
        job_deadline: Some(Duration::from_secs(30)),
        ..CoordinatorConfig::default()
    }
    // Tight ceiling so the stub video misses it and the envelope comes back PARTIAL.
    .with_task("video", TaskOptions { timeout: Some(Duration::from_secs(2)), ..TaskOptions::default() });

    let coordinator = Coordinator::new(registry, config);

    let job = Job::new("Handcrafted Wooden Spice Box", reference)
        .with_param("story", serde_json::json!({ "tone": "warm" }));

    info!(job = %job.id, "submitting demo job");
    let envelope = coordinator.run(job).await.expect("demo registry is non-empty");

    info!(status = ?envelope.status(), tasks = envelope.len(), "job settled");
    println!(
        "{}",
        serde_json::to_string_pretty(&envelope).expect("envelope serializes")
    );
}
