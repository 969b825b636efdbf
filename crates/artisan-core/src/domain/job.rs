//! Job: one orchestration request (description + reference artifact + params).

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::errors::CoordinatorError;
use super::ids::JobId;

/// Name of a sub-task, unique within a job.
///
/// Also the registry key: one capability per name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskName(String);

impl TaskName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Opaque locator for a large payload held in an artifact store
/// (e.g. `gs://bucket/images/spice_box.jpg`, `mem://artisan/01H...`).
///
/// The domain model exchanges binaries by reference only; resolving a
/// locator to bytes is the store's job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtifactRef(String);

impl ArtifactRef {
    pub fn new(locator: impl Into<String>) -> Self {
        Self(locator.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Scheme part of the locator (`gs`, `mem`, ...), if well-formed.
    pub fn scheme(&self) -> Option<&str> {
        self.0.split_once("://").map(|(scheme, _)| scheme)
    }

    /// A locator must be non-empty and carry `scheme://path`.
    pub fn validate(&self) -> Result<(), CoordinatorError> {
        let Some((scheme, path)) = self.0.split_once("://") else {
            return Err(CoordinatorError::InvalidJob(format!(
                "artifact locator {:?} must look like scheme://path",
                self.0
            )));
        };
        if scheme.is_empty() || path.is_empty() {
            return Err(CoordinatorError::InvalidJob(format!(
                "artifact locator {:?} has an empty scheme or path",
                self.0
            )));
        }
        Ok(())
    }
}

impl fmt::Display for ArtifactRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One orchestration request: immutable once submitted, discarded after the
/// envelope is returned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,

    /// Free-text description of the product to generate content for.
    pub description: String,

    /// Reference image (or other source artifact) the capabilities work from.
    pub artifact: ArtifactRef,

    /// Extra parameters keyed by sub-task name; capabilities pick up their
    /// own entry (missing entry = `null`). Kept as open JSON so new
    /// capabilities do not force schema changes here.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub params: HashMap<TaskName, serde_json::Value>,
}

impl Job {
    pub fn new(description: impl Into<String>, artifact: ArtifactRef) -> Self {
        Self {
            id: JobId::generate(),
            description: description.into(),
            artifact,
            params: HashMap::new(),
        }
    }

    pub fn with_param(mut self, task: impl Into<TaskName>, value: serde_json::Value) -> Self {
        self.params.insert(task.into(), value);
        self
    }

    /// Parameters for one sub-task (`null` when none were supplied).
    pub fn params_for(&self, task: &TaskName) -> serde_json::Value {
        self.params
            .get(task)
            .cloned()
            .unwrap_or(serde_json::Value::Null)
    }

    /// Sanity checks performed before any dispatch.
    pub fn validate(&self) -> Result<(), CoordinatorError> {
        if self.description.trim().is_empty() {
            return Err(CoordinatorError::InvalidJob(
                "product description is required and cannot be empty".to_string(),
            ));
        }
        self.artifact.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_job_passes_validation() {
        let job = Job::new(
            "Handcrafted Wooden Spice Box",
            ArtifactRef::new("gs://bucket/images/spice_box.jpg"),
        );
        job.validate().unwrap();
    }

    #[test]
    fn empty_description_is_rejected() {
        let job = Job::new("   ", ArtifactRef::new("gs://bucket/img.png"));
        let err = job.validate().unwrap_err();
        assert!(err.to_string().contains("description"));
    }

    #[test]
    fn locator_without_scheme_is_rejected() {
        let job = Job::new("bowl", ArtifactRef::new("bucket/img.png"));
        assert!(job.validate().is_err());

        let job = Job::new("bowl", ArtifactRef::new("gs://"));
        assert!(job.validate().is_err());
    }

    #[test]
    fn scheme_is_extracted() {
        assert_eq!(ArtifactRef::new("gs://b/i.jpg").scheme(), Some("gs"));
        assert_eq!(ArtifactRef::new("no-scheme").scheme(), None);
    }

    #[test]
    fn params_for_missing_task_is_null() {
        let job = Job::new("bowl", ArtifactRef::new("mem://a/b"))
            .with_param("story", serde_json::json!({"tone": "warm"}));

        assert_eq!(
            job.params_for(&TaskName::new("story"))["tone"],
            "warm"
        );
        assert!(job.params_for(&TaskName::new("video")).is_null());
    }
}
