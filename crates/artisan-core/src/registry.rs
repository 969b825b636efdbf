//! Capability registry (sub-task name -> capability).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::config::CoordinatorConfig;
use crate::domain::{CoordinatorError, TaskName};
use crate::ports::Capability;

/// One resolved unit of delegated work, ready for dispatch.
#[derive(Clone)]
pub struct TaskSpec {
    pub name: TaskName,
    pub capability: Arc<dyn Capability>,
    pub timeout: Duration,
    pub max_retries: u32,
    pub required: bool,
}

impl std::fmt::Debug for TaskSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskSpec")
            .field("name", &self.name)
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .field("required", &self.required)
            .finish_non_exhaustive()
    }
}

/// Registry of capabilities.
///
/// Design:
/// - Built during initialization (mutable).
/// - Used during runtime (immutable).
/// This avoids locks and keeps registration a configuration-time decision.
#[derive(Default)]
pub struct CapabilityRegistry {
    capabilities: HashMap<TaskName, Arc<dyn Capability>>,
    order: Vec<TaskName>,
}

impl CapabilityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a capability under a sub-task name.
    ///
    /// Blank names are rejected: the name is the envelope key and the config
    /// lookup key. Duplicate names are a configuration error, not "last
    /// wins": a silent overwrite would drop a configured sub-task from every
    /// envelope.
    pub fn register(
        &mut self,
        name: impl Into<TaskName>,
        capability: Arc<dyn Capability>,
    ) -> Result<(), CoordinatorError> {
        let name = name.into();
        if name.as_str().trim().is_empty() {
            return Err(CoordinatorError::InvalidTaskName(name.as_str().to_string()));
        }
        if self.capabilities.contains_key(&name) {
            return Err(CoordinatorError::DuplicateTask(name));
        }
        self.order.push(name.clone());
        self.capabilities.insert(name, capability);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.capabilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.capabilities.is_empty()
    }

    /// Resolve registered capabilities against the configuration into
    /// dispatchable specs, skipping disabled sub-tasks.
    pub fn specs(&self, config: &CoordinatorConfig) -> Vec<TaskSpec> {
        let mut specs = Vec::with_capacity(self.order.len());
        for name in &self.order {
            let options = config.task_options(name.as_str());
            if !options.enabled {
                continue;
            }
            specs.push(TaskSpec {
                name: name.clone(),
                capability: Arc::clone(&self.capabilities[name]),
                timeout: options.timeout.unwrap_or(config.default_timeout),
                max_retries: options.max_retries.unwrap_or(config.default_max_retries),
                required: options.required,
            });
        }
        specs
    }
}
