//! Coordinator configuration.
//!
//! Everything the coordinator needs is passed in here explicitly at
//! construction; nothing is read from the process environment. Serde-derived
//! so embedders can load it from a file or flags.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Per-sub-task options, overlaid on the coordinator defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskOptions {
    /// Disabled sub-tasks are excluded from dispatch entirely; no runtime
    /// semantics beyond inclusion/exclusion.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Required sub-tasks drive the overall job status; optional ones are
    /// still reported but do not gate it.
    #[serde(default = "default_true")]
    pub required: bool,

    /// Per-task wall-clock ceiling (falls back to `default_timeout`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<Duration>,

    /// Per-task retry ceiling (falls back to `default_max_retries`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<u32>,
}

fn default_true() -> bool {
    true
}

impl Default for TaskOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            required: true,
            timeout: None,
            max_retries: None,
        }
    }
}

impl TaskOptions {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    pub fn optional() -> Self {
        Self {
            required: false,
            ..Self::default()
        }
    }
}

/// Coordinator-wide configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoordinatorConfig {
    /// Default per-sub-task wall-clock ceiling.
    pub default_timeout: Duration,

    /// Default retries after the first invocation (total calls = 1 + n).
    pub default_max_retries: u32,

    /// First backoff delay; doubles per attempt up to `retry_max_delay`.
    pub retry_base_delay: Duration,

    /// Upper cap on any single backoff delay.
    pub retry_max_delay: Duration,

    /// Optional hard ceiling on total coordinator runtime. At expiry every
    /// still-pending sub-task is marked timed out and the envelope returns.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_deadline: Option<Duration>,

    /// Per-sub-task overrides keyed by sub-task name.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub tasks: HashMap<String, TaskOptions>,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            // Video generation can take minutes; the original system allowed 10.
            default_timeout: Duration::from_secs(600),
            default_max_retries: 3,
            retry_base_delay: Duration::from_secs(2),
            retry_max_delay: Duration::from_secs(60),
            job_deadline: None,
            tasks: HashMap::new(),
        }
    }
}

impl CoordinatorConfig {
    pub fn with_task(mut self, name: impl Into<String>, options: TaskOptions) -> Self {
        self.tasks.insert(name.into(), options);
        self
    }

    pub fn task_options(&self, name: &str) -> TaskOptions {
        self.tasks.get(name).cloned().unwrap_or_default()
    }
}
