//! The `STATUS` health probe.

use std::process;
use std::time::Instant;

use once_cell::sync::OnceCell;
use serde::Serialize;

use shuttle_plugins::{TaskError, TaskHandler, TaskInput, TaskOutcome};

/// Task type served by [`StatusTask`].
pub const STATUS_TASK: &str = "STATUS";

const STATUS_UP: &str = "UP";

/// Reports that the worker is alive, with basic process facts.
#[derive(Debug)]
pub struct StatusTask {
    instance_id: String,
    started: Instant,
    tasks: OnceCell<Vec<String>>,
}

#[derive(Debug, Serialize)]
struct StatusReport<'a> {
    status: &'static str,
    instance_id: &'a str,
    pid: u32,
    version: &'static str,
    uptime_secs: u64,
    tasks: &'a [String],
}

impl StatusTask {
    /// Creates the probe for the named instance, measuring uptime from now.
    pub fn new(instance_id: impl Into<String>) -> Self {
        Self {
            instance_id: instance_id.into(),
            started: Instant::now(),
            tasks: OnceCell::new(),
        }
    }

    /// Records the final set of task types. Only the first call has any
    /// effect; the list is fixed once registration is over.
    pub fn publish_tasks(&self, tasks: Vec<String>) {
        if self.tasks.set(tasks).is_err() {
            tracing::debug!(
                target: concat!(env!("CARGO_PKG_NAME"), "::tasks"),
                "status task list already published"
            );
        }
    }
}

impl TaskHandler for StatusTask {
    fn task_type(&self) -> &str {
        STATUS_TASK
    }

    fn invoke(&self, _input: &TaskInput<'_>) -> Result<TaskOutcome, TaskError> {
        let report = StatusReport {
            status: STATUS_UP,
            instance_id: &self.instance_id,
            pid: process::id(),
            version: env!("CARGO_PKG_VERSION"),
            uptime_secs: self.started.elapsed().as_secs(),
            tasks: self.tasks.get().map(Vec::as_slice).unwrap_or_default(),
        };
        let output = serde_json::to_vec(&report)
            .map_err(|error| TaskError::rejected(format!("failed to encode status: {error}")))?;
        Ok(TaskOutcome::with_output(STATUS_UP, output))
    }

    fn reads_input(&self) -> bool {
        false
    }

    fn prefers_file_output(&self) -> bool {
        true
    }
}
