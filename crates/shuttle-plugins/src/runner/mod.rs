//! Adapting plugin manifests into task handlers.
//!
//! [`PluginTaskHandler`] is the bridge between the task registry and a
//! plugin process: it builds a [`PluginRequest`] from the task input,
//! delegates to a [`PluginExecutor`], and maps the [`PluginResponse`] back
//! into a task outcome.
//!
//! The executor abstraction enables test doubles that return pre-configured
//! responses without spawning real processes.

use std::sync::Arc;

use crate::error::{PluginError, TaskError};
use crate::manifest::PluginManifest;
use crate::protocol::{PluginRequest, PluginResponse};
use crate::task::{TaskHandler, TaskInput, TaskOutcome};

/// Trait abstracting plugin process execution for testability.
///
/// The production implementation is
/// [`ProcessExecutor`](crate::process::ProcessExecutor).
pub trait PluginExecutor {
    /// Executes the plugin described by `manifest` with `request`.
    ///
    /// # Errors
    ///
    /// Returns a [`PluginError`] if the plugin cannot be spawned, times out,
    /// exits with a non-zero status, or produces invalid output.
    fn execute(
        &self,
        manifest: &PluginManifest,
        request: &PluginRequest,
    ) -> Result<PluginResponse, PluginError>;
}

/// A task handler backed by an external plugin process.
#[derive(Debug)]
pub struct PluginTaskHandler<E> {
    manifest: PluginManifest,
    executor: Arc<E>,
}

impl<E> PluginTaskHandler<E> {
    /// Binds `manifest` to `executor`.
    #[must_use]
    pub const fn new(manifest: PluginManifest, executor: Arc<E>) -> Self {
        Self { manifest, executor }
    }

    /// Returns the manifest this handler runs.
    #[must_use]
    pub const fn manifest(&self) -> &PluginManifest {
        &self.manifest
    }
}

impl<E: PluginExecutor> TaskHandler for PluginTaskHandler<E> {
    fn task_type(&self) -> &str {
        self.manifest.task_type()
    }

    fn invoke(&self, input: &TaskInput<'_>) -> Result<TaskOutcome, TaskError> {
        let request = PluginRequest::new(
            input.request_id,
            self.manifest.task_type(),
            input.metadata.to_vec(),
            input.payload.to_vec(),
        );
        match self.executor.execute(&self.manifest, &request)? {
            PluginResponse::Done { summary, output } => Ok(TaskOutcome { summary, output }),
            PluginResponse::Error { message } => Err(TaskError::Rejected(message)),
        }
    }

    fn reads_input(&self) -> bool {
        self.manifest.reads_input()
    }

    fn prefers_file_output(&self) -> bool {
        self.manifest.file_output()
    }
}
