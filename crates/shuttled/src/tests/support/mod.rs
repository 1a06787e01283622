//! Test doubles shared by the worker's unit and behaviour tests.

mod attacher;
mod config_loader;
mod reporter;
mod workspace;

use shuttle_plugins::{TaskError, TaskHandler, TaskInput, TaskOutcome};

pub use attacher::MemoryAttacher;
pub use config_loader::{FailingConfigLoader, TestConfigLoader};
pub use reporter::{HealthEvent, RecordingHealthReporter};
pub use workspace::Workspace;

/// Handler that returns its input unchanged.
#[derive(Debug, Default)]
pub struct Echo;

impl TaskHandler for Echo {
    fn task_type(&self) -> &str {
        "ECHO"
    }

    fn invoke(&self, input: &TaskInput<'_>) -> Result<TaskOutcome, TaskError> {
        Ok(TaskOutcome::with_output(
            format!("echoed {} bytes", input.payload.len()),
            input.payload.to_vec(),
        ))
    }
}
