//! Built-in task handlers.

mod sentiment;
mod status;

use std::sync::Arc;

use shuttle_plugins::{SharedHandler, TaskRegistry};

pub use sentiment::{Classification, Polarity, SENTIMENT_TASK, SentimentTask, classify};
pub use status::{STATUS_TASK, StatusTask};

/// Registers the built-in handlers and returns the status probe so the
/// final task list can be published once plugins have been merged.
pub fn register_builtins(registry: &mut TaskRegistry, instance_id: &str) -> Arc<StatusTask> {
    let status = Arc::new(StatusTask::new(instance_id));
    let handler: SharedHandler = status.clone();
    let _ = registry.register(handler);
    let _ = registry.register(Arc::new(SentimentTask));
    status
}
