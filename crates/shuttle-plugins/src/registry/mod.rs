//! Task registry keyed by upper-cased task type.
//!
//! Registration is last-wins: a plugin registered after a built-in with the
//! same task type replaces it, and the displaced handler is handed back to
//! the caller so the shadowing can be logged.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::task::TaskHandler;

/// Shared handle to a registered handler.
pub type SharedHandler = Arc<dyn TaskHandler>;

/// Registry of task handlers.
#[derive(Clone, Default)]
pub struct TaskRegistry {
    handlers: HashMap<String, SharedHandler>,
}

impl fmt::Debug for TaskRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskRegistry")
            .field("task_types", &self.task_types())
            .finish()
    }
}

/// Normalises a task type to its registry key.
#[must_use]
pub fn task_key(task_type: &str) -> String {
    task_type.to_ascii_uppercase()
}

impl TaskRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` under its upper-cased task type, returning the
    /// handler it displaced, if any.
    pub fn register(&mut self, handler: SharedHandler) -> Option<SharedHandler> {
        let key = task_key(handler.task_type());
        self.handlers.insert(key, handler)
    }

    /// Looks up a handler; `task_type` is upper-cased first.
    #[must_use]
    pub fn get(&self, task_type: &str) -> Option<&SharedHandler> {
        self.handlers.get(&task_key(task_type))
    }

    /// Registered task types in sorted order.
    #[must_use]
    pub fn task_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.handlers.keys().cloned().collect();
        types.sort_unstable();
        types
    }

    /// Returns the number of registered handlers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns `true` when no handlers are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
