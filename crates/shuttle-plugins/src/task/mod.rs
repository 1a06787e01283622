//! The task handler interface.
//!
//! A handler sees only the decoded input bytes and the residual metadata
//! tokens. It knows nothing about shared memory or payload files; the worker
//! loads input before the call and delivers output after it.

use crate::error::TaskError;

/// Everything a handler receives for one request.
#[derive(Debug, Clone, Copy)]
pub struct TaskInput<'a> {
    /// Host-assigned request identifier.
    pub request_id: &'a str,
    /// Decoded input payload. Empty when the handler does not read input.
    pub payload: &'a [u8],
    /// Task metadata left after transport tokens were removed.
    pub metadata: &'a [String],
}

impl<'a> TaskInput<'a> {
    /// Bundles the parts of a request.
    #[must_use]
    pub const fn new(request_id: &'a str, payload: &'a [u8], metadata: &'a [String]) -> Self {
        Self {
            request_id,
            payload,
            metadata,
        }
    }
}

/// Result of a successful invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskOutcome {
    /// Short, single-line summary; the worker prefixes it with `DONE`.
    pub summary: String,
    /// Output payload, if the task produces one.
    pub output: Option<Vec<u8>>,
}

impl TaskOutcome {
    /// An outcome with a summary and an output payload.
    #[must_use]
    pub fn with_output(summary: impl Into<String>, output: Vec<u8>) -> Self {
        Self {
            summary: summary.into(),
            output: Some(output),
        }
    }

    /// An outcome carrying only a summary.
    #[must_use]
    pub fn summary_only(summary: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            output: None,
        }
    }
}

/// A named unit of work the worker can dispatch to.
pub trait TaskHandler {
    /// Task type this handler serves. Matched case-insensitively.
    fn task_type(&self) -> &str;

    /// Runs the task.
    ///
    /// # Errors
    ///
    /// Returns a [`TaskError`] whose display text is reported to the host.
    fn invoke(&self, input: &TaskInput<'_>) -> Result<TaskOutcome, TaskError>;

    /// Whether the worker should load input before invoking. Handlers that
    /// ignore their input return `false` so no input file is required.
    fn reads_input(&self) -> bool {
        true
    }

    /// Whether output must go to a file even when the host offered an output
    /// segment. Tasks producing short text results return `true`.
    fn prefers_file_output(&self) -> bool {
        false
    }
}
