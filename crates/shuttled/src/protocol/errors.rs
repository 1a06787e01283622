//! Error types for command parsing and request dispatch.
//!
//! Every variant's display text is the message sent to the host after
//! `ERROR `, so the wording here is part of the wire protocol.

use thiserror::Error;

use shuttle_plugins::TaskError;
use shuttle_transport::TransportError;

/// Errors that end a single request with an `ERROR` line. None of them stop
/// the command loop.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// `EXECUTE` was given fewer than two tokens.
    #[error("Missing arguments")]
    MissingArguments,

    /// The first token is not a known command word.
    #[error("Unknown command: {command}")]
    UnknownCommand {
        /// Upper-cased command word.
        command: String,
    },

    /// No handler is registered for the task type.
    #[error("Unknown task type: {task_type}")]
    UnknownTaskType {
        /// Upper-cased task type.
        task_type: String,
    },

    /// The request id cannot be embedded in a file name.
    #[error("Invalid request id: {request_id}")]
    InvalidRequestId {
        /// Offending identifier.
        request_id: String,
    },

    /// The command line exceeded the size limit.
    #[error("Command too long: {size} bytes exceeds {max_size} byte limit")]
    LineTooLong {
        /// Bytes read before giving up.
        size: usize,
        /// Configured limit.
        max_size: usize,
    },

    /// The command line is not UTF-8.
    #[error("Command is not valid UTF-8")]
    InvalidEncoding,

    /// Moving the payload in or out failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The task handler reported a failure.
    #[error(transparent)]
    Task(#[from] TaskError),

    /// The task handler panicked.
    #[error("Task {task_type} panicked: {message}")]
    HandlerPanicked {
        /// Task type whose handler panicked.
        task_type: String,
        /// Panic payload, when it was a string.
        message: String,
    },
}

impl DispatchError {
    /// Creates an unknown command error.
    pub fn unknown_command(command: impl Into<String>) -> Self {
        Self::UnknownCommand {
            command: command.into(),
        }
    }

    /// Creates an unknown task type error.
    pub fn unknown_task_type(task_type: impl Into<String>) -> Self {
        Self::UnknownTaskType {
            task_type: task_type.into(),
        }
    }

    /// Creates an invalid request id error.
    pub fn invalid_request_id(request_id: impl Into<String>) -> Self {
        Self::InvalidRequestId {
            request_id: request_id.into(),
        }
    }

    /// Short machine-friendly label used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingArguments
            | Self::UnknownCommand { .. }
            | Self::InvalidRequestId { .. }
            | Self::LineTooLong { .. }
            | Self::InvalidEncoding => "protocol",
            Self::UnknownTaskType { .. } => "unknown_task",
            Self::Transport(_) => "transport",
            Self::Task(_) | Self::HandlerPanicked { .. } => "handler",
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(DispatchError::MissingArguments, "Missing arguments")]
    #[case(DispatchError::unknown_command("PROCESS"), "Unknown command: PROCESS")]
    #[case(DispatchError::unknown_task_type("YOLO"), "Unknown task type: YOLO")]
    #[case(DispatchError::invalid_request_id("../x"), "Invalid request id: ../x")]
    fn protocol_messages_are_stable(#[case] error: DispatchError, #[case] expected: &str) {
        assert_eq!(error.to_string(), expected);
    }

    #[rstest]
    fn task_errors_pass_through_verbatim() {
        let error = DispatchError::from(TaskError::rejected("bad image"));
        assert_eq!(error.to_string(), "bad image");
        assert_eq!(error.kind(), "handler");
    }
}
