//! Domain errors raised by task handlers and plugin operations.
//!
//! I/O errors are wrapped in `Arc` to satisfy the `result_large_err` Clippy
//! lint and to keep the enums cheap to clone into reports.

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

/// Errors arising while loading or running a plugin.
#[derive(Debug, Error)]
pub enum PluginError {
    /// The plugin process could not be spawned.
    #[error("plugin '{name}' failed to start: {message}")]
    SpawnFailed {
        /// Task type served by the plugin.
        name: String,
        /// Human-readable failure description.
        message: String,
        /// Optional underlying I/O error.
        #[source]
        source: Option<Arc<std::io::Error>>,
    },

    /// The plugin did not complete within its timeout.
    #[error("plugin '{name}' timed out after {timeout_secs}s")]
    Timeout {
        /// Task type served by the plugin.
        name: String,
        /// Configured timeout in seconds.
        timeout_secs: u64,
    },

    /// The plugin exited with a non-zero status code.
    #[error("plugin '{name}' exited with non-zero status {status}")]
    NonZeroExit {
        /// Task type served by the plugin.
        name: String,
        /// Process exit status, or -1 when killed by a signal.
        status: i32,
    },

    /// The plugin request could not be serialised to JSON.
    #[error("failed to serialise plugin request: {0}")]
    SerializeRequest(#[source] serde_json::Error),

    /// The plugin response could not be deserialised from JSON.
    #[error("failed to deserialise plugin response: {message}")]
    DeserializeResponse {
        /// Human-readable description of the parse failure.
        message: String,
        /// Optional underlying JSON error.
        #[source]
        source: Option<serde_json::Error>,
    },

    /// The plugin produced output that does not conform to the protocol.
    #[error("plugin '{name}' wrote invalid output: {message}")]
    InvalidOutput {
        /// Task type served by the plugin.
        name: String,
        /// Description of the protocol violation.
        message: String,
    },

    /// An I/O error occurred while communicating with the plugin process.
    #[error("I/O error communicating with plugin '{name}': {source}")]
    Io {
        /// Task type served by the plugin.
        name: String,
        /// Underlying I/O error.
        #[source]
        source: Arc<std::io::Error>,
    },

    /// A manifest file could not be read.
    #[error("failed to read manifest {}: {source}", path.display())]
    ReadManifest {
        /// Manifest path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: Arc<std::io::Error>,
    },

    /// A manifest file is not valid JSON or misses required fields.
    #[error("failed to parse manifest {}: {source}", path.display())]
    ParseManifest {
        /// Manifest path.
        path: PathBuf,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// A plugin manifest failed validation.
    #[error("manifest error: {message}")]
    Manifest {
        /// Description of the validation failure.
        message: String,
    },

    /// The plugin executable was not found on the filesystem.
    #[error("plugin '{name}' executable not found: {}", path.display())]
    ExecutableNotFound {
        /// Task type served by the plugin.
        name: String,
        /// Path that was checked.
        path: PathBuf,
    },
}

impl PluginError {
    pub(crate) fn io(name: &str, source: std::io::Error) -> Self {
        Self::Io {
            name: name.to_owned(),
            source: Arc::new(source),
        }
    }
}

/// Failure reported by a task handler. Its display text becomes the
/// `ERROR` response sent to the host.
#[derive(Debug, Error)]
pub enum TaskError {
    /// The handler refused the request, e.g. because the input is invalid.
    #[error("{0}")]
    Rejected(String),

    /// The backing plugin process failed.
    #[error(transparent)]
    Plugin(#[from] PluginError),
}

impl TaskError {
    /// Builds a [`TaskError::Rejected`] from any displayable message.
    #[must_use]
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected(message.into())
    }
}
