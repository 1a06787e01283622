//! Plugin manifests binding a task type to an external executable.
//!
//! A manifest is a small JSON document placed in the plugin directory:
//!
//! ```json
//! {
//!   "task_type": "MATH_ADD",
//!   "executable": "math-add",
//!   "args": ["--quiet"],
//!   "timeout_secs": 10,
//!   "file_output": true,
//!   "reads_input": false
//! }
//! ```
//!
//! Relative executable paths are resolved against the directory holding the
//! manifest. Plugins that work from metadata tokens alone set `reads_input`
//! to `false` so the host need not stage an input payload.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::PluginError;

/// Default timeout in seconds for plugin execution.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Declarative description of a plugin task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginManifest {
    task_type: String,
    executable: PathBuf,
    #[serde(default)]
    args: Vec<String>,
    #[serde(default = "default_timeout_secs")]
    timeout_secs: u64,
    #[serde(default)]
    file_output: bool,
    #[serde(default = "default_reads_input")]
    reads_input: bool,
}

const fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

const fn default_reads_input() -> bool {
    true
}

impl PluginManifest {
    /// Creates a manifest with the default timeout, no extra arguments and
    /// output routed by the host's directive.
    #[must_use]
    pub fn new(task_type: impl Into<String>, executable: impl Into<PathBuf>) -> Self {
        Self {
            task_type: task_type.into(),
            executable: executable.into(),
            args: Vec::new(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            file_output: false,
            reads_input: true,
        }
    }

    /// Sets arguments passed to the executable.
    #[must_use]
    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    /// Overrides the default timeout.
    #[must_use]
    pub const fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Forces this plugin's output to the payload file.
    #[must_use]
    pub const fn with_file_output(mut self, file_output: bool) -> Self {
        self.file_output = file_output;
        self
    }

    /// Declares whether the plugin consumes an input payload.
    #[must_use]
    pub const fn with_reads_input(mut self, reads_input: bool) -> Self {
        self.reads_input = reads_input;
        self
    }

    /// Reads, parses and validates the manifest at `path`, resolving a
    /// relative executable against the manifest's directory.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::ReadManifest`], [`PluginError::ParseManifest`]
    /// or [`PluginError::Manifest`].
    pub fn load(path: &Path) -> Result<Self, PluginError> {
        let text = fs::read_to_string(path).map_err(|source| PluginError::ReadManifest {
            path: path.to_path_buf(),
            source: Arc::new(source),
        })?;
        let manifest: Self =
            serde_json::from_str(&text).map_err(|source| PluginError::ParseManifest {
                path: path.to_path_buf(),
                source,
            })?;
        manifest.validate()?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        Ok(manifest.resolved_against(base))
    }

    /// Returns a copy whose relative executable is joined onto `base`.
    #[must_use]
    pub fn resolved_against(mut self, base: &Path) -> Self {
        if self.executable.is_relative() {
            self.executable = base.join(&self.executable);
        }
        self
    }

    /// Validates the manifest, returning an error if it is malformed.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::Manifest`] if the task type is empty or
    /// contains whitespace, the executable is empty, or the timeout is zero.
    pub fn validate(&self) -> Result<(), PluginError> {
        if self.task_type.trim().is_empty() {
            return Err(manifest_error("task_type must not be empty"));
        }
        if self.task_type.chars().any(char::is_whitespace) {
            return Err(manifest_error(format!(
                "task_type must be a single token, got '{}'",
                self.task_type
            )));
        }
        if self.executable.as_os_str().is_empty() {
            return Err(manifest_error("executable must not be empty"));
        }
        if self.timeout_secs == 0 {
            return Err(manifest_error("timeout_secs must be at least 1"));
        }
        Ok(())
    }

    /// Returns the task type served by the plugin.
    #[must_use]
    pub const fn task_type(&self) -> &str {
        self.task_type.as_str()
    }

    /// Returns the executable path.
    #[must_use]
    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// Returns the default arguments.
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Returns the timeout in seconds.
    #[must_use]
    pub const fn timeout_secs(&self) -> u64 {
        self.timeout_secs
    }

    /// Returns whether output is forced to the payload file.
    #[must_use]
    pub const fn file_output(&self) -> bool {
        self.file_output
    }

    /// Returns whether the worker loads an input payload for this plugin.
    #[must_use]
    pub const fn reads_input(&self) -> bool {
        self.reads_input
    }
}

fn manifest_error(message: impl Into<String>) -> PluginError {
    PluginError::Manifest {
        message: message.into(),
    }
}
