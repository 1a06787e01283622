//! Configuration for the shuttle worker.
//!
//! Values are layered by `ortho_config`: built-in defaults, an optional TOML
//! file named with `--config-path`, `SHUTTLE_*` environment variables, and
//! command-line flags, with later layers taking precedence.

mod defaults;
mod identifier;
mod logging;
mod paths;

use std::sync::Arc;
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use ortho_config::{OrthoConfig, OrthoError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use defaults::{
    DEFAULT_ATTACH_ATTEMPTS, DEFAULT_ATTACH_BASE_DELAY_MS, DEFAULT_ATTACH_STEP_DELAY_MS,
    DEFAULT_INSTANCE_ID, DEFAULT_LOG_FILTER, PLUGIN_DIR_NAME, WORK_ROOT_DIR_NAME,
    default_instance_id, default_log_filter, default_log_filter_string, default_log_format,
    default_work_root,
};
pub use identifier::{IdentifierError, is_safe_identifier, validate_identifier};
pub use logging::{LogFormat, LogFormatParseError};
pub use paths::WorkDirError;

/// Runtime configuration shared by the worker binary and its libraries.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "SHUTTLE")]
pub struct Config {
    /// Directory holding one working directory per worker instance.
    #[serde(default = "defaults::default_work_root")]
    #[ortho_config(default = defaults::default_work_root())]
    pub work_root: Utf8PathBuf,
    /// Identifier of this worker instance; names its working directory.
    #[serde(default = "defaults::default_instance_id")]
    #[ortho_config(default = defaults::default_instance_id())]
    pub instance_id: String,
    /// Directory scanned for plugin manifests. Defaults to
    /// `<work_root>/plugins` when unset.
    #[serde(default)]
    pub plugin_dir: Option<Utf8PathBuf>,
    /// Tracing filter expression, e.g. `info` or `shuttled=debug`.
    #[serde(default = "defaults::default_log_filter_string")]
    #[ortho_config(default = defaults::default_log_filter_string())]
    pub log_filter: String,
    /// Output format for stderr logs.
    #[serde(default = "defaults::default_log_format")]
    #[ortho_config(default = defaults::default_log_format())]
    pub log_format: LogFormat,
    /// Upper bound on shared-memory attach attempts.
    #[serde(default = "defaults::default_attach_attempts")]
    #[ortho_config(default = defaults::DEFAULT_ATTACH_ATTEMPTS)]
    pub attach_attempts: u32,
    /// Base delay between attach attempts, in milliseconds.
    #[serde(default = "defaults::default_attach_base_delay_ms")]
    #[ortho_config(default = defaults::DEFAULT_ATTACH_BASE_DELAY_MS)]
    pub attach_base_delay_ms: u64,
    /// Per-attempt increment added to the attach delay, in milliseconds.
    #[serde(default = "defaults::default_attach_step_delay_ms")]
    #[ortho_config(default = defaults::DEFAULT_ATTACH_STEP_DELAY_MS)]
    pub attach_step_delay_ms: u64,
    /// Extra task types whose output always goes to a file, even when the
    /// host offers an output segment.
    #[serde(default)]
    #[ortho_config(merge_strategy = "append")]
    pub file_output_tasks: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            work_root: default_work_root(),
            instance_id: default_instance_id(),
            plugin_dir: None,
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
            attach_attempts: DEFAULT_ATTACH_ATTEMPTS,
            attach_base_delay_ms: DEFAULT_ATTACH_BASE_DELAY_MS,
            attach_step_delay_ms: DEFAULT_ATTACH_STEP_DELAY_MS,
            file_output_tasks: Vec::new(),
        }
    }
}

impl Config {
    /// Tracing filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Configured log output format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Instance identifier.
    #[must_use]
    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    /// Root directory for per-instance working directories.
    #[must_use]
    pub fn work_root(&self) -> &Utf8Path {
        &self.work_root
    }

    /// Working directory of this instance: `<work_root>/<instance_id>`.
    #[must_use]
    pub fn work_dir(&self) -> Utf8PathBuf {
        self.work_root.join(&self.instance_id)
    }

    /// Directory scanned for plugin manifests.
    #[must_use]
    pub fn plugin_dir(&self) -> Utf8PathBuf {
        self.plugin_dir
            .clone()
            .unwrap_or_else(|| self.work_root.join(PLUGIN_DIR_NAME))
    }

    /// Maximum number of attach attempts.
    #[must_use]
    pub const fn attach_attempts(&self) -> u32 {
        self.attach_attempts
    }

    /// Delay before the second attach attempt.
    #[must_use]
    pub const fn attach_base_delay(&self) -> Duration {
        Duration::from_millis(self.attach_base_delay_ms)
    }

    /// Increment added to the attach delay for every further attempt.
    #[must_use]
    pub const fn attach_step_delay(&self) -> Duration {
        Duration::from_millis(self.attach_step_delay_ms)
    }

    /// Task types configured to always write their output to a file.
    #[must_use]
    pub fn file_output_tasks(&self) -> &[String] {
        &self.file_output_tasks
    }

    /// Checks values that the type system cannot.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the instance identifier is not file-name
    /// safe or the attach bound is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_identifier(&self.instance_id).map_err(ConfigError::InvalidInstanceId)?;
        if self.attach_attempts == 0 {
            return Err(ConfigError::ZeroAttachAttempts);
        }
        Ok(())
    }
}

/// Semantic configuration errors detected after loading.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The instance identifier cannot name a directory safely.
    #[error("instance id is not file-name safe: {0}")]
    InvalidInstanceId(#[source] IdentifierError),
    /// `attach_attempts` must allow at least one attempt.
    #[error("attach_attempts must be at least 1")]
    ZeroAttachAttempts,
}

/// Loads configuration from the process arguments and environment.
///
/// # Errors
///
/// Returns the aggregated `ortho_config` error when any layer fails to parse.
pub fn load_config() -> Result<Config, Arc<OrthoError>> {
    Config::load()
}

/// Loads configuration from an explicit argument list. The first item is the
/// program name.
///
/// # Errors
///
/// Returns the aggregated `ortho_config` error when any layer fails to parse.
pub fn load_config_from_iter<I, T>(args: I) -> Result<Config, Arc<OrthoError>>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Config::load_from_iter(args)
}
