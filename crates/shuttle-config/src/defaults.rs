use std::env;

use camino::Utf8PathBuf;

use crate::logging::LogFormat;

/// Directory name appended to the system temporary directory to form the
/// default work root.
pub const WORK_ROOT_DIR_NAME: &str = "shuttle";

/// Name of the plugin directory beneath the work root.
pub const PLUGIN_DIR_NAME: &str = "plugins";

/// Instance identifier used when neither the host nor the operator picks one.
pub const DEFAULT_INSTANCE_ID: &str = "default";

/// Default log filter expression used by the worker.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Number of attempts made when attaching to a shared-memory segment.
pub const DEFAULT_ATTACH_ATTEMPTS: u32 = 15;

/// Delay before the second attach attempt, in milliseconds.
pub const DEFAULT_ATTACH_BASE_DELAY_MS: u64 = 50;

/// Additional delay added per subsequent attach attempt, in milliseconds.
pub const DEFAULT_ATTACH_STEP_DELAY_MS: u64 = 10;

/// Default log filter expression used by the worker.
#[must_use]
pub const fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
#[must_use]
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format for the worker.
#[must_use]
pub const fn default_log_format() -> LogFormat {
    LogFormat::Json
}

/// Owned instance identifier used by serde defaults.
#[must_use]
pub fn default_instance_id() -> String {
    DEFAULT_INSTANCE_ID.to_owned()
}

/// Computes the default work root: `shuttle` beneath the system temporary
/// directory.
#[must_use]
pub fn default_work_root() -> Utf8PathBuf {
    let mut base = Utf8PathBuf::from_path_buf(env::temp_dir())
        .unwrap_or_else(|_| Utf8PathBuf::from("/tmp"));
    base.push(WORK_ROOT_DIR_NAME);
    base
}

pub(crate) const fn default_attach_attempts() -> u32 {
    DEFAULT_ATTACH_ATTEMPTS
}

pub(crate) const fn default_attach_base_delay_ms() -> u64 {
    DEFAULT_ATTACH_BASE_DELAY_MS
}

pub(crate) const fn default_attach_step_delay_ms() -> u64 {
    DEFAULT_ATTACH_STEP_DELAY_MS
}
