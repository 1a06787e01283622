//! Structured health reporting for worker lifecycle events.

use std::path::Path;
use std::sync::Arc;

use shuttle_config::Config;
use shuttle_plugins::{PluginError, PluginManifest, RejectedManifest};

use crate::bootstrap::BootstrapError;
use crate::protocol::LoopOutcome;

const HEALTH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::health");

/// Observer trait used to surface lifecycle events to telemetry sinks.
pub trait HealthReporter: Send + Sync {
    /// Invoked before configuration loading begins.
    fn bootstrap_starting(&self);

    /// Invoked after bootstrap completes successfully.
    fn bootstrap_succeeded(&self, config: &Config, task_types: &[String]);

    /// Invoked when bootstrap fails.
    fn bootstrap_failed(&self, error: &BootstrapError);

    /// Invoked for each plugin registered. `shadowed` is set when it
    /// replaced an existing handler.
    fn plugin_loaded(&self, manifest: &PluginManifest, shadowed: bool);

    /// Invoked for each manifest skipped during discovery.
    fn plugin_rejected(&self, rejected: &RejectedManifest);

    /// Invoked when the plugin directory exists but cannot be scanned.
    fn plugin_directory_unreadable(&self, dir: &Path, error: &PluginError);

    /// Invoked when the command loop stops.
    fn loop_finished(&self, outcome: LoopOutcome);
}

impl<T> HealthReporter for Arc<T>
where
    T: HealthReporter,
{
    fn bootstrap_starting(&self) {
        (**self).bootstrap_starting();
    }

    fn bootstrap_succeeded(&self, config: &Config, task_types: &[String]) {
        (**self).bootstrap_succeeded(config, task_types);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        (**self).bootstrap_failed(error);
    }

    fn plugin_loaded(&self, manifest: &PluginManifest, shadowed: bool) {
        (**self).plugin_loaded(manifest, shadowed);
    }

    fn plugin_rejected(&self, rejected: &RejectedManifest) {
        (**self).plugin_rejected(rejected);
    }

    fn plugin_directory_unreadable(&self, dir: &Path, error: &PluginError) {
        (**self).plugin_directory_unreadable(dir, error);
    }

    fn loop_finished(&self, outcome: LoopOutcome) {
        (**self).loop_finished(outcome);
    }
}

/// Default reporter that records lifecycle events using `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredHealthReporter;

impl StructuredHealthReporter {
    /// Builds a new reporter.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl HealthReporter for StructuredHealthReporter {
    fn bootstrap_starting(&self) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_starting",
            "starting worker bootstrap"
        );
    }

    fn bootstrap_succeeded(&self, config: &Config, task_types: &[String]) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_succeeded",
            instance_id = %config.instance_id(),
            work_dir = %config.work_dir(),
            plugin_dir = %config.plugin_dir(),
            log_format = ?config.log_format(),
            tasks = ?task_types,
            "worker bootstrap completed"
        );
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        tracing::error!(
            target: HEALTH_TARGET,
            event = "bootstrap_failed",
            error = %error,
            "worker bootstrap failed"
        );
    }

    fn plugin_loaded(&self, manifest: &PluginManifest, shadowed: bool) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "plugin_loaded",
            task_type = %manifest.task_type(),
            executable = %manifest.executable().display(),
            timeout_secs = manifest.timeout_secs(),
            shadowed,
            "plugin registered"
        );
    }

    fn plugin_rejected(&self, rejected: &RejectedManifest) {
        tracing::warn!(
            target: HEALTH_TARGET,
            event = "plugin_rejected",
            path = %rejected.path.display(),
            error = %rejected.error,
            "plugin manifest skipped"
        );
    }

    fn plugin_directory_unreadable(&self, dir: &Path, error: &PluginError) {
        tracing::warn!(
            target: HEALTH_TARGET,
            event = "plugin_directory_unreadable",
            dir = %dir.display(),
            error = %error,
            "plugin directory could not be scanned; continuing with built-ins"
        );
    }

    fn loop_finished(&self, outcome: LoopOutcome) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "loop_finished",
            outcome = %outcome,
            "command loop finished"
        );
    }
}
