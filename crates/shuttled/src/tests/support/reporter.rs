//! Test double for [`HealthReporter`] that records lifecycle events.

use std::path::Path;
use std::sync::Mutex;

use shuttle_config::Config;
use shuttle_plugins::{PluginError, PluginManifest, RejectedManifest};

use crate::bootstrap::BootstrapError;
use crate::health::HealthReporter;
use crate::protocol::LoopOutcome;

/// Structured health events tracked during tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthEvent {
    BootstrapStarting,
    BootstrapSucceeded(Vec<String>),
    BootstrapFailed(String),
    PluginLoaded { task_type: String, shadowed: bool },
    PluginRejected(String),
    PluginDirectoryUnreadable,
    LoopFinished(LoopOutcome),
}

/// Records health events for assertions.
#[derive(Debug, Default)]
pub struct RecordingHealthReporter {
    events: Mutex<Vec<HealthEvent>>,
}

impl RecordingHealthReporter {
    /// Captures a copy of the recorded events.
    pub fn events(&self) -> Vec<HealthEvent> {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .clone()
    }

    fn record(&self, event: HealthEvent) {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .push(event);
    }
}

impl HealthReporter for RecordingHealthReporter {
    fn bootstrap_starting(&self) {
        self.record(HealthEvent::BootstrapStarting);
    }

    fn bootstrap_succeeded(&self, _config: &Config, task_types: &[String]) {
        self.record(HealthEvent::BootstrapSucceeded(task_types.to_vec()));
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        self.record(HealthEvent::BootstrapFailed(error.to_string()));
    }

    fn plugin_loaded(&self, manifest: &PluginManifest, shadowed: bool) {
        self.record(HealthEvent::PluginLoaded {
            task_type: manifest.task_type().to_owned(),
            shadowed,
        });
    }

    fn plugin_rejected(&self, rejected: &RejectedManifest) {
        let file = rejected
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.record(HealthEvent::PluginRejected(file));
    }

    fn plugin_directory_unreadable(&self, _dir: &Path, _error: &PluginError) {
        self.record(HealthEvent::PluginDirectoryUnreadable);
    }

    fn loop_finished(&self, outcome: LoopOutcome) {
        self.record(HealthEvent::LoopFinished(outcome));
    }
}
