//! Worker bootstrap orchestration.
//!
//! Builds every piece of process-wide state once (configuration, telemetry,
//! working directory, task registry, transport) and hands it to the command
//! loop inside a [`Worker`]. Dropping the worker tears it all down.

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use ortho_config::OrthoError;
use thiserror::Error;

use shuttle_config::{Config, ConfigError, WorkDirError};
use shuttle_plugins::{
    PluginTaskHandler, ProcessExecutor, SharedHandler, TaskRegistry, discover,
};
use shuttle_transport::{
    BulkTransport, FileTransport, PlatformAttacher, RetryPolicy, SegmentAttacher,
    SharedMemoryAccessor,
};

use crate::health::HealthReporter;
use crate::protocol::{self, Dispatcher, LoopOutcome};
use crate::tasks;
use crate::telemetry::{self, TelemetryError, TelemetryHandle};

/// Trait abstracting configuration loading for testability.
pub trait ConfigLoader: Send + Sync {
    /// Loads the worker configuration.
    ///
    /// # Errors
    ///
    /// Returns the loader's error when no configuration can be produced.
    fn load(&self) -> Result<Config, Arc<OrthoError>>;
}

/// Loader that reads CLI flags, `SHUTTLE_*` variables and the config file.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemConfigLoader;

impl ConfigLoader for SystemConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        shuttle_config::load_config()
    }
}

/// Loader returning a fixed configuration.
#[derive(Debug, Clone)]
pub struct StaticConfigLoader {
    config: Config,
}

impl StaticConfigLoader {
    /// Wraps `config`.
    pub fn new(config: Config) -> Self {
        Self { config }
    }
}

impl ConfigLoader for StaticConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Ok(self.config.clone())
    }
}

/// Errors surfaced during bootstrap.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Configuration failed to load.
    #[error("failed to load configuration: {source}")]
    Configuration {
        /// Underlying loader error.
        #[source]
        source: Arc<OrthoError>,
    },
    /// Configuration loaded but holds unusable values.
    #[error("invalid configuration: {source}")]
    InvalidConfiguration {
        /// Validation failure.
        #[source]
        source: ConfigError,
    },
    /// Telemetry initialisation failed.
    #[error("failed to initialise telemetry: {source}")]
    Telemetry {
        /// Underlying telemetry error.
        #[source]
        source: TelemetryError,
    },
    /// The instance working directory could not be created.
    #[error("failed to prepare working directory: {source}")]
    WorkDir {
        /// Filesystem error reported while creating the directory.
        #[source]
        source: WorkDirError,
    },
}

/// Result of a successful bootstrap.
pub struct Worker<A = PlatformAttacher> {
    config: Config,
    dispatcher: Dispatcher<A>,
    telemetry: TelemetryHandle,
    reporter: Arc<dyn HealthReporter>,
}

impl<A: SegmentAttacher> Worker<A> {
    /// Accessor for the resolved configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Accessor for the dispatcher, primarily useful for testing.
    #[must_use]
    pub fn dispatcher(&self) -> &Dispatcher<A> {
        &self.dispatcher
    }

    /// Accessor for the telemetry handle, primarily useful for testing.
    #[must_use]
    pub fn telemetry(&self) -> TelemetryHandle {
        self.telemetry
    }

    /// Serves host commands until `EXIT` or end of stream.
    ///
    /// # Errors
    ///
    /// Returns the I/O error that broke the command channel.
    pub fn run<R: BufRead, W: Write>(&self, input: R, output: W) -> io::Result<LoopOutcome> {
        let outcome = protocol::serve(&self.dispatcher, input, output)?;
        self.reporter.loop_finished(outcome);
        Ok(outcome)
    }
}

/// Bootstraps the worker using the supplied collaborators.
///
/// # Errors
///
/// Returns a [`BootstrapError`] when configuration, telemetry or the
/// working directory cannot be set up. Plugin problems are reported through
/// `reporter` and never fail bootstrap.
pub fn bootstrap_with(
    loader: &dyn ConfigLoader,
    reporter: Arc<dyn HealthReporter>,
) -> Result<Worker, BootstrapError> {
    reporter.bootstrap_starting();

    let config = match loader.load() {
        Ok(config) => config,
        Err(source) => return Err(fail(&reporter, BootstrapError::Configuration { source })),
    };

    if let Err(source) = config.validate() {
        return Err(fail(
            &reporter,
            BootstrapError::InvalidConfiguration { source },
        ));
    }

    let telemetry = match telemetry::initialise(&config) {
        Ok(handle) => handle,
        Err(source) => return Err(fail(&reporter, BootstrapError::Telemetry { source })),
    };

    let work_dir = match config.prepare_work_dir() {
        Ok(path) => path,
        Err(source) => return Err(fail(&reporter, BootstrapError::WorkDir { source })),
    };

    let registry = build_registry(&config, reporter.as_ref());
    let retry = RetryPolicy::from_config(&config);
    let transport = BulkTransport::new(
        FileTransport::new(work_dir),
        SharedMemoryAccessor::new(PlatformAttacher::default(), retry),
    );
    let dispatcher = Dispatcher::new(registry, transport, config.file_output_tasks());
    reporter.bootstrap_succeeded(&config, &dispatcher.registry().task_types());

    Ok(Worker {
        config,
        dispatcher,
        telemetry,
        reporter,
    })
}

fn fail(reporter: &Arc<dyn HealthReporter>, error: BootstrapError) -> BootstrapError {
    reporter.bootstrap_failed(&error);
    error
}

/// Registers the built-ins, then merges plugins from the plugin directory.
/// Plugins win over built-ins with the same task type.
fn build_registry(config: &Config, reporter: &dyn HealthReporter) -> TaskRegistry {
    let mut registry = TaskRegistry::new();
    let status = tasks::register_builtins(&mut registry, config.instance_id());

    let plugin_dir = config.plugin_dir();
    match discover(plugin_dir.as_std_path()) {
        Ok(report) => {
            for rejected in &report.rejected {
                reporter.plugin_rejected(rejected);
            }
            let executor = Arc::new(ProcessExecutor);
            for manifest in report.manifests {
                let handler = Arc::new(PluginTaskHandler::new(manifest, Arc::clone(&executor)));
                let shared: SharedHandler = handler.clone();
                let shadowed = registry.register(shared).is_some();
                reporter.plugin_loaded(handler.manifest(), shadowed);
            }
        }
        Err(error) => reporter.plugin_directory_unreadable(plugin_dir.as_std_path(), &error),
    }

    status.publish_tasks(registry.task_types());
    registry
}
