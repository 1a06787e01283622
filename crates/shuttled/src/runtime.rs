//! Process-level entry point tying bootstrap to the standard streams.

use std::io;
use std::sync::Arc;

use thiserror::Error;

use crate::bootstrap::{BootstrapError, SystemConfigLoader, bootstrap_with};
use crate::health::StructuredHealthReporter;
use crate::protocol::LoopOutcome;

/// Errors that end the worker process with a failure status.
#[derive(Debug, Error)]
pub enum RunError {
    /// Bootstrap did not complete.
    #[error(transparent)]
    Bootstrap(#[from] BootstrapError),
    /// The command channel failed while serving requests.
    #[error("command channel failed: {0}")]
    Channel(#[source] io::Error),
}

/// Bootstraps from the process environment and serves commands on the
/// standard streams until the host exits or disconnects.
///
/// # Errors
///
/// Returns [`RunError`] when bootstrap fails or the channel breaks.
pub fn run_worker() -> Result<LoopOutcome, RunError> {
    let reporter = Arc::new(StructuredHealthReporter::new());
    let worker = bootstrap_with(&SystemConfigLoader, reporter)?;

    let stdin = io::stdin();
    let stdout = io::stdout();
    worker
        .run(stdin.lock(), stdout.lock())
        .map_err(RunError::Channel)
}
