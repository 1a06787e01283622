//! The shuttle worker.
//!
//! A host process launches `shuttled`, waits for `READY` on its standard
//! output, then sends one command per line on standard input. Each
//! `EXECUTE` names a task type, a request id and metadata tokens; bulk input
//! and output travel through shared-memory segments created by the host or
//! through length-prefixed files in the instance working directory (see
//! [`shuttle_transport`]). The worker answers each command with a single
//! `DONE` or `ERROR` line, strictly in order.
//!
//! Bootstrap loads configuration through [`shuttle_config`], initialises
//! structured telemetry on standard error, prepares the working directory
//! and builds the task registry: the built-in `STATUS` and `SENTIMENT`
//! handlers first, then any plugins found in the plugin directory (see
//! [`shuttle_plugins`]). Health reporting hooks emit structured events at
//! each stage so operators can diagnose a worker that never became ready.

mod bootstrap;
mod health;
pub mod protocol;
mod runtime;
pub mod tasks;
mod telemetry;

pub use bootstrap::{
    BootstrapError, ConfigLoader, StaticConfigLoader, SystemConfigLoader, Worker, bootstrap_with,
};
pub use health::{HealthReporter, StructuredHealthReporter};
pub use protocol::LoopOutcome;
pub use runtime::{RunError, run_worker};
pub use telemetry::{TelemetryError, TelemetryHandle};

#[cfg(test)]
mod tests;
