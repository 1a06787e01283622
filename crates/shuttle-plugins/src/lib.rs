//! Task handlers and the plugin layer for the shuttle worker.
//!
//! The worker dispatches every `EXECUTE` request to a [`TaskHandler`]
//! looked up in a [`TaskRegistry`]. Built-in handlers live in the worker
//! binary; further handlers come from plugin manifests discovered at
//! startup. Each manifest binds a task type to an external executable that
//! speaks a single-line JSONL protocol over standard I/O, so a misbehaving
//! plugin can only fail its own request.
//!
//! # Architecture
//!
//! [`discovery::discover`] loads [`PluginManifest`]s from the plugin
//! directory. Each manifest is wrapped in a [`PluginTaskHandler`], which
//! turns a [`TaskInput`] into a [`PluginRequest`], runs it through a
//! [`PluginExecutor`] (normally [`ProcessExecutor`]), and maps the
//! [`PluginResponse`] back into a [`TaskOutcome`].

pub mod discovery;
pub mod error;
pub mod manifest;
pub mod process;
pub mod protocol;
pub mod registry;
pub mod runner;
pub mod task;

#[cfg(test)]
mod tests;

pub use self::discovery::{DiscoveryReport, RejectedManifest, discover};
pub use self::error::{PluginError, TaskError};
pub use self::manifest::PluginManifest;
pub use self::process::ProcessExecutor;
pub use self::protocol::{PluginRequest, PluginResponse};
pub use self::registry::{SharedHandler, TaskRegistry, task_key};
pub use self::runner::{PluginExecutor, PluginTaskHandler};
pub use self::task::{TaskHandler, TaskInput, TaskOutcome};
