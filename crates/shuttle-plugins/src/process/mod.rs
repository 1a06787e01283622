//! Process-based plugin execution.
//!
//! [`ProcessExecutor`] implements the [`PluginExecutor`] trait by spawning
//! the manifest's executable, writing the request to stdin as a single JSONL
//! line, reading the response from stdout, and enforcing the manifest's
//! timeout across the whole exchange.
//!
//! The stdin writer and stdout reader run on helper threads so a plugin that
//! never reads its input or never answers cannot block the worker past the
//! timeout.

use std::io::{BufRead, BufReader, Read, Write};
use std::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command, Stdio};
use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::error::PluginError;
use crate::manifest::PluginManifest;
use crate::protocol::{PluginRequest, PluginResponse};
use crate::runner::PluginExecutor;

/// Tracing target for plugin process operations.
const PLUGIN_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::process");

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Executes plugins by spawning child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessExecutor;

impl PluginExecutor for ProcessExecutor {
    fn execute(
        &self,
        manifest: &PluginManifest,
        request: &PluginRequest,
    ) -> Result<PluginResponse, PluginError> {
        execute_process(manifest, request)
    }
}

/// Spawns the plugin process, writes the request, reads the response.
fn execute_process(
    manifest: &PluginManifest,
    request: &PluginRequest,
) -> Result<PluginResponse, PluginError> {
    let name = manifest.task_type();
    let timeout = Duration::from_secs(manifest.timeout_secs());
    let deadline = Instant::now() + timeout;

    let mut json = serde_json::to_string(request).map_err(PluginError::SerializeRequest)?;
    json.push('\n');

    if !manifest.executable().exists() {
        return Err(PluginError::ExecutableNotFound {
            name: name.to_owned(),
            path: manifest.executable().to_path_buf(),
        });
    }

    debug!(
        target: PLUGIN_TARGET,
        plugin = name,
        executable = %manifest.executable().display(),
        request_bytes = json.len(),
        "spawning plugin process"
    );

    let mut child = Command::new(manifest.executable())
        .args(manifest.args())
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|err| PluginError::SpawnFailed {
            name: name.to_owned(),
            message: err.to_string(),
            source: Some(Arc::new(err)),
        })?;

    let stdin = child.stdin.take().ok_or_else(|| capture_failure(name, "stdin"))?;
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| capture_failure(name, "stdout"))?;
    let stderr = child.stderr.take().map(spawn_stderr_drain);

    let writer = spawn_writer(stdin, json);
    let response_line = match read_response(name, stdout, deadline, manifest.timeout_secs()) {
        Ok(line) => line,
        Err(err) => {
            kill(name, &mut child);
            return Err(err);
        }
    };

    let exit = wait_for_exit(name, &mut child, deadline, manifest.timeout_secs());
    if writer.join().is_err() {
        warn!(target: PLUGIN_TARGET, plugin = name, "stdin writer panicked");
    }
    log_stderr(name, stderr);
    exit?;
    parse_response(name, &response_line)
}

fn capture_failure(name: &str, stream: &str) -> PluginError {
    PluginError::SpawnFailed {
        name: name.to_owned(),
        message: format!("failed to capture {stream}"),
        source: None,
    }
}

/// Writes the request and closes stdin. A plugin that exits without reading
/// everything produces a broken pipe, which is not an error on its own.
fn spawn_writer(mut stdin: ChildStdin, json: String) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        if let Err(err) = stdin.write_all(json.as_bytes()).and_then(|()| stdin.flush()) {
            debug!(target: PLUGIN_TARGET, error = %err, "plugin stdin closed early");
        }
    })
}

/// Reads a single JSONL line from the plugin's stdout, giving up at
/// `deadline`.
fn read_response(
    name: &str,
    stdout: ChildStdout,
    deadline: Instant,
    timeout_secs: u64,
) -> Result<String, PluginError> {
    let (sender, receiver) = mpsc::channel();
    thread::spawn(move || {
        let mut line = String::new();
        let result = BufReader::new(stdout).read_line(&mut line).map(|_| line);
        // The receiver may have timed out already.
        sender.send(result).ok();
    });

    let remaining = deadline.saturating_duration_since(Instant::now());
    let line = match receiver.recv_timeout(remaining) {
        Ok(result) => result.map_err(|err| PluginError::io(name, err))?,
        Err(RecvTimeoutError::Timeout) => {
            return Err(PluginError::Timeout {
                name: name.to_owned(),
                timeout_secs,
            });
        }
        Err(RecvTimeoutError::Disconnected) => {
            return Err(PluginError::InvalidOutput {
                name: name.to_owned(),
                message: String::from("stdout reader stopped unexpectedly"),
            });
        }
    };

    debug!(
        target: PLUGIN_TARGET,
        plugin = name,
        bytes_read = line.len(),
        "read response from plugin stdout"
    );

    if line.trim().is_empty() {
        return Err(PluginError::InvalidOutput {
            name: name.to_owned(),
            message: String::from("plugin produced no output on stdout"),
        });
    }
    Ok(line)
}

/// Drains stderr on a helper thread so a chatty plugin never blocks on a
/// full pipe.
fn spawn_stderr_drain(stderr: ChildStderr) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut buffer = String::new();
        if BufReader::new(stderr).read_to_string(&mut buffer).is_err() {
            buffer.clear();
        }
        buffer
    })
}

fn log_stderr(name: &str, drain: Option<thread::JoinHandle<String>>) {
    let Some(handle) = drain else {
        return;
    };
    match handle.join() {
        Ok(buffer) if !buffer.trim().is_empty() => debug!(
            target: PLUGIN_TARGET,
            plugin = name,
            stderr = %buffer.trim(),
            "plugin stderr output"
        ),
        Ok(_) => {}
        Err(_) => warn!(target: PLUGIN_TARGET, plugin = name, "stderr reader panicked"),
    }
}

/// Waits for the child process to exit, enforcing the deadline.
fn wait_for_exit(
    name: &str,
    child: &mut Child,
    deadline: Instant,
    timeout_secs: u64,
) -> Result<(), PluginError> {
    loop {
        match child.try_wait() {
            Ok(Some(status)) => {
                debug!(
                    target: PLUGIN_TARGET,
                    plugin = name,
                    ?status,
                    "plugin process exited"
                );
                if status.success() {
                    return Ok(());
                }
                return Err(PluginError::NonZeroExit {
                    name: name.to_owned(),
                    status: status.code().unwrap_or(-1),
                });
            }
            Ok(None) => {
                if Instant::now() >= deadline {
                    kill(name, child);
                    return Err(PluginError::Timeout {
                        name: name.to_owned(),
                        timeout_secs,
                    });
                }
                thread::sleep(POLL_INTERVAL);
            }
            Err(err) => return Err(PluginError::io(name, err)),
        }
    }
}

fn kill(name: &str, child: &mut Child) {
    warn!(
        target: PLUGIN_TARGET,
        plugin = name,
        "terminating plugin process"
    );
    drop(child.kill());
    drop(child.wait());
}

/// Parses a JSONL response line into a [`PluginResponse`].
fn parse_response(name: &str, line: &str) -> Result<PluginResponse, PluginError> {
    serde_json::from_str(line.trim()).map_err(|err| PluginError::DeserializeResponse {
        message: format!("plugin '{name}' produced invalid JSON: {err}"),
        source: Some(err),
    })
}

#[cfg(all(test, unix))]
mod tests;
