//! Scanning the plugin directory for manifests.
//!
//! Every `*.json` file directly inside the directory is loaded in file-name
//! order. A manifest that fails to load is recorded in the report and
//! skipped; it never aborts the scan.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::error::PluginError;
use crate::manifest::PluginManifest;

const DISCOVERY_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::discovery");

const MANIFEST_EXTENSION: &str = "json";

/// A manifest that could not be loaded.
#[derive(Debug)]
pub struct RejectedManifest {
    /// Manifest file.
    pub path: PathBuf,
    /// Why it was rejected.
    pub error: PluginError,
}

/// Outcome of scanning a plugin directory.
#[derive(Debug, Default)]
pub struct DiscoveryReport {
    /// Valid manifests in file-name order.
    pub manifests: Vec<PluginManifest>,
    /// Manifests that failed to load.
    pub rejected: Vec<RejectedManifest>,
}

/// Loads every manifest in `dir`. A missing directory yields an empty
/// report.
///
/// # Errors
///
/// Returns [`PluginError::ReadManifest`] only when the directory exists but
/// cannot be listed.
pub fn discover(dir: &Path) -> Result<DiscoveryReport, PluginError> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(source) if source.kind() == io::ErrorKind::NotFound => {
            debug!(
                target: DISCOVERY_TARGET,
                dir = %dir.display(),
                "plugin directory absent; no plugins loaded"
            );
            return Ok(DiscoveryReport::default());
        }
        Err(source) => {
            return Err(PluginError::ReadManifest {
                path: dir.to_path_buf(),
                source: Arc::new(source),
            });
        }
    };

    let mut paths: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| is_manifest(path))
        .collect();
    paths.sort();

    let mut report = DiscoveryReport::default();
    for path in paths {
        match PluginManifest::load(&path) {
            Ok(manifest) => {
                debug!(
                    target: DISCOVERY_TARGET,
                    manifest = %path.display(),
                    task_type = manifest.task_type(),
                    "loaded plugin manifest"
                );
                report.manifests.push(manifest);
            }
            Err(error) => report.rejected.push(RejectedManifest { path, error }),
        }
    }
    Ok(report)
}

fn is_manifest(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .is_some_and(|extension| extension.eq_ignore_ascii_case(MANIFEST_EXTENSION))
}
