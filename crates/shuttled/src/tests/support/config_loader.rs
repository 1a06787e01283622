//! Configuration loaders for bootstrap tests.

use std::ffi::OsString;
use std::sync::Arc;

use camino::Utf8PathBuf;
use ortho_config::OrthoError;

use shuttle_config::{Config, load_config_from_iter};

use crate::bootstrap::ConfigLoader;

/// Loader rooting the worker under a test-owned directory.
pub struct TestConfigLoader {
    config: Config,
}

impl TestConfigLoader {
    /// Uses `work_root` with otherwise default settings.
    pub fn new(work_root: Utf8PathBuf) -> Self {
        Self {
            config: Config {
                work_root,
                instance_id: String::from("bdd"),
                ..Config::default()
            },
        }
    }
}

impl ConfigLoader for TestConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Ok(self.config.clone())
    }
}

/// Loader that fails by passing an unknown log format on the command line.
pub struct FailingConfigLoader;

impl ConfigLoader for FailingConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        load_config_from_iter([
            OsString::from("shuttled"),
            OsString::from("--log-format"),
            OsString::from("yaml"),
        ])
    }
}
