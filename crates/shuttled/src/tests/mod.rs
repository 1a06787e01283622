//! Test suites for the shuttle worker.

use mockall::mock;

use shuttle_plugins::{PluginError, PluginExecutor, PluginManifest, PluginRequest, PluginResponse};

mod behaviour;
pub(crate) mod support;

mock! {
    pub(crate) Executor {}
    impl PluginExecutor for Executor {
        fn execute(
            &self,
            manifest: &PluginManifest,
            request: &PluginRequest,
        ) -> Result<PluginResponse, PluginError>;
    }
}
