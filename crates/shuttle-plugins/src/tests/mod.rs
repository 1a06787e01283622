//! Crate-level integration and BDD tests.

use std::sync::Arc;

use mockall::mock;

use crate::error::PluginError;
use crate::manifest::PluginManifest;
use crate::protocol::{PluginRequest, PluginResponse};
use crate::registry::TaskRegistry;
use crate::runner::{PluginExecutor, PluginTaskHandler};
use crate::task::TaskInput;


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

#[test]
fn discovered_plugin_dispatches_through_registry() {
    let mut executor = MockExecutor::new();
    executor
        .expect_execute()
        .once()
        .returning(|_, request| {
            Ok(PluginResponse::done(
                format!("Result: {}", request.metadata().join("+")),
                None,
            ))
        });

    let mut registry = TaskRegistry::new();
    registry.register(Arc::new(PluginTaskHandler::new(
        PluginManifest::new("math_add", "/usr/bin/math-add"),
        Arc::new(executor),
    )));

    let handler = registry.get("MATH_ADD").expect("registered");
    let metadata = vec![String::from("3"), String::from("4")];
    let outcome = handler
        .invoke(&TaskInput::new("r", b"", &metadata))
        .expect("invoke");
    assert_eq!(outcome.summary, "Result: 3+4");
}
