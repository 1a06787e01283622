//! Behaviour-driven tests for the host command loop.

use std::io::Cursor;
use std::sync::Arc;

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};

use shuttle_plugins::{PluginManifest, PluginResponse, PluginTaskHandler, TaskRegistry};
use shuttle_transport::{BulkTransport, FileTransport, RetryPolicy, SharedMemoryAccessor};

use super::MockExecutor;
use super::support::{Echo, MemoryAttacher, Workspace};
use crate::protocol::{Dispatcher, LoopOutcome, serve};
use crate::tasks::register_builtins;

// ---------------------------------------------------------------------------
// Test world
// ---------------------------------------------------------------------------

struct TestWorld {
    workspace: Workspace,
    registry: TaskRegistry,
    attacher: MemoryAttacher,
    shadowed: usize,
    replies: Vec<String>,
    outcome: Option<LoopOutcome>,
}

#[fixture]
fn world() -> TestWorld {
    TestWorld {
        workspace: Workspace::new(),
        registry: TaskRegistry::new(),
        attacher: MemoryAttacher::default(),
        shadowed: 0,
        replies: Vec::new(),
        outcome: None,
    }
}

fn unquote(value: &str) -> &str {
    value.trim_matches('"')
}

// ---------------------------------------------------------------------------
// Given steps
// ---------------------------------------------------------------------------

#[given("a worker with the built-in tasks")]
fn given_builtins(world: &mut TestWorld) {
    let status = register_builtins(&mut world.registry, "bdd");
    status.publish_tasks(world.registry.task_types());
}

#[given("an input file for request {id} containing {text}")]
fn given_input_file(world: &mut TestWorld, id: String, text: String) {
    world
        .workspace
        .files()
        .write_input(unquote(&id), unquote(&text).as_bytes())
        .expect("host writes input");
}

fn register_plugin(world: &mut TestWorld, manifest: PluginManifest, executor: MockExecutor) {
    let displaced = world
        .registry
        .register(Arc::new(PluginTaskHandler::new(manifest, Arc::new(executor))));
    world.shadowed += usize::from(displaced.is_some());
}

#[given("a metadata-only plugin serving task {task} with summary {summary}")]
fn given_plugin(world: &mut TestWorld, task: String, summary: String) {
    let answer = PluginResponse::done(unquote(&summary), None);
    let mut executor = MockExecutor::new();
    executor
        .expect_execute()
        .returning(move |_, _| Ok(answer.clone()));
    let manifest =
        PluginManifest::new(unquote(&task), "/opt/plugins/status").with_reads_input(false);
    register_plugin(world, manifest, executor);
    assert_eq!(world.shadowed, 1, "plugin should replace the built-in");
}

#[given("a metadata-only plugin adding its tokens for task {task}")]
fn given_adding_plugin(world: &mut TestWorld, task: String) {
    let mut executor = MockExecutor::new();
    executor
        .expect_execute()
        .withf(|_, request| request.input().is_empty())
        .returning(|_, request| {
            let sum: i64 = request
                .metadata()
                .iter()
                .map(|token| token.parse::<i64>().expect("numeric token"))
                .sum();
            Ok(PluginResponse::done(format!("Result: {sum}"), None))
        });
    let manifest =
        PluginManifest::new(unquote(&task), "/opt/plugins/math-add").with_reads_input(false);
    register_plugin(world, manifest, executor);
}

#[given("a shared segment {name} containing {text}")]
fn given_segment(world: &mut TestWorld, name: String, text: String) {
    world.attacher = world
        .attacher
        .clone()
        .with_segment(unquote(&name), unquote(&text).as_bytes().to_vec());
}

#[given("an empty output segment {name} of {size} bytes")]
fn given_output_segment(world: &mut TestWorld, name: String, size: usize) {
    world.attacher = world
        .attacher
        .clone()
        .with_segment(unquote(&name), vec![0; size]);
}

#[given("a handler that echoes its input")]
fn given_echo(world: &mut TestWorld) {
    world.registry.register(Arc::new(Echo));
}

// ---------------------------------------------------------------------------
// When steps
// ---------------------------------------------------------------------------

#[when("the host sends {lines}")]
fn when_host_sends(world: &mut TestWorld, lines: String) {
    let mut input = unquote(&lines).replace('|', "\n");
    input.push('\n');
    let dispatcher = Dispatcher::new(
        world.registry.clone(),
        BulkTransport::new(
            FileTransport::new(world.workspace.path()),
            SharedMemoryAccessor::new(world.attacher.clone(), RetryPolicy::immediate(3)),
        ),
        Vec::<String>::new(),
    );

    let mut output = Vec::new();
    let outcome = serve(&dispatcher, Cursor::new(input.into_bytes()), &mut output)
        .expect("command loop");

    world.outcome = Some(outcome);
    world.replies = String::from_utf8(output)
        .expect("utf8 replies")
        .lines()
        .map(str::to_owned)
        .collect();
}

// ---------------------------------------------------------------------------
// Then steps
// ---------------------------------------------------------------------------

#[then("the replies are {expected}")]
fn then_replies(world: &mut TestWorld, expected: String) {
    let expected: Vec<&str> = unquote(&expected).split('|').collect();
    assert_eq!(world.replies, expected);
}

#[then("reply {index} starts with {prefix}")]
fn then_reply_starts_with(world: &mut TestWorld, index: usize, prefix: String) {
    let reply = world
        .replies
        .get(index - 1)
        .unwrap_or_else(|| panic!("no reply {index} in {:?}", world.replies));
    assert!(
        reply.starts_with(unquote(&prefix)),
        "reply {index} was {reply:?}"
    );
}

#[then("the output file for request {id} contains {text}")]
fn then_output_contains(world: &mut TestWorld, id: String, text: String) {
    let output = world
        .workspace
        .files()
        .read_output(unquote(&id))
        .expect("output file");
    let output = String::from_utf8(output).expect("utf8 output");
    assert!(output.contains(unquote(&text)), "output was {output:?}");
}

#[then("the output file for request {id} reports status {status}")]
fn then_status_report(world: &mut TestWorld, id: String, status: String) {
    let output = world
        .workspace
        .files()
        .read_output(unquote(&id))
        .expect("output file");
    let report: serde_json::Value = serde_json::from_slice(&output).expect("status json");
    assert_eq!(report["status"], unquote(&status));
    assert_eq!(report["instance_id"], "bdd");
}

#[then("no output file exists for request {id}")]
fn then_no_output(world: &mut TestWorld, id: String) {
    assert!(world.workspace.files().read_output(unquote(&id)).is_err());
}

#[then("the loop ended with {outcome}")]
fn then_loop_ended(world: &mut TestWorld, outcome: String) {
    let actual = world.outcome.expect("loop ran");
    assert_eq!(actual.as_str(), unquote(&outcome));
}

#[then("segment {name} starts with {text}")]
fn then_segment_starts_with(world: &mut TestWorld, name: String, text: String) {
    let contents = world.attacher.contents(unquote(&name));
    assert!(contents.starts_with(unquote(&text).as_bytes()));
}

// ---------------------------------------------------------------------------
// Scenario registration
// ---------------------------------------------------------------------------

#[scenario(path = "tests/features/command_loop.feature")]
fn command_loop_behaviour(world: TestWorld) {
    let _ = world;
}
