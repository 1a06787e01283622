//! Process executor tests driven by small shell-script plugins.

use std::fs;
use std::path::PathBuf;

use rstest::{fixture, rstest};
use tempfile::TempDir;

use super::*;

struct ScriptDir {
    dir: TempDir,
}

impl ScriptDir {
    fn script(&self, name: &str, body: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        fs::write(&path, format!("{body}\n")).expect("write script");
        path
    }
}

#[fixture]
fn scripts() -> ScriptDir {
    ScriptDir {
        dir: TempDir::new().expect("temp dir"),
    }
}

fn request() -> PluginRequest {
    PluginRequest::new("req-1", "ECHO", vec![String::from("a")], b"payload".to_vec())
}

// Scripts run through `/bin/sh` so no freshly written file is ever
// executed directly.
fn run(script: PathBuf, timeout_secs: u64) -> Result<PluginResponse, PluginError> {
    let manifest = PluginManifest::new("ECHO", "/bin/sh")
        .with_args(vec![script.display().to_string()])
        .with_timeout_secs(timeout_secs);
    ProcessExecutor.execute(&manifest, &request())
}

#[rstest]
fn successful_plugin_round_trip(scripts: ScriptDir) {
    let plugin = scripts.script(
        "ok.sh",
        r#"read line
echo "diagnostic" >&2
echo '{"status":"done","summary":"Result: 7","output":"Nw=="}'"#,
    );

    let response = run(plugin, 5).expect("execute");

    assert_eq!(response, PluginResponse::done("Result: 7", Some(b"7".to_vec())));
}

#[rstest]
fn plugin_sees_request_json(scripts: ScriptDir) {
    let capture = scripts.dir.path().join("seen.json");
    let plugin = scripts.script(
        "capture.sh",
        &format!(
            r#"read line
printf '%s' "$line" > '{}'
echo '{{"status":"done","summary":"ok"}}'"#,
            capture.display()
        ),
    );

    run(plugin, 5).expect("execute");

    let seen: PluginRequest =
        serde_json::from_str(&fs::read_to_string(capture).expect("read capture")).expect("json");
    assert_eq!(seen, request());
}

#[rstest]
fn error_response_is_returned_not_raised(scripts: ScriptDir) {
    let plugin = scripts.script(
        "err.sh",
        r#"read line
echo '{"status":"error","message":"bad input"}'"#,
    );

    let response = run(plugin, 5).expect("execute");

    assert_eq!(response, PluginResponse::error("bad input"));
}

#[rstest]
fn non_zero_exit_is_reported(scripts: ScriptDir) {
    let plugin = scripts.script(
        "exit.sh",
        r#"read line
echo '{"status":"done","summary":"ok"}'
exit 3"#,
    );

    let err = run(plugin, 5).expect_err("must fail");

    assert!(matches!(err, PluginError::NonZeroExit { status: 3, .. }));
}

#[rstest]
fn silent_plugin_is_invalid_output(scripts: ScriptDir) {
    let plugin = scripts.script("silent.sh", "read line");

    let err = run(plugin, 5).expect_err("must fail");

    assert!(matches!(err, PluginError::InvalidOutput { .. }));
}

#[rstest]
fn malformed_json_is_reported(scripts: ScriptDir) {
    let plugin = scripts.script("garbage.sh", "read line\necho 'not json'");

    let err = run(plugin, 5).expect_err("must fail");

    assert!(matches!(err, PluginError::DeserializeResponse { .. }));
}

#[rstest]
fn hanging_plugin_times_out(scripts: ScriptDir) {
    let plugin = scripts.script("hang.sh", "sleep 30");

    let started = Instant::now();
    let err = run(plugin, 1).expect_err("must fail");

    assert!(matches!(err, PluginError::Timeout { timeout_secs: 1, .. }));
    assert!(started.elapsed() < Duration::from_secs(10));
}

#[rstest]
fn missing_executable_is_reported(scripts: ScriptDir) {
    let manifest = PluginManifest::new("ECHO", scripts.dir.path().join("absent"));
    let err = ProcessExecutor
        .execute(&manifest, &request())
        .expect_err("must fail");

    assert!(matches!(err, PluginError::ExecutableNotFound { .. }));
}
