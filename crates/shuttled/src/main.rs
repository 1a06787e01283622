use std::io::{self, Write};
use std::process::ExitCode;

fn main() -> ExitCode {
    match shuttled::run_worker() {
        Ok(_) => ExitCode::SUCCESS,
        Err(error) => {
            // Telemetry may not be installed yet, so report directly.
            let _ = writeln!(io::stderr(), "shuttled: {error}");
            ExitCode::FAILURE
        }
    }
}
