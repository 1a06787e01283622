//! Parsing of command lines read from the host.

use shuttle_config::is_safe_identifier;
use shuttle_plugins::task_key;

use super::errors::DispatchError;

const EXECUTE: &str = "EXECUTE";
const EXIT: &str = "EXIT";

/// A parsed command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Whitespace-only line; produces no response.
    Blank,
    /// Stop reading commands.
    Exit,
    /// Run a task.
    Execute(ExecuteRequest),
}

/// The operands of an `EXECUTE` command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecuteRequest {
    /// Upper-cased task type.
    pub task_type: String,
    /// Host-assigned request identifier.
    pub request_id: String,
    /// Remaining tokens, transport directive included.
    pub metadata: Vec<String>,
}

impl Command {
    /// Parses one line.
    ///
    /// Command words are case-insensitive. Trailing tokens after `EXIT` are
    /// ignored.
    ///
    /// # Errors
    ///
    /// Returns a protocol [`DispatchError`] for unknown command words,
    /// `EXECUTE` lines with fewer than two operands and request ids that are
    /// unsafe to embed in file names.
    pub fn parse(line: &str) -> Result<Self, DispatchError> {
        let mut tokens = line.split_whitespace();
        let Some(word) = tokens.next() else {
            return Ok(Self::Blank);
        };

        match word.to_ascii_uppercase().as_str() {
            EXIT => Ok(Self::Exit),
            EXECUTE => {
                let (Some(task_type), Some(request_id)) = (tokens.next(), tokens.next()) else {
                    return Err(DispatchError::MissingArguments);
                };
                if !is_safe_identifier(request_id) {
                    return Err(DispatchError::invalid_request_id(request_id));
                }
                Ok(Self::Execute(ExecuteRequest {
                    task_type: task_key(task_type),
                    request_id: request_id.to_owned(),
                    metadata: tokens.map(str::to_owned).collect(),
                }))
            }
            other => Err(DispatchError::unknown_command(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("")]
    #[case("   \t ")]
    fn whitespace_lines_are_blank(#[case] line: &str) {
        assert_eq!(Command::parse(line).expect("parse"), Command::Blank);
    }

    #[rstest]
    #[case("EXIT")]
    #[case("exit")]
    #[case("  Exit now please")]
    fn exit_is_case_insensitive(#[case] line: &str) {
        assert_eq!(Command::parse(line).expect("parse"), Command::Exit);
    }

    #[rstest]
    fn execute_splits_operands() {
        let command = Command::parse("execute sentiment req-1 SHMEM seg 12 extra")
            .expect("parse");

        assert_eq!(
            command,
            Command::Execute(ExecuteRequest {
                task_type: String::from("SENTIMENT"),
                request_id: String::from("req-1"),
                metadata: vec![
                    String::from("SHMEM"),
                    String::from("seg"),
                    String::from("12"),
                    String::from("extra"),
                ],
            })
        );
    }

    #[rstest]
    #[case("EXECUTE")]
    #[case("EXECUTE STATUS")]
    fn execute_requires_two_operands(#[case] line: &str) {
        let error = Command::parse(line).expect_err("must fail");
        assert!(matches!(error, DispatchError::MissingArguments));
    }

    #[rstest]
    fn unknown_words_are_echoed_upper_cased() {
        let error = Command::parse("process foo").expect_err("must fail");
        assert_eq!(error.to_string(), "Unknown command: PROCESS");
    }

    #[rstest]
    #[case("../etc")]
    #[case("a/b")]
    fn unsafe_request_ids_are_rejected(#[case] request_id: &str) {
        let line = format!("EXECUTE STATUS {request_id}");
        let error = Command::parse(&line).expect_err("must fail");
        assert!(matches!(error, DispatchError::InvalidRequestId { .. }));
    }
}
