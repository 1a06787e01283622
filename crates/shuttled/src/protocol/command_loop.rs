//! The line-oriented command loop.
//!
//! Reads one command at a time, answers each with exactly one line and
//! keeps going until `EXIT` or end of stream. Only I/O failures on the
//! channel itself stop it early.

use std::fmt;
use std::io::{self, BufRead, Read, Write};
use std::str;

use tracing::{debug, warn};

use shuttle_transport::SegmentAttacher;

use super::command::Command;
use super::dispatcher::Dispatcher;
use super::errors::DispatchError;
use super::response::{ResponseLine, ResponseWriter};

/// Tracing target for command loop events.
pub(crate) const PROTOCOL_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::protocol");

/// Maximum size of a single command line in bytes, excluding the newline.
pub const MAX_COMMAND_BYTES: usize = 64 * 1024;

// Room for a maximal line plus its `\r\n` terminator.
const READ_LIMIT: usize = MAX_COMMAND_BYTES + 2;

/// How the command loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopOutcome {
    /// The host sent `EXIT`.
    Exited,
    /// The host closed the command channel.
    EndOfStream,
}

impl LoopOutcome {
    /// Stable label for logs.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Exited => "exited",
            Self::EndOfStream => "end_of_stream",
        }
    }
}

impl fmt::Display for LoopOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

enum LineRead {
    Line,
    TooLong(usize),
    End,
}

/// Serves commands from `input` until `EXIT` or end of stream, writing
/// replies to `output`. `READY` is written before the first read.
///
/// # Errors
///
/// Returns an I/O error when reading a command or writing a reply fails.
/// No reply is owed to the host in that case.
pub fn serve<A, R, W>(
    dispatcher: &Dispatcher<A>,
    mut input: R,
    output: W,
) -> io::Result<LoopOutcome>
where
    A: SegmentAttacher,
    R: BufRead,
    W: Write,
{
    let mut writer = ResponseWriter::new(output);
    writer.write_line(&ResponseLine::Ready)?;

    let mut buffer = Vec::new();
    let mut handled: u64 = 0;
    loop {
        let response = match read_command_line(&mut input, &mut buffer)? {
            LineRead::End => {
                debug!(target: PROTOCOL_TARGET, handled, "command channel closed");
                return Ok(LoopOutcome::EndOfStream);
            }
            LineRead::TooLong(size) => Some(reject(&DispatchError::LineTooLong {
                size,
                max_size: MAX_COMMAND_BYTES,
            })),
            LineRead::Line => match str::from_utf8(trim_line_ending(&buffer)) {
                Err(_) => Some(reject(&DispatchError::InvalidEncoding)),
                Ok(line) => match Command::parse(line) {
                    Ok(Command::Blank) => None,
                    Ok(Command::Exit) => {
                        writer.write_line(&ResponseLine::Exiting)?;
                        debug!(target: PROTOCOL_TARGET, handled, "exit requested");
                        return Ok(LoopOutcome::Exited);
                    }
                    Ok(Command::Execute(request)) => match dispatcher.dispatch(&request) {
                        Ok(summary) => Some(ResponseLine::done(summary)),
                        Err(error) => Some(reject(&error)),
                    },
                    Err(error) => Some(reject(&error)),
                },
            },
        };

        if let Some(line) = response {
            handled += 1;
            writer.write_line(&line)?;
        }
    }
}

fn reject(error: &DispatchError) -> ResponseLine {
    warn!(
        target: PROTOCOL_TARGET,
        kind = error.kind(),
        error = %error,
        "request failed"
    );
    ResponseLine::error(error)
}

/// Reads one line into `buffer`, refusing to buffer more than
/// [`MAX_COMMAND_BYTES`]. The rest of an overlong line is discarded.
fn read_command_line<R: BufRead>(reader: &mut R, buffer: &mut Vec<u8>) -> io::Result<LineRead> {
    buffer.clear();
    let limit = u64::try_from(READ_LIMIT).unwrap_or(u64::MAX);
    let read = reader.by_ref().take(limit).read_until(b'\n', buffer)?;
    if read == 0 {
        return Ok(LineRead::End);
    }
    if buffer.last() != Some(&b'\n') && read == READ_LIMIT {
        let discarded = discard_line(reader)?;
        return Ok(LineRead::TooLong(read.saturating_add(discarded)));
    }
    let len = trim_line_ending(buffer).len();
    if len > MAX_COMMAND_BYTES {
        return Ok(LineRead::TooLong(len));
    }
    Ok(LineRead::Line)
}

fn discard_line<R: BufRead>(reader: &mut R) -> io::Result<usize> {
    let mut discarded = 0_usize;
    loop {
        let available = match reader.fill_buf() {
            Ok(available) => available,
            Err(error) if error.kind() == io::ErrorKind::Interrupted => continue,
            Err(error) => return Err(error),
        };
        if available.is_empty() {
            return Ok(discarded);
        }
        if let Some(position) = available.iter().position(|byte| *byte == b'\n') {
            reader.consume(position + 1);
            return Ok(discarded.saturating_add(position));
        }
        let len = available.len();
        reader.consume(len);
        discarded = discarded.saturating_add(len);
    }
}

fn trim_line_ending(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use rstest::rstest;

    use super::*;

    fn read_all(input: &[u8]) -> Vec<Result<String, usize>> {
        let mut reader = Cursor::new(input.to_vec());
        let mut buffer = Vec::new();
        let mut lines = Vec::new();
        loop {
            match read_command_line(&mut reader, &mut buffer).expect("read") {
                LineRead::End => return lines,
                LineRead::TooLong(size) => lines.push(Err(size)),
                LineRead::Line => {
                    let line = String::from_utf8_lossy(trim_line_ending(&buffer));
                    lines.push(Ok(line.into_owned()));
                }
            }
        }
    }

    #[rstest]
    fn lines_are_split_and_trimmed() {
        let lines = read_all(b"EXIT\r\nEXECUTE A b\nlast");
        assert_eq!(
            lines,
            vec![
                Ok(String::from("EXIT")),
                Ok(String::from("EXECUTE A b")),
                Ok(String::from("last")),
            ]
        );
    }

    #[rstest]
    fn a_line_at_the_limit_is_accepted() {
        let mut input = vec![b'a'; MAX_COMMAND_BYTES];
        input.push(b'\n');

        let lines = read_all(&input);

        assert_eq!(lines.len(), 1);
        assert!(matches!(&lines[0], Ok(line) if line.len() == MAX_COMMAND_BYTES));
    }

    #[rstest]
    fn a_crlf_line_at_the_limit_is_accepted() {
        let mut input = vec![b'a'; MAX_COMMAND_BYTES];
        input.extend_from_slice(b"\r\nEXIT\r\n");

        let lines = read_all(&input);

        assert_eq!(lines.len(), 2);
        assert!(matches!(&lines[0], Ok(line) if line.len() == MAX_COMMAND_BYTES));
        assert_eq!(lines[1], Ok(String::from("EXIT")));
    }

    #[rstest]
    fn one_byte_over_the_limit_is_rejected() {
        let mut input = vec![b'a'; MAX_COMMAND_BYTES + 1];
        input.extend_from_slice(b"\nEXIT\n");

        let lines = read_all(&input);

        assert_eq!(
            lines,
            vec![Err(MAX_COMMAND_BYTES + 1), Ok(String::from("EXIT"))]
        );
    }

    #[rstest]
    fn overlong_lines_are_skipped_whole() {
        let mut input = vec![b'a'; MAX_COMMAND_BYTES + 10];
        input.extend_from_slice(b"\nEXIT\n");

        let lines = read_all(&input);

        assert_eq!(
            lines,
            vec![Err(MAX_COMMAND_BYTES + 10), Ok(String::from("EXIT"))]
        );
    }
}
