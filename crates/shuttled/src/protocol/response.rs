//! Response lines written to the host.
//!
//! Every reply is exactly one newline-terminated line, flushed as soon as it
//! is written so the host never waits on a buffered response.

use std::fmt;
use std::io::{self, Write};

use super::errors::DispatchError;

/// A single protocol reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseLine {
    /// Sent once at startup.
    Ready,
    /// Request completed; carries the summary.
    Done(String),
    /// Request failed; carries the message.
    Error(String),
    /// Acknowledges `EXIT`.
    Exiting,
}

impl ResponseLine {
    /// Builds a `DONE` line.
    pub fn done(summary: impl Into<String>) -> Self {
        Self::Done(summary.into())
    }

    /// Builds an `ERROR` line from any dispatch error.
    pub fn error(error: &DispatchError) -> Self {
        Self::Error(error.to_string())
    }
}

impl fmt::Display for ResponseLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ready => f.write_str("READY"),
            Self::Exiting => f.write_str("EXITING"),
            Self::Done(summary) => write_with_body(f, "DONE", summary),
            Self::Error(message) => write_with_body(f, "ERROR", message),
        }
    }
}

// Embedded line breaks are folded to spaces so a reply can never span two
// lines.
fn write_with_body(f: &mut fmt::Formatter<'_>, keyword: &str, body: &str) -> fmt::Result {
    let folded = body.trim().replace(['\r', '\n'], " ");
    if folded.is_empty() {
        f.write_str(keyword)
    } else {
        write!(f, "{keyword} {folded}")
    }
}

/// Writer that frames and flushes response lines.
pub struct ResponseWriter<W> {
    writer: W,
}

impl<W: Write> ResponseWriter<W> {
    /// Creates a new response writer wrapping the given output stream.
    pub const fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Writes `line` followed by a newline and flushes.
    ///
    /// # Errors
    ///
    /// Returns the I/O error from the underlying stream. Such errors are
    /// fatal to the command loop.
    pub fn write_line(&mut self, line: &ResponseLine) -> io::Result<()> {
        writeln!(self.writer, "{line}")?;
        self.writer.flush()
    }

    /// Consumes the writer and returns the inner stream.
    pub fn into_inner(self) -> W {
        self.writer
    }
}
