//! Error types for bulk-data transport.

use std::io;
use std::num::ParseIntError;
use std::sync::Arc;

use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors raised while moving payloads between host and worker.
///
/// Display strings are sent verbatim to the host after `ERROR `, so they
/// stay on one line and name the resource involved.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// A `SHMEM` directive lacked a required token.
    #[error("incomplete SHMEM directive: missing {missing}")]
    IncompleteDirective {
        /// Name of the missing token.
        missing: &'static str,
    },

    /// A size or capacity token was not a non-negative integer.
    #[error("invalid {field} '{value}': {source}")]
    InvalidInteger {
        /// Which token failed to parse.
        field: &'static str,
        /// Raw token text.
        value: String,
        /// Parser error.
        #[source]
        source: ParseIntError,
    },

    /// Every attach attempt failed.
    #[error("failed to attach shared memory '{name}' after {attempts} attempts: {reason}")]
    AttachExhausted {
        /// Segment name as sent by the host.
        name: String,
        /// Number of attempts made.
        attempts: u32,
        /// Reason reported by the final attempt.
        reason: String,
    },

    /// Shared memory is not available on this platform.
    #[error("shared memory transport is not supported on this platform")]
    Unsupported,

    /// The requested range does not fit inside the segment's backing store.
    #[error("shared memory '{name}' holds {available} bytes but {requested} were requested")]
    SegmentTooSmall {
        /// Segment name.
        name: String,
        /// Bytes requested.
        requested: usize,
        /// Bytes backing the segment.
        available: usize,
    },

    /// A payload exceeded the capacity the host declared for the output
    /// segment.
    #[error("output of {len} bytes exceeds capacity {capacity} of shared memory '{name}'")]
    CapacityExceeded {
        /// Segment name.
        name: String,
        /// Payload length.
        len: usize,
        /// Declared capacity.
        capacity: usize,
    },

    /// The request identifier cannot be embedded in a file name.
    #[error("request id is not file-name safe: '{request_id}'")]
    UnsafeRequestId {
        /// Offending identifier.
        request_id: String,
    },

    /// The expected input or output file does not exist.
    #[error("file not found: {path}")]
    MissingFile {
        /// Path that was opened.
        path: Utf8PathBuf,
    },

    /// The file ended before its 4-byte length header.
    #[error("missing length header in {path}")]
    MissingHeader {
        /// Path that was read.
        path: Utf8PathBuf,
    },

    /// The file ended before the number of bytes its header declared.
    #[error("truncated payload in {path}: expected {expected} bytes, found {actual}")]
    Truncated {
        /// Path that was read.
        path: Utf8PathBuf,
        /// Length from the header.
        expected: usize,
        /// Bytes actually present.
        actual: usize,
    },

    /// The payload cannot be described by a 4-byte length header.
    #[error("payload of {len} bytes exceeds the 4 GiB frame limit")]
    PayloadTooLarge {
        /// Payload length.
        len: usize,
    },

    /// Any other I/O failure on a transport file.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// Path involved.
        path: Utf8PathBuf,
        /// Underlying error.
        #[source]
        source: Arc<io::Error>,
    },
}

impl TransportError {
    pub(crate) fn invalid_integer(field: &'static str, value: &str, source: ParseIntError) -> Self {
        Self::InvalidInteger {
            field,
            value: value.to_owned(),
            source,
        }
    }

    pub(crate) fn io(path: impl Into<Utf8PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source: Arc::new(source),
        }
    }
}
