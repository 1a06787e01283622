//! Length-prefixed payload files in the instance working directory.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};

use camino::{Utf8Path, Utf8PathBuf};
use shuttle_config::is_safe_identifier;
use tempfile::NamedTempFile;

use crate::error::TransportError;

/// Size of the big-endian length header that precedes every payload.
pub const HEADER_LEN: usize = 4;

const INPUT_PREFIX: &str = "input_";
const OUTPUT_PREFIX: &str = "output_";
const FILE_SUFFIX: &str = ".dat";

/// Reads and writes `input_<id>.dat` / `output_<id>.dat` frames.
#[derive(Debug, Clone)]
pub struct FileTransport {
    work_dir: Utf8PathBuf,
}

impl FileTransport {
    /// Creates a transport rooted at `work_dir`. The directory must already
    /// exist.
    #[must_use]
    pub fn new(work_dir: impl Into<Utf8PathBuf>) -> Self {
        Self {
            work_dir: work_dir.into(),
        }
    }

    /// Directory holding the payload files.
    #[must_use]
    pub fn work_dir(&self) -> &Utf8Path {
        &self.work_dir
    }

    /// Path of the input file for `request_id`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::UnsafeRequestId`] when the identifier cannot
    /// be embedded in a file name.
    pub fn input_path(&self, request_id: &str) -> Result<Utf8PathBuf, TransportError> {
        self.payload_path(INPUT_PREFIX, request_id)
    }

    /// Path of the output file for `request_id`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::UnsafeRequestId`] when the identifier cannot
    /// be embedded in a file name.
    pub fn output_path(&self, request_id: &str) -> Result<Utf8PathBuf, TransportError> {
        self.payload_path(OUTPUT_PREFIX, request_id)
    }

    /// Reads the host-written input payload.
    ///
    /// # Errors
    ///
    /// Fails when the file is absent, its header is missing, or the payload
    /// is shorter than the header declares.
    pub fn read_input(&self, request_id: &str) -> Result<Vec<u8>, TransportError> {
        read_frame_file(&self.input_path(request_id)?)
    }

    /// Writes the worker's output payload, replacing any earlier file.
    ///
    /// # Errors
    ///
    /// Fails when the payload exceeds the frame limit or the file cannot be
    /// written.
    pub fn write_output(&self, request_id: &str, payload: &[u8]) -> Result<(), TransportError> {
        self.write_frame_file(&self.output_path(request_id)?, payload)
    }

    /// Host-side counterpart of [`Self::read_input`].
    ///
    /// # Errors
    ///
    /// As for [`Self::write_output`].
    pub fn write_input(&self, request_id: &str, payload: &[u8]) -> Result<(), TransportError> {
        self.write_frame_file(&self.input_path(request_id)?, payload)
    }

    /// Host-side counterpart of [`Self::write_output`].
    ///
    /// # Errors
    ///
    /// As for [`Self::read_input`].
    pub fn read_output(&self, request_id: &str) -> Result<Vec<u8>, TransportError> {
        read_frame_file(&self.output_path(request_id)?)
    }

    fn payload_path(&self, prefix: &str, request_id: &str) -> Result<Utf8PathBuf, TransportError> {
        if !is_safe_identifier(request_id) {
            return Err(TransportError::UnsafeRequestId {
                request_id: request_id.to_owned(),
            });
        }
        Ok(self
            .work_dir
            .join(format!("{prefix}{request_id}{FILE_SUFFIX}")))
    }

    // The frame lands in a sibling temporary file that is renamed over the
    // destination, so readers never observe a partial frame.
    fn write_frame_file(&self, path: &Utf8Path, payload: &[u8]) -> Result<(), TransportError> {
        let header = encode_header(payload.len())?;
        let temp = NamedTempFile::new_in(&self.work_dir)
            .map_err(|source| TransportError::io(&self.work_dir, source))?;
        {
            let mut writer = BufWriter::new(temp.as_file());
            writer
                .write_all(&header)
                .and_then(|()| writer.write_all(payload))
                .and_then(|()| writer.flush())
                .map_err(|source| TransportError::io(path, source))?;
        }
        temp.persist(path)
            .map_err(|error| TransportError::io(path, error.error))?;
        Ok(())
    }
}

/// Encodes the 4-byte big-endian header for a payload of `len` bytes.
///
/// # Errors
///
/// Returns [`TransportError::PayloadTooLarge`] above `u32::MAX` bytes.
#[expect(
    clippy::big_endian_bytes,
    reason = "the frame header is big-endian on the wire"
)]
pub fn encode_header(len: usize) -> Result<[u8; HEADER_LEN], TransportError> {
    let len32 = u32::try_from(len).map_err(|_| TransportError::PayloadTooLarge { len })?;
    Ok(len32.to_be_bytes())
}

/// Reads one frame from `reader`. `path` labels errors.
///
/// # Errors
///
/// Returns [`TransportError::MissingHeader`] if fewer than four bytes are
/// available and [`TransportError::Truncated`] if the payload is short.
#[expect(
    clippy::big_endian_bytes,
    reason = "the frame header is big-endian on the wire"
)]
pub fn read_frame<R: Read>(reader: &mut R, path: &Utf8Path) -> Result<Vec<u8>, TransportError> {
    let mut header = [0_u8; HEADER_LEN];
    if let Err(source) = reader.read_exact(&mut header) {
        return Err(if source.kind() == io::ErrorKind::UnexpectedEof {
            TransportError::MissingHeader {
                path: path.to_path_buf(),
            }
        } else {
            TransportError::io(path, source)
        });
    }

    let declared = u32::from_be_bytes(header);
    let mut payload = Vec::new();
    reader
        .take(u64::from(declared))
        .read_to_end(&mut payload)
        .map_err(|source| TransportError::io(path, source))?;

    let expected = usize::try_from(declared).unwrap_or(usize::MAX);
    if payload.len() < expected {
        return Err(TransportError::Truncated {
            path: path.to_path_buf(),
            expected,
            actual: payload.len(),
        });
    }
    Ok(payload)
}

fn read_frame_file(path: &Utf8Path) -> Result<Vec<u8>, TransportError> {
    let file = File::open(path).map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            TransportError::MissingFile {
                path: path.to_path_buf(),
            }
        } else {
            TransportError::io(path, source)
        }
    })?;
    read_frame(&mut BufReader::new(file), path)
}
