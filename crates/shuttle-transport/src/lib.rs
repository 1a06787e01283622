//! Bulk-data transport between the shuttle worker and its host.
//!
//! Payloads travel either through host-created shared-memory segments or
//! through length-prefixed files in the instance working directory. The
//! [`TransportPlan`] parsed from request metadata decides which; the
//! [`BulkTransport`] facade carries it out.

mod directive;
mod error;
mod file;
mod shm;

pub use directive::{
    EMPTY_METADATA_PLACEHOLDER, OUTPUT_SEGMENT_MARKER, OutputTarget, SHMEM_KEYWORD, SegmentRef,
    TransportDirective, TransportPlan,
};
pub use error::TransportError;
pub use file::{FileTransport, HEADER_LEN, encode_header, read_frame};
#[cfg(unix)]
pub use shm::{PosixAttacher, PosixSegment, normalise_name};
#[cfg(not(unix))]
pub use shm::UnsupportedAttacher;
pub use shm::{
    AttachError, PlatformAttacher, RetryPolicy, Segment, SegmentAttacher, SharedMemoryAccessor,
};

/// Where an output payload ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// Nothing was written because the handler produced no payload.
    Skipped,
    /// Written to `output_<id>.dat`.
    File {
        /// Payload length.
        bytes: usize,
    },
    /// Copied into the host's output segment.
    Segment {
        /// Segment name.
        name: String,
        /// Bytes written.
        bytes: usize,
    },
}

/// Loads request input and delivers handler output for either transport.
#[derive(Debug, Clone)]
pub struct BulkTransport<A = PlatformAttacher> {
    files: FileTransport,
    segments: SharedMemoryAccessor<A>,
}

impl<A: SegmentAttacher> BulkTransport<A> {
    /// Combines a file transport and a shared-memory accessor.
    #[must_use]
    pub const fn new(files: FileTransport, segments: SharedMemoryAccessor<A>) -> Self {
        Self { files, segments }
    }

    /// File transport for the working directory.
    #[must_use]
    pub const fn files(&self) -> &FileTransport {
        &self.files
    }

    /// Reads the request's input as `directive` describes.
    ///
    /// # Errors
    ///
    /// Propagates any [`TransportError`] from the selected transport.
    pub fn load_input(
        &self,
        request_id: &str,
        directive: &TransportDirective,
    ) -> Result<Vec<u8>, TransportError> {
        match directive {
            TransportDirective::Inline => self.files.read_input(request_id),
            TransportDirective::SharedSegment { input, .. } => {
                self.segments.attach_and_read(&input.name, input.size)
            }
        }
    }

    /// Writes `payload` to `target`. `None` means the handler had nothing to
    /// write, which is not an error.
    ///
    /// # Errors
    ///
    /// Propagates any [`TransportError`] from the selected transport.
    pub fn deliver_output(
        &self,
        request_id: &str,
        target: &OutputTarget,
        payload: Option<&[u8]>,
    ) -> Result<Delivery, TransportError> {
        let Some(bytes) = payload else {
            return Ok(Delivery::Skipped);
        };
        match target {
            OutputTarget::File => {
                self.files.write_output(request_id, bytes)?;
                Ok(Delivery::File { bytes: bytes.len() })
            }
            OutputTarget::Segment(segment) => {
                let written = self
                    .segments
                    .attach_and_write(&segment.name, segment.size, bytes)?;
                Ok(Delivery::Segment {
                    name: segment.name.clone(),
                    bytes: written,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use camino::Utf8PathBuf;
    use rstest::rstest;
    use tempfile::TempDir;

    use super::*;

    fn transport(dir: &TempDir) -> BulkTransport {
        let path = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf8 path");
        BulkTransport::new(
            FileTransport::new(path),
            SharedMemoryAccessor::new(PlatformAttacher::default(), RetryPolicy::immediate(1)),
        )
    }

    #[rstest]
    fn inline_requests_use_files_both_ways() {
        let dir = TempDir::new().expect("temp dir");
        let bulk = transport(&dir);
        bulk.files().write_input("r1", b"in").expect("host write");

        let input = bulk
            .load_input("r1", &TransportDirective::Inline)
            .expect("load");
        let delivery = bulk
            .deliver_output("r1", &OutputTarget::File, Some(b"out"))
            .expect("deliver");

        assert_eq!(input, b"in");
        assert_eq!(delivery, Delivery::File { bytes: 3 });
        assert_eq!(bulk.files().read_output("r1").expect("host read"), b"out");
    }

    #[rstest]
    fn absent_payload_writes_nothing() {
        let dir = TempDir::new().expect("temp dir");
        let bulk = transport(&dir);

        let delivery = bulk
            .deliver_output("r2", &OutputTarget::File, None)
            .expect("deliver");

        assert_eq!(delivery, Delivery::Skipped);
        assert!(bulk.files().read_output("r2").is_err());
    }

    #[rstest]
    fn over_capacity_segment_output_is_an_error() {
        let dir = TempDir::new().expect("temp dir");
        let bulk = transport(&dir);
        let target = OutputTarget::Segment(SegmentRef::new("never_out_1", 2));

        let error = bulk
            .deliver_output("r3", &target, Some(b"four"))
            .expect_err("must fail");

        assert!(matches!(error, TransportError::CapacityExceeded { .. }));
    }
}
