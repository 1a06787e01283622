//! Temporary working directory playing the host's side of file transport.

use camino::Utf8PathBuf;
use tempfile::TempDir;

use shuttle_transport::FileTransport;

/// Owns a temporary directory for the lifetime of a test.
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    /// Creates a fresh directory.
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("temporary work dir"),
        }
    }

    /// Directory path.
    pub fn path(&self) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(self.dir.path().to_path_buf())
            .expect("utf8 temp path")
    }

    /// Host-side view of the payload files.
    pub fn files(&self) -> FileTransport {
        FileTransport::new(self.path())
    }
}
