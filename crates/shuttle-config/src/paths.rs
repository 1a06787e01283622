use std::fs::DirBuilder;
use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use thiserror::Error;

use crate::Config;

impl Config {
    /// Ensures the instance working directory exists and returns its path.
    ///
    /// # Errors
    ///
    /// Returns [`WorkDirError`] when the directory cannot be created.
    pub fn prepare_work_dir(&self) -> Result<Utf8PathBuf, WorkDirError> {
        let path = self.work_dir();
        create_private_dir(&path)?;
        Ok(path)
    }
}

fn create_private_dir(path: &Utf8Path) -> Result<(), WorkDirError> {
    let mut builder = DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o700);
    }

    if let Err(source) = builder.create(path.as_std_path())
        && source.kind() != io::ErrorKind::AlreadyExists
    {
        return Err(WorkDirError {
            path: path.to_path_buf(),
            source,
        });
    }
    Ok(())
}

/// Raised when the working directory cannot be created.
#[derive(Debug, Error)]
#[error("failed to create working directory '{path}': {source}")]
pub struct WorkDirError {
    /// Directory that could not be created.
    pub path: Utf8PathBuf,
    /// Underlying I/O error.
    #[source]
    pub source: io::Error,
}
