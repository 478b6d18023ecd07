// Filesystem lock file
use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use tripwire_core::port::LockFile;

/// Marker file on the local filesystem
#[derive(Debug, Clone)]
pub struct FsLockFile {
    path: PathBuf,
}

impl FsLockFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LockFile for FsLockFile {
    fn is_present(&self) -> io::Result<bool> {
        self.path.try_exists()
    }

    fn create(&self) -> io::Result<()> {
        OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.path)
            .map(|_| ())
    }

    fn remove(&self) -> io::Result<()> {
        match fs::remove_file(&self.path) {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }
}
