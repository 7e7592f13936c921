//! Local filesystem adapter using std::fs.

use std::io;
use std::path::Path;

use stackweave_core::{
    application::{ApplicationError, ports::Filesystem},
    error::{StackweaveError, StackweaveResult},
};

/// Production filesystem implementation using `std::fs`.
#[derive(Debug, Clone, Copy)]
pub struct LocalFilesystem;

impl LocalFilesystem {
    /// Create a new local filesystem adapter.
    pub fn new() -> Self {
        Self
    }
}

impl Default for LocalFilesystem {
    fn default() -> Self {
        Self::new()
    }
}

impl Filesystem for LocalFilesystem {
    fn create_dir_all(&self, path: &Path) -> StackweaveResult<()> {
        std::fs::create_dir_all(path).map_err(|e| map_io_error(path, e, "create directory"))
    }

    fn write_file(&self, path: &Path, content: &str) -> StackweaveResult<()> {
        std::fs::write(path, content).map_err(|e| map_io_error(path, e, "write file"))
    }

    fn read_file(&self, path: &Path) -> StackweaveResult<String> {
        std::fs::read_to_string(path).map_err(|e| map_io_error(path, e, "read file"))
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn remove_file(&self, path: &Path) -> StackweaveResult<()> {
        std::fs::remove_file(path).map_err(|e| map_io_error(path, e, "remove file"))
    }
}

fn map_io_error(path: &Path, e: io::Error, operation: &str) -> StackweaveError {
    ApplicationError::FilesystemError {
        path: path.to_path_buf(),
        reason: format!("Failed to {operation}: {e}"),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_read_remove_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let fs = LocalFilesystem::new();
        let nested = dir.path().join("out");
        let file = nested.join(".env.example");

        fs.create_dir_all(&nested).unwrap();
        fs.write_file(&file, "PORT=8000\n").unwrap();
        assert!(fs.exists(&file));
        assert_eq!(fs.read_file(&file).unwrap(), "PORT=8000\n");

        fs.remove_file(&file).unwrap();
        assert!(!fs.exists(&file));
    }

    #[test]
    fn read_missing_file_names_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("Dockerfile");
        let err = LocalFilesystem::new().read_file(&missing).unwrap_err();
        assert!(err.to_string().contains("Failed to read file"));
        assert!(err.to_string().contains("Dockerfile"));
    }
}
