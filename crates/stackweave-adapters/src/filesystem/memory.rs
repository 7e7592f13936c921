//! In-memory filesystem adapter for testing.

use std::{
    collections::{HashMap, HashSet},
    path::{Path, PathBuf},
    sync::{Arc, RwLock},
};

use stackweave_core::{
    application::{ApplicationError, ports::Filesystem},
    error::StackweaveResult,
};

/// In-memory filesystem for testing.
///
/// Writes whose path starts with a prefix registered through
/// [`MemoryFilesystem::fail_writes_under`] fail, which lets tests exercise
/// rollback.
#[derive(Debug, Clone, Default)]
pub struct MemoryFilesystem {
    inner: Arc<RwLock<MemoryFilesystemInner>>,
}

#[derive(Debug, Default)]
struct MemoryFilesystemInner {
    files: HashMap<PathBuf, String>,
    directories: HashSet<PathBuf>,
    failing: Vec<PathBuf>,
}

impl MemoryFilesystem {
    /// Create a new empty memory filesystem.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every later write to `path` (or below it) fail.
    pub fn fail_writes_under(&self, path: impl Into<PathBuf>) {
        if let Ok(mut inner) = self.inner.write() {
            inner.failing.push(path.into());
        }
    }

    /// Content of a file, if present (testing helper).
    pub fn content(&self, path: &Path) -> Option<String> {
        let inner = self.inner.read().ok()?;
        inner.files.get(path).cloned()
    }

    /// List all files, sorted.
    pub fn list_files(&self) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = self
            .inner
            .read()
            .map(|inner| inner.files.keys().cloned().collect())
            .unwrap_or_default();
        files.sort();
        files
    }

    fn write_lock(
        &self,
    ) -> StackweaveResult<std::sync::RwLockWriteGuard<'_, MemoryFilesystemInner>> {
        self.inner
            .write()
            .map_err(|_| ApplicationError::StoreLockError.into())
    }
}

impl Filesystem for MemoryFilesystem {
    fn create_dir_all(&self, path: &Path) -> StackweaveResult<()> {
        let mut inner = self.write_lock()?;

        let mut current = PathBuf::new();
        for component in path.components() {
            current.push(component);
            inner.directories.insert(current.clone());
        }

        Ok(())
    }

    fn write_file(&self, path: &Path, content: &str) -> StackweaveResult<()> {
        let mut inner = self.write_lock()?;

        if inner.failing.iter().any(|prefix| path.starts_with(prefix)) {
            return Err(ApplicationError::FilesystemError {
                path: path.to_path_buf(),
                reason: "Simulated write failure".into(),
            }
            .into());
        }

        // Ensure parent exists
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !inner.directories.contains(parent) {
                return Err(ApplicationError::FilesystemError {
                    path: path.to_path_buf(),
                    reason: "Parent directory does not exist".into(),
                }
                .into());
            }
        }

        inner.files.insert(path.to_path_buf(), content.to_string());
        Ok(())
    }

    fn read_file(&self, path: &Path) -> StackweaveResult<String> {
        self.content(path).ok_or_else(|| {
            ApplicationError::FilesystemError {
                path: path.to_path_buf(),
                reason: "No such file".into(),
            }
            .into()
        })
    }

    fn exists(&self, path: &Path) -> bool {
        self.inner
            .read()
            .map(|inner| inner.files.contains_key(path) || inner.directories.contains(path))
            .unwrap_or(false)
    }

    fn remove_file(&self, path: &Path) -> StackweaveResult<()> {
        let mut inner = self.write_lock()?;
        inner
            .files
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| {
                ApplicationError::FilesystemError {
                    path: path.to_path_buf(),
                    reason: "No such file".into(),
                }
                .into()
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_requires_parent_directory() {
        let fs = MemoryFilesystem::new();
        assert!(fs.write_file(Path::new("out/Dockerfile"), "FROM x").is_err());

        fs.create_dir_all(Path::new("out")).unwrap();
        fs.write_file(Path::new("out/Dockerfile"), "FROM x").unwrap();
        assert_eq!(fs.read_file(Path::new("out/Dockerfile")).unwrap(), "FROM x");
        assert!(fs.exists(Path::new("out")));
    }

    #[test]
    fn failing_prefix_rejects_writes() {
        let fs = MemoryFilesystem::new();
        fs.create_dir_all(Path::new("out")).unwrap();
        fs.fail_writes_under("out/.dockerignore");

        assert!(fs.write_file(Path::new("out/Dockerfile"), "").is_ok());
        assert!(fs.write_file(Path::new("out/.dockerignore"), "").is_err());
    }

    #[test]
    fn remove_missing_file_fails() {
        let fs = MemoryFilesystem::new();
        assert!(fs.remove_file(Path::new("nope")).is_err());
    }
}
