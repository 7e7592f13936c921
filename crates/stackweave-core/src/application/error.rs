//! Application layer errors.
//!
//! These errors represent failures in orchestration, not composition logic.
//! Composition errors are `DomainError` from `crate::domain`.

use std::path::PathBuf;
use thiserror::Error;

use crate::error::ErrorCategory;

/// Errors that occur during application orchestration.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ApplicationError {
    /// No fragment with this id exists in the store.
    #[error("Fragment not found: {id}")]
    FragmentNotFound { id: String },

    /// A document the check expects is missing from the directory.
    #[error("Missing document: {}", path.display())]
    MissingDocument { path: PathBuf },

    /// Filesystem operation failed.
    #[error("Filesystem error at {}: {reason}", path.display())]
    FilesystemError { path: PathBuf, reason: String },

    /// Emission would overwrite existing files.
    #[error("{} file(s) already exist: {}", paths.len(), display_paths(paths))]
    FilesExist { paths: Vec<PathBuf> },

    /// Store access failed (lock poisoned, etc.).
    #[error("Fragment store error")]
    StoreLockError,

    /// Rollback failed (best-effort cleanup failed).
    #[error("Rollback failed for {}: {reason}", path.display())]
    RollbackFailed { path: PathBuf, reason: String },
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl ApplicationError {
    /// Get user-actionable suggestions.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::FragmentNotFound { id } => vec![
                format!("No fragment is registered as '{id}'"),
                "Try: stackweave catalog to see available fragments".into(),
            ],
            Self::MissingDocument { path } => vec![
                format!("Expected to find {}", path.display()),
                "Run stackweave generate in this directory first".into(),
            ],
            Self::FilesystemError { path, .. } => vec![
                format!("Failed to access: {}", path.display()),
                "Check that you have write permissions".into(),
                "Ensure the parent directory exists".into(),
            ],
            Self::FilesExist { .. } => vec![
                "Use --force to overwrite (destructive)".into(),
                "Or choose a different output directory".into(),
            ],
            Self::StoreLockError => vec![
                "The fragment store is locked".into(),
                "Try again in a moment".into(),
            ],
            Self::RollbackFailed { path, .. } => vec![
                format!("{} may be left partially written", path.display()),
                "Inspect the directory before retrying".into(),
            ],
        }
    }

    /// Get error category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::FragmentNotFound { .. } | Self::MissingDocument { .. } => ErrorCategory::NotFound,
            Self::FilesExist { .. } => ErrorCategory::Conflict,
            Self::FilesystemError { .. } | Self::RollbackFailed { .. } | Self::StoreLockError => {
                ErrorCategory::Internal
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn files_exist_lists_every_path() {
        let err = ApplicationError::FilesExist {
            paths: vec!["out/Dockerfile".into(), "out/.env.example".into()],
        };
        let msg = err.to_string();
        assert!(msg.starts_with("2 file(s)"));
        assert!(msg.contains("out/Dockerfile"));
        assert_eq!(err.category(), ErrorCategory::Conflict);
    }
}
