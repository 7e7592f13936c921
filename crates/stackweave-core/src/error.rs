//! Unified error handling for stackweave core.
//!
//! This module provides a unified error type that wraps domain and application
//! errors, with rich context and user-actionable suggestions.

use thiserror::Error;

use crate::application::ApplicationError;
use crate::domain::{self, DomainError, Violation};

/// Root error type for stackweave core operations.
#[derive(Debug, Error, Clone)]
pub enum StackweaveError {
    /// Errors from the domain layer (options, catalog, composition, consistency).
    #[error("{0}")]
    Domain(#[from] DomainError),

    /// Errors from the application layer (store and filesystem access).
    #[error("{0}")]
    Application(#[from] ApplicationError),

    /// Configuration or setup errors.
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Unexpected internal errors (bugs).
    #[error("Internal error: {message}. This is a bug, please report it.")]
    Internal { message: String },
}

impl StackweaveError {
    /// Get user-actionable suggestions for fixing this error.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Domain(e) => e.suggestions(),
            Self::Application(e) => e.suggestions(),
            Self::Configuration { message } => vec![
                format!("Configuration issue: {message}"),
                "Check your setup and try again".into(),
            ],
            Self::Internal { .. } => vec![
                "This appears to be a bug in stackweave".into(),
                "Please report this issue at: https://github.com/cosecruz/stackweave/issues".into(),
            ],
        }
    }

    /// Get error category for display/styling purposes.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Domain(e) => match e.category() {
                domain::ErrorCategory::Validation => ErrorCategory::Validation,
                domain::ErrorCategory::Consistency => ErrorCategory::Consistency,
                domain::ErrorCategory::Catalog => ErrorCategory::Catalog,
            },
            Self::Application(e) => e.category(),
            Self::Configuration { .. } => ErrorCategory::Configuration,
            Self::Internal { .. } => ErrorCategory::Internal,
        }
    }

    /// The consistency violations carried by this error, if any.
    pub fn violations(&self) -> &[Violation] {
        match self {
            Self::Domain(DomainError::Consistency { violations }) => violations,
            _ => &[],
        }
    }

    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Application(ApplicationError::StoreLockError))
    }
}

/// Error categories for UI display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Consistency,
    Catalog,
    NotFound,
    Conflict,
    Configuration,
    Internal,
}

/// Convenient result type alias.
pub type StackweaveResult<T> = Result<T, StackweaveError>;

/// Extension trait for adding context to errors.
pub trait Context<T> {
    /// Add context to an error.
    fn context(self, msg: impl Into<String>) -> StackweaveResult<T>;
}

impl<T, E> Context<T> for Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn context(self, msg: impl Into<String>) -> StackweaveResult<T> {
        self.map_err(|e| StackweaveError::Internal {
            message: format!("{}: {}", msg.into(), e),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consistency_errors_expose_their_violations() {
        let err = StackweaveError::from(DomainError::Consistency { violations: vec![] });
        assert_eq!(err.category(), ErrorCategory::Consistency);
        assert!(err.violations().is_empty());
    }

    #[test]
    fn context_wraps_foreign_errors_as_internal() {
        let parsed: Result<u16, _> = "not a number".parse::<u16>();
        let err = parsed.context("parsing port").unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Internal);
        assert!(err.to_string().contains("parsing port"));
    }
}
