// ============================================================================
// domain/error.rs - COMPOSITION ERROR DOMAIN
// ============================================================================

use thiserror::Error;

use crate::domain::{validator::Violation, value_objects::DocumentKind};

/// Root domain error type.
///
/// All errors are:
/// - Cloneable (results are handed back as data)
/// - Categorizable (for CLI display)
/// - Actionable (provides suggestions)
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    // ========================================================================
    // Input Errors (caller can re-prompt)
    // ========================================================================
    #[error("invalid option '{field}': {reason}")]
    InvalidOptionSet { field: &'static str, reason: String },

    // ========================================================================
    // Composition Errors (catalog authoring defects)
    // ========================================================================
    #[error(
        "identifier '{name}' already bound to '{existing}', fragment '{fragment}' tried to bind '{attempted}'"
    )]
    IdentifierConflict {
        name: String,
        existing: String,
        attempted: String,
        fragment: String,
    },

    #[error("fragment '{fragment}' references unresolved identifier '{name}'")]
    UnresolvedIdentifier { name: String, fragment: String },

    #[error("invalid fragment '{fragment}': {reason}")]
    InvalidFragment { fragment: String, reason: String },

    #[error("fragment '{fragment}' is registered more than once")]
    DuplicateFragment { fragment: String },

    #[error("catalog has no unconditional fragment for the {document}")]
    MissingMandatoryFragment { document: DocumentKind },

    // ========================================================================
    // Consistency Errors (cross-document disagreement)
    // ========================================================================
    #[error("bundle is inconsistent: {} violation(s)", violations.len())]
    Consistency { violations: Vec<Violation> },
}

impl DomainError {
    /// Get user-actionable suggestions for fixing this error.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::InvalidOptionSet { field, reason } => vec![
                format!("Check the value supplied for '{field}'"),
                format!("Details: {reason}"),
            ],
            Self::IdentifierConflict { name, .. } => vec![
                format!("Two fragments disagree on '{name}'"),
                "This is a catalog defect; no bundle was produced".into(),
            ],
            Self::UnresolvedIdentifier { name, fragment } => vec![
                format!("No fragment selected before '{fragment}' provides '{name}'"),
                "Reorder the catalog or add a provider for the identifier".into(),
            ],
            Self::Consistency { violations } => violations
                .iter()
                .map(|v| format!("  • {v}"))
                .collect(),
            _ => vec!["See documentation for more details".into()],
        }
    }

    /// Error category for CLI display styling.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidOptionSet { .. } => ErrorCategory::Validation,
            Self::Consistency { .. } => ErrorCategory::Consistency,
            Self::IdentifierConflict { .. }
            | Self::UnresolvedIdentifier { .. }
            | Self::InvalidFragment { .. }
            | Self::DuplicateFragment { .. }
            | Self::MissingMandatoryFragment { .. } => ErrorCategory::Catalog,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Consistency,
    Catalog,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_message_names_both_values() {
        let err = DomainError::IdentifierConflict {
            name: "db.port".into(),
            existing: "5432".into(),
            attempted: "3306".into(),
            fragment: "env-mysql".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("db.port"));
        assert!(msg.contains("5432"));
        assert!(msg.contains("3306"));
        assert_eq!(err.category(), ErrorCategory::Catalog);
    }

    #[test]
    fn option_errors_are_validation() {
        let err = DomainError::InvalidOptionSet {
            field: "app_port",
            reason: "0 is out of range".into(),
        };
        assert_eq!(err.category(), ErrorCategory::Validation);
        assert!(err.suggestions().iter().any(|s| s.contains("app_port")));
    }
}
