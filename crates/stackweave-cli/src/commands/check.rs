//! Implementation of the `stackweave check` command.
//!
//! Loads the four documents from a directory, hand-edited or not, and
//! reports every cross-document disagreement.

use tracing::{info, instrument};

use stackweave_adapters::{BuiltinStore, LocalFilesystem};
use stackweave_core::{
    application::ComposeService,
    domain::{DomainError, Violation},
};

use crate::{
    cli::CheckArgs,
    error::{CliError, CliResult},
    output::OutputManager,
};

/// Execute the `stackweave check` command.
///
/// A clean directory exits 0. Any violation is printed and then returned as
/// a consistency error so the process exits with the user-error code.
#[instrument(skip_all, fields(dir = %args.dir.display()))]
pub fn execute(args: CheckArgs, output: OutputManager) -> CliResult<()> {
    let store = Box::new(BuiltinStore::with_builtin()?);
    let filesystem = Box::new(LocalFilesystem::new());
    let service = ComposeService::new(store, filesystem);

    let violations = service.check_directory(&args.dir)?;
    info!(violations = violations.len(), "Check finished");

    if output.is_json() {
        let json = serde_json::json!({
            "dir": args.dir.display().to_string(),
            "consistent": violations.is_empty(),
            "violations": violations,
        });
        output.data(&json.to_string())?;
    } else if violations.is_empty() {
        output.success(&format!("{} is consistent", args.dir.display()))?;
    } else {
        output.header(&format!("{} violation(s) in {}", violations.len(), args.dir.display()))?;
        for line in render(&violations) {
            output.error(&line)?;
        }
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(CliError::Core(DomainError::Consistency { violations }.into()))
    }
}

/// One line per violation, grouped by the document holding the reference.
fn render(violations: &[Violation]) -> Vec<String> {
    let mut sorted: Vec<&Violation> = violations.iter().collect();
    sorted.sort_by_key(|v| v.source);
    sorted
        .into_iter()
        .map(|v| {
            format!(
                "{:<22} {} -> {}  '{}' {}",
                v.kind.as_str(),
                v.source.file_name(),
                v.counterpart.file_name(),
                v.identifier,
                v.detail
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use stackweave_core::domain::{DocumentKind, ViolationKind};

    fn violation(kind: ViolationKind, source: DocumentKind, identifier: &str) -> Violation {
        Violation {
            kind,
            source,
            counterpart: DocumentKind::EnvTemplate,
            identifier: identifier.into(),
            detail: "has no definition".into(),
        }
    }

    #[test]
    fn render_groups_by_source_document() {
        let lines = render(&[
            violation(
                ViolationKind::UndefinedVariable,
                DocumentKind::OrchestrationDescriptor,
                "REDIS_URL",
            ),
            violation(ViolationKind::UnmappedExposedPort, DocumentKind::BuildDescriptor, "8000"),
        ]);
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("Dockerfile -> .env.example"));
        assert!(lines[1].contains("'REDIS_URL'"));
        assert!(lines[1].contains("undefined-variable"));
    }
}
