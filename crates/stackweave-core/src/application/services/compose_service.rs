//! Compose Service - main application orchestrator.
//!
//! This service coordinates the whole workflow:
//! 1. Validate the option set
//! 2. Look up the applicable fragments
//! 3. Compose them into a bundle
//! 4. Validate the bundle's cross-document consistency
//! 5. Optionally emit the bundle to a directory, all-or-nothing
//!
//! It implements the driving port (incoming) and uses driven ports (outgoing).

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument, warn};

use crate::{
    application::{
        ApplicationError,
        ports::{Filesystem, FragmentStore},
        services::FragmentInfo,
    },
    domain::{
        Bundle, Composer, ConsistencyValidator, DocumentKind, DomainValidator as validator,
        OptionSet, Violation,
    },
    error::StackweaveResult,
};

/// Main composition service.
pub struct ComposeService {
    store: Box<dyn FragmentStore>,
    filesystem: Box<dyn Filesystem>,
}

impl ComposeService {
    /// Create a new compose service with the given adapters.
    pub fn new(store: Box<dyn FragmentStore>, filesystem: Box<dyn Filesystem>) -> Self {
        Self { store, filesystem }
    }

    /// Compose and validate the bundle for an option set.
    ///
    /// Either a fully consistent bundle comes back, or an error; never a
    /// partial bundle.
    #[instrument(skip_all, fields(options = %options))]
    pub fn compose(&self, options: &OptionSet) -> StackweaveResult<Bundle> {
        validator::validate_option_set(options)?;

        let fragments = self.store.find(options)?;
        debug!(count = fragments.len(), "Fragments selected");

        let selected: Vec<_> = fragments.iter().collect();
        let bundle = Composer::new(options).compose(&selected)?;
        debug!(identifiers = bundle.identifiers().len(), "Fragments composed");

        validator::validate_bundle(&bundle)?;
        info!("Bundle composed and validated");
        Ok(bundle)
    }

    /// The fragments a composition for `options` would apply, in order.
    pub fn plan(&self, options: &OptionSet) -> StackweaveResult<Vec<FragmentInfo>> {
        validator::validate_option_set(options)?;
        Ok(self
            .store
            .find(options)?
            .iter()
            .map(FragmentInfo::from)
            .collect())
    }

    /// Target path of every document when emitted into `dir`.
    pub fn output_paths(dir: &Path) -> Vec<(DocumentKind, PathBuf)> {
        DocumentKind::ALL
            .into_iter()
            .map(|kind| (kind, dir.join(kind.file_name())))
            .collect()
    }

    /// Write the four documents of `bundle` into `dir`.
    ///
    /// Refuses to touch existing files unless `overwrite` is set. If any write
    /// fails, files written so far are restored to their previous content (or
    /// removed if they did not exist) before the error is returned.
    #[instrument(skip_all, fields(dir = %dir.display(), overwrite = overwrite))]
    pub fn emit(
        &self,
        bundle: &Bundle,
        dir: &Path,
        overwrite: bool,
    ) -> StackweaveResult<Vec<PathBuf>> {
        let targets = Self::output_paths(dir);

        if !overwrite {
            let existing: Vec<PathBuf> = targets
                .iter()
                .filter(|(_, path)| self.filesystem.exists(path))
                .map(|(_, path)| path.clone())
                .collect();
            if !existing.is_empty() {
                return Err(ApplicationError::FilesExist { paths: existing }.into());
            }
        }

        // Snapshot before the first write so a failed read leaves nothing to undo.
        let mut previous = Vec::with_capacity(targets.len());
        for (_, path) in &targets {
            previous.push(if self.filesystem.exists(path) {
                Some(self.filesystem.read_file(path)?)
            } else {
                None
            });
        }

        self.filesystem.create_dir_all(dir)?;

        let mut written: Vec<(PathBuf, Option<String>)> = Vec::with_capacity(targets.len());
        for ((kind, path), previous) in targets.iter().zip(previous) {
            if let Err(e) = self.filesystem.write_file(path, bundle.document(*kind)) {
                warn!(error = %e, path = %path.display(), "Write failed, attempting rollback");
                self.rollback(&written)?;
                return Err(e);
            }
            debug!(path = %path.display(), "Document written");
            written.push((path.clone(), previous));
        }

        info!(files = written.len(), "Bundle emitted");
        Ok(written.into_iter().map(|(path, _)| path).collect())
    }

    /// Load the four documents from `dir` and report every violation.
    #[instrument(skip_all, fields(dir = %dir.display()))]
    pub fn check_directory(&self, dir: &Path) -> StackweaveResult<Vec<Violation>> {
        let mut documents = BTreeMap::new();
        for (kind, path) in Self::output_paths(dir) {
            if !self.filesystem.exists(&path) {
                return Err(ApplicationError::MissingDocument { path }.into());
            }
            documents.insert(kind, self.filesystem.read_file(&path)?);
        }

        let violations = ConsistencyValidator::violations(&Bundle::from_documents(documents));
        info!(violations = violations.len(), "Directory checked");
        Ok(violations)
    }

    // -------------------------------------------------------------------------
    // Internal Helpers
    // -------------------------------------------------------------------------

    /// Restore already written documents, newest first.
    ///
    /// Stops at the first document it cannot restore and reports it.
    fn rollback(&self, written: &[(PathBuf, Option<String>)]) -> StackweaveResult<()> {
        for (path, previous) in written.iter().rev() {
            let result = match previous {
                Some(content) => self.filesystem.write_file(path, content),
                None => self.filesystem.remove_file(path),
            };
            result.map_err(|e| ApplicationError::RollbackFailed {
                path: path.clone(),
                reason: e.to_string(),
            })?;
        }
        info!(files = written.len(), "Rollback successful");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{MockFilesystem, MockFragmentStore};
    use crate::domain::{DatabaseKind, DomainError, Fragment};
    use crate::error::StackweaveError;

    fn options() -> OptionSet {
        OptionSet::builder()
            .project_name("shop")
            .database(DatabaseKind::Postgres)
            .build()
            .unwrap()
    }

    fn fragments() -> Vec<Fragment> {
        vec![
            Fragment::builder("env-app", DocumentKind::EnvTemplate)
                .provides("app.port_var", "PORT")
                .derives("app.port", |o| o.app_port().to_string())
                .body("{{app.port_var}}={{app.port}}\n")
                .build()
                .unwrap(),
            Fragment::builder("dockerfile", DocumentKind::BuildDescriptor)
                .requires(["app.port"])
                .body("FROM python:3.11-slim\nEXPOSE {{app.port}}\n")
                .build()
                .unwrap(),
            Fragment::builder("compose", DocumentKind::OrchestrationDescriptor)
                .requires(["app.port"])
                .body("services:\n  app:\n    build: .\n    ports:\n      - \"{{app.port}}:{{app.port}}\"\n")
                .build()
                .unwrap(),
        ]
    }

    fn store_with(fragments: Vec<Fragment>) -> MockFragmentStore {
        let mut store = MockFragmentStore::new();
        store.expect_find().returning(move |_| Ok(fragments.clone()));
        store
    }

    #[test]
    fn compose_returns_validated_bundle() {
        let service = ComposeService::new(Box::new(store_with(fragments())), Box::new(MockFilesystem::new()));
        let bundle = service.compose(&options()).unwrap();
        assert_eq!(bundle.document(DocumentKind::EnvTemplate), "PORT=8000\n");
        assert_eq!(bundle.fragment_ids().len(), 3);
    }

    #[test]
    fn compose_surfaces_consistency_violations() {
        let mut broken = fragments();
        broken.push(
            Fragment::builder("compose-env", DocumentKind::OrchestrationDescriptor)
                .body("    environment:\n      SECRET: ${SECRET}\n")
                .build()
                .unwrap(),
        );
        let service = ComposeService::new(Box::new(store_with(broken)), Box::new(MockFilesystem::new()));

        let err = service.compose(&options()).unwrap_err();
        assert!(matches!(
            err,
            StackweaveError::Domain(DomainError::Consistency { .. })
        ));
        assert_eq!(err.violations()[0].identifier, "SECRET");
    }

    #[test]
    fn emit_refuses_existing_files_without_overwrite() {
        let mut fs = MockFilesystem::new();
        fs.expect_exists()
            .returning(|p: &Path| p.ends_with("Dockerfile"));
        fs.expect_write_file().never();

        let service = ComposeService::new(Box::new(store_with(fragments())), Box::new(fs));
        let bundle = Bundle::from_documents(BTreeMap::new());
        let err = service.emit(&bundle, Path::new("out"), false).unwrap_err();
        assert!(matches!(
            err,
            StackweaveError::Application(ApplicationError::FilesExist { ref paths }) if paths.len() == 1
        ));
    }

    #[test]
    fn emit_writes_all_four_documents() {
        let mut fs = MockFilesystem::new();
        fs.expect_exists().returning(|_| false);
        fs.expect_create_dir_all()
            .times(1)
            .returning(|_| Ok(()));
        fs.expect_write_file().times(4).returning(|_, _| Ok(()));

        let service = ComposeService::new(Box::new(store_with(fragments())), Box::new(fs));
        let bundle = service.compose(&options()).unwrap();
        let written = service.emit(&bundle, Path::new("out"), false).unwrap();
        assert_eq!(written.len(), 4);
        assert!(written.contains(&PathBuf::from("out/docker-compose.yml")));
    }

    #[test]
    fn emit_rolls_back_on_failure() {
        let mut fs = MockFilesystem::new();
        fs.expect_exists().returning(|_| false);
        fs.expect_create_dir_all().returning(|_| Ok(()));
        fs.expect_write_file().returning(|p: &Path, _| {
            if p.ends_with(".dockerignore") {
                Err(ApplicationError::FilesystemError {
                    path: p.to_path_buf(),
                    reason: "disk full".into(),
                }
                .into())
            } else {
                Ok(())
            }
        });
        // Dockerfile and docker-compose.yml were written before the failure.
        fs.expect_remove_file().times(2).returning(|_| Ok(()));

        let service = ComposeService::new(Box::new(store_with(fragments())), Box::new(fs));
        let bundle = Bundle::from_documents(BTreeMap::new());
        let err = service.emit(&bundle, Path::new("out"), true).unwrap_err();
        assert!(err.to_string().contains("disk full"));
    }

    #[test]
    fn emit_fails_before_writing_when_a_previous_file_is_unreadable() {
        let mut fs = MockFilesystem::new();
        fs.expect_exists().returning(|_| true);
        fs.expect_read_file().returning(|p: &Path| {
            if p.ends_with(".env.example") {
                Err(ApplicationError::FilesystemError {
                    path: p.to_path_buf(),
                    reason: "permission denied".into(),
                }
                .into())
            } else {
                Ok("old\n".into())
            }
        });
        fs.expect_create_dir_all().never();
        fs.expect_write_file().never();
        fs.expect_remove_file().never();

        let service = ComposeService::new(Box::new(store_with(fragments())), Box::new(fs));
        let bundle = Bundle::from_documents(BTreeMap::new());
        let err = service.emit(&bundle, Path::new("out"), true).unwrap_err();
        assert!(err.to_string().contains("permission denied"));
    }

    #[test]
    fn check_directory_reports_missing_documents() {
        let mut fs = MockFilesystem::new();
        fs.expect_exists().returning(|_| false);

        let service = ComposeService::new(Box::new(MockFragmentStore::new()), Box::new(fs));
        let err = service.check_directory(Path::new("out")).unwrap_err();
        assert!(matches!(
            err,
            StackweaveError::Application(ApplicationError::MissingDocument { .. })
        ));
    }

    #[test]
    fn plan_rejects_invalid_options_before_lookup() {
        let mut store = MockFragmentStore::new();
        store.expect_find().never();
        let service = ComposeService::new(Box::new(store), Box::new(MockFilesystem::new()));

        let invalid: OptionSet = serde_json::from_str(
            r#"{"database_kind":"none","cache_enabled":true,"environment_mode":"development",
                "project_name":"shop","app_port":6379,"workers":4,"python_version":"3.11"}"#,
        )
        .unwrap();
        assert!(service.plan(&invalid).is_err());
    }
}
