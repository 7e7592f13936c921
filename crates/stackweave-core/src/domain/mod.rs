// ============================================================================
//  CLEAN MODULE BOUNDARIES
// ============================================================================

//! Core domain layer for stackweave.
//!
//! This module contains pure composition logic. All I/O (reading a catalog,
//! writing documents) is handled via ports defined in the application layer.
//!
//! ## Hexagonal Architecture Compliance
//!
//! - **No async**: Domain logic is synchronous
//! - **No I/O**: No filesystem, network, or external calls
//! - **No logging**: Observability belongs to the application and CLI layers
//! - **Immutable results**: A `Bundle` never changes once composed
//!
// Public API - what the world sees
pub mod capabilities;
pub mod composer;
pub mod entities;
pub mod error;
pub mod validator;
pub mod value_objects;

// Private implementation details - not visible outside domain
mod validation;

// Re-exports for convenience
pub use entities::{
    bundle::Bundle,
    catalog::{FragmentCatalog, MANDATORY_DOCUMENTS},
    fragment::{
        Binding, BindingValue, DatabaseSelector, Fragment, FragmentBuilder, FragmentId,
        FragmentMatcher, FragmentMatcherBuilder, Predicate, TemplateSource,
    },
    identifier_table::IdentifierTable,
    option_set::{
        DEFAULT_APP_PORT, DEFAULT_PYTHON_VERSION, DEFAULT_WORKERS, OptionSet, OptionSetBuilder,
    },
};

pub use composer::Composer;
pub use error::{DomainError, ErrorCategory};
pub use validator::{ConsistencyValidator, Violation, ViolationKind};
pub use value_objects::{DatabaseKind, DocumentKind, EnvironmentMode};

pub use validation::DomainValidator;

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn options(db: DatabaseKind, cache: bool, mode: EnvironmentMode) -> OptionSet {
        OptionSet::builder()
            .project_name("shop")
            .database(db)
            .cache(cache)
            .mode(mode)
            .build()
            .unwrap()
    }

    /// A tiny catalog exercising every piece of the pipeline: a provider, a
    /// mode overlay, a database-scoped fragment and a cross-document reference.
    fn catalog() -> FragmentCatalog {
        FragmentCatalog::new(vec![
            Fragment::builder("env-app", DocumentKind::EnvTemplate)
                .provides("app.port_var", "PORT")
                .derives("app.port", |o| o.app_port().to_string())
                .body("{{app.port_var}}={{app.port}}\n")
                .build()
                .unwrap(),
            Fragment::builder("env-db", DocumentKind::EnvTemplate)
                .matcher(FragmentMatcher::builder().any_engine().build())
                .provides("db.url_var", "DATABASE_URL")
                .derives("db.url", |o| format!("{}://db/shop", o.database_kind()))
                .body("{{db.url_var}}={{db.url}}\n")
                .build()
                .unwrap(),
            Fragment::builder("dockerfile", DocumentKind::BuildDescriptor)
                .requires(["app.port"])
                .body("FROM python:3.11-slim\nEXPOSE {{app.port}}\n")
                .build()
                .unwrap(),
            Fragment::builder("compose", DocumentKind::OrchestrationDescriptor)
                .requires(["app.port", "app.port_var"])
                .body(
                    "services:\n  app:\n    build: .\n    ports:\n      - \"{{app.port}}:{{app.port}}\"\n    environment:\n      {{app.port_var}}: ${{{app.port_var}}:-{{app.port}}}\n",
                )
                .build()
                .unwrap(),
            Fragment::builder("compose-db-env", DocumentKind::OrchestrationDescriptor)
                .matcher(FragmentMatcher::builder().any_engine().build())
                .requires(["db.url_var", "db.url"])
                .body("      {{db.url_var}}: ${{{db.url_var}}:-{{db.url}}}\n")
                .build()
                .unwrap(),
            Fragment::builder("ignore-prod", DocumentKind::IgnoreList)
                .matcher(FragmentMatcher::builder().mode(EnvironmentMode::Production).build())
                .body("tests/\n")
                .build()
                .unwrap(),
        ])
        .unwrap()
    }

    fn compose(opts: &OptionSet) -> Result<Bundle, DomainError> {
        let catalog = catalog();
        let bundle = Composer::new(opts).compose(&catalog.lookup(opts))?;
        DomainValidator::validate_bundle(&bundle)?;
        Ok(bundle)
    }

    // ========================================================================
    // Value Object Tests
    // ========================================================================

    #[test]
    fn value_objects_parse() {
        assert_eq!(DatabaseKind::from_str("mysql").unwrap(), DatabaseKind::Mysql);
        assert_eq!(
            EnvironmentMode::from_str("prod").unwrap(),
            EnvironmentMode::Production
        );
        assert_eq!(
            DocumentKind::from_str("compose").unwrap(),
            DocumentKind::OrchestrationDescriptor
        );
    }

    // ========================================================================
    // Pipeline Tests
    // ========================================================================

    #[test]
    fn every_combination_composes_and_validates() {
        for db in DatabaseKind::ALL {
            for cache in [false, true] {
                for mode in EnvironmentMode::ALL {
                    let opts = options(db, cache, mode);
                    compose(&opts).unwrap_or_else(|e| panic!("{opts}: {e}"));
                }
            }
        }
    }

    #[test]
    fn cross_document_values_agree() {
        let opts = options(DatabaseKind::Postgres, false, EnvironmentMode::Development);
        let bundle = compose(&opts).unwrap();

        let env = bundle.document(DocumentKind::EnvTemplate);
        let compose_doc = bundle.document(DocumentKind::OrchestrationDescriptor);
        assert!(env.contains("DATABASE_URL=postgres://db/shop"));
        assert!(compose_doc.contains("DATABASE_URL: ${DATABASE_URL:-postgres://db/shop}"));
        assert!(
            bundle
                .document(DocumentKind::BuildDescriptor)
                .contains("EXPOSE 8000")
        );
    }

    #[test]
    fn composition_is_idempotent() {
        let opts = options(DatabaseKind::Mongo, true, EnvironmentMode::Production);
        assert_eq!(compose(&opts).unwrap(), compose(&opts).unwrap());
    }

    #[test]
    fn mode_overlay_is_exclusive() {
        let dev = compose(&options(DatabaseKind::None, false, EnvironmentMode::Development)).unwrap();
        let prod = compose(&options(DatabaseKind::None, false, EnvironmentMode::Production)).unwrap();
        assert!(!dev.document(DocumentKind::IgnoreList).contains("tests/"));
        assert!(prod.document(DocumentKind::IgnoreList).contains("tests/"));
        assert!(!dev.fragment_ids().contains(&"ignore-prod".into()));
    }

    #[test]
    fn validator_catches_a_hand_edited_bundle() {
        let opts = options(DatabaseKind::Mysql, false, EnvironmentMode::Development);
        let bundle = compose(&opts).unwrap();

        let mut docs: std::collections::BTreeMap<_, _> = bundle
            .documents()
            .map(|(k, v)| (k, v.to_string()))
            .collect();
        docs.insert(DocumentKind::EnvTemplate, "PORT=8000\n".to_string());
        let edited = Bundle::from_documents(docs);

        let violations = ConsistencyValidator::violations(&edited);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].identifier, "DATABASE_URL");
    }
}
