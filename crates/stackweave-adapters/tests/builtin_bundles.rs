//! End-to-end composition with the built-in catalog and real adapters.

use std::path::Path;

use stackweave_adapters::{BuiltinStore, LocalFilesystem, MemoryFilesystem};
use stackweave_core::domain::ConsistencyValidator;
use stackweave_core::prelude::*;

fn service(fs: impl Filesystem + 'static) -> ComposeService {
    ComposeService::new(Box::new(BuiltinStore::with_builtin().unwrap()), Box::new(fs))
}

fn options(db: DatabaseKind, cache: bool, mode: EnvironmentMode) -> OptionSet {
    OptionSet::builder()
        .project_name("shop")
        .database(db)
        .cache(cache)
        .mode(mode)
        .build()
        .unwrap()
}

fn every_combination() -> Vec<OptionSet> {
    let mut all = Vec::new();
    for db in DatabaseKind::ALL {
        for cache in [false, true] {
            for mode in EnvironmentMode::ALL {
                all.push(options(db, cache, mode));
            }
        }
    }
    all
}

#[test]
fn all_sixteen_combinations_compose_consistently() {
    let service = service(MemoryFilesystem::new());
    let combinations = every_combination();
    assert_eq!(combinations.len(), 16);

    for opts in combinations {
        let bundle = service
            .compose(&opts)
            .unwrap_or_else(|e| panic!("{opts}: {e}"));
        assert!(
            ConsistencyValidator::violations(&bundle).is_empty(),
            "{opts} produced violations"
        );
        for kind in DocumentKind::ALL {
            assert!(!bundle.document(kind).is_empty(), "{opts}: empty {kind}");
        }
    }
}

#[test]
fn postgres_with_cache_in_development() {
    let service = service(MemoryFilesystem::new());
    let bundle = service
        .compose(&options(DatabaseKind::Postgres, true, EnvironmentMode::Development))
        .unwrap();

    let compose = bundle.document(DocumentKind::OrchestrationDescriptor);
    let env = bundle.document(DocumentKind::EnvTemplate);
    let dockerfile = bundle.document(DocumentKind::BuildDescriptor);

    assert!(compose.contains("  db:\n    image: postgres:16-alpine\n"));
    assert!(compose.contains("  cache:\n    image: redis:7-alpine\n"));
    assert!(compose.contains("    depends_on:\n      db:\n        condition: service_healthy\n      cache:\n"));
    assert!(compose.contains(
        "DATABASE_URL: ${DATABASE_URL:-postgresql://app:changeme@db:5432/shop}"
    ));
    assert!(compose.contains("REDIS_URL: ${REDIS_URL:-redis://cache:6379/0}"));
    assert!(compose.contains("      - ./app:/code/app\n"));
    assert!(compose.contains("      - \"5432:5432\"\n"));
    assert!(compose.contains("volumes:\n  postgres-data:\n  redis-data:\n"));

    assert!(env.contains("DATABASE_URL=postgresql://app:changeme@db:5432/shop\n"));
    assert!(env.contains("REDIS_URL=redis://cache:6379/0\n"));
    assert!(env.contains("ENVIRONMENT=development\n"));
    assert_eq!(env.matches("PORT=").count(), 1);

    assert!(dockerfile.starts_with("# syntax=docker/dockerfile:1\nFROM python:3.11-slim\n"));
    assert!(!dockerfile.contains("USER app"));
}

#[test]
fn bare_production_bundle_has_no_backing_services() {
    let service = service(MemoryFilesystem::new());
    let bundle = service
        .compose(&options(DatabaseKind::None, false, EnvironmentMode::Production))
        .unwrap();

    let compose = bundle.document(DocumentKind::OrchestrationDescriptor);
    assert!(!compose.contains("depends_on"));
    assert!(!compose.contains("\nvolumes:"));
    assert!(!compose.contains("  db:"));
    assert!(compose.contains("--workers 4"));
    assert!(compose.contains("restart: unless-stopped"));

    assert!(!bundle.document(DocumentKind::EnvTemplate).contains("DATABASE_URL"));
    assert!(bundle.document(DocumentKind::BuildDescriptor).contains("USER app\n"));
    assert!(bundle.document(DocumentKind::IgnoreList).contains("\ntests/\n"));
}

#[test]
fn mysql_gets_a_random_root_password_in_both_documents() {
    let service = service(MemoryFilesystem::new());
    let bundle = service
        .compose(&options(DatabaseKind::Mysql, false, EnvironmentMode::Development))
        .unwrap();

    assert!(
        bundle
            .document(DocumentKind::EnvTemplate)
            .contains("MYSQL_RANDOM_ROOT_PASSWORD=yes\n")
    );
    assert!(
        bundle
            .document(DocumentKind::OrchestrationDescriptor)
            .contains("MYSQL_RANDOM_ROOT_PASSWORD: ${MYSQL_RANDOM_ROOT_PASSWORD:-yes}")
    );
}

#[test]
fn composition_is_deterministic() {
    let service = service(MemoryFilesystem::new());
    for opts in every_combination() {
        let first = service.compose(&opts).unwrap();
        let second = service.compose(&opts).unwrap();
        assert_eq!(first, second, "{opts}");
    }
}

#[test]
fn parallel_composition_matches_sequential() {
    let service = service(MemoryFilesystem::new());
    let combinations = every_combination();
    let sequential: Vec<Bundle> = combinations
        .iter()
        .map(|opts| service.compose(opts).unwrap())
        .collect();

    let shared = &service;
    let parallel: Vec<Bundle> = std::thread::scope(|scope| {
        let handles: Vec<_> = combinations
            .iter()
            .map(|opts| scope.spawn(move || shared.compose(opts).unwrap()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(parallel, sequential);
}

#[test]
fn custom_port_flows_into_every_document() {
    let service = service(MemoryFilesystem::new());
    let opts = OptionSet::builder()
        .project_name("shop")
        .app_port(9000)
        .build()
        .unwrap();
    let bundle = service.compose(&opts).unwrap();

    assert!(bundle.document(DocumentKind::BuildDescriptor).contains("EXPOSE 9000\n"));
    assert!(bundle.document(DocumentKind::EnvTemplate).contains("PORT=9000\n"));
    assert!(
        bundle
            .document(DocumentKind::OrchestrationDescriptor)
            .contains("\"9000:9000\"")
    );
}

#[test]
fn emitted_directory_checks_clean_and_detects_hand_edits() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("shop");
    let service = service(LocalFilesystem::new());

    let bundle = service
        .compose(&options(DatabaseKind::Mongo, true, EnvironmentMode::Production))
        .unwrap();
    let written = service.emit(&bundle, &out, false).unwrap();
    assert_eq!(written.len(), 4);
    assert!(service.check_directory(&out).unwrap().is_empty());

    // Second emit without overwrite is refused.
    assert!(service.emit(&bundle, &out, false).is_err());

    let env_path = out.join(".env.example");
    let edited = std::fs::read_to_string(&env_path)
        .unwrap()
        .replace("REDIS_URL=", "CACHE_URL=");
    std::fs::write(&env_path, edited).unwrap();

    let violations = service.check_directory(&out).unwrap();
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].identifier, "REDIS_URL");
    assert_eq!(violations[0].source, DocumentKind::OrchestrationDescriptor);
}

#[test]
fn failed_emit_leaves_previous_files_untouched() {
    let fs = MemoryFilesystem::new();
    let service = service(fs.clone());
    let out = Path::new("out");

    let dev = service
        .compose(&options(DatabaseKind::None, false, EnvironmentMode::Development))
        .unwrap();
    service.emit(&dev, out, false).unwrap();
    let before = fs.content(&out.join("Dockerfile")).unwrap();

    fs.fail_writes_under(out.join(".env.example"));
    let prod = service
        .compose(&options(DatabaseKind::None, false, EnvironmentMode::Production))
        .unwrap();
    assert!(service.emit(&prod, out, true).is_err());

    assert_eq!(fs.content(&out.join("Dockerfile")).unwrap(), before);
    assert_eq!(fs.list_files().len(), 4);
}
