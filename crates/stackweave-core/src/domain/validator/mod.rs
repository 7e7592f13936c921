//! Cross-document consistency checks over a finished [`Bundle`].
//!
//! The validator never stops at the first problem: it collects every
//! violation it can find so the caller sees the whole picture at once. Each
//! violation names the document the dangling reference lives in, the
//! document that should have satisfied it, and the identifier involved.

mod build;
mod compose;
mod env;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::Serialize;

use crate::domain::{
    entities::bundle::Bundle, error::DomainError, value_objects::DocumentKind,
};

use self::{build::IgnoreRules, compose::ComposeFile};

// ============================================================================
// Violations
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ViolationKind {
    /// A `depends_on` entry names a service that does not exist.
    UnknownDependency,
    /// A referenced variable has no definition in the env template.
    UndefinedVariable,
    /// An inline default disagrees with the env template value.
    DefaultMismatch,
    /// The env template defines a variable more than once.
    DuplicateVariable,
    /// A mounted named volume is missing from the top-level registry.
    UndeclaredVolume,
    /// Two services publish the same host port.
    HostPortCollision,
    /// The build descriptor copies a path the ignore list excludes.
    IgnoredBuildSource,
    /// A port the image exposes is not mapped by the service that builds it.
    UnmappedExposedPort,
    /// A document could not be parsed at all.
    UnparseableDocument,
}

impl ViolationKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::UnknownDependency => "unknown-dependency",
            Self::UndefinedVariable => "undefined-variable",
            Self::DefaultMismatch => "default-mismatch",
            Self::DuplicateVariable => "duplicate-variable",
            Self::UndeclaredVolume => "undeclared-volume",
            Self::HostPortCollision => "host-port-collision",
            Self::IgnoredBuildSource => "ignored-build-source",
            Self::UnmappedExposedPort => "unmapped-exposed-port",
            Self::UnparseableDocument => "unparseable-document",
        }
    }
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One cross-document disagreement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub kind: ViolationKind,
    /// Document holding the reference.
    pub source: DocumentKind,
    /// Document expected to satisfy it.
    pub counterpart: DocumentKind,
    pub identifier: String,
    pub detail: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} -> {}: '{}' {}",
            self.kind, self.source, self.counterpart, self.identifier, self.detail
        )
    }
}

// ============================================================================
// Validator
// ============================================================================

/// Checks that the four documents of a bundle agree with each other.
pub struct ConsistencyValidator;

impl ConsistencyValidator {
    /// `Ok(())` when consistent, otherwise every violation found.
    pub fn validate(bundle: &Bundle) -> Result<(), DomainError> {
        let violations = Self::violations(bundle);
        if violations.is_empty() {
            Ok(())
        } else {
            Err(DomainError::Consistency { violations })
        }
    }

    /// Every violation in `bundle`, in check order.
    pub fn violations(bundle: &Bundle) -> Vec<Violation> {
        let mut out = Vec::new();

        let env_template = bundle.document(DocumentKind::EnvTemplate);
        let env_entries = env::entries(env_template);
        check_env_duplicates(&env_entries, &mut out);

        let definitions: BTreeMap<&str, &str> = env_entries
            .iter()
            .map(|e| (e.name.as_str(), e.value.as_str()))
            .collect();

        let build_text = bundle.document(DocumentKind::BuildDescriptor);
        let build_locals = env::build_local_names(build_text);
        let build_refs = env::references(build_text)
            .into_iter()
            .filter(|r| !build_locals.contains(&r.name));
        check_env_references(DocumentKind::BuildDescriptor, build_refs, &definitions, &mut out);

        let compose_text = bundle.document(DocumentKind::OrchestrationDescriptor);
        check_env_references(
            DocumentKind::OrchestrationDescriptor,
            env::references(compose_text).into_iter(),
            &definitions,
            &mut out,
        );

        match ComposeFile::parse(compose_text) {
            Ok(compose) => {
                check_dependencies(&compose, &mut out);
                check_volumes(&compose, &mut out);
                check_host_ports(&compose, &mut out);
                check_exposed_ports(&compose, build_text, &mut out);
            }
            Err(e) => out.push(Violation {
                kind: ViolationKind::UnparseableDocument,
                source: DocumentKind::OrchestrationDescriptor,
                counterpart: DocumentKind::OrchestrationDescriptor,
                identifier: DocumentKind::OrchestrationDescriptor.file_name().to_string(),
                detail: format!("is not valid YAML: {e}"),
            }),
        }

        check_ignored_sources(
            build_text,
            bundle.document(DocumentKind::IgnoreList),
            &mut out,
        );

        out
    }
}

fn check_env_duplicates(entries: &[env::EnvEntry], out: &mut Vec<Violation>) {
    let mut first_seen: BTreeMap<&str, usize> = BTreeMap::new();
    for entry in entries {
        match first_seen.get(entry.name.as_str()) {
            Some(first) => out.push(Violation {
                kind: ViolationKind::DuplicateVariable,
                source: DocumentKind::EnvTemplate,
                counterpart: DocumentKind::EnvTemplate,
                identifier: entry.name.clone(),
                detail: format!("is defined on line {first} and again on line {}", entry.line),
            }),
            None => {
                first_seen.insert(&entry.name, entry.line);
            }
        }
    }
}

fn check_env_references(
    source: DocumentKind,
    refs: impl Iterator<Item = env::EnvRef>,
    definitions: &BTreeMap<&str, &str>,
    out: &mut Vec<Violation>,
) {
    let mut reported = BTreeSet::new();
    for reference in refs {
        match definitions.get(reference.name.as_str()) {
            None => {
                if reported.insert(reference.name.clone()) {
                    out.push(Violation {
                        kind: ViolationKind::UndefinedVariable,
                        source,
                        counterpart: DocumentKind::EnvTemplate,
                        detail: "is referenced but not defined".into(),
                        identifier: reference.name,
                    });
                }
            }
            Some(value) => {
                if let Some(default) = reference.default.as_deref() {
                    if default != *value {
                        out.push(Violation {
                            kind: ViolationKind::DefaultMismatch,
                            source,
                            counterpart: DocumentKind::EnvTemplate,
                            detail: format!(
                                "defaults to '{default}' but the env template sets '{value}'"
                            ),
                            identifier: reference.name,
                        });
                    }
                }
            }
        }
    }
}

fn check_dependencies(compose: &ComposeFile, out: &mut Vec<Violation>) {
    for (name, service) in &compose.services {
        for dependency in service.dependencies() {
            if !compose.services.contains_key(dependency) {
                out.push(Violation {
                    kind: ViolationKind::UnknownDependency,
                    source: DocumentKind::OrchestrationDescriptor,
                    counterpart: DocumentKind::OrchestrationDescriptor,
                    identifier: dependency.to_string(),
                    detail: format!("is a dependency of '{name}' but no such service exists"),
                });
            }
        }
    }
}

fn check_volumes(compose: &ComposeFile, out: &mut Vec<Violation>) {
    for (name, service) in &compose.services {
        for volume in service.named_volumes() {
            if !compose.declares_volume(volume) {
                out.push(Violation {
                    kind: ViolationKind::UndeclaredVolume,
                    source: DocumentKind::OrchestrationDescriptor,
                    counterpart: DocumentKind::OrchestrationDescriptor,
                    identifier: volume.to_string(),
                    detail: format!("is mounted by '{name}' but not declared under volumes"),
                });
            }
        }
    }
}

fn check_host_ports(compose: &ComposeFile, out: &mut Vec<Violation>) {
    // (owner, host ip, published port) of every binding seen so far
    let mut bound: Vec<(&str, Option<String>, String)> = Vec::new();
    for (name, service) in &compose.services {
        for mapping in service.ports.iter().map(|p| p.mapping()) {
            let Some(published) = mapping.published else {
                continue;
            };
            let clash = bound.iter().find(|(owner, ip, port)| {
                *owner != name.as_str()
                    && *port == published
                    && ips_overlap(ip.as_deref(), mapping.host_ip.as_deref())
            });
            if let Some((owner, _, _)) = clash {
                out.push(Violation {
                    kind: ViolationKind::HostPortCollision,
                    source: DocumentKind::OrchestrationDescriptor,
                    counterpart: DocumentKind::OrchestrationDescriptor,
                    identifier: published.clone(),
                    detail: format!("is published by both '{owner}' and '{name}'"),
                });
            }
            bound.push((name.as_str(), mapping.host_ip, published));
        }
    }
}

/// A binding without an address, or on the unspecified address, takes the
/// port on every interface.
fn ips_overlap(a: Option<&str>, b: Option<&str>) -> bool {
    fn any_interface(ip: Option<&str>) -> bool {
        matches!(
            ip.map(|ip| ip.trim_matches(['[', ']'])),
            None | Some("" | "0.0.0.0" | "::")
        )
    }
    any_interface(a) || any_interface(b) || a == b
}

fn check_exposed_ports(compose: &ComposeFile, build_text: &str, out: &mut Vec<Violation>) {
    let exposed = build::exposed_ports(build_text);
    for (name, service) in compose.services.iter().filter(|(_, s)| s.build.is_some()) {
        let targets: Vec<String> = service.ports.iter().map(|p| p.mapping().target).collect();
        for port in &exposed {
            if !targets.contains(port) {
                out.push(Violation {
                    kind: ViolationKind::UnmappedExposedPort,
                    source: DocumentKind::BuildDescriptor,
                    counterpart: DocumentKind::OrchestrationDescriptor,
                    identifier: port.clone(),
                    detail: format!("is exposed by the image but '{name}' does not map it"),
                });
            }
        }
    }
}

fn check_ignored_sources(build_text: &str, ignore_text: &str, out: &mut Vec<Violation>) {
    let rules = IgnoreRules::parse(ignore_text);
    for source in build::copy_sources(build_text) {
        if let Some(pattern) = rules.excluding_pattern(&source) {
            out.push(Violation {
                kind: ViolationKind::IgnoredBuildSource,
                source: DocumentKind::BuildDescriptor,
                counterpart: DocumentKind::IgnoreList,
                detail: format!("is copied into the image but excluded by '{pattern}'"),
                identifier: source,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bundle(build: &str, compose: &str, ignore: &str, env: &str) -> Bundle {
        let mut docs = BTreeMap::new();
        docs.insert(DocumentKind::BuildDescriptor, build.to_string());
        docs.insert(DocumentKind::OrchestrationDescriptor, compose.to_string());
        docs.insert(DocumentKind::IgnoreList, ignore.to_string());
        docs.insert(DocumentKind::EnvTemplate, env.to_string());
        Bundle::from_documents(docs)
    }

    fn kinds(violations: &[Violation]) -> Vec<ViolationKind> {
        violations.iter().map(|v| v.kind).collect()
    }

    const BUILD: &str = "FROM python:3.11-slim\nCOPY ./app /code/app\nEXPOSE 8000\n";
    const COMPOSE: &str = "services:\n  app:\n    build: .\n    ports:\n      - \"8000:8000\"\n    environment:\n      PORT: ${PORT:-8000}\n";

    #[test]
    fn consistent_bundle_passes() {
        let b = bundle(BUILD, COMPOSE, ".git\n", "PORT=8000\n");
        assert!(ConsistencyValidator::validate(&b).is_ok());
    }

    #[test]
    fn undefined_variable_names_both_documents() {
        let b = bundle(BUILD, COMPOSE, "", "");
        let violations = ConsistencyValidator::violations(&b);
        assert_eq!(kinds(&violations), vec![ViolationKind::UndefinedVariable]);
        let v = &violations[0];
        assert_eq!(v.source, DocumentKind::OrchestrationDescriptor);
        assert_eq!(v.counterpart, DocumentKind::EnvTemplate);
        assert_eq!(v.identifier, "PORT");
    }

    #[test]
    fn default_must_match_env_template() {
        let b = bundle(BUILD, COMPOSE, "", "PORT=9000\n");
        let violations = ConsistencyValidator::violations(&b);
        assert_eq!(kinds(&violations), vec![ViolationKind::DefaultMismatch]);
    }

    #[test]
    fn duplicate_definitions_are_reported() {
        let b = bundle(BUILD, COMPOSE, "", "PORT=8000\nPORT=8000\n");
        let violations = ConsistencyValidator::violations(&b);
        assert_eq!(kinds(&violations), vec![ViolationKind::DuplicateVariable]);
        assert!(violations[0].detail.contains("line 1"));
    }

    #[test]
    fn all_structural_problems_are_collected() {
        let compose = r#"
services:
  app:
    build: .
    ports:
      - "8000:8000"
    depends_on:
      - db
    volumes:
      - data:/data
  cache:
    image: redis
    ports:
      - "8000:6379"
"#;
        let b = bundle(BUILD, compose, "app/\n", "");
        let found = kinds(&ConsistencyValidator::violations(&b));
        assert!(found.contains(&ViolationKind::UnknownDependency));
        assert!(found.contains(&ViolationKind::UndeclaredVolume));
        assert!(found.contains(&ViolationKind::HostPortCollision));
        assert!(found.contains(&ViolationKind::IgnoredBuildSource));
        assert_eq!(found.len(), 4);
    }

    #[test]
    fn inline_comment_in_env_template_is_not_a_mismatch() {
        let b = bundle(BUILD, COMPOSE, "", "PORT=8000 # http port\n");
        assert!(ConsistencyValidator::violations(&b).is_empty());
    }

    #[test]
    fn wildcard_binding_collides_with_specific_address() {
        let compose = r#"
services:
  app:
    build: .
    ports:
      - "8000:8000"
  cache:
    image: redis
    ports:
      - "127.0.0.1:8000:6379"
"#;
        let b = bundle(BUILD, compose, "", "");
        let violations = ConsistencyValidator::violations(&b);
        assert_eq!(kinds(&violations), vec![ViolationKind::HostPortCollision]);
        assert_eq!(violations[0].identifier, "8000");
    }

    #[test]
    fn distinct_addresses_may_share_a_port() {
        let compose = r#"
services:
  app:
    build: .
    ports:
      - "127.0.0.1:8000:8000"
  cache:
    image: redis
    ports:
      - "127.0.0.2:8000:6379"
"#;
        let b = bundle(BUILD, compose, "", "");
        assert!(ConsistencyValidator::violations(&b).is_empty());
    }

    #[test]
    fn unmapped_expose_is_reported() {
        let compose = "services:\n  app:\n    build: .\n    ports:\n      - \"8080:9000\"\n";
        let b = bundle(BUILD, compose, "", "");
        assert_eq!(
            kinds(&ConsistencyValidator::violations(&b)),
            vec![ViolationKind::UnmappedExposedPort]
        );
    }

    #[test]
    fn build_local_variables_need_no_env_entry() {
        let build = "FROM python:3.11-slim\nARG APP_HOME=/code\nWORKDIR ${APP_HOME}\n";
        let b = bundle(build, "", "", "");
        assert!(ConsistencyValidator::validate(&b).is_ok());
    }

    #[test]
    fn broken_yaml_is_a_violation_not_a_panic() {
        let b = bundle("", "services: [unclosed", "", "");
        let err = ConsistencyValidator::validate(&b).unwrap_err();
        let DomainError::Consistency { violations } = err else {
            panic!("expected consistency error");
        };
        assert_eq!(violations[0].kind, ViolationKind::UnparseableDocument);
    }

    #[test]
    fn display_names_kind_documents_and_identifier() {
        let b = bundle(BUILD, COMPOSE, "", "");
        let text = ConsistencyValidator::violations(&b)[0].to_string();
        assert!(text.contains("undefined-variable"));
        assert!(text.contains("orchestration-descriptor -> env-template"));
        assert!(text.contains("PORT"));
    }
}
