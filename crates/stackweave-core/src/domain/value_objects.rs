//! Domain value objects: DatabaseKind, EnvironmentMode, DocumentKind.
//!
//! # Design
//!
//! These are pure value types: `Copy`, compared by value, no identity.
//! They hold NO engine knowledge. Images, ports, and health checks live in
//! `capabilities.rs`. This file's only job is to define the types, their
//! string representations, and their `FromStr` parsers.
//!
//! # Adding New Variants
//!
//! 1. Add the enum variant here
//! 2. Add the `as_str` arm and the `FromStr` arm here
//! 3. Add an engine entry in `capabilities.rs`
//! 4. Add its fragments to the built-in catalog

use crate::domain::error::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ── DatabaseKind ─────────────────────────────────────────────────────────────

/// The database engine backing the primary service, or none at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseKind {
    Postgres,
    Mysql,
    Mongo,
    None,
}

impl DatabaseKind {
    /// Every variant, in catalog order.
    pub const ALL: [DatabaseKind; 4] = [Self::Postgres, Self::Mysql, Self::Mongo, Self::None];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Postgres => "postgres",
            Self::Mysql => "mysql",
            Self::Mongo => "mongo",
            Self::None => "none",
        }
    }

    /// Whether this kind actually runs a database container.
    pub const fn is_engine(self) -> bool {
        !matches!(self, Self::None)
    }
}

impl fmt::Display for DatabaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DatabaseKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Ok(Self::Postgres),
            "mysql" => Ok(Self::Mysql),
            "mongo" | "mongodb" => Ok(Self::Mongo),
            "none" => Ok(Self::None),
            other => Err(DomainError::InvalidOptionSet {
                field: "database_kind",
                reason: format!("unknown database kind: {other}"),
            }),
        }
    }
}

// ── EnvironmentMode ──────────────────────────────────────────────────────────

/// Deployment environment the bundle targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvironmentMode {
    Development,
    Production,
}

impl EnvironmentMode {
    pub const ALL: [EnvironmentMode; 2] = [Self::Development, Self::Production];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
        }
    }
}

impl fmt::Display for EnvironmentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EnvironmentMode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            other => Err(DomainError::InvalidOptionSet {
                field: "environment_mode",
                reason: format!("unknown environment mode: {other}"),
            }),
        }
    }
}

// ── DocumentKind ─────────────────────────────────────────────────────────────

/// One of the four documents a bundle always carries.
///
/// Ordering follows declaration order; bundles iterate documents in this
/// order so output is stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DocumentKind {
    BuildDescriptor,
    OrchestrationDescriptor,
    IgnoreList,
    EnvTemplate,
}

impl DocumentKind {
    pub const ALL: [DocumentKind; 4] = [
        Self::BuildDescriptor,
        Self::OrchestrationDescriptor,
        Self::IgnoreList,
        Self::EnvTemplate,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::BuildDescriptor => "build-descriptor",
            Self::OrchestrationDescriptor => "orchestration-descriptor",
            Self::IgnoreList => "ignore-list",
            Self::EnvTemplate => "env-template",
        }
    }

    /// Conventional file name the calling layer writes this document to.
    pub const fn file_name(&self) -> &'static str {
        match self {
            Self::BuildDescriptor => "Dockerfile",
            Self::OrchestrationDescriptor => "docker-compose.yml",
            Self::IgnoreList => ".dockerignore",
            Self::EnvTemplate => ".env.example",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "build-descriptor" | "build" | "dockerfile" => Ok(Self::BuildDescriptor),
            "orchestration-descriptor" | "orchestration" | "compose" | "docker-compose.yml" => {
                Ok(Self::OrchestrationDescriptor)
            }
            "ignore-list" | "ignore" | ".dockerignore" => Ok(Self::IgnoreList),
            "env-template" | "env" | ".env.example" => Ok(Self::EnvTemplate),
            other => Err(DomainError::InvalidFragment {
                fragment: String::new(),
                reason: format!("unknown document: {other}"),
            }),
        }
    }
}
