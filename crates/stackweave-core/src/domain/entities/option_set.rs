//! The `OptionSet` aggregate and its typestate builder.
//!
//! An `OptionSet` is the finalized set of choices a composition runs against.
//! Every field is validated at build time; once an `OptionSet` exists the
//! catalog can select fragments for it without further checks.
//!
//! # Typestate builder
//!
//! The builder uses two phantom marker types (`NoName` / `HasName`) to enforce
//! at *compile time* that a project name is set before the set can be built.
//! Runtime validation (`validate`) still runs at `build()` for ranges and the
//! cross-field port check.
//!
//! # Domain purity
//!
//! This module must not import `tracing`.

use std::fmt;
use std::marker::PhantomData;

use serde::{Deserialize, Serialize};

use crate::domain::{
    capabilities,
    error::DomainError,
    value_objects::{DatabaseKind, EnvironmentMode},
};

/// Port the primary service listens on when none is given.
pub const DEFAULT_APP_PORT: u16 = 8000;
/// Production worker count when none is given.
pub const DEFAULT_WORKERS: u8 = 4;
/// Base image Python version when none is given.
pub const DEFAULT_PYTHON_VERSION: &str = "3.11";

const MAX_PROJECT_NAME_LEN: usize = 63;
const MAX_WORKERS: u8 = 64;

// ── Aggregate root ────────────────────────────────────────────────────────────

/// A fully-validated set of composition choices.
///
/// - `project_name` is a lowercase identifier usable as a compose project name
/// - `app_port` is in `[1, 65535]` and does not collide with a selected
///   backing service
/// - `workers` is in `[1, 64]`
/// - `python_version` is `MAJOR.MINOR`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OptionSet {
    database_kind: DatabaseKind,
    cache_enabled: bool,
    environment_mode: EnvironmentMode,
    project_name: String,
    app_port: u16,
    workers: u8,
    python_version: String,
}

impl OptionSet {
    /// Start building a new `OptionSet`.
    pub fn builder() -> OptionSetBuilder<NoName> {
        OptionSetBuilder::new()
    }

    pub const fn database_kind(&self) -> DatabaseKind {
        self.database_kind
    }
    pub const fn cache_enabled(&self) -> bool {
        self.cache_enabled
    }
    pub const fn environment_mode(&self) -> EnvironmentMode {
        self.environment_mode
    }
    pub fn project_name(&self) -> &str {
        &self.project_name
    }
    pub const fn app_port(&self) -> u16 {
        self.app_port
    }
    pub const fn workers(&self) -> u8 {
        self.workers
    }
    pub fn python_version(&self) -> &str {
        &self.python_version
    }

    pub const fn is_production(&self) -> bool {
        matches!(self.environment_mode, EnvironmentMode::Production)
    }

    /// Validate this option set's internal consistency.
    ///
    /// Called automatically by the builder. Available for re-validation after
    /// deserialization.
    pub fn validate(&self) -> Result<(), DomainError> {
        validate_project_name(&self.project_name)?;

        if self.app_port == 0 {
            return Err(DomainError::InvalidOptionSet {
                field: "app_port",
                reason: "port must be in 1..=65535".into(),
            });
        }
        capabilities::validate_app_port(self.app_port, self.database_kind, self.cache_enabled)
            .map_err(|reason| DomainError::InvalidOptionSet {
                field: "app_port",
                reason,
            })?;

        if !(1..=MAX_WORKERS).contains(&self.workers) {
            return Err(DomainError::InvalidOptionSet {
                field: "workers",
                reason: format!("worker count must be in 1..={MAX_WORKERS}, got {}", self.workers),
            });
        }

        validate_python_version(&self.python_version)
    }
}

impl fmt::Display for OptionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}, db={}, cache={}, port={})",
            self.project_name,
            self.environment_mode,
            self.database_kind,
            if self.cache_enabled { "on" } else { "off" },
            self.app_port
        )
    }
}

fn validate_project_name(name: &str) -> Result<(), DomainError> {
    let invalid = |reason: String| DomainError::InvalidOptionSet {
        field: "project_name",
        reason,
    };

    let Some(first) = name.chars().next() else {
        return Err(invalid("project name cannot be empty".into()));
    };
    if name.len() > MAX_PROJECT_NAME_LEN {
        return Err(invalid(format!(
            "project name is longer than {MAX_PROJECT_NAME_LEN} characters"
        )));
    }
    if !first.is_ascii_lowercase() {
        return Err(invalid(format!(
            "'{name}' must start with a lowercase letter"
        )));
    }
    if let Some(bad) = name
        .chars()
        .find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-' || *c == '_'))
    {
        return Err(invalid(format!(
            "'{name}' contains '{bad}'; use lowercase letters, digits, '-' or '_'"
        )));
    }
    Ok(())
}

fn validate_python_version(version: &str) -> Result<(), DomainError> {
    let well_formed = version
        .split_once('.')
        .is_some_and(|(major, minor)| {
            !major.is_empty()
                && !minor.is_empty()
                && major.chars().all(|c| c.is_ascii_digit())
                && minor.chars().all(|c| c.is_ascii_digit())
        });

    if well_formed {
        Ok(())
    } else {
        Err(DomainError::InvalidOptionSet {
            field: "python_version",
            reason: format!("'{version}' is not of the form MAJOR.MINOR (e.g. 3.11)"),
        })
    }
}

// ── Typestate markers ─────────────────────────────────────────────────────────

/// Marker: project name has not yet been set.
pub struct NoName;
/// Marker: project name has been set; the set may now be built.
pub struct HasName;

// ── Builder ───────────────────────────────────────────────────────────────────

/// Typestate builder for [`OptionSet`].
///
/// Every field except the project name has a default: no database, no cache,
/// development mode, port 8000, four workers, Python 3.11.
pub struct OptionSetBuilder<N> {
    database_kind: DatabaseKind,
    cache_enabled: bool,
    environment_mode: EnvironmentMode,
    project_name: Option<String>,
    app_port: u16,
    workers: u8,
    python_version: String,
    _marker: PhantomData<N>,
}

impl OptionSetBuilder<NoName> {
    pub fn new() -> Self {
        Self {
            database_kind: DatabaseKind::None,
            cache_enabled: false,
            environment_mode: EnvironmentMode::Development,
            project_name: None,
            app_port: DEFAULT_APP_PORT,
            workers: DEFAULT_WORKERS,
            python_version: DEFAULT_PYTHON_VERSION.to_string(),
            _marker: PhantomData,
        }
    }

    /// Set the project name. This transitions the builder to `HasName`.
    pub fn project_name(self, name: impl Into<String>) -> OptionSetBuilder<HasName> {
        OptionSetBuilder {
            database_kind: self.database_kind,
            cache_enabled: self.cache_enabled,
            environment_mode: self.environment_mode,
            project_name: Some(name.into()),
            app_port: self.app_port,
            workers: self.workers,
            python_version: self.python_version,
            _marker: PhantomData,
        }
    }
}

impl Default for OptionSetBuilder<NoName> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N> OptionSetBuilder<N> {
    pub fn database(mut self, kind: DatabaseKind) -> Self {
        self.database_kind = kind;
        self
    }

    pub fn cache(mut self, enabled: bool) -> Self {
        self.cache_enabled = enabled;
        self
    }

    pub fn mode(mut self, mode: EnvironmentMode) -> Self {
        self.environment_mode = mode;
        self
    }

    pub fn app_port(mut self, port: u16) -> Self {
        self.app_port = port;
        self
    }

    pub fn workers(mut self, workers: u8) -> Self {
        self.workers = workers;
        self
    }

    pub fn python_version(mut self, version: impl Into<String>) -> Self {
        self.python_version = version.into();
        self
    }
}

impl OptionSetBuilder<HasName> {
    /// Build and validate the `OptionSet`.
    pub fn build(self) -> Result<OptionSet, DomainError> {
        let options = OptionSet {
            database_kind: self.database_kind,
            cache_enabled: self.cache_enabled,
            environment_mode: self.environment_mode,
            project_name: self.project_name.unwrap_or_default(),
            app_port: self.app_port,
            workers: self.workers,
            python_version: self.python_version,
        };

        options.validate()?;
        Ok(options)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
