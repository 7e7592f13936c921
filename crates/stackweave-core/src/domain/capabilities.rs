//! Backing-service capability registry.
//!
//! Every container the engine can place next to the primary service is
//! described exactly once here: image, port, data volume, credential
//! variables, health check. Fragments read their literal values from this
//! table, and option validation reads the ports from it, so the two can never
//! drift apart.
//!
//! # Adding a New Database Engine
//!
//! 1. Add a variant to `DatabaseKind` in `value_objects.rs`
//! 2. Add one [`EngineDef`] entry to [`ENGINE_REGISTRY`]
//! 3. Add its env-template and service fragments to the built-in catalog

use crate::domain::value_objects::DatabaseKind;

// ── Database engines ─────────────────────────────────────────────────────────

/// Describes everything the catalog needs to know about one database engine.
#[derive(Debug, Clone, Copy)]
pub struct EngineDef {
    /// The option value this definition answers to.
    pub kind: DatabaseKind,

    /// Container image reference, pinned to a major version.
    pub image: &'static str,

    /// Port the engine listens on inside its container.
    ///
    /// In development the same number is published on the host.
    pub port: u16,

    /// Named volume holding the engine's data.
    pub volume: &'static str,

    /// Mount point of the data volume inside the container.
    pub data_path: &'static str,

    /// Scheme of the connection URL handed to the application.
    pub url_scheme: &'static str,

    /// Suffix appended to the connection URL (query string, if any).
    pub url_suffix: &'static str,

    /// Variable the image reads the application user from.
    pub user_var: &'static str,

    /// Variable the image reads the application password from.
    pub password_var: &'static str,

    /// Variable the image reads the initial database name from.
    pub name_var: &'static str,

    /// Health check command, in compose `CMD-SHELL` form.
    pub healthcheck: &'static str,

    /// Further `(variable, default)` pairs the image needs to start.
    pub extra_env: &'static [(&'static str, &'static str)],
}

/// Single source of truth for database engines.
pub static ENGINE_REGISTRY: &[EngineDef] = &[
    EngineDef {
        kind: DatabaseKind::Postgres,
        image: "postgres:16-alpine",
        port: 5432,
        volume: "postgres-data",
        data_path: "/var/lib/postgresql/data",
        url_scheme: "postgresql",
        url_suffix: "",
        user_var: "POSTGRES_USER",
        password_var: "POSTGRES_PASSWORD",
        name_var: "POSTGRES_DB",
        healthcheck: "pg_isready -U $${POSTGRES_USER} -d $${POSTGRES_DB}",
        extra_env: &[],
    },
    EngineDef {
        kind: DatabaseKind::Mysql,
        image: "mysql:8.4",
        port: 3306,
        volume: "mysql-data",
        data_path: "/var/lib/mysql",
        url_scheme: "mysql",
        url_suffix: "",
        user_var: "MYSQL_USER",
        password_var: "MYSQL_PASSWORD",
        name_var: "MYSQL_DATABASE",
        healthcheck: "mysqladmin ping -h localhost --silent",
        extra_env: &[("MYSQL_RANDOM_ROOT_PASSWORD", "yes")],
    },
    EngineDef {
        kind: DatabaseKind::Mongo,
        image: "mongo:7",
        port: 27017,
        volume: "mongo-data",
        data_path: "/data/db",
        url_scheme: "mongodb",
        url_suffix: "?authSource=admin",
        user_var: "MONGO_INITDB_ROOT_USERNAME",
        password_var: "MONGO_INITDB_ROOT_PASSWORD",
        name_var: "MONGO_INITDB_DATABASE",
        healthcheck: "mongosh --quiet --eval 'db.runCommand({ping: 1}).ok'",
        extra_env: &[],
    },
];

// ── Cache ────────────────────────────────────────────────────────────────────

/// Describes the optional cache container.
#[derive(Debug, Clone, Copy)]
pub struct CacheDef {
    pub image: &'static str,
    pub port: u16,
    pub volume: &'static str,
    pub data_path: &'static str,
    pub url_scheme: &'static str,
    pub healthcheck: &'static str,
}

/// The one cache the catalog knows how to wire in.
pub static CACHE: CacheDef = CacheDef {
    image: "redis:7-alpine",
    port: 6379,
    volume: "redis-data",
    data_path: "/data",
    url_scheme: "redis",
    healthcheck: "redis-cli ping",
};

// ── Registry lookup API ───────────────────────────────────────────────────────

/// Find the engine definition for a database kind.
///
/// Returns `None` for [`DatabaseKind::None`].
pub fn find_engine(kind: DatabaseKind) -> Option<&'static EngineDef> {
    ENGINE_REGISTRY.iter().find(|def| def.kind == kind)
}

/// Ports claimed by the backing services selected for these choices.
///
/// Each entry is `(owner, port)`, owner being the option that selected it.
pub fn reserved_ports(database: DatabaseKind, cache_enabled: bool) -> Vec<(&'static str, u16)> {
    let mut ports = Vec::with_capacity(2);
    if let Some(engine) = find_engine(database) {
        ports.push((engine.kind.as_str(), engine.port));
    }
    if cache_enabled {
        ports.push(("cache", CACHE.port));
    }
    ports
}

/// Validate that the primary service's port does not collide with a
/// backing service selected alongside it.
///
/// Returns `Ok(())` on success or a human-readable error string.
pub fn validate_app_port(
    app_port: u16,
    database: DatabaseKind,
    cache_enabled: bool,
) -> Result<(), String> {
    match reserved_ports(database, cache_enabled)
        .into_iter()
        .find(|(_, port)| *port == app_port)
    {
        Some((owner, port)) => Err(format!(
            "port {port} is already used by the {owner} service; pick another app port"
        )),
        None => Ok(()),
    }
}

// ── Registry integrity (checked in tests) ────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn every_engine_kind_is_registered_once() {
        for kind in DatabaseKind::ALL {
            let count = ENGINE_REGISTRY.iter().filter(|d| d.kind == kind).count();
            let expected = usize::from(kind.is_engine());
            assert_eq!(count, expected, "registry entries for {kind}");
        }
    }

    #[test]
    fn backing_ports_and_volumes_are_distinct() {
        let mut ports = HashSet::new();
        let mut volumes = HashSet::new();
        for def in ENGINE_REGISTRY {
            assert!(ports.insert(def.port), "duplicate port {}", def.port);
            assert!(volumes.insert(def.volume), "duplicate volume {}", def.volume);
        }
        assert!(ports.insert(CACHE.port));
        assert!(volumes.insert(CACHE.volume));
    }

    #[test]
    fn none_has_no_engine() {
        assert!(find_engine(DatabaseKind::None).is_none());
    }

    #[test]
    fn reserved_ports_follow_selection() {
        assert!(reserved_ports(DatabaseKind::None, false).is_empty());
        assert_eq!(
            reserved_ports(DatabaseKind::Postgres, true),
            vec![("postgres", 5432), ("cache", 6379)]
        );
    }

    #[test]
    fn app_port_on_cache_port_is_rejected() {
        let err = validate_app_port(6379, DatabaseKind::None, true).unwrap_err();
        assert!(err.contains("cache"));
        assert!(validate_app_port(6379, DatabaseKind::None, false).is_ok());
    }

    #[test]
    fn app_port_on_engine_port_is_rejected() {
        assert!(validate_app_port(27017, DatabaseKind::Mongo, false).is_err());
        assert!(validate_app_port(8000, DatabaseKind::Mongo, true).is_ok());
    }
}
