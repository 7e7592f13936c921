//! The fragment catalog that ships with stackweave.
//!
//! [`builtin_catalog`] is the single entry-point. Fragments are listed in
//! composition order: every identifier is provided by a fragment that comes
//! before the first fragment requiring it, so the env-template fragments lead
//! (they bind most names), then the build descriptor, the orchestration
//! descriptor and the ignore list.
//!
//! # Identifier naming
//!
//! | Prefix     | Bound by                  | Examples                          |
//! |------------|---------------------------|-----------------------------------|
//! | `project.` | `env-app`                 | `project.name`                    |
//! | `app.`     | `env-app`                 | `app.service`, `app.port_var`     |
//! | `db.`      | `env-<engine>`            | `db.service`, `db.url`            |
//! | `cache.`   | `env-redis`               | `cache.service`, `cache.url_var`  |
//!
//! Per-engine fragments are generated from [`ENGINE_REGISTRY`]; an engine
//! registered there gets its env-template and service fragments for free.

use tracing::{debug, instrument};

use stackweave_core::domain::{
    DocumentKind, DomainError, EnvironmentMode, Fragment, FragmentCatalog, FragmentId,
    FragmentMatcher, OptionSet,
    capabilities::{CACHE, ENGINE_REGISTRY, EngineDef},
};

// ── Public API ────────────────────────────────────────────────────────────────

/// Build and lint the built-in catalog.
///
/// Fails only if a fragment below is malformed, which the tests in this
/// module rule out.
#[instrument]
pub fn builtin_catalog() -> Result<FragmentCatalog, DomainError> {
    let mut fragments = vec![env_app()?];
    for engine in ENGINE_REGISTRY {
        fragments.push(engine_env(engine)?);
    }
    fragments.push(cache_env()?);

    fragments.extend(dockerfile()?);
    fragments.extend(compose_app()?);
    for engine in ENGINE_REGISTRY {
        fragments.push(engine_service(engine)?);
    }
    fragments.extend(compose_backing_services()?);
    fragments.extend(dockerignore()?);

    debug!(count = fragments.len(), "Built-in fragments assembled");
    FragmentCatalog::new(fragments)
}

// ── Matchers ─────────────────────────────────────────────────────────────────

fn has_backing_service(options: &OptionSet) -> bool {
    options.database_kind().is_engine() || options.cache_enabled()
}

fn in_mode(mode: EnvironmentMode) -> FragmentMatcher {
    FragmentMatcher::builder().mode(mode).build()
}

fn with_cache() -> FragmentMatcher {
    FragmentMatcher::builder().cache(true).build()
}

fn any_engine() -> FragmentMatcher {
    FragmentMatcher::builder().any_engine().build()
}

fn backing_services() -> FragmentMatcher {
    FragmentMatcher::builder()
        .when("backing services selected", has_backing_service)
        .build()
}

/// `{{symbol}}`
fn ph(symbol: &str) -> String {
    format!("{{{{{symbol}}}}}")
}

/// Symbol stem for an extra engine variable: `MYSQL_ROOT` → `db.env.mysql_root`.
fn extra_symbol(var: &str) -> String {
    format!("db.env.{}", var.to_ascii_lowercase())
}

// ── Env template ─────────────────────────────────────────────────────────────

fn env_app() -> Result<Fragment, DomainError> {
    Fragment::builder("env-app", DocumentKind::EnvTemplate)
        .description("Primary service settings and the names every document shares")
        .derives("project.name", |o| o.project_name().to_string())
        .derives("env.mode", |o| o.environment_mode().as_str().to_string())
        .derives("app.debug", |o| (!o.is_production()).to_string())
        .derives("app.port", |o| o.app_port().to_string())
        .derives("python.version", |o| o.python_version().to_string())
        .provides("app.service", "app")
        .provides("app.name_var", "APP_NAME")
        .provides("app.env_var", "ENVIRONMENT")
        .provides("app.debug_var", "DEBUG")
        .provides("app.host_var", "HOST")
        .provides("app.host", "0.0.0.0")
        .provides("app.port_var", "PORT")
        .body(
            "# Environment for {{project.name}}
# Copy to .env and adjust; docker compose reads .env on its own.

{{app.name_var}}={{project.name}}
{{app.env_var}}={{env.mode}}
{{app.debug_var}}={{app.debug}}
{{app.host_var}}={{app.host}}
{{app.port_var}}={{app.port}}
",
        )
        .build()
}

fn engine_env(engine: &EngineDef) -> Result<Fragment, DomainError> {
    let name = engine.kind.as_str();
    let url = format!(
        "{}://{{{{db.user}}}}:{{{{db.password}}}}@{{{{db.service}}}}:{{{{db.port}}}}/{{{{db.name}}}}{}",
        engine.url_scheme, engine.url_suffix
    );

    let mut builder =
        Fragment::builder(FragmentId::new(format!("env-{name}")), DocumentKind::EnvTemplate)
            .description(format!("{name} credentials and connection URL"))
            .matcher(FragmentMatcher::builder().database(engine.kind).build())
            .provides("db.service", "db")
            .provides("db.image", engine.image)
            .provides("db.port", engine.port.to_string())
            .provides("db.volume", engine.volume)
            .provides("db.data_path", engine.data_path)
            .provides("db.healthcheck", engine.healthcheck)
            .provides("db.user_var", engine.user_var)
            .provides("db.password_var", engine.password_var)
            .provides("db.name_var", engine.name_var)
            .provides("db.user", "app")
            .provides("db.password", "changeme")
            .derives("db.name", |o| o.project_name().replace('-', "_"))
            .provides("db.url_var", "DATABASE_URL")
            .provides("db.url", url);

    let mut body = format!(
        "\n# Database ({name})\n{}={}\n{}={}\n{}={}\n",
        ph("db.user_var"),
        ph("db.user"),
        ph("db.password_var"),
        ph("db.password"),
        ph("db.name_var"),
        ph("db.name"),
    );
    for (var, default) in engine.extra_env {
        let symbol = extra_symbol(var);
        builder = builder
            .provides(format!("{symbol}_var"), *var)
            .provides(symbol.clone(), *default);
        body.push_str(&format!("{}={}\n", ph(&format!("{symbol}_var")), ph(&symbol)));
    }
    body.push_str(&format!("{}={}\n", ph("db.url_var"), ph("db.url")));

    builder.body(body).build()
}

fn cache_env() -> Result<Fragment, DomainError> {
    Fragment::builder("env-redis", DocumentKind::EnvTemplate)
        .description("Cache connection URL")
        .matcher(with_cache())
        .provides("cache.service", "cache")
        .provides("cache.image", CACHE.image)
        .provides("cache.port", CACHE.port.to_string())
        .provides("cache.volume", CACHE.volume)
        .provides("cache.data_path", CACHE.data_path)
        .provides("cache.healthcheck", CACHE.healthcheck)
        .provides("cache.url_var", "REDIS_URL")
        .provides(
            "cache.url",
            format!("{}://{{{{cache.service}}}}:{{{{cache.port}}}}/0", CACHE.url_scheme),
        )
        .body(
            "
# Cache (redis)
{{cache.url_var}}={{cache.url}}
",
        )
        .build()
}

// ── Build descriptor ─────────────────────────────────────────────────────────

fn dockerfile() -> Result<Vec<Fragment>, DomainError> {
    Ok(vec![
        Fragment::builder("dockerfile-base", DocumentKind::BuildDescriptor)
            .description("Slim Python base image with dependencies installed")
            .requires(["python.version", "app.port"])
            .body(
                "# syntax=docker/dockerfile:1
FROM python:{{python.version}}-slim

ENV PYTHONDONTWRITEBYTECODE=1 PYTHONUNBUFFERED=1

WORKDIR /code

COPY ./requirements.txt /code/requirements.txt
RUN pip install --no-cache-dir --upgrade -r /code/requirements.txt

COPY ./app /code/app

EXPOSE {{app.port}}
",
            )
            .build()?,
        Fragment::builder("dockerfile-prod-user", DocumentKind::BuildDescriptor)
            .description("Run as an unprivileged user")
            .matcher(in_mode(EnvironmentMode::Production))
            .body(
                "
RUN adduser --system --group --no-create-home app \\
    && chown -R app:app /code
USER app
",
            )
            .build()?,
        Fragment::builder("dockerfile-cmd", DocumentKind::BuildDescriptor)
            .description("Default command, reading host and port from the environment")
            .requires(["app.host_var", "app.host", "app.port_var", "app.port"])
            .body(
                "
CMD [\"sh\", \"-c\", \"fastapi run app/main.py --host ${{{app.host_var}}:-{{app.host}}} --port ${{{app.port_var}}:-{{app.port}}}\"]
",
            )
            .build()?,
    ])
}

// ── Orchestration descriptor ─────────────────────────────────────────────────

fn compose_app() -> Result<Vec<Fragment>, DomainError> {
    Ok(vec![
        Fragment::builder("compose-app", DocumentKind::OrchestrationDescriptor)
            .description("Project name and the primary service")
            .requires([
                "project.name",
                "env.mode",
                "app.service",
                "app.port",
                "app.name_var",
                "app.env_var",
                "app.debug_var",
                "app.debug",
                "app.host_var",
                "app.host",
                "app.port_var",
            ])
            .body(
                "name: {{project.name}}

services:
  {{app.service}}:
    build: .
    image: {{project.name}}:latest
    ports:
      - \"{{app.port}}:{{app.port}}\"
    environment:
      {{app.name_var}}: ${{{app.name_var}}:-{{project.name}}}
      {{app.env_var}}: ${{{app.env_var}}:-{{env.mode}}}
      {{app.debug_var}}: ${{{app.debug_var}}:-{{app.debug}}}
      {{app.host_var}}: ${{{app.host_var}}:-{{app.host}}}
      {{app.port_var}}: ${{{app.port_var}}:-{{app.port}}}
",
            )
            .build()?,
        Fragment::builder("compose-app-db-env", DocumentKind::OrchestrationDescriptor)
            .description("Database URL handed to the primary service")
            .matcher(any_engine())
            .requires(["db.url_var", "db.url"])
            .body("      {{db.url_var}}: ${{{db.url_var}}:-{{db.url}}}\n")
            .build()?,
        Fragment::builder("compose-app-cache-env", DocumentKind::OrchestrationDescriptor)
            .description("Cache URL handed to the primary service")
            .matcher(with_cache())
            .requires(["cache.url_var", "cache.url"])
            .body("      {{cache.url_var}}: ${{{cache.url_var}}:-{{cache.url}}}\n")
            .build()?,
        Fragment::builder("compose-app-dev", DocumentKind::OrchestrationDescriptor)
            .description("Live-reload server with the source tree mounted")
            .matcher(in_mode(EnvironmentMode::Development))
            .requires(["app.host", "app.port"])
            .body(
                "    volumes:
      - ./app:/code/app
    command: fastapi dev app/main.py --host {{app.host}} --port {{app.port}}
",
            )
            .build()?,
        Fragment::builder("compose-app-prod", DocumentKind::OrchestrationDescriptor)
            .description("Multi-worker server with restart policy and resource limits")
            .matcher(in_mode(EnvironmentMode::Production))
            .requires(["app.host", "app.port"])
            .derives("app.workers", |o| o.workers().to_string())
            .body(
                "    command: fastapi run app/main.py --host {{app.host}} --port {{app.port}} --workers {{app.workers}}
    restart: unless-stopped
    deploy:
      resources:
        limits:
          cpus: \"1.0\"
          memory: 512M
",
            )
            .build()?,
        Fragment::builder("compose-app-depends", DocumentKind::OrchestrationDescriptor)
            .description("Start-up ordering header")
            .matcher(backing_services())
            .body("    depends_on:\n")
            .build()?,
        Fragment::builder("compose-app-depends-db", DocumentKind::OrchestrationDescriptor)
            .description("Wait for a healthy database")
            .matcher(any_engine())
            .requires(["db.service"])
            .body("      {{db.service}}:\n        condition: service_healthy\n")
            .build()?,
        Fragment::builder("compose-app-depends-cache", DocumentKind::OrchestrationDescriptor)
            .description("Wait for a healthy cache")
            .matcher(with_cache())
            .requires(["cache.service"])
            .body("      {{cache.service}}:\n        condition: service_healthy\n")
            .build()?,
    ])
}

fn engine_service(engine: &EngineDef) -> Result<Fragment, DomainError> {
    let name = engine.kind.as_str();
    let mut requires: Vec<String> = [
        "db.service",
        "db.image",
        "db.user_var",
        "db.user",
        "db.password_var",
        "db.password",
        "db.name_var",
        "db.name",
        "db.volume",
        "db.data_path",
        "db.healthcheck",
    ]
    .into_iter()
    .map(str::to_string)
    .collect();

    let mut environment = String::new();
    for (var_symbol, value_symbol) in [
        ("db.user_var", "db.user"),
        ("db.password_var", "db.password"),
        ("db.name_var", "db.name"),
    ] {
        environment.push_str(&compose_env_line(var_symbol, value_symbol));
    }
    for (var, _) in engine.extra_env {
        let symbol = extra_symbol(var);
        let var_symbol = format!("{symbol}_var");
        environment.push_str(&compose_env_line(&var_symbol, &symbol));
        requires.push(var_symbol);
        requires.push(symbol);
    }

    let body = format!(
        "
  {{{{db.service}}}}:
    image: {{{{db.image}}}}
    environment:
{environment}    volumes:
      - {{{{db.volume}}}}:{{{{db.data_path}}}}
    healthcheck:
      test: [\"CMD-SHELL\", \"{{{{db.healthcheck}}}}\"]
      interval: 10s
      timeout: 5s
      retries: 5
      start_period: 10s
"
    );

    Fragment::builder(
        FragmentId::new(format!("compose-{name}")),
        DocumentKind::OrchestrationDescriptor,
    )
        .description(format!("{name} service with data volume and health check"))
        .matcher(FragmentMatcher::builder().database(engine.kind).build())
        .requires(requires)
        .body(body)
        .build()
}

/// `      {{var}}: ${{{var}}:-{{value}}}` with a trailing newline.
fn compose_env_line(var_symbol: &str, value_symbol: &str) -> String {
    let var = ph(var_symbol);
    format!("      {var}: ${{{var}:-{}}}\n", ph(value_symbol))
}

fn compose_backing_services() -> Result<Vec<Fragment>, DomainError> {
    Ok(vec![
        Fragment::builder("compose-db-restart-prod", DocumentKind::OrchestrationDescriptor)
            .description("Restart the database with the stack")
            .matcher(
                FragmentMatcher::builder()
                    .any_engine()
                    .mode(EnvironmentMode::Production)
                    .build(),
            )
            .body("    restart: unless-stopped\n")
            .build()?,
        Fragment::builder("compose-db-ports-dev", DocumentKind::OrchestrationDescriptor)
            .description("Publish the database port for local tools")
            .matcher(
                FragmentMatcher::builder()
                    .any_engine()
                    .mode(EnvironmentMode::Development)
                    .build(),
            )
            .requires(["db.port"])
            .body("    ports:\n      - \"{{db.port}}:{{db.port}}\"\n")
            .build()?,
        Fragment::builder("compose-redis", DocumentKind::OrchestrationDescriptor)
            .description("redis service with append-only persistence")
            .matcher(with_cache())
            .requires([
                "cache.service",
                "cache.image",
                "cache.volume",
                "cache.data_path",
                "cache.healthcheck",
            ])
            .body(
                "
  {{cache.service}}:
    image: {{cache.image}}
    command: redis-server --appendonly yes
    volumes:
      - {{cache.volume}}:{{cache.data_path}}
    healthcheck:
      test: [\"CMD-SHELL\", \"{{cache.healthcheck}}\"]
      interval: 10s
      timeout: 5s
      retries: 5
",
            )
            .build()?,
        Fragment::builder("compose-cache-restart-prod", DocumentKind::OrchestrationDescriptor)
            .description("Restart the cache with the stack")
            .matcher(
                FragmentMatcher::builder()
                    .cache(true)
                    .mode(EnvironmentMode::Production)
                    .build(),
            )
            .body("    restart: unless-stopped\n")
            .build()?,
        Fragment::builder("compose-cache-ports-dev", DocumentKind::OrchestrationDescriptor)
            .description("Publish the cache port for local tools")
            .matcher(
                FragmentMatcher::builder()
                    .cache(true)
                    .mode(EnvironmentMode::Development)
                    .build(),
            )
            .requires(["cache.port"])
            .body("    ports:\n      - \"{{cache.port}}:{{cache.port}}\"\n")
            .build()?,
        Fragment::builder("compose-volumes", DocumentKind::OrchestrationDescriptor)
            .description("Top-level named volumes header")
            .matcher(backing_services())
            .body("\nvolumes:\n")
            .build()?,
        Fragment::builder("compose-volume-db", DocumentKind::OrchestrationDescriptor)
            .description("Database data volume")
            .matcher(any_engine())
            .requires(["db.volume"])
            .body("  {{db.volume}}:\n")
            .build()?,
        Fragment::builder("compose-volume-cache", DocumentKind::OrchestrationDescriptor)
            .description("Cache data volume")
            .matcher(with_cache())
            .requires(["cache.volume"])
            .body("  {{cache.volume}}:\n")
            .build()?,
    ])
}

// ── Ignore list ──────────────────────────────────────────────────────────────

fn dockerignore() -> Result<Vec<Fragment>, DomainError> {
    Ok(vec![
        Fragment::builder("dockerignore-base", DocumentKind::IgnoreList)
            .description("Version control, local configuration and Python artifacts")
            .body(
                "# Version control
.git
.gitignore

# Container configuration and local secrets
.dockerignore
Dockerfile
docker-compose.yml
.env

# Python artifacts
**/__pycache__
**/*.pyc
.pytest_cache
.mypy_cache
.ruff_cache
.venv
venv

# Editors and OS files
.vscode
.idea
.DS_Store
*.log
",
            )
            .build()?,
        Fragment::builder("dockerignore-prod", DocumentKind::IgnoreList)
            .description("Keep tests and docs out of the production image")
            .matcher(in_mode(EnvironmentMode::Production))
            .body(
                "
# Not needed at runtime
tests/
docs/
*.md
",
            )
            .build()?,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use stackweave_core::domain::DatabaseKind;

    fn options(db: DatabaseKind, cache: bool, mode: EnvironmentMode) -> OptionSet {
        OptionSet::builder()
            .project_name("shop")
            .database(db)
            .cache(cache)
            .mode(mode)
            .build()
            .unwrap()
    }

    fn selected_ids(db: DatabaseKind, cache: bool, mode: EnvironmentMode) -> Vec<String> {
        let catalog = builtin_catalog().unwrap();
        catalog
            .lookup(&options(db, cache, mode))
            .iter()
            .map(|f| f.id.to_string())
            .collect()
    }

    #[test]
    fn catalog_builds_and_lints() {
        let catalog = builtin_catalog().unwrap();
        assert!(catalog.len() > 20);
    }

    #[test]
    fn every_engine_has_env_and_service_fragments() {
        let catalog = builtin_catalog().unwrap();
        for engine in ENGINE_REGISTRY {
            let name = engine.kind.as_str();
            assert!(catalog.get(&FragmentId::new(format!("env-{name}"))).is_some());
            assert!(catalog.get(&FragmentId::new(format!("compose-{name}"))).is_some());
        }
    }

    #[test]
    fn none_without_cache_selects_no_backing_fragments() {
        let ids = selected_ids(DatabaseKind::None, false, EnvironmentMode::Development);
        assert!(!ids.iter().any(|id| id.contains("db") || id.contains("cache")));
        assert!(!ids.contains(&"compose-volumes".to_string()));
        assert!(!ids.contains(&"compose-app-depends".to_string()));
    }

    #[test]
    fn mode_scoped_fragments_are_exclusive() {
        let dev = selected_ids(DatabaseKind::Postgres, true, EnvironmentMode::Development);
        let prod = selected_ids(DatabaseKind::Postgres, true, EnvironmentMode::Production);
        assert!(dev.contains(&"compose-app-dev".to_string()));
        assert!(!dev.contains(&"compose-app-prod".to_string()));
        assert!(prod.contains(&"compose-app-prod".to_string()));
        assert!(!prod.iter().any(|id| id.ends_with("-dev")));
        assert!(!dev.iter().any(|id| id.ends_with("-prod")));
    }

    #[test]
    fn mysql_carries_its_extra_variable() {
        let catalog = builtin_catalog().unwrap();
        let fragment = catalog.get(&"env-mysql".into()).unwrap();
        assert!(
            fragment
                .provided_symbols()
                .any(|s| s == "db.env.mysql_random_root_password_var")
        );
    }

    #[test]
    fn placeholder_helper_wraps_symbol() {
        assert_eq!(ph("db.url"), "{{db.url}}");
        assert_eq!(
            compose_env_line("db.user_var", "db.user"),
            "      {{db.user_var}}: ${{{db.user_var}}:-{{db.user}}}\n"
        );
    }
}
