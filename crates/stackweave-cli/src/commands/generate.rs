//! Implementation of the `stackweave generate` command.
//!
//! Responsibility: turn CLI arguments and configured defaults into an
//! `OptionSet`, call the core compose service, and display results. No
//! composition logic lives here.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use tracing::{debug, info, instrument};

use stackweave_adapters::{BuiltinStore, LocalFilesystem};
use stackweave_core::{
    application::ComposeService,
    domain::{Bundle, DatabaseKind, EnvironmentMode, OptionSet},
    error::Context,
};

use crate::{
    cli::{Database, GenerateArgs, Mode},
    config::{AppConfig, Defaults},
    error::{CliError, CliResult},
    output::OutputManager,
};

/// Execute the `stackweave generate` command.
///
/// Dispatch sequence:
/// 1. Resolve the project name and the option set (flags over config)
/// 2. Confirm with the user unless `--yes`, `--quiet`, `--stdout` or `--dry-run`
/// 3. `--dry-run`: show the plan and target paths, write nothing
/// 4. `--stdout`: print the composed documents, write nothing
/// 5. Otherwise emit the four files, all-or-nothing
#[instrument(skip_all, fields(dir = %args.dir.display()))]
pub fn execute(args: GenerateArgs, config: AppConfig, output: OutputManager) -> CliResult<()> {
    // 1. Resolve options
    let project_name = resolve_project_name(args.name.as_deref(), &args.dir)?;
    let options = resolve_options(&args, &config.defaults, &project_name)?;
    debug!(options = %options, "Options resolved");

    // 2. Show configuration and confirm
    let interactive = !(output.is_quiet() || args.yes || args.stdout || args.dry_run);
    if interactive {
        show_configuration(&options, &args.dir, &output)?;
        if !confirm()? {
            return Err(CliError::Cancelled);
        }
    }

    let store = Box::new(BuiltinStore::with_builtin()?);
    let filesystem = Box::new(LocalFilesystem::new());
    let service = ComposeService::new(store, filesystem);

    // 3. Dry run: describe but do not write.
    if args.dry_run {
        let plan = service.plan(&options)?;
        // Composing surfaces catalog and consistency errors a real run would hit.
        service.compose(&options)?;

        output.info(&format!("Dry run: would compose '{}'", options.project_name()))?;
        output.header("Fragments")?;
        for fragment in &plan {
            output.print(&format!(
                "  {:<28} {:<26} {}",
                fragment.id,
                fragment.document.as_str(),
                fragment.applies_when
            ))?;
        }
        output.header("Files")?;
        for (_, path) in ComposeService::output_paths(&args.dir) {
            let note = if path.exists() {
                if args.force { " (overwrite)" } else { " (exists)" }
            } else {
                ""
            };
            output.print(&format!("  {}{note}", path.display()))?;
        }
        return Ok(());
    }

    let bundle = service.compose(&options)?;
    info!(fragments = bundle.fragment_ids().len(), "Bundle composed");

    // 4. Print instead of writing.
    if args.stdout {
        return print_bundle(&bundle, &output);
    }

    // 5. Emit
    if !output.is_json() {
        output.header(&format!("Writing '{}'...", options.project_name()))?;
    }
    let written = service.emit(&bundle, &args.dir, args.force)?;
    info!(files = written.len(), dir = %args.dir.display(), "Bundle written");

    if output.is_json() {
        let paths: Vec<String> = written.iter().map(|p| p.display().to_string()).collect();
        let json = serde_json::json!({ "project": options.project_name(), "written": paths });
        output.data(&json.to_string())?;
        return Ok(());
    }

    for path in &written {
        output.success(&format!("Wrote {}", path.display()))?;
    }

    if !output.is_quiet() {
        output.print("")?;
        output.print("Next steps:")?;
        output.print("  cp .env.example .env")?;
        output.print("  docker compose up --build")?;
    }

    Ok(())
}

// ── Option resolution ─────────────────────────────────────────────────────────

/// `--name` if given, otherwise the output directory's own name.
fn resolve_project_name(name: Option<&str>, dir: &Path) -> CliResult<String> {
    if let Some(name) = name {
        return Ok(name.to_string());
    }

    let absolute: PathBuf = if dir.is_absolute() {
        dir.to_path_buf()
    } else {
        std::env::current_dir()
            .map_err(|e| CliError::IoError {
                message: "failed to read the current directory".into(),
                source: e,
            })?
            .join(dir)
    };

    // `components` drops `.` so `./shop/.` still names `shop`.
    absolute
        .components()
        .filter_map(|c| match c {
            std::path::Component::Normal(s) => s.to_str(),
            _ => None,
        })
        .next_back()
        .map(str::to_ascii_lowercase)
        .ok_or_else(|| CliError::InvalidInput {
            message: format!(
                "cannot derive a project name from '{}', pass --name",
                dir.display()
            ),
            source: None,
        })
}

/// Merge flags over configured defaults and validate the result.
fn resolve_options(args: &GenerateArgs, defaults: &Defaults, name: &str) -> CliResult<OptionSet> {
    let database = match args.database {
        Some(db) => convert_database(db),
        None => DatabaseKind::from_str(&defaults.database)
            .map_err(|e| config_error("defaults.database", e))?,
    };
    let mode = match args.mode {
        Some(mode) => convert_mode(mode),
        None => EnvironmentMode::from_str(&defaults.mode)
            .map_err(|e| config_error("defaults.mode", e))?,
    };
    let cache = args.cache || (defaults.cache && !args.no_cache);

    let options = OptionSet::builder()
        .project_name(name)
        .database(database)
        .cache(cache)
        .mode(mode)
        .app_port(args.port.unwrap_or(defaults.app_port))
        .workers(args.workers.unwrap_or(defaults.workers))
        .python_version(args.python.as_deref().unwrap_or(&defaults.python_version))
        .build()
        .map_err(|e| CliError::Core(e.into()))?;
    Ok(options)
}

fn config_error(key: &str, err: impl std::error::Error + Send + Sync + 'static) -> CliError {
    CliError::ConfigError {
        message: format!("invalid value for '{key}': {err}"),
        source: Some(Box::new(err)),
    }
}

// ── Type conversions CLI → core ───────────────────────────────────────────────

fn convert_database(db: Database) -> DatabaseKind {
    match db {
        Database::Postgres => DatabaseKind::Postgres,
        Database::Mysql => DatabaseKind::Mysql,
        Database::Mongo => DatabaseKind::Mongo,
        Database::None => DatabaseKind::None,
    }
}

fn convert_mode(mode: Mode) -> EnvironmentMode {
    match mode {
        Mode::Development => EnvironmentMode::Development,
        Mode::Production => EnvironmentMode::Production,
    }
}

// ── UI helpers ────────────────────────────────────────────────────────────────

fn print_bundle(bundle: &Bundle, output: &OutputManager) -> CliResult<()> {
    if output.is_json() {
        let json = serde_json::to_string_pretty(bundle).context("serializing bundle")?;
        output.data(&json)?;
        return Ok(());
    }

    for (kind, text) in bundle.documents() {
        output.data(&format!("==> {} <==", kind.file_name()))?;
        output.data(text.trim_end_matches('\n'))?;
        output.data("")?;
    }
    Ok(())
}

fn show_configuration(options: &OptionSet, dir: &Path, out: &OutputManager) -> CliResult<()> {
    out.header("Configuration")?;
    out.print(&format!("  Project:   {}", options.project_name()))?;
    out.print(&format!("  Database:  {}", options.database_kind()))?;
    out.print(&format!(
        "  Cache:     {}",
        if options.cache_enabled() { "redis" } else { "none" }
    ))?;
    out.print(&format!("  Mode:      {}", options.environment_mode()))?;
    out.print(&format!("  Port:      {}", options.app_port()))?;
    if options.is_production() {
        out.print(&format!("  Workers:   {}", options.workers()))?;
    }
    out.print(&format!("  Python:    {}", options.python_version()))?;
    out.print(&format!("  Location:  {}", dir.display()))?;
    out.print("")?;
    Ok(())
}

fn confirm() -> CliResult<bool> {
    use std::io::{self, Write};

    print!("Continue? [Y/n] ");
    io::stdout().flush().map_err(|e| CliError::IoError {
        message: "failed to flush stdout".into(),
        source: e,
    })?;

    let mut input = String::new();
    io::stdin()
        .read_line(&mut input)
        .map_err(|e| CliError::IoError {
            message: "failed to read confirmation input".into(),
            source: e,
        })?;

    let input = input.trim().to_ascii_lowercase();
    Ok(input.is_empty() || input == "y" || input == "yes")
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;

    fn generate_args(argv: &[&str]) -> GenerateArgs {
        let mut full = vec!["stackweave", "generate"];
        full.extend_from_slice(argv);
        match Cli::parse_from(full).command {
            crate::cli::Commands::Generate(args) => args,
            other => panic!("expected generate, got {other:?}"),
        }
    }

    // ── resolve_project_name ──────────────────────────────────────────────────

    #[test]
    fn explicit_name_wins() {
        let name = resolve_project_name(Some("shop"), Path::new("/tmp/other")).unwrap();
        assert_eq!(name, "shop");
    }

    #[test]
    fn name_defaults_to_directory_leaf() {
        let name = resolve_project_name(None, Path::new("/srv/Orders/.")).unwrap();
        assert_eq!(name, "orders");
    }

    #[test]
    fn root_directory_has_no_name() {
        assert!(matches!(
            resolve_project_name(None, Path::new("/")),
            Err(CliError::InvalidInput { .. })
        ));
    }

    // ── resolve_options ───────────────────────────────────────────────────────

    #[test]
    fn flags_override_config_defaults() {
        let mut defaults = AppConfig::default().defaults;
        defaults.database = "mysql".into();
        defaults.cache = true;

        let args = generate_args(&["--db", "pg", "--no-cache", "--mode", "prod", "-p", "9000"]);
        let options = resolve_options(&args, &defaults, "shop").unwrap();
        assert_eq!(options.database_kind(), DatabaseKind::Postgres);
        assert!(!options.cache_enabled());
        assert_eq!(options.environment_mode(), EnvironmentMode::Production);
        assert_eq!(options.app_port(), 9000);
    }

    #[test]
    fn config_defaults_fill_missing_flags() {
        let mut defaults = AppConfig::default().defaults;
        defaults.database = "mongo".into();
        defaults.cache = true;
        defaults.workers = 2;

        let options = resolve_options(&generate_args(&[]), &defaults, "shop").unwrap();
        assert_eq!(options.database_kind(), DatabaseKind::Mongo);
        assert!(options.cache_enabled());
        assert_eq!(options.workers(), 2);
    }

    #[test]
    fn bad_configured_database_is_config_error() {
        let mut defaults = AppConfig::default().defaults;
        defaults.database = "oracle".into();

        let err = resolve_options(&generate_args(&[]), &defaults, "shop").unwrap_err();
        assert!(matches!(err, CliError::ConfigError { .. }));
        assert_eq!(err.exit_code(), 4);
    }

    #[test]
    fn port_colliding_with_database_is_user_error() {
        let defaults = AppConfig::default().defaults;
        let args = generate_args(&["--db", "postgres", "--port", "5432"]);

        let err = resolve_options(&args, &defaults, "shop").unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
