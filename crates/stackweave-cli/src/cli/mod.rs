//! CLI argument definitions using the clap derive API.
//!
//! This module is the *only* place that knows about argument names, aliases,
//! help text, and value enums.  No business logic lives here.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

pub mod global;
pub use global::{GlobalArgs, OutputFormat};

// ── Top-level CLI ─────────────────────────────────────────────────────────────

/// Main CLI entry-point.
#[derive(Debug, Parser)]
#[command(
    name    = "stackweave",
    bin_name = "stackweave",
    version  = env!("CARGO_PKG_VERSION"),
    author   = env!("CARGO_PKG_AUTHORS"),
    about    = "\u{26a1} Container configuration that agrees with itself",
    long_about = "stackweave composes a Dockerfile, docker-compose.yml, .dockerignore \
                  and .env.example for a FastAPI service from a handful of choices, \
                  and checks that the four files agree with each other.",
    after_help = "EXAMPLES:\n\
        \x20 stackweave generate shop --db postgres --cache\n\
        \x20 stackweave generate api  --mode production --port 9000 --yes\n\
        \x20 stackweave check shop\n\
        \x20 stackweave catalog --document compose\n\
        \x20 stackweave completions bash > /usr/share/bash-completion/completions/stackweave",
    arg_required_else_help = true,
    subcommand_required    = true,
)]
pub struct Cli {
    /// Flags available on every subcommand.
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

// ── Subcommands ───────────────────────────────────────────────────────────────

/// All available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Compose the four documents and write them to a directory.
    #[command(
        visible_alias = "g",
        about = "Generate a consistent configuration bundle",
        after_help = "EXAMPLES:\n\
            \x20 stackweave generate shop --db postgres --cache\n\
            \x20 stackweave generate . --name shop --mode production --workers 8\n\
            \x20 stackweave generate shop --db mongo --dry-run\n\
            \x20 stackweave generate --name shop --stdout --output-format json"
    )]
    Generate(GenerateArgs),

    /// Validate documents already on disk.
    #[command(
        about = "Check that the documents in a directory agree",
        after_help = "EXAMPLES:\n\
            \x20 stackweave check\n\
            \x20 stackweave check ./shop --output-format json"
    )]
    Check(CheckArgs),

    /// List the fragments in the built-in catalog.
    #[command(
        visible_alias = "ls",
        about = "List catalog fragments",
        after_help = "EXAMPLES:\n\
            \x20 stackweave catalog\n\
            \x20 stackweave catalog --document env\n\
            \x20 stackweave catalog compose-app --format json"
    )]
    Catalog(CatalogArgs),

    /// Initialise a stackweave configuration file.
    #[command(
        about = "Initialise configuration",
        after_help = "EXAMPLES:\n\
            \x20 stackweave init                       # platform config dir\n\
            \x20 stackweave --config ./sw.toml init    # explicit file"
    )]
    Init(InitArgs),

    /// Generate shell completion scripts.
    #[command(
        about = "Generate shell completions",
        after_help = "EXAMPLES:\n\
            \x20 stackweave completions bash > ~/.local/share/bash-completion/completions/stackweave\n\
            \x20 stackweave completions zsh  > ~/.zfunc/_stackweave\n\
            \x20 stackweave completions fish > ~/.config/fish/completions/stackweave.fish"
    )]
    Completions(CompletionsArgs),

    /// Inspect the stackweave configuration.
    #[command(
        about = "Configuration management",
        subcommand,
        after_help = "EXAMPLES:\n\
            \x20 stackweave config get defaults.database\n\
            \x20 stackweave config list\n\
            \x20 stackweave config path"
    )]
    Config(ConfigCommands),
}

// ── generate ──────────────────────────────────────────────────────────────────

/// Arguments for `stackweave generate`.
#[derive(Debug, Args)]
pub struct GenerateArgs {
    /// Output directory.  Created if missing.
    #[arg(value_name = "DIR", default_value = ".", help = "Output directory")]
    pub dir: PathBuf,

    /// Project name.  Defaults to the output directory's name.
    #[arg(short = 'n', long = "name", value_name = "NAME", help = "Project name")]
    pub name: Option<String>,

    /// Database engine.
    #[arg(
        short = 'd',
        long = "db",
        value_name = "ENGINE",
        value_enum,
        help = "Database engine"
    )]
    pub database: Option<Database>,

    /// Add a cache service.
    #[arg(long = "cache", conflicts_with = "no_cache", help = "Add a redis cache")]
    pub cache: bool,

    /// Leave the cache out even if the configuration enables it.
    #[arg(long = "no-cache", help = "Do not add a cache")]
    pub no_cache: bool,

    /// Environment mode.
    #[arg(
        short = 'm',
        long = "mode",
        value_name = "MODE",
        value_enum,
        help = "Environment mode"
    )]
    pub mode: Option<Mode>,

    /// Port the primary service listens on.
    #[arg(short = 'p', long = "port", value_name = "PORT", help = "Application port")]
    pub port: Option<u16>,

    /// Worker processes in production.
    #[arg(short = 'w', long = "workers", value_name = "N", help = "Production worker count")]
    pub workers: Option<u8>,

    /// Python base image version.
    #[arg(long = "python", value_name = "VERSION", help = "Python version (MAJOR.MINOR)")]
    pub python: Option<String>,

    /// Skip the confirmation prompt.
    #[arg(
        short = 'y',
        long = "yes",
        help = "Skip confirmation and write immediately"
    )]
    pub yes: bool,

    /// Overwrite existing documents (destructive).
    #[arg(long = "force", help = "Overwrite existing files")]
    pub force: bool,

    /// List fragments and target files without composing or writing.
    #[arg(long = "dry-run", help = "Show what would be written without writing")]
    pub dry_run: bool,

    /// Print the documents instead of writing them.
    #[arg(long = "stdout", conflicts_with = "dry_run", help = "Print documents to stdout")]
    pub stdout: bool,
}

// ── check ─────────────────────────────────────────────────────────────────────

/// Arguments for `stackweave check`.
#[derive(Debug, Args)]
pub struct CheckArgs {
    /// Directory holding the four documents.
    #[arg(value_name = "DIR", default_value = ".", help = "Directory to check")]
    pub dir: PathBuf,
}

// ── catalog ───────────────────────────────────────────────────────────────────

/// Arguments for `stackweave catalog`.
#[derive(Debug, Args)]
pub struct CatalogArgs {
    /// Show one fragment in detail.
    #[arg(value_name = "ID", help = "Fragment id to show")]
    pub id: Option<String>,

    /// Only fragments contributing to this document.
    #[arg(
        short = 'D',
        long = "document",
        value_enum,
        help = "Filter by document"
    )]
    pub document: Option<Document>,

    /// Output format.
    #[arg(
        long = "format",
        value_enum,
        default_value = "table",
        help = "Output format"
    )]
    pub format: ListFormat,
}

/// Output format for the `catalog` command.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ListFormat {
    /// Human-readable table.
    Table,
    /// One id per line.
    List,
    /// JSON array.
    Json,
    /// CSV rows.
    Csv,
}

// ── init ──────────────────────────────────────────────────────────────────────

/// Arguments for `stackweave init`.
#[derive(Debug, Args)]
pub struct InitArgs {
    /// Overwrite an existing config file.
    #[arg(short = 'f', long = "force", help = "Overwrite existing configuration")]
    pub force: bool,
}

// ── completions ───────────────────────────────────────────────────────────────

/// Arguments for `stackweave completions`.
#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Target shell.
    #[arg(value_enum, help = "Shell to generate completions for")]
    pub shell: Shell,
}

/// Supported shells for completion generation.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

// ── config subcommands ────────────────────────────────────────────────────────

/// Subcommands for `stackweave config`.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Print the value of a configuration key.
    Get {
        /// Dotted key path, e.g. `defaults.database`.
        key: String,
    },
    /// Print all configuration values.
    List,
    /// Print the path to the active configuration file.
    Path,
}

// ── value enums ───────────────────────────────────────────────────────────────

/// Database engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "lowercase")]
pub enum Database {
    #[value(alias = "postgresql", alias = "pg")]
    Postgres,
    #[value(alias = "mariadb")]
    Mysql,
    #[value(alias = "mongodb")]
    Mongo,
    None,
}

impl std::fmt::Display for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Postgres => write!(f, "postgres"),
            Self::Mysql => write!(f, "mysql"),
            Self::Mongo => write!(f, "mongo"),
            Self::None => write!(f, "none"),
        }
    }
}

/// Environment modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "lowercase")]
pub enum Mode {
    #[value(alias = "dev")]
    Development,
    #[value(alias = "prod")]
    Production,
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
        }
    }
}

/// The four documents, by short name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "lowercase")]
pub enum Document {
    #[value(alias = "dockerfile", alias = "build")]
    Build,
    #[value(alias = "compose")]
    Orchestration,
    #[value(alias = "dockerignore")]
    Ignore,
    #[value(alias = "env-example")]
    Env,
}

// ── tests ─────────────────────────────────────────────────────────────────────
