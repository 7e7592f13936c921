//! Flags accepted by every `stackweave` subcommand, flattened into
//! [`super::Cli`].

use clap::Args;
use std::path::PathBuf;

/// Verbosity, colour, config file and output format.
#[derive(Debug, Args)]
pub struct GlobalArgs {
    /// Number of `-v` flags; see `logging::derive_level`.
    #[arg(
        short = 'v',
        long = "verbose",
        action = clap::ArgAction::Count,
        global = true,
        help = "Show more diagnostics on stderr (repeatable)",
        long_help = "Show more diagnostics on stderr. STACKWEAVE_LOG or RUST_LOG override this.
    -v      bundle composed, files written
    -vv     selected fragments and rendered identifiers
    -vvv    everything, including catalog loading"
    )]
    pub verbose: u8,

    /// Errors only, on both stdout and stderr.
    #[arg(
        short = 'q',
        long = "quiet",
        global = true,
        conflicts_with = "verbose",
        help = "Print errors only"
    )]
    pub quiet: bool,

    /// Plain output. Also set through `NO_COLOR`.
    #[arg(
        long = "no-color",
        global = true,
        env = "NO_COLOR",
        help = "Never colour output"
    )]
    pub no_color: bool,

    /// Read defaults from this file instead of the per-user config.toml.
    #[arg(
        short = 'c',
        long = "config",
        global = true,
        value_name = "FILE",
        help = "Use this config file"
    )]
    pub config: Option<PathBuf>,

    #[arg(
        long = "output-format",
        global = true,
        value_enum,
        default_value = "auto",
        help = "How results are printed"
    )]
    pub output_format: OutputFormat,
}

/// Rendering of command results on stdout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human on a terminal, plain when piped.
    #[default]
    Auto,
    /// Coloured, with headers.
    Human,
    /// Same text, no colour.
    Plain,
    /// One JSON document per command.
    Json,
}
