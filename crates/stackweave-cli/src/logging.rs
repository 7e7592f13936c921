//! Diagnostics for the `stackweave` binary.
//!
//! The core and adapter crates emit `tracing` events (fragment selection,
//! rendered identifiers, each emitted file); this module decides which of
//! them reach stderr. Nothing outside `main` installs a subscriber.
//!
//! Filter source, first match wins:
//!
//! 1. `STACKWEAVE_LOG`, e.g. `STACKWEAVE_LOG=stackweave_core=trace`
//! 2. `RUST_LOG`
//! 3. `--quiet` (errors only) or the `-v` count: warn, info, debug, trace

use std::io::IsTerminal as _;

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{GlobalArgs, OutputFormat};

/// Variable read before `RUST_LOG`.
const LOG_ENV: &str = "STACKWEAVE_LOG";

/// Install the stderr subscriber for this process.
///
/// Fails if a subscriber is already registered.
pub fn init_logging(args: &GlobalArgs) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(filter_directives(derive_level(args))));

    // Colour only when a person is watching stderr.
    let use_ansi = !args.no_color && std::io::stderr().is_terminal();

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_file(false)
        .with_line_number(false)
        .with_ansi(use_ansi)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("cannot install log subscriber: {e}"))?;

    Ok(())
}

/// One directive per crate of the workspace, all at `level`.
fn filter_directives(level: &str) -> String {
    format!("stackweave={level},stackweave_core={level},stackweave_adapters={level}")
}

/// `--quiet` beats any number of `-v`.
fn derive_level(args: &GlobalArgs) -> &'static str {
    if args.quiet {
        return "error";
    }
    match args.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::GlobalArgs;

    fn args_with(verbose: u8, quiet: bool) -> GlobalArgs {
        GlobalArgs {
            verbose,
            quiet,
            no_color: true,
            config: None,
            output_format: OutputFormat::Auto,
        }
    }

    #[test]
    fn level_quiet() {
        assert_eq!(derive_level(&args_with(0, true)), "error");
    }

    #[test]
    fn level_default() {
        assert_eq!(derive_level(&args_with(0, false)), "warn");
    }

    #[test]
    fn level_verbose_one() {
        assert_eq!(derive_level(&args_with(1, false)), "info");
    }

    #[test]
    fn level_verbose_two() {
        assert_eq!(derive_level(&args_with(2, false)), "debug");
    }

    #[test]
    fn level_verbose_three_plus() {
        assert_eq!(derive_level(&args_with(3, false)), "trace");
        assert_eq!(derive_level(&args_with(10, false)), "trace");
    }

    #[test]
    fn quiet_overrides_verbose() {
        assert_eq!(derive_level(&args_with(3, true)), "error");
    }

    #[test]
    fn directives_cover_every_crate() {
        let d = filter_directives("debug");
        assert!(d.contains("stackweave=debug"));
        assert!(d.contains("stackweave_core=debug"));
        assert!(d.contains("stackweave_adapters=debug"));
    }
}
