//! One module per subcommand. Each exposes an `execute` entry point called
//! from `main::run`.

pub mod catalog;
pub mod check;
pub mod completions;
pub mod config;
pub mod generate;
pub mod init;
