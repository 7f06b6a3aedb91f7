//! CLI module for docspace
//!
//! Provides command-line interface for:
//! - serve: Start the HTTP server
//! - check-schema: Validate a schema description offline

mod args;
mod commands;
mod errors;

pub use args::{Cli, Command};
pub use commands::{check_schema, resolve_config, run, run_command, serve};
pub use errors::{CliError, CliErrorCode, CliResult};
