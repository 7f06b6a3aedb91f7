//! CLI argument definitions using clap
//!
//! Commands:
//! - docspace serve [--config <path>] [--host <host>] [--port <port>]
//! - docspace check-schema --type <name> --file <path>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// docspace - A schema-driven document store over HTTP
#[derive(Parser, Debug)]
#[command(name = "docspace")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the HTTP server
    Serve {
        /// Path to configuration file (defaults apply when omitted)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Host to bind to, overriding the configuration file
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to, overriding the configuration file
        #[arg(long)]
        port: Option<u16>,
    },

    /// Validate a schema description offline and print the resulting descriptor
    CheckSchema {
        /// Type name to validate the schema under
        #[arg(long = "type")]
        type_name: String,

        /// Path to the schema description JSON file
        #[arg(long)]
        file: PathBuf,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
