//! CLI command implementations

use std::fs;
use std::path::Path;

use serde_json::Value;
use tracing_subscriber::EnvFilter;

use crate::http_server::{HttpServer, HttpServerConfig};
use crate::schema::{build_type, TypeDescriptor};

use super::args::Command;
use super::errors::{CliError, CliResult};

/// Parse arguments and run the selected command
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Serve { config, host, port } => {
            let config = resolve_config(config.as_deref(), host, port)?;
            serve(config)
        }
        Command::CheckSchema { type_name, file } => {
            let descriptor = check_schema(&type_name, &file)?;
            println!("{}", serde_json::to_string_pretty(&descriptor)?);
            Ok(())
        }
    }
}

/// Loads the config file (or defaults) and applies flag overrides
pub fn resolve_config(
    path: Option<&Path>,
    host: Option<String>,
    port: Option<u16>,
) -> CliResult<HttpServerConfig> {
    let mut config = match path {
        Some(path) => HttpServerConfig::load(path)?,
        None => HttpServerConfig::default(),
    };

    if let Some(host) = host {
        config.host = host;
    }
    if let Some(port) = port {
        config.port = port;
    }
    config.validate()?;

    Ok(config)
}

/// Start the HTTP server and block until it stops
pub fn serve(config: HttpServerConfig) -> CliResult<()> {
    init_tracing(&config.log_filter);

    match &config.data_dir {
        Some(dir) => tracing::info!(data_dir = %dir.display(), "persistent type registry enabled"),
        None => tracing::warn!("no data_dir configured, registered types are lost on restart"),
    }

    let server = HttpServer::with_config(config)
        .map_err(|e| CliError::boot_failed(format!("Failed to open type registry: {}", e)))?;

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::boot_failed(format!("Failed to create tokio runtime: {}", e)))?;

    rt.block_on(async {
        server
            .start()
            .await
            .map_err(|e| CliError::boot_failed(format!("HTTP server failed: {}", e)))
    })
}

/// Validate a schema description file without touching any registry
pub fn check_schema(type_name: &str, file: &Path) -> CliResult<TypeDescriptor> {
    let content = fs::read_to_string(file).map_err(|e| {
        CliError::io_error(format!("Failed to read {}: {}", file.display(), e))
    })?;
    let schema: Value = serde_json::from_str(&content)
        .map_err(|e| CliError::schema_error(format!("Invalid schema JSON: {}", e)))?;

    Ok(build_type(type_name, &schema)?)
}

/// RUST_LOG wins over the configured filter
fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    // A subscriber may already be installed (tests, embedding); keep it.
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
