use std::path::PathBuf;

use clap::Parser;

/// Command-line options for the data-plane service.
#[derive(Debug, Parser)]
#[command(
    name = "data-service",
    about = "Data-plane service: tenant registry and reference plugins, ready for a transport to serve"
)]
pub struct Cli {
    /// Path to the static tenant config file (YAML).
    #[arg(long, env = "DATA_SERVICE_CONFIG")]
    pub config: PathBuf,

    /// Log level passed to the tracing env-filter, e.g. `info`, `data_core=debug`.
    #[arg(long, env = "DATA_SERVICE_LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}
