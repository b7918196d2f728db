//! CRM Console
//!
//! Schema-driven record forms, result tables and search panels for the CRM
//! admin console.
//!
//! This is the main entry point for the command-line front end.

use clap::Parser;
use crm_cli::{Cli, ConsoleConfig};
use std::process::ExitCode;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let config = ConsoleConfig::load(&cli.config)?;

    // Initialize logging
    FmtSubscriber::builder()
        .with_env_filter(log_filter(cli.verbose, &config))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
    tracing::debug!(version = crm_cli::VERSION, "crm-console starting");

    crm_cli::run(&cli, &config)
}

/// `-v` flags win over `RUST_LOG`, which wins over the config file
fn log_filter(verbose: u8, config: &ConsoleConfig) -> EnvFilter {
    match verbose {
        0 => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    }
}
