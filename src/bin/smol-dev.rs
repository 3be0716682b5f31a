//! smol-dev CLI Binary
//!
//! Command-line interface for the smol-dev generation pipeline.

use clap::Parser;
use smol_dev::cli::{Cli, RunContext};
use smol_dev::config::ConfigLoader;
use smol_dev::logging::{init_logging, LoggingConfig};
use std::path::Path;
use std::process;
use tracing::{error, info};

fn main() {
    let cli = Cli::parse();

    let logging_config = build_logging_config(&cli);
    if let Err(e) = init_logging(Some(&logging_config)) {
        eprintln!("Failed to initialize logging: {}", e);
        process::exit(1);
    }

    info!("smol-dev starting");

    let context = match RunContext::new(cli.config.clone(), cli.verbose, cli.debug, cli.quiet) {
        Ok(ctx) => ctx,
        Err(e) => {
            error!("Error loading configuration: {}", e);
            eprintln!("{}", smol_dev::cli::map_error(&e));
            process::exit(1);
        }
    };

    match context.execute(&cli.command) {
        Ok(output) => {
            info!("Command completed successfully");
            println!("{}", output);
        }
        Err(e) => {
            error!("Command failed: {}", e);
            eprintln!("{}", smol_dev::cli::map_error(&e));
            process::exit(1);
        }
    }
}

/// Build logging configuration from CLI args and config file.
/// Precedence: CLI flags override config file override defaults.
fn build_logging_config(cli: &Cli) -> LoggingConfig {
    let mut config = match cli.config {
        Some(ref config_path) => ConfigLoader::load_from_file(config_path)
            .ok()
            .map(|c| c.logging)
            .unwrap_or_default(),
        None => ConfigLoader::load(Path::new("."))
            .ok()
            .map(|c| c.logging)
            .unwrap_or_default(),
    };

    if cli.verbose || cli.debug {
        config.level = "debug".to_string();
    }
    if let Some(ref level) = cli.log_level {
        config.level = level.clone();
    }
    if cli.quiet {
        config.level = "off".to_string();
    }
    if let Some(ref format) = cli.log_format {
        config.format = format.clone();
    }
    if let Some(ref output) = cli.log_output {
        config.output = output.clone();
    }
    if let Some(ref file) = cli.log_file {
        config.file = file.clone();
        if cli.log_output.is_none() {
            config.output = "file".to_string();
        }
    }

    config
}
