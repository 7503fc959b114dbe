//! stateconf CLI Binary
//!
//! Command-line interface to the provider/loader config store.

use clap::Parser;
use stateconf::cli::{load_settings, Cli, RunContext};
use stateconf::logging::{init_logging, LoggingConfig};
use std::process;
use tracing::{debug, error};

fn main() {
    let cli = Cli::parse();

    let logging_config = build_logging_config(&cli);
    if let Err(e) = init_logging(Some(&logging_config)) {
        eprintln!("Failed to initialize logging: {}", e);
        process::exit(1);
    }

    let context = match RunContext::new(&cli) {
        Ok(ctx) => ctx,
        Err(e) => {
            error!("Error loading settings: {}", e);
            eprintln!("{}", e);
            process::exit(1);
        }
    };
    debug!(store = %context.settings().store_dir.display(), "Using config store");

    match context.execute(&cli.command) {
        Ok(output) => {
            if !output.is_empty() {
                println!("{}", output);
            }
        }
        Err(e) => {
            error!("Command failed: {}", e);
            eprintln!("{}", e);
            process::exit(1);
        }
    }
}

/// Logging configuration from settings, overridden by CLI flags
fn build_logging_config(cli: &Cli) -> LoggingConfig {
    let mut config = load_settings(cli)
        .map(|s| s.logging)
        .unwrap_or_default();

    if cli.verbose {
        config.level = "debug".to_string();
    }
    if let Some(ref level) = cli.log_level {
        config.level = level.clone();
    }
    if let Some(format) = cli.log_format {
        config.format = format;
    }
    config
}
