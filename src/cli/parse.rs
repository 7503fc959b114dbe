//! CLI parse: clap types for stateconf. No behavior; definitions only.

use crate::logging::LogFormat;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// stateconf - registry of state providers and loaders
#[derive(Parser, Debug)]
#[command(name = "stateconf")]
#[command(about = "Maintain the config store of state providers and their loaders")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config store directory (overrides settings)
    #[arg(long)]
    pub store_dir: Option<PathBuf>,

    /// Settings file path (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format
    #[arg(long, value_enum)]
    pub log_format: Option<LogFormat>,
}

/// Rendering of `list`
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ListFormat {
    /// Table
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the config text describing a module or config file
    Dump {
        /// Provider module, loader module or config file
        path: PathBuf,
        /// Declared provider type, or "loader"
        #[arg(long = "type", value_name = "TYPE")]
        provider_type: Option<String>,
    },
    /// Write the config text of a module into the store
    Save {
        /// Provider module, loader module or config file
        path: PathBuf,
        /// Declared provider type, or "loader"
        #[arg(long = "type", value_name = "TYPE")]
        provider_type: Option<String>,
    },
    /// Remove store entries describing a module
    Rm {
        /// Module path the entries reference
        path: PathBuf,
    },
    /// List providers and loaders in the store
    List {
        #[arg(long, value_enum, default_value_t = ListFormat::Text)]
        format: ListFormat,
    },
    /// Follow store changes and print every added entry
    Watch,
}
