//! Diagnostics setup
//!
//! Every skip, stale entry and lookup miss is reported through `tracing`.
//! [`init_logging`] installs the global subscriber described by a
//! [`LoggingConfig`]; the environment can override it:
//!
//! - `STATECONF_LOG`: full filter directive, e.g. `stateconf::store=debug`
//! - `STATECONF_LOG_FORMAT`: `text` or `json`
//! - `STATECONF_LOG_OUTPUT`: `stderr`, `stdout` or `file`

use crate::error::StoreError;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

const ENV_FILTER: &str = "STATECONF_LOG";
const ENV_FORMAT: &str = "STATECONF_LOG_FORMAT";
const ENV_OUTPUT: &str = "STATECONF_LOG_OUTPUT";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Stderr,
    Stdout,
    File,
}

/// Subscriber settings, the `[logging]` table of the settings file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Base level: trace, debug, info, warn, error or off
    pub level: String,
    pub format: LogFormat,
    pub output: LogOutput,
    /// Log file, used when `output` is `file`
    pub file: PathBuf,
    /// ANSI colors for text output on a terminal stream
    pub color: bool,
    /// Extra per-target levels, e.g. `stateconf::monitor = "debug"`
    pub modules: BTreeMap<String, String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: LogFormat::Text,
            output: LogOutput::Stderr,
            file: PathBuf::from("stateconf.log"),
            color: true,
            modules: BTreeMap::new(),
        }
    }
}

/// Parse a `ValueEnum` from an environment variable, if it is set
fn env_choice<T: ValueEnum>(var: &str) -> Result<Option<T>, StoreError> {
    match std::env::var(var) {
        Ok(raw) => T::from_str(&raw, true)
            .map(Some)
            .map_err(|e| StoreError::Settings(format!("{var}: {e}"))),
        Err(_) => Ok(None),
    }
}

fn build_filter(config: &LoggingConfig) -> Result<EnvFilter, StoreError> {
    if let Ok(filter) = EnvFilter::try_from_env(ENV_FILTER) {
        return Ok(filter);
    }
    let mut filter = EnvFilter::try_new(&config.level)
        .map_err(|e| StoreError::Settings(format!("Invalid log level {}: {e}", config.level)))?;
    for (target, level) in &config.modules {
        let directive = format!("{target}={level}")
            .parse()
            .map_err(|e| StoreError::Settings(format!("Invalid log directive for {target}: {e}")))?;
        filter = filter.add_directive(directive);
    }
    Ok(filter)
}

fn build_writer(output: LogOutput, config: &LoggingConfig) -> Result<BoxMakeWriter, StoreError> {
    Ok(match output {
        LogOutput::Stderr => BoxMakeWriter::new(std::io::stderr),
        LogOutput::Stdout => BoxMakeWriter::new(std::io::stdout),
        LogOutput::File => {
            if let Some(parent) = config.file.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&config.file)?;
            BoxMakeWriter::new(Arc::new(file))
        }
    })
}

/// Install the global subscriber
///
/// Fails on an invalid filter or environment override, when the log file
/// can't be opened, or when a subscriber is already installed.
pub fn init_logging(config: Option<&LoggingConfig>) -> Result<(), StoreError> {
    let defaults = LoggingConfig::default();
    let config = config.unwrap_or(&defaults);

    let filter = build_filter(config)?;
    let format = env_choice(ENV_FORMAT)?.unwrap_or(config.format);
    let output = env_choice(ENV_OUTPUT)?.unwrap_or(config.output);
    let writer = build_writer(output, config)?;

    let registry = Registry::default().with(filter);
    let installed = match format {
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_writer(writer),
            )
            .try_init(),
        LogFormat::Text => registry
            .with(
                fmt::layer()
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_ansi(config.color && output != LogOutput::File)
                    .with_writer(writer),
            )
            .try_init(),
    };
    installed.map_err(|e| StoreError::Settings(format!("Failed to install logger: {e}")))
}
