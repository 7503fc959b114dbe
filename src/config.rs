//! Configuration System
//!
//! Settings for the command-line tool, merged from (lowest to highest
//! precedence) built-in defaults, the user config file
//! (`<config dir>/stateconf/config.toml`), an explicitly given TOML file and
//! `STATECONF_*` environment variables (`__` separates nested keys, e.g.
//! `STATECONF_LOGGING__LEVEL=debug`).

use crate::error::StoreError;
use crate::logging::LoggingConfig;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File, FileFormat};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

const ENV_PREFIX: &str = "STATECONF";

/// Runtime settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Config store directory
    pub store_dir: PathBuf,

    /// Provider type assumed when none is given
    #[serde(default = "default_type")]
    pub default_type: String,

    /// Mask applied to property permission bits
    #[serde(default = "default_umask")]
    pub umask: u32,

    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_type() -> String {
    crate::model::DEFAULT_PROVIDER_TYPE.to_string()
}

fn default_umask() -> u32 {
    0o022
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "stateconf")
}

/// Store directory used when none is configured
pub fn default_store_dir() -> PathBuf {
    project_dirs()
        .map(|dirs| dirs.config_dir().join("registry"))
        .unwrap_or_else(|| PathBuf::from("registry"))
}

/// Location of the user config file, if the platform has a config dir
pub fn user_config_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join("config.toml"))
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            store_dir: default_store_dir(),
            default_type: default_type(),
            umask: default_umask(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<(), StoreError> {
        if self.store_dir.as_os_str().is_empty() {
            return Err(StoreError::Settings("Store directory cannot be empty".into()));
        }
        if self.default_type.is_empty() {
            return Err(StoreError::Settings("Default provider type cannot be empty".into()));
        }
        if self.umask > 0o777 {
            return Err(StoreError::Settings(format!(
                "Invalid umask {:o}",
                self.umask
            )));
        }
        Ok(())
    }
}

/// Builds [`Settings`] from the layered sources
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    file: Option<PathBuf>,
    user_file: bool,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            file: None,
            user_file: true,
        }
    }

    /// Read this TOML file on top of the user config; it must exist
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    /// Skip the user config file
    pub fn without_user_file(mut self) -> Self {
        self.user_file = false;
        self
    }

    fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, StoreError> {
        Ok(Config::builder()
            .set_default("store_dir", default_store_dir().to_string_lossy().to_string())?
            .set_default("default_type", default_type())?
            .set_default("umask", i64::from(default_umask()))?)
    }

    fn add_file(builder: ConfigBuilder<DefaultState>, path: &Path, required: bool) -> ConfigBuilder<DefaultState> {
        debug!(path = %path.display(), required, "Adding config file");
        builder.add_source(File::from(path).format(FileFormat::Toml).required(required))
    }

    pub fn load(&self) -> Result<Settings, StoreError> {
        let mut builder = Self::builder_with_defaults()?;
        if self.user_file {
            if let Some(path) = user_config_path() {
                builder = Self::add_file(builder, &path, false);
            }
        }
        if let Some(path) = &self.file {
            builder = Self::add_file(builder, path, true);
        }
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        );

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }
}
