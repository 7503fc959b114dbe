//! CLI route: run context and the single route table. Dispatches to the
//! pipeline, store and monitor, formats through presentation.

use crate::cli::parse::{Cli, Commands, ListFormat};
use crate::cli::presentation::{
    format_add_event, format_list_json, format_list_text, format_removed, ListEntry,
};
use crate::config::{ConfigLoader, Settings};
use crate::error::StoreError;
use crate::model::{Library, Loader, Provider};
use crate::module::memory::StaticHost;
use crate::module::ModuleHost;
use crate::monitor::{ConfigReceiver, Monitor};
use crate::pipeline;
use crate::store::ConfigStore;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

/// Receiver printing every forwarded entry on stdout
struct PrintReceiver;

impl ConfigReceiver for PrintReceiver {
    fn provider_add(&mut self, provider: Arc<Provider>) {
        info!(provider = provider.name(), "Provider added");
        println!("{}", format_add_event(&Library::Provider((*provider).clone())));
    }

    fn loader_add(&mut self, loader: Arc<Loader>) {
        info!(loader = loader.name(), "Loader added");
        println!("{}", format_add_event(&Library::Loader((*loader).clone())));
    }
}

/// Runtime context for CLI execution: settings plus the module host
pub struct RunContext {
    settings: Settings,
    host: Box<dyn ModuleHost>,
}

impl RunContext {
    /// Load settings for `cli` and use an empty module host
    pub fn new(cli: &Cli) -> Result<Self, StoreError> {
        let settings = load_settings(cli)?;
        Ok(Self::with_host(settings, Box::new(StaticHost::new())))
    }

    /// Context with an embedder-supplied module host
    pub fn with_host(settings: Settings, host: Box<dyn ModuleHost>) -> Self {
        Self { settings, host }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    fn store_dir(&self) -> &Path {
        &self.settings.store_dir
    }

    fn declared_type<'a>(&'a self, provider_type: &'a Option<String>) -> &'a str {
        provider_type
            .as_deref()
            .unwrap_or(&self.settings.default_type)
    }

    /// Execute a CLI command via the route table
    pub fn execute(&self, command: &Commands) -> Result<String, StoreError> {
        match command {
            Commands::Dump {
                path,
                provider_type,
            } => self.handle_dump(path, self.declared_type(provider_type)),
            Commands::Save {
                path,
                provider_type,
            } => self.handle_save(path, self.declared_type(provider_type)),
            Commands::Rm { path } => self.handle_rm(path),
            Commands::List { format } => self.handle_list(*format),
            Commands::Watch => self.handle_watch(),
        }
    }

    fn handle_dump(&self, path: &Path, declared_type: &str) -> Result<String, StoreError> {
        let mut out = Vec::new();
        match pipeline::dump(self.store_dir(), self.host.as_ref(), &mut out, path, declared_type)? {
            Some(_) => Ok(String::from_utf8_lossy(&out).trim_end().to_string()),
            None => Err(StoreError::Unrecognized(path.to_path_buf())),
        }
    }

    fn handle_save(&self, path: &Path, declared_type: &str) -> Result<String, StoreError> {
        match pipeline::save(self.store_dir(), self.host.as_ref(), path, declared_type)? {
            Some(cfg_path) => Ok(cfg_path.display().to_string()),
            None => Err(StoreError::Unrecognized(path.to_path_buf())),
        }
    }

    fn handle_rm(&self, path: &Path) -> Result<String, StoreError> {
        let removed = pipeline::rm(self.store_dir(), path)?;
        Ok(format_removed(path, &removed))
    }

    fn handle_list(&self, format: ListFormat) -> Result<String, StoreError> {
        let store = ConfigStore::open(self.store_dir())?;
        let mut entries = Vec::new();
        store.scan(|cfg_path, library| {
            entries.push(ListEntry {
                config: cfg_path.to_path_buf(),
                library,
            })
        })?;
        match format {
            ListFormat::Json => format_list_json(&entries, self.settings.umask),
            ListFormat::Text => Ok(format_list_text(&entries)),
        }
    }

    fn handle_watch(&self) -> Result<String, StoreError> {
        let mut monitor = Monitor::new(self.store_dir(), PrintReceiver)?;
        let stop = AtomicBool::new(false);
        monitor.watch(&stop)?;
        Ok(String::new())
    }
}

/// Settings from the layered config sources, with `--store-dir` on top
pub fn load_settings(cli: &Cli) -> Result<Settings, StoreError> {
    let mut loader = ConfigLoader::new();
    if let Some(path) = &cli.config {
        loader = loader.with_file(path);
    }
    let mut settings = loader.load()?;
    if let Some(dir) = &cli.store_dir {
        settings.store_dir = PathBuf::from(dir);
    }
    Ok(settings)
}
