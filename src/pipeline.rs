//! Dump, save and remove config entries
//!
//! `dump` works out what a path is and writes its canonical config text:
//! a provider module (loaded through the loader registered for its declared
//! type), a loader module, or an existing config file that is re-emitted.
//! `save` stores that text in the config store and touches the directory;
//! `rm` deletes every store file describing a module path.

use crate::error::StoreError;
use crate::introspect::{loader_from_module, provider_from_module};
use crate::model::{Library, DEFAULT_PROVIDER_TYPE};
use crate::module::ModuleHost;
use crate::path::{absolute_path, canonicalize_path};
use crate::registry::LoaderRegistry;
use crate::store::{self, is_config_file, ConfigName, ConfigStore};
use std::collections::BTreeSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Declared type asking to treat the path as a loader module
pub const LOADER_TYPE: &str = "loader";

/// Re-emit the libraries of a config file
///
/// A library without a module path takes the config file's own path.
fn dump_config_file(out: &mut dyn Write, path: &Path) -> Result<Option<ConfigName>, StoreError> {
    if !is_config_file(path) {
        warn!(path = %path.display(), "Not a config file either");
        return Ok(None);
    }
    let mut libs = Vec::new();
    if let Err(e) = store::load_file(path, &mut |cfg_path: &Path, lib: Library| {
        let lib = if lib.path().as_os_str().is_empty() {
            lib.with_path(cfg_path)
        } else {
            lib
        };
        libs.push(lib);
    }) {
        warn!(path = %path.display(), error = %e, "Can't dump config file");
        return Ok(None);
    }

    let mut name = None;
    for lib in &libs {
        write!(out, "{lib}")?;
        name = Some(ConfigName::from(lib));
    }
    Ok(name)
}

fn dump_loader(
    host: &dyn ModuleHost,
    out: &mut dyn Write,
    path: &Path,
) -> Result<Option<ConfigName>, StoreError> {
    let module = host.open_loader(path);
    match loader_from_module(module.as_deref(), path) {
        Some(loader) => {
            let lib = Library::Loader(loader);
            write!(out, "{lib}")?;
            Ok(Some(ConfigName::from(&lib)))
        }
        None => {
            info!(path = %path.display(), "Not a loader");
            dump_config_file(out, path)
        }
    }
}

fn dump_provider(
    store_dir: &Path,
    host: &dyn ModuleHost,
    out: &mut dyn Write,
    path: &Path,
    provider_type: &str,
) -> Result<Option<ConfigName>, StoreError> {
    debug!(path = %path.display(), provider_type, "Trying to dump provider");
    let registry = if store_dir.is_dir() {
        LoaderRegistry::from_dir(store_dir)?
    } else {
        LoaderRegistry::new()
    };

    let Some(loader) = registry.get(provider_type) else {
        if provider_type == DEFAULT_PROVIDER_TYPE {
            debug!("No default loader registered, trying to dump as a loader");
            return dump_loader(host, out, path);
        }
        let miss = StoreError::LookupMiss(provider_type.to_string());
        warn!(path = %path.display(), "{}", miss);
        return Ok(None);
    };

    let module = host
        .open_loader(loader.path())
        .and_then(|loader| loader.load(path));
    match provider_from_module(module.as_deref(), path, provider_type) {
        Some(provider) => {
            let lib = Library::Provider(provider);
            write!(out, "{lib}")?;
            Ok(Some(ConfigName::from(&lib)))
        }
        None => {
            debug!(path = %path.display(), "Not a provider, trying loader");
            dump_loader(host, out, path)
        }
    }
}

/// Write the config text describing `path` to `out`
///
/// Returns the config name of the dumped entry, `None` when `path` is
/// neither a module the host can introspect nor a config file.
pub fn dump(
    store_dir: &Path,
    host: &dyn ModuleHost,
    out: &mut dyn Write,
    path: &Path,
    declared_type: &str,
) -> Result<Option<ConfigName>, StoreError> {
    let path = canonicalize_path(path)?;
    if declared_type == LOADER_TYPE {
        debug!(path = %path.display(), "Dumping loader");
        return dump_loader(host, out, &path);
    }
    dump_provider(store_dir, host, out, &path, declared_type)
}

/// Dump `path` into the store as `<kind>-<name>.conf`
///
/// Returns the written file, `None` (and no side effects) when nothing
/// could be dumped.
pub fn save(
    store_dir: &Path,
    host: &dyn ModuleHost,
    path: &Path,
    declared_type: &str,
) -> Result<Option<PathBuf>, StoreError> {
    let mut buf = Vec::new();
    let Some(name) = dump(store_dir, host, &mut buf, path, declared_type)? else {
        warn!(path = %path.display(), "Can't retrieve information");
        return Ok(None);
    };

    let mut store = ConfigStore::open(store_dir)?;
    let cfg_path = store.write(&name, &buf)?;
    store.touch()?;
    info!(config = %cfg_path.display(), "Saved {}", name);
    Ok(Some(cfg_path))
}

/// Remove every store file whose module path is `path`
///
/// A store directory that does not exist holds nothing to remove and is
/// left uncreated.
pub fn rm(store_dir: &Path, path: &Path) -> Result<Vec<PathBuf>, StoreError> {
    if !store_dir.is_dir() {
        debug!(store = %store_dir.display(), "No config store, nothing to remove");
        return Ok(Vec::new());
    }
    let full_path = absolute_path(path);
    let mut store = ConfigStore::open(store_dir)?;

    let mut matching = BTreeSet::new();
    store.scan(|cfg_path, lib| {
        if absolute_path(lib.path()) == full_path {
            matching.insert(cfg_path.to_path_buf());
        }
    })?;

    let mut removed = Vec::new();
    for cfg_path in matching {
        if !cfg_path.exists() {
            continue;
        }
        store.remove(&cfg_path)?;
        info!(config = %cfg_path.display(), "Removed");
        removed.push(cfg_path);
    }
    Ok(removed)
}
