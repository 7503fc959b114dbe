//! Loader Registry
//!
//! Name-keyed set of loaders declared in a config store, answering "which
//! loader handles provider type T". The registry is a plain value: build it
//! from a directory when needed and pass it down.

use crate::error::StoreError;
use crate::model::{Library, Loader};
use crate::store;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Default, Clone)]
pub struct LoaderRegistry {
    loaders: BTreeMap<String, Arc<Loader>>,
}

impl LoaderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every loader found under `root`, ignoring providers
    pub fn from_dir(root: &Path) -> Result<Self, StoreError> {
        let mut registry = Self::new();
        store::scan(root, |_, lib| {
            if let Library::Loader(loader) = lib {
                registry.register(loader);
            }
        })?;
        Ok(registry)
    }

    /// Add a loader, replacing any loader of the same name
    pub fn register(&mut self, loader: Loader) -> Arc<Loader> {
        let loader = Arc::new(loader);
        if let Some(previous) = self
            .loaders
            .insert(loader.name().to_string(), Arc::clone(&loader))
        {
            if previous.path() != loader.path() {
                warn!(
                    loader = loader.name(),
                    previous = %previous.path().display(),
                    path = %loader.path().display(),
                    "Loader registered twice, replacing"
                );
            }
        } else {
            debug!(loader = loader.name(), "Registered loader");
        }
        loader
    }

    pub fn get(&self, name: &str) -> Option<Arc<Loader>> {
        self.loaders.get(name).cloned()
    }

    pub fn list(&self) -> impl Iterator<Item = &Arc<Loader>> {
        self.loaders.values()
    }

    pub fn len(&self) -> usize {
        self.loaders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loaders.is_empty()
    }
}
