//! In-process modules
//!
//! Statically linked providers and loaders, addressed by the path they would
//! have on disk. Cursor acquisition is counted so callers can check that
//! every cursor handed out was given back.

use super::{
    Attr, Branch, ChildNode, Cursor, LoaderModule, ModuleHost, NodeId, ProviderModule, Variant,
};
use crate::path::absolute_path;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct MemoryProperty {
    name: String,
    default: Variant,
    attr: Attr,
}

impl MemoryProperty {
    pub fn new(name: impl Into<String>, default: Variant, attr: Attr) -> Self {
        Self {
            name: name.into(),
            default,
            attr,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MemoryNamespace {
    name: String,
    properties: Vec<MemoryProperty>,
}

impl MemoryNamespace {
    pub fn new(name: impl Into<String>, properties: Vec<MemoryProperty>) -> Self {
        Self {
            name: name.into(),
            properties,
        }
    }
}

/// Provider module held in memory
///
/// Namespace ids are their index; property ids number all properties of the
/// provider in declaration order.
#[derive(Debug, Default)]
pub struct MemoryProvider {
    name: String,
    info: Vec<(String, Variant)>,
    namespaces: Vec<MemoryNamespace>,
    open: AtomicUsize,
}

impl MemoryProvider {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_info(mut self, key: impl Into<String>, value: Variant) -> Self {
        self.info.push((key.into(), value));
        self
    }

    pub fn with_namespace(mut self, ns: MemoryNamespace) -> Self {
        self.namespaces.push(ns);
        self
    }

    /// Cursors handed out and not yet released
    pub fn open_cursors(&self) -> usize {
        self.open.load(Ordering::SeqCst)
    }

    fn first_property_id(&self, ns: NodeId) -> NodeId {
        self.namespaces[..ns.min(self.namespaces.len())]
            .iter()
            .map(|ns| ns.properties.len())
            .sum()
    }

    fn property(&self, id: NodeId) -> Option<&MemoryProperty> {
        self.namespaces.iter().flat_map(|ns| &ns.properties).nth(id)
    }
}

impl ProviderModule for MemoryProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn info(&self) -> Vec<(String, Variant)> {
        self.info.clone()
    }

    fn first(&self, _branch: Branch) -> Cursor {
        self.open.fetch_add(1, Ordering::SeqCst);
        Cursor::new(0)
    }

    fn get(&self, branch: Branch, cursor: &Cursor) -> Option<ChildNode> {
        let pos = usize::try_from(cursor.raw()).ok()?;
        match branch {
            Branch::Root => self.namespaces.get(pos).map(|ns| ChildNode {
                id: pos,
                name: ns.name.clone(),
            }),
            Branch::Namespace(ns) => {
                let prop = self.namespaces.get(ns)?.properties.get(pos)?;
                Some(ChildNode {
                    id: self.first_property_id(ns) + pos,
                    name: prop.name.clone(),
                })
            }
        }
    }

    fn next(&self, _branch: Branch, cursor: &mut Cursor) {
        *cursor = Cursor::new(cursor.raw() + 1);
    }

    fn release(&self, _branch: Branch, _cursor: Cursor) {
        self.open.fetch_sub(1, Ordering::SeqCst);
    }

    fn getattr(&self, property: NodeId) -> Attr {
        self.property(property).map(|p| p.attr).unwrap_or_default()
    }

    fn default_value(&self, property: NodeId) -> Variant {
        self.property(property)
            .map(|p| p.default.clone())
            .unwrap_or(Variant::Unknown(0))
    }
}

/// Loader module resolving provider paths to in-memory providers
pub struct MemoryLoader {
    name: String,
    providers: HashMap<PathBuf, Arc<MemoryProvider>>,
}

impl MemoryLoader {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            providers: HashMap::new(),
        }
    }

    /// Serve `provider` when `path` is loaded
    pub fn with_provider(mut self, path: &Path, provider: Arc<MemoryProvider>) -> Self {
        self.providers.insert(absolute_path(path), provider);
        self
    }
}

impl LoaderModule for MemoryLoader {
    fn name(&self) -> &str {
        &self.name
    }

    fn load(&self, path: &Path) -> Option<Box<dyn ProviderModule>> {
        let provider = self.providers.get(&absolute_path(path))?;
        Some(Box::new(Arc::clone(provider)))
    }
}

/// Host answering `open_loader` from a fixed table
#[derive(Default)]
pub struct StaticHost {
    loaders: HashMap<PathBuf, Arc<dyn LoaderModule>>,
}

impl StaticHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_loader(mut self, path: &Path, loader: Arc<dyn LoaderModule>) -> Self {
        self.loaders.insert(absolute_path(path), loader);
        self
    }
}

impl ModuleHost for StaticHost {
    fn open_loader(&self, path: &Path) -> Option<Arc<dyn LoaderModule>> {
        self.loaders.get(&absolute_path(path)).cloned()
    }
}
