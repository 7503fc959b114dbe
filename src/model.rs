//! Entity model: properties, namespaces, providers and loaders.
//!
//! Entities are built once (by the text builder or by introspection) and are
//! never mutated afterwards. Namespaces own their properties and providers own
//! their namespaces; consumers receive providers and loaders as shared
//! snapshots.

use crate::value::PropertyValue;
use bitflags::bitflags;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

/// Provider info key naming the loader type that handles it
pub const INFO_TYPE: &str = "type";

/// Loader type used when a provider does not declare one
pub const DEFAULT_PROVIDER_TYPE: &str = "default";

bitflags! {
    /// Property access flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Access: u32 {
        const READ = 1;
        const WRITE = 2;
        /// Changes are pushed as discrete notifications
        const SUBSCRIBE = 4;
    }
}

/// A named, access-flagged declaration of one piece of state
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    name: String,
    default: PropertyValue,
    access: Access,
}

impl Property {
    pub fn new(name: impl Into<String>, default: PropertyValue, access: Access) -> Self {
        Self {
            name: name.into(),
            default,
            access,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn default_value(&self) -> &PropertyValue {
        &self.default
    }

    /// Default value in its textual form
    pub fn defval(&self) -> String {
        self.default.to_display_string()
    }

    pub fn access(&self) -> Access {
        self.access
    }

    /// POSIX permission bits derived from the access flags, minus `umask`
    pub fn mode(&self, umask: u32) -> u32 {
        let mut res = 0;
        if self.access.contains(Access::READ) {
            res |= 0o444;
        }
        if self.access.contains(Access::WRITE) {
            res |= 0o222;
        }
        res & !umask
    }
}

/// Named group of properties inside a provider
#[derive(Debug, Clone, PartialEq)]
pub struct Namespace {
    name: String,
    properties: Vec<Property>,
}

impl Namespace {
    pub fn new(name: impl Into<String>, properties: Vec<Property>) -> Self {
        Self {
            name: name.into(),
            properties,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }
}

/// Description of a state provider module
#[derive(Debug, Clone, PartialEq)]
pub struct Provider {
    name: String,
    path: PathBuf,
    mtime: u64,
    info: BTreeMap<String, PropertyValue>,
    namespaces: Vec<Namespace>,
}

/// Modification time of `path` in seconds since the epoch, 0 if it is missing
fn module_mtime(path: &Path) -> u64 {
    std::fs::metadata(path)
        .and_then(|m| m.modified())
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

impl Provider {
    pub fn new(
        name: impl Into<String>,
        path: impl Into<PathBuf>,
        info: BTreeMap<String, PropertyValue>,
        namespaces: Vec<Namespace>,
    ) -> Self {
        let path = path.into();
        Self {
            name: name.into(),
            mtime: module_mtime(&path),
            path,
            info,
            namespaces,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn mtime(&self) -> u64 {
        self.mtime
    }

    pub fn info(&self) -> &BTreeMap<String, PropertyValue> {
        &self.info
    }

    /// Loader type handling this provider
    pub fn provider_type(&self) -> String {
        self.info
            .get(INFO_TYPE)
            .map(PropertyValue::to_display_string)
            .unwrap_or_else(|| DEFAULT_PROVIDER_TYPE.to_string())
    }

    pub fn namespaces(&self) -> &[Namespace] {
        &self.namespaces
    }

    pub fn namespace(&self, name: &str) -> Option<&Namespace> {
        self.namespaces.iter().find(|ns| ns.name == name)
    }

    /// Same provider backed by a different module path
    pub fn with_path(self, path: impl Into<PathBuf>) -> Self {
        Self::new(self.name, path, self.info, self.namespaces)
    }
}

/// Description of an adapter able to load providers of one type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Loader {
    name: String,
    path: PathBuf,
}

impl Loader {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn with_path(self, path: impl Into<PathBuf>) -> Self {
        Self::new(self.name, path)
    }
}

/// Kind of a library entity, also the config file name prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LibraryKind {
    Provider,
    Loader,
}

impl LibraryKind {
    pub fn prefix(self) -> &'static str {
        match self {
            LibraryKind::Provider => "provider",
            LibraryKind::Loader => "loader",
        }
    }

    pub fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "provider" => Some(LibraryKind::Provider),
            "loader" => Some(LibraryKind::Loader),
            _ => None,
        }
    }
}

/// Either a provider or a loader
#[derive(Debug, Clone, PartialEq)]
pub enum Library {
    Provider(Provider),
    Loader(Loader),
}

impl Library {
    pub fn kind(&self) -> LibraryKind {
        match self {
            Library::Provider(_) => LibraryKind::Provider,
            Library::Loader(_) => LibraryKind::Loader,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Library::Provider(p) => p.name(),
            Library::Loader(l) => l.name(),
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            Library::Provider(p) => p.path(),
            Library::Loader(l) => l.path(),
        }
    }

    pub fn with_path(self, path: impl Into<PathBuf>) -> Self {
        match self {
            Library::Provider(p) => Library::Provider(p.with_path(path)),
            Library::Loader(l) => Library::Loader(l.with_path(path)),
        }
    }
}

/// Any entity a record constructor can produce
#[derive(Debug, Clone, PartialEq)]
pub enum Entity {
    Property(Property),
    Namespace(Namespace),
    Provider(Provider),
    Loader(Loader),
}

impl Entity {
    pub fn name(&self) -> &str {
        match self {
            Entity::Property(p) => p.name(),
            Entity::Namespace(ns) => ns.name(),
            Entity::Provider(p) => p.name(),
            Entity::Loader(l) => l.name(),
        }
    }

    /// Record form name producing this entity
    pub fn record(&self) -> &'static str {
        match self {
            Entity::Property(_) => "prop",
            Entity::Namespace(_) => "ns",
            Entity::Provider(_) => "provider",
            Entity::Loader(_) => "loader",
        }
    }

    /// Top-level library, or the entity back if it is only a building block
    pub fn into_library(self) -> Result<Library, Entity> {
        match self {
            Entity::Provider(p) => Ok(Library::Provider(p)),
            Entity::Loader(l) => Ok(Library::Loader(l)),
            other => Err(other),
        }
    }
}

impl From<Library> for Entity {
    fn from(lib: Library) -> Self {
        match lib {
            Library::Provider(p) => Entity::Provider(p),
            Library::Loader(l) => Entity::Loader(l),
        }
    }
}
