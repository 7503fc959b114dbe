//! Building entities from live modules
//!
//! Walks the namespace/property tree a provider module exposes and produces
//! the same [`Provider`] the text builder would produce for its config file.
//! Attribute flags are taken as reported: there is no behavior keyword on
//! this path, `DISCRETE` maps straight to the Subscribe bit.

use crate::model::{Access, Loader, Namespace, Property, Provider, INFO_TYPE};
use crate::module::{Attr, Branch, BranchIter, ChildNode, LoaderModule, ProviderModule, Variant};
use crate::path::absolute_path;
use crate::value::PropertyValue;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use tracing::{debug, warn};

impl From<Variant> for PropertyValue {
    fn from(v: Variant) -> Self {
        match v {
            Variant::Int(v) => PropertyValue::Int(v),
            Variant::UInt(v) => PropertyValue::UInt(v),
            Variant::Bool(v) => PropertyValue::Bool(v),
            Variant::Real(v) => PropertyValue::Real(v),
            Variant::Str(v) => PropertyValue::Str(v),
            Variant::Unknown(tag) => {
                debug!(tag, "Unknown variant tag, using empty string");
                PropertyValue::Str(String::new())
            }
        }
    }
}

impl From<Attr> for Access {
    fn from(attr: Attr) -> Self {
        let mut access = Access::empty();
        if attr.contains(Attr::DISCRETE) {
            access |= Access::SUBSCRIBE;
        }
        if attr.contains(Attr::WRITE) {
            access |= Access::WRITE;
        }
        if attr.contains(Attr::READ) {
            access |= Access::READ;
        }
        access
    }
}

fn property_from_node(module: &dyn ProviderModule, node: ChildNode) -> Property {
    let access = Access::from(module.getattr(node.id));
    let default = PropertyValue::from(module.default_value(node.id));
    Property::new(node.name, default, access)
}

fn namespace_from_node(module: &dyn ProviderModule, node: ChildNode) -> Namespace {
    let mut seen = HashSet::new();
    let mut properties = Vec::new();
    for child in BranchIter::new(module, Branch::Namespace(node.id)) {
        if !seen.insert(child.name.clone()) {
            warn!(namespace = %node.name, property = %child.name, "Duplicate property, keeping the first");
            continue;
        }
        properties.push(property_from_node(module, child));
    }
    Namespace::new(node.name, properties)
}

/// Describe a loaded provider module
///
/// `None` when no module is loaded. The info map is seeded with the
/// caller's provider type and overlaid with the module's own metadata.
pub fn provider_from_module(
    module: Option<&dyn ProviderModule>,
    path: &Path,
    provider_type: &str,
) -> Option<Provider> {
    let Some(module) = module else {
        warn!(path = %path.display(), "Provider is not loaded");
        return None;
    };

    let mut info = BTreeMap::from([(INFO_TYPE.to_string(), PropertyValue::from(provider_type))]);
    for (key, value) in module.info() {
        info.insert(key, PropertyValue::from(value));
    }

    let mut seen = HashSet::new();
    let mut namespaces = Vec::new();
    for node in BranchIter::new(module, Branch::Root) {
        if !seen.insert(node.name.clone()) {
            warn!(provider = module.name(), namespace = %node.name, "Duplicate namespace, keeping the first");
            continue;
        }
        namespaces.push(namespace_from_node(module, node));
    }

    Some(Provider::new(
        module.name(),
        absolute_path(path),
        info,
        namespaces,
    ))
}

/// Describe a loaded loader module, `None` when there is none
pub fn loader_from_module(module: Option<&dyn LoaderModule>, path: &Path) -> Option<Loader> {
    module.map(|loader| Loader::new(loader.name(), absolute_path(path)))
}
