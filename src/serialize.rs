//! Canonical textual form of entities
//!
//! Output is accepted back by the reader. Optional property flags are only
//! written when they differ from the defaults (discrete behavior, read-only
//! access).

use crate::model::{Access, Entity, Library, Loader, Namespace, Property, Provider};
use crate::value::quote;
use std::fmt;
use std::path::Path;

fn quote_path(path: &Path) -> String {
    quote(&path.to_string_lossy())
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\n    (prop {} {}", quote(self.name()), quote(&self.defval()))?;
        let access = self.access();
        if !access.contains(Access::SUBSCRIBE) {
            f.write_str(" :behavior continuous")?;
        }
        if access.contains(Access::WRITE) {
            if access.contains(Access::READ) {
                f.write_str(" :access rw")?;
            } else {
                f.write_str(" :access wonly")?;
            }
        }
        f.write_str(")")
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\n  (ns {}", quote(self.name()))?;
        for prop in self.properties() {
            write!(f, "{prop}")?;
        }
        f.write_str(")")
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "(provider {} {}",
            quote(self.name()),
            quote_path(self.path())
        )?;
        for (key, value) in self.info() {
            write!(f, " :{} {}", key, value.to_serialized_string())?;
        }
        for ns in self.namespaces() {
            write!(f, "{ns}")?;
        }
        f.write_str(")\n")
    }
}

impl fmt::Display for Loader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "(loader {} {})",
            quote(self.name()),
            quote_path(self.path())
        )
    }
}

impl fmt::Display for Library {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Library::Provider(p) => p.fmt(f),
            Library::Loader(l) => l.fmt(f),
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entity::Property(p) => p.fmt(f),
            Entity::Namespace(ns) => ns.fmt(f),
            Entity::Provider(p) => p.fmt(f),
            Entity::Loader(l) => l.fmt(f),
        }
    }
}
