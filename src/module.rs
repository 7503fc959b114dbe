//! Live Module Contract
//!
//! Abstracts over loaded provider and loader modules. A provider module
//! exposes a root node (name plus flat metadata) and two levels of branches:
//! the root branch lists namespaces, each namespace branch lists properties.
//! Branches are walked with a first/next/release cursor protocol; callers
//! outside this module only ever see [`BranchIter`], which releases its
//! cursor when dropped.
//!
//! How modules are located and opened is up to the [`ModuleHost`]
//! implementation. [`memory::StaticHost`] keeps modules in process.

use bitflags::bitflags;
use std::path::Path;
use std::sync::Arc;

pub mod memory;

/// Identifier of a node inside one module
pub type NodeId = usize;

bitflags! {
    /// Attribute flags reported by a module for a property node
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Attr: u32 {
        const READ = 1;
        const WRITE = 2;
        /// Property changes are pushed to subscribers
        const DISCRETE = 4;
    }
}

/// Typed value as reported by a module
#[derive(Debug, Clone, PartialEq)]
pub enum Variant {
    Int(i64),
    UInt(u64),
    Bool(bool),
    Real(f64),
    Str(String),
    /// Tag the module reported but this crate does not know
    Unknown(u32),
}

/// Branch of the module tree to iterate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Branch {
    /// Namespaces of the provider
    Root,
    /// Properties of one namespace
    Namespace(NodeId),
}

/// Node reached through a branch cursor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildNode {
    pub id: NodeId,
    pub name: String,
}

/// Opaque branch cursor handed out by a module
#[derive(Debug, PartialEq, Eq)]
pub struct Cursor(u64);

impl Cursor {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// A loaded provider module
pub trait ProviderModule {
    /// Provider name from the root node
    fn name(&self) -> &str;

    /// Root node metadata, in module order
    fn info(&self) -> Vec<(String, Variant)>;

    /// Open a cursor positioned on the first child of `branch`
    fn first(&self, branch: Branch) -> Cursor;

    /// Child under the cursor, `None` once the branch is exhausted
    fn get(&self, branch: Branch, cursor: &Cursor) -> Option<ChildNode>;

    /// Advance the cursor
    fn next(&self, branch: Branch, cursor: &mut Cursor);

    /// Give the cursor back to the module
    fn release(&self, branch: Branch, cursor: Cursor);

    /// Attribute flags of a property node
    fn getattr(&self, property: NodeId) -> Attr;

    /// Typed default value of a property node
    fn default_value(&self, property: NodeId) -> Variant;
}

impl<T: ProviderModule + ?Sized> ProviderModule for Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn info(&self) -> Vec<(String, Variant)> {
        (**self).info()
    }

    fn first(&self, branch: Branch) -> Cursor {
        (**self).first(branch)
    }

    fn get(&self, branch: Branch, cursor: &Cursor) -> Option<ChildNode> {
        (**self).get(branch, cursor)
    }

    fn next(&self, branch: Branch, cursor: &mut Cursor) {
        (**self).next(branch, cursor)
    }

    fn release(&self, branch: Branch, cursor: Cursor) {
        (**self).release(branch, cursor)
    }

    fn getattr(&self, property: NodeId) -> Attr {
        (**self).getattr(property)
    }

    fn default_value(&self, property: NodeId) -> Variant {
        (**self).default_value(property)
    }
}

/// A loaded loader module
pub trait LoaderModule {
    /// Provider type this loader handles
    fn name(&self) -> &str;

    /// Load `path` as a provider module
    fn load(&self, path: &Path) -> Option<Box<dyn ProviderModule>>;
}

/// Opens loader modules by path
pub trait ModuleHost {
    /// Open `path` as a loader module, `None` if it is not one
    fn open_loader(&self, path: &Path) -> Option<Arc<dyn LoaderModule>>;
}

/// Scoped iteration over one branch of a provider module
///
/// The cursor is released exactly once: on exhaustion, or on drop if
/// iteration stops early.
pub struct BranchIter<'a> {
    module: &'a dyn ProviderModule,
    branch: Branch,
    cursor: Option<Cursor>,
}

impl<'a> BranchIter<'a> {
    pub fn new(module: &'a dyn ProviderModule, branch: Branch) -> Self {
        Self {
            cursor: Some(module.first(branch)),
            module,
            branch,
        }
    }

    fn close(&mut self) {
        if let Some(cursor) = self.cursor.take() {
            self.module.release(self.branch, cursor);
        }
    }
}

impl Iterator for BranchIter<'_> {
    type Item = ChildNode;

    fn next(&mut self) -> Option<ChildNode> {
        let cursor = self.cursor.as_mut()?;
        match self.module.get(self.branch, cursor) {
            Some(node) => {
                self.module.next(self.branch, cursor);
                Some(node)
            }
            None => {
                self.close();
                None
            }
        }
    }
}

impl Drop for BranchIter<'_> {
    fn drop(&mut self) {
        self.close();
    }
}
