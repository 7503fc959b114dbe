//! Record constructors for the textual config form.
//!
//! The reader resolves `(provider ...)`, `(loader ...)`, `(ns ...)` and
//! `(prop ...)` forms by looking the head symbol up in an [`Env`] and calling
//! the matching builder with the already-evaluated arguments. Builders are
//! plain functions: they keep no state between calls.

use crate::error::ParseError;
use crate::expr::{Expr, RecordArgs, RestArg};
use crate::model::{
    Access, Entity, Loader, Namespace, Property, Provider, DEFAULT_PROVIDER_TYPE, INFO_TYPE,
};
use crate::value::{to_integer, to_property, PropertyValue};
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, warn};

/// Builder for one record form
pub type RecordFn = fn(RecordArgs) -> Result<Entity, ParseError>;

const BEHAVIOR_DISCRETE: &str = "discrete";
const BEHAVIOR_CONTINUOUS: &str = "continuous";

const RECORDS: &[(&str, RecordFn)] = &[
    ("provider", build_provider),
    ("loader", build_loader),
    ("ns", build_namespace),
    ("prop", build_property),
];

const CONSTANTS: &[(&str, i64)] = &[
    ("false", 0),
    ("true", 1),
    (BEHAVIOR_DISCRETE, Access::SUBSCRIBE.bits() as i64),
    (BEHAVIOR_CONTINUOUS, 0),
    ("rw", Access::READ.union(Access::WRITE).bits() as i64),
    ("wonly", Access::WRITE.bits() as i64),
];

/// Names visible to config text: record forms and constants
#[derive(Debug, Clone, Copy)]
pub struct Env {
    records: &'static [(&'static str, RecordFn)],
    constants: &'static [(&'static str, i64)],
}

impl Env {
    /// Environment with the provider/loader/ns/prop forms and their constants
    pub fn standard() -> Self {
        Self {
            records: RECORDS,
            constants: CONSTANTS,
        }
    }

    pub fn record(&self, name: &str) -> Option<RecordFn> {
        self.records
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, f)| *f)
    }

    pub fn constant(&self, name: &str) -> Option<Expr> {
        self.constants
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| Expr::Int(*v))
    }
}

impl Default for Env {
    fn default() -> Self {
        Self::standard()
    }
}

/// How changes of a property are delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    /// Pushed as notifications (Subscribe bit set)
    Discrete,
    /// Must be polled
    Continuous,
}

impl Behavior {
    fn from_value(value: &PropertyValue) -> Result<Self, ParseError> {
        let discrete = i64::from(Access::SUBSCRIBE.bits());
        match value {
            PropertyValue::Str(s) if s == BEHAVIOR_DISCRETE => Ok(Behavior::Discrete),
            PropertyValue::Str(s) if s == BEHAVIOR_CONTINUOUS => Ok(Behavior::Continuous),
            PropertyValue::Int(v) if *v == discrete => Ok(Behavior::Discrete),
            PropertyValue::Int(0) => Ok(Behavior::Continuous),
            other => Err(ParseError::mismatch("a behavior", other.to_display_string())),
        }
    }
}

fn expect_entity(expected: &'static str, expr: Expr) -> Result<Entity, ParseError> {
    match expr {
        Expr::Entity(entity) => Ok(*entity),
        other => Err(ParseError::mismatch(expected, other.text())),
    }
}

fn build_provider(mut args: RecordArgs) -> Result<Entity, ParseError> {
    let name = args.required_string("name")?;
    let path = args.required_string("path")?;

    let mut info = BTreeMap::from([(
        INFO_TYPE.to_string(),
        PropertyValue::from(DEFAULT_PROVIDER_TYPE),
    )]);
    let mut namespaces: Vec<Namespace> = Vec::new();
    let mut seen = HashSet::new();

    for arg in args.rest() {
        match arg {
            RestArg::Item(expr) => match expect_entity("a namespace", expr)? {
                Entity::Namespace(ns) => {
                    if !seen.insert(ns.name().to_string()) {
                        return Err(ParseError::Duplicate {
                            what: "namespace",
                            name: ns.name().to_string(),
                        });
                    }
                    namespaces.push(ns);
                }
                other => {
                    return Err(ParseError::mismatch(
                        "a namespace",
                        Expr::Entity(Box::new(other)).text(),
                    ))
                }
            },
            RestArg::Option { key, value } => {
                if !info.contains_key(&key) {
                    debug!(provider = %name, key = %key, "Keeping provider option");
                }
                info.insert(key, to_property(&value)?);
            }
        }
    }

    Ok(Entity::Provider(Provider::new(name, path, info, namespaces)))
}

fn build_loader(mut args: RecordArgs) -> Result<Entity, ParseError> {
    let name = args.required_string("name")?;
    let path = args.required_string("path")?;
    args.finish()?;
    Ok(Entity::Loader(Loader::new(name, path)))
}

fn build_namespace(mut args: RecordArgs) -> Result<Entity, ParseError> {
    let name = args.required_string("name")?;

    let mut properties: Vec<Property> = Vec::new();
    let mut seen = HashSet::new();
    for arg in args.rest() {
        let prop = match arg {
            RestArg::Item(expr) => match expect_entity("a property", expr)? {
                Entity::Property(prop) => prop,
                other => {
                    return Err(ParseError::mismatch(
                        "a property",
                        Expr::Entity(Box::new(other)).text(),
                    ))
                }
            },
            RestArg::Option { key, .. } => {
                return Err(ParseError::mismatch("a property", format!(":{key}")))
            }
        };
        if !seen.insert(prop.name().to_string()) {
            return Err(ParseError::Duplicate {
                what: "property",
                name: prop.name().to_string(),
            });
        }
        properties.push(prop);
    }

    Ok(Entity::Namespace(Namespace::new(name, properties)))
}

fn build_property(mut args: RecordArgs) -> Result<Entity, ParseError> {
    let name = args.required_string("name")?;
    let defval = to_property(&args.required("default value")?)?;

    let mut behavior = PropertyValue::from(BEHAVIOR_DISCRETE);
    let mut access = PropertyValue::Int(i64::from(Access::READ.bits()));
    for arg in args.rest() {
        match arg {
            RestArg::Option { key, value } => match key.as_str() {
                "behavior" => behavior = to_property(&value)?,
                "access" => access = to_property(&value)?,
                _ => warn!(
                    property = %name,
                    "Unknown property option :{} {}, ignoring",
                    key,
                    value.text()
                ),
            },
            RestArg::Item(expr) => warn!(
                property = %name,
                "Unexpected argument {}, ignoring",
                expr.text()
            ),
        }
    }

    let bits = to_integer(&access)?;
    let bits = u32::try_from(bits)
        .map_err(|_| ParseError::mismatch("access flags", access.to_display_string()))?;
    let mut access = Access::from_bits_truncate(bits);
    match Behavior::from_value(&behavior)? {
        Behavior::Discrete => access.insert(Access::SUBSCRIBE),
        Behavior::Continuous => access.remove(Access::SUBSCRIBE),
    }

    Ok(Entity::Property(Property::new(name, defval, access)))
}
