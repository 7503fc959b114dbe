//! stateconf: filesystem-backed registry of state providers and loaders
//!
//! Providers (plugins exposing namespaces of typed properties) and loaders
//! (adapters that load providers of one type) are described in a textual
//! config form and kept in a config store directory. Descriptions are either
//! written by hand or derived by introspecting a live module; both paths
//! produce the same entity model.

pub mod builder;
pub mod cli;
pub mod config;
pub mod error;
pub mod expr;
pub mod introspect;
pub mod logging;
pub mod model;
pub mod module;
pub mod monitor;
pub mod path;
pub mod pipeline;
pub mod reader;
pub mod registry;
pub mod serialize;
pub mod store;
pub mod value;
