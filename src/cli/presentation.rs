//! CLI presentation: text and json formatters.

use crate::error::StoreError;
use crate::model::{Access, Library, Provider};
use chrono::{DateTime, SecondsFormat};
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use serde_json::json;
use std::path::{Path, PathBuf};

/// One library found in the store
#[derive(Debug, Clone)]
pub struct ListEntry {
    pub config: PathBuf,
    pub library: Library,
}

fn format_mtime(secs: u64) -> String {
    if secs == 0 {
        return "-".to_string();
    }
    i64::try_from(secs)
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_else(|| "-".to_string())
}

fn access_label(access: Access) -> String {
    let mut out = String::new();
    out.push(if access.contains(Access::READ) { 'r' } else { '-' });
    out.push(if access.contains(Access::WRITE) { 'w' } else { '-' });
    out.push(if access.contains(Access::SUBSCRIBE) { 's' } else { '-' });
    out
}

fn config_file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

pub fn format_list_text(entries: &[ListEntry]) -> String {
    if entries.is_empty() {
        return "No providers or loaders found.\n\nUse 'stateconf save <module>' to add one."
            .to_string();
    }
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Kind", "Name", "Type", "Namespaces", "Module", "Modified", "Config"]);
    for entry in entries {
        let (provider_type, namespaces, mtime) = match &entry.library {
            Library::Provider(p) => (
                p.provider_type(),
                p.namespaces().len().to_string(),
                format_mtime(p.mtime()),
            ),
            Library::Loader(_) => ("-".to_string(), "-".to_string(), "-".to_string()),
        };
        table.add_row(vec![
            entry.library.kind().prefix().to_string(),
            entry.library.name().to_string(),
            provider_type,
            namespaces,
            entry.library.path().display().to_string(),
            mtime,
            config_file_name(&entry.config),
        ]);
    }
    format!("{table}\n\nTotal: {} entr{}", entries.len(), if entries.len() == 1 { "y" } else { "ies" })
}

fn provider_json(provider: &Provider, umask: u32) -> serde_json::Value {
    let namespaces: Vec<_> = provider
        .namespaces()
        .iter()
        .map(|ns| {
            let properties: Vec<_> = ns
                .properties()
                .iter()
                .map(|p| {
                    json!({
                        "name": p.name(),
                        "default": p.default_value(),
                        "access": access_label(p.access()),
                        "mode": format!("{:03o}", p.mode(umask)),
                    })
                })
                .collect();
            json!({ "name": ns.name(), "properties": properties })
        })
        .collect();
    json!({
        "info": provider.info(),
        "mtime": format_mtime(provider.mtime()),
        "namespaces": namespaces,
    })
}

pub fn format_list_json(entries: &[ListEntry], umask: u32) -> Result<String, StoreError> {
    let items: Vec<_> = entries
        .iter()
        .map(|entry| {
            let mut item = json!({
                "kind": entry.library.kind(),
                "name": entry.library.name(),
                "path": entry.library.path().display().to_string(),
                "config": entry.config.display().to_string(),
            });
            if let (Library::Provider(p), Some(obj)) = (&entry.library, item.as_object_mut()) {
                obj.insert("provider".to_string(), provider_json(p, umask));
            }
            item
        })
        .collect();
    let out = json!({ "entries": items, "total": entries.len() });
    serde_json::to_string_pretty(&out).map_err(|e| StoreError::Settings(e.to_string()))
}

/// Line printed by `watch` for each forwarded entry
pub fn format_add_event(library: &Library) -> String {
    format!(
        "{} {} {}",
        library.kind().prefix(),
        library.name(),
        library.path().display()
    )
}

pub fn format_removed(module: &Path, removed: &[PathBuf]) -> String {
    if removed.is_empty() {
        return format!("No config entries reference {}", module.display());
    }
    removed
        .iter()
        .map(|p| format!("Removed {}", p.display()))
        .collect::<Vec<_>>()
        .join("\n")
}
