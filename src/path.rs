//! Path canonicalization for module and config paths
//!
//! Module paths are stored in canonical form so that a provider introspected
//! from `./lib/../lib/x.so` and one declared with `/abs/lib/x.so` compare
//! equal, which `rm` relies on.

use crate::error::StoreError;
use std::path::{Component, Path, PathBuf};
use unicode_normalization::UnicodeNormalization;

/// Canonicalize and normalize an existing path
///
/// Resolves symlinks and `.`/`..`, normalizes Unicode to NFC and strips
/// trailing separators (except for the root).
pub fn canonicalize_path(path: &Path) -> Result<PathBuf, StoreError> {
    let canonical = dunce::canonicalize(path)?;
    Ok(PathBuf::from(normalize_path_string(&canonical.to_string_lossy())))
}

/// Absolute form of `path` without requiring it to exist
///
/// Uses the canonical path when the file exists, otherwise joins relative
/// paths onto the working directory and folds `.`/`..` lexically.
pub fn absolute_path(path: &Path) -> PathBuf {
    if let Ok(canonical) = canonicalize_path(path) {
        return canonical;
    }
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };

    let mut out = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    PathBuf::from(normalize_path_string(&out.to_string_lossy()))
}

/// Normalize a path string without filesystem access
pub fn normalize_path_string(path: &str) -> String {
    let mut result: String = path.nfc().collect();
    if result.len() > 1 {
        while result.ends_with('/') || result.ends_with('\\') {
            result.pop();
        }
    }
    result
}
