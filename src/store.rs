//! Config Store
//!
//! A config store is a flat directory of textual config files, one per
//! provider or loader, named `<kind>-<name>.conf`. Scanning feeds every
//! qualifying file through the reader and hands each library to a receiver.
//! Per-file failures (bad name, parse error, unreadable file) are logged and
//! skipped; only a scan root that is neither file nor directory fails the
//! scan.
//!
//! Files of a directory are delivered ordered by modification time, then
//! path, so when two files describe the same kind and name the most recently
//! modified one is delivered last.

use crate::error::{ParseError, StoreError};
use crate::expr::Expr;
use crate::model::{Library, LibraryKind};
use crate::reader::Reader;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Extension of config files
pub const CONFIG_EXTENSION: &str = "conf";

/// Kind and entity name encoded in a config file name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ConfigName {
    kind: LibraryKind,
    name: String,
}

impl ConfigName {
    pub fn new(kind: LibraryKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }

    pub fn kind(&self) -> LibraryKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// `<prefix>-<name>.conf`
    pub fn file_name(&self) -> String {
        format!("{self}.{CONFIG_EXTENSION}")
    }
}

impl fmt::Display for ConfigName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.kind.prefix(), self.name)
    }
}

impl From<&Library> for ConfigName {
    fn from(lib: &Library) -> Self {
        ConfigName::new(lib.kind(), lib.name())
    }
}

/// Classify a path by its file name alone
///
/// A config file has the `conf` extension and a `provider-` or `loader-`
/// prefix before a non-empty name.
pub fn classify(path: &Path) -> Option<ConfigName> {
    if path.extension()? != CONFIG_EXTENSION {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    let (prefix, name) = stem.split_once('-')?;
    let kind = LibraryKind::from_prefix(prefix)?;
    if name.is_empty() {
        return None;
    }
    Some(ConfigName::new(kind, name))
}

pub fn is_config_file(path: &Path) -> bool {
    classify(path).is_some()
}

/// Parse one file and deliver every library it declares
///
/// Libraries before a parse failure are still delivered; the failure is
/// returned as [`StoreError::Malformed`] with the reader offset.
pub fn load_file<F>(path: &Path, receiver: &mut F) -> Result<usize, StoreError>
where
    F: FnMut(&Path, Library),
{
    debug!(path = %path.display(), "Loading config");
    let text = fs::read_to_string(path)?;
    let mut reader = Reader::new(&text);
    let mut delivered = 0;
    loop {
        let failure = match reader.next_expr() {
            Ok(None) => return Ok(delivered),
            Ok(Some(Expr::Entity(entity))) => match entity.into_library() {
                Ok(lib) => {
                    receiver(path, lib);
                    delivered += 1;
                    continue;
                }
                Err(other) => ParseError::mismatch(
                    "a provider or loader",
                    Expr::Entity(Box::new(other)).text(),
                ),
            },
            Ok(Some(other)) => ParseError::mismatch("a provider or loader", other.text()),
            Err(e) => e,
        };
        return Err(StoreError::Malformed {
            path: path.to_path_buf(),
            offset: reader.offset(),
            source: failure,
        });
    }
}

/// Load `path` if its name classifies as a config file
pub fn check_name_load<F>(path: &Path, receiver: &mut F) -> Result<usize, StoreError>
where
    F: FnMut(&Path, Library),
{
    if !is_config_file(path) {
        return Err(StoreError::NotConfigFile(path.to_path_buf()));
    }
    load_file(path, receiver)
}

/// Outcome of one scan
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ScanReport {
    /// Libraries delivered to the receiver
    pub loaded: usize,
    /// Files skipped, with the reason
    pub skipped: Vec<(PathBuf, String)>,
}

/// Regular files directly inside `dir`, oldest first
pub(crate) fn config_candidates(dir: &Path) -> Result<Vec<PathBuf>, StoreError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(io::Error::from)?;
        if entry.file_type().is_dir() {
            continue;
        }
        let mtime = entry
            .metadata()
            .ok()
            .and_then(|m| m.modified().ok())
            .unwrap_or(UNIX_EPOCH);
        files.push((mtime, entry.into_path()));
    }
    files.sort();
    Ok(files.into_iter().map(|(_, path)| path).collect())
}

/// Scan a single config file or a directory of them
pub fn scan<F>(root: &Path, mut receiver: F) -> Result<ScanReport, StoreError>
where
    F: FnMut(&Path, Library),
{
    let files = if root.is_file() {
        vec![root.to_path_buf()]
    } else if root.is_dir() {
        config_candidates(root)?
    } else {
        return Err(StoreError::InvalidSource(root.to_path_buf()));
    };

    let mut report = ScanReport::default();
    let mut origins: HashMap<ConfigName, PathBuf> = HashMap::new();
    let mut deliver = |path: &Path, lib: Library| {
        let key = ConfigName::from(&lib);
        if let Some(previous) = origins.insert(key.clone(), path.to_path_buf()) {
            if previous != path {
                warn!(
                    entry = %key,
                    previous = %previous.display(),
                    path = %path.display(),
                    "Config entry declared again, newer file wins"
                );
            }
        }
        receiver(path, lib);
    };

    for path in files {
        match check_name_load(&path, &mut deliver) {
            Ok(count) => report.loaded += count,
            Err(StoreError::Malformed {
                path,
                offset,
                source,
            }) => {
                warn!(path = %path.display(), offset, error = %source, "Error parsing config, skipping");
                report.skipped.push((path, source.to_string()));
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Skipping file");
                report.skipped.push((path, e.to_string()));
            }
        }
    }

    debug!(
        root = %root.display(),
        loaded = report.loaded,
        skipped = report.skipped.len(),
        "Scan complete"
    );
    Ok(report)
}

/// Make sure `dir` exists as a directory, creating it if needed
pub fn ensure_dir(dir: &Path) -> Result<(), StoreError> {
    if dir.is_dir() {
        return Ok(());
    }
    if dir.exists() {
        return Err(StoreError::InvalidSource(dir.to_path_buf()));
    }
    fs::create_dir_all(dir).map_err(|e| {
        warn!(path = %dir.display(), error = %e, "Can't create config directory");
        StoreError::InvalidSource(dir.to_path_buf())
    })?;
    info!(path = %dir.display(), "Created config directory");
    Ok(())
}

/// Config files known in one store directory
#[derive(Debug, Clone)]
pub struct ConfigStore {
    root: PathBuf,
    entries: BTreeMap<PathBuf, ConfigName>,
}

impl ConfigStore {
    /// Open the store at `root`, creating the directory if missing
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        ensure_dir(&root)?;
        let mut store = Self {
            root,
            entries: BTreeMap::new(),
        };
        store.refresh()?;
        Ok(store)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Re-read the directory listing
    pub fn refresh(&mut self) -> Result<(), StoreError> {
        self.entries = config_candidates(&self.root)?
            .into_iter()
            .filter_map(|path| classify(&path).map(|name| (path, name)))
            .collect();
        Ok(())
    }

    /// Known config files with their classified names
    pub fn entries(&self) -> impl Iterator<Item = (&Path, &ConfigName)> {
        self.entries.iter().map(|(p, n)| (p.as_path(), n))
    }

    /// Path a config file for `name` lives at
    pub fn path_for(&self, name: &ConfigName) -> PathBuf {
        self.root.join(name.file_name())
    }

    /// Scan every config file of the store
    pub fn scan<F>(&self, receiver: F) -> Result<ScanReport, StoreError>
    where
        F: FnMut(&Path, Library),
    {
        scan(&self.root, receiver)
    }

    /// Write the config file for `name`, returning its path
    pub fn write(
        &mut self,
        name: &ConfigName,
        contents: impl AsRef<[u8]>,
    ) -> Result<PathBuf, StoreError> {
        let path = self.path_for(name);
        fs::write(&path, contents)?;
        self.entries.insert(path.clone(), name.clone());
        Ok(path)
    }

    /// Delete a config file of the store
    pub fn remove(&mut self, path: &Path) -> Result<(), StoreError> {
        fs::remove_file(path)?;
        self.entries.remove(path);
        Ok(())
    }

    /// Bump the directory modification time so watchers see a change
    pub fn touch(&self) -> Result<(), StoreError> {
        fs::File::open(&self.root)?.set_modified(SystemTime::now())?;
        Ok(())
    }
}
