//! Directory Monitor
//!
//! Keeps a receiver in sync with a config store directory. Construction
//! makes sure the directory exists and forwards everything a full scan finds;
//! afterwards each change notification re-reads only the file it names.
//! Entries whose module file is missing are dropped as stale.
//!
//! The monitor remembers the size and modification time each config file
//! had when it was last read. A file is only read (and its entries forwarded)
//! again once that fingerprint changes, so the several notifications one
//! save produces forward its entries once. A notification about the
//! directory itself only wakes the monitor up: it checks every file's
//! fingerprint and reads the changed ones.
//!
//! Everything runs on the caller's thread: [`Monitor::watch`] blocks on the
//! notification channel and processes one event at a time.

use crate::error::StoreError;
use crate::model::{Library, Loader, Provider};
use crate::store::{self, ensure_dir, is_config_file};
use notify::{Event, EventKind, RecursiveMode, Watcher};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::time::{Duration, SystemTime};
use tracing::{debug, error, info, warn};

/// How often the watch loop checks its stop flag
const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Consumer of discovered providers and loaders
pub trait ConfigReceiver {
    fn provider_add(&mut self, provider: Arc<Provider>);
    fn loader_add(&mut self, loader: Arc<Loader>);
}

/// Forward `lib` unless its module is gone; true if forwarded
fn forward<R: ConfigReceiver>(target: &mut R, cfg_path: &Path, lib: Library) -> bool {
    if !lib.path().exists() {
        let stale = StoreError::StaleEntry(lib.path().to_path_buf());
        warn!(config = %cfg_path.display(), "{}, skipping", stale);
        return false;
    }
    match lib {
        Library::Provider(p) => target.provider_add(Arc::new(p)),
        Library::Loader(l) => target.loader_add(Arc::new(l)),
    }
    true
}

/// State of a config file when it was last read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Fingerprint {
    modified: SystemTime,
    len: u64,
}

impl Fingerprint {
    fn of(path: &Path) -> Option<Self> {
        let meta = fs::metadata(path).ok().filter(|m| m.is_file())?;
        Some(Self {
            modified: meta.modified().ok()?,
            len: meta.len(),
        })
    }
}

pub struct Monitor<R: ConfigReceiver> {
    root: PathBuf,
    target: R,
    seen: HashMap<PathBuf, Fingerprint>,
}

impl<R: ConfigReceiver> Monitor<R> {
    /// Start monitoring `root`, forwarding the initial scan to `target`
    pub fn new(root: impl Into<PathBuf>, target: R) -> Result<Self, StoreError> {
        let root = root.into();
        debug!(root = %root.display(), "Config monitor");
        ensure_dir(&root)?;
        let mut monitor = Self {
            root,
            target,
            seen: HashMap::new(),
        };
        let forwarded = monitor.rescan()?;
        info!(root = %monitor.root.display(), forwarded, "Initial config scan done");
        Ok(monitor)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn target(&self) -> &R {
        &self.target
    }

    pub fn target_mut(&mut self) -> &mut R {
        &mut self.target
    }

    pub fn into_target(self) -> R {
        self.target
    }

    /// Forget what was read and forward every entry of the directory again
    pub fn rescan(&mut self) -> Result<usize, StoreError> {
        self.seen.clear();
        self.sync()
    }

    /// Read every config file changed since it was last read, oldest first
    pub fn sync(&mut self) -> Result<usize, StoreError> {
        let mut forwarded = 0;
        for path in store::config_candidates(&self.root)? {
            if is_config_file(&path) {
                forwarded += self.reload(&path);
            }
        }
        self.seen.retain(|path, _| path.exists());
        Ok(forwarded)
    }

    /// Read `path` if its fingerprint changed, returning how many entries were forwarded
    fn reload(&mut self, path: &Path) -> usize {
        let Some(fingerprint) = Fingerprint::of(path) else {
            if self.seen.remove(path).is_some() {
                debug!(path = %path.display(), "Config file removed");
            }
            return 0;
        };
        if self.seen.get(path) == Some(&fingerprint) {
            debug!(path = %path.display(), "Config file unchanged");
            return 0;
        }

        let target = &mut self.target;
        let mut forwarded = 0;
        let loaded = store::check_name_load(path, &mut |cfg_path: &Path, lib: Library| {
            if forward(target, cfg_path, lib) {
                forwarded += 1;
            }
        });
        if let Err(e) = loaded {
            warn!(path = %path.display(), error = %e, "Skipping changed config");
        }
        // Taken before the read: a write racing the read changes it again.
        self.seen.insert(path.to_path_buf(), fingerprint);
        forwarded
    }

    /// React to a change of `path`, returning how many entries were forwarded
    ///
    /// A change of the directory itself syncs every changed file; a file that
    /// does not classify as a config file, or no longer exists, is ignored.
    pub fn handle_change(&mut self, path: &Path) -> usize {
        if path == self.root || path.is_dir() {
            return self.sync().unwrap_or_else(|e| {
                error!(root = %self.root.display(), error = %e, "Sync failed");
                0
            });
        }
        if !is_config_file(path) {
            debug!(path = %path.display(), "Not a config file, ignoring");
            return 0;
        }
        self.reload(path)
    }

    /// Apply one watcher event
    pub fn process_event(&mut self, event: &Event) -> usize {
        match event.kind {
            EventKind::Create(_)
            | EventKind::Modify(_)
            | EventKind::Remove(_)
            | EventKind::Any => event
                .paths
                .iter()
                .map(|path| self.handle_change(path))
                .sum(),
            _ => 0,
        }
    }

    /// Block processing change notifications until `stop` is set
    pub fn watch(&mut self, stop: &AtomicBool) -> Result<(), StoreError> {
        let (tx, rx) = mpsc::channel();
        let mut watcher = notify::recommended_watcher(move |res| {
            if let Err(e) = tx.send(res) {
                error!("Error sending watch event: {}", e);
            }
        })?;
        watcher.watch(&self.root, RecursiveMode::NonRecursive)?;
        info!(root = %self.root.display(), "Watching config directory");

        while !stop.load(Ordering::SeqCst) {
            match rx.recv_timeout(POLL_INTERVAL) {
                Ok(Ok(event)) => {
                    self.process_event(&event);
                }
                Ok(Err(e)) => warn!("Watch error: {}", e),
                Err(mpsc::RecvTimeoutError::Timeout) => {}
                Err(mpsc::RecvTimeoutError::Disconnected) => {
                    error!("Watcher channel disconnected");
                    break;
                }
            }
        }
        Ok(())
    }
}
