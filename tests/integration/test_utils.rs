//! Shared helpers for integration tests

use stateconf::model::{Loader, Provider};
use stateconf::monitor::ConfigReceiver;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Receiver recording every forwarded entry as `kind:name`
///
/// Clones share the same log, so one copy can move into a watch thread
/// while the test inspects another.
#[derive(Clone, Default)]
pub struct Collector {
    seen: Arc<Mutex<Vec<String>>>,
}

impl Collector {
    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

impl ConfigReceiver for Collector {
    fn provider_add(&mut self, provider: Arc<Provider>) {
        self.seen
            .lock()
            .unwrap()
            .push(format!("provider:{}", provider.name()));
    }

    fn loader_add(&mut self, loader: Arc<Loader>) {
        self.seen
            .lock()
            .unwrap()
            .push(format!("loader:{}", loader.name()));
    }
}

/// Create a placeholder module file so entries referencing it are not stale
pub fn module_file(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, b"\x7fELF").unwrap();
    path
}

/// Write a config file and pin its modification time to `secs` after the epoch
pub fn write_config(dir: &Path, name: &str, text: &str, secs: u64) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, text).unwrap();
    let file = fs::File::options().write(true).open(&path).unwrap();
    file.set_modified(UNIX_EPOCH + Duration::from_secs(secs))
        .unwrap();
    path
}

/// Poll `check` until it holds or `timeout` passes
pub fn wait_until(timeout: Duration, mut check: impl FnMut() -> bool) -> bool {
    let deadline = SystemTime::now() + timeout;
    while SystemTime::now() < deadline {
        if check() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(50));
    }
    check()
}
