//! Directory monitor: initial scan, change handling and the watch loop

use super::test_utils::{module_file, wait_until, write_config, Collector};
use notify::event::{CreateKind, DataChange, MetadataKind, ModifyKind, RemoveKind};
use notify::{Event, EventKind};
use stateconf::module::memory::{MemoryLoader, StaticHost};
use stateconf::monitor::Monitor;
use stateconf::pipeline::{save, LOADER_TYPE};
use std::fs;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn test_new_creates_missing_directory() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().join("registry");
    let monitor = Monitor::new(&root, Collector::default()).unwrap();
    assert!(root.is_dir());
    assert!(monitor.target().seen().is_empty());
}

#[test]
fn test_initial_scan_forwards_live_entries() {
    let dir = TempDir::new().unwrap();
    let module = module_file(dir.path(), "libsensor.so");
    let root = dir.path().join("registry");
    fs::create_dir(&root).unwrap();
    write_config(
        &root,
        "provider-sensor.conf",
        &format!("(provider \"sensor\" \"{}\")", module.display()),
        100,
    );
    write_config(&root, "loader-gone.conf", "(loader \"gone\" \"/no/such.so\")", 200);

    let monitor = Monitor::new(&root, Collector::default()).unwrap();
    assert_eq!(monitor.target().seen(), vec!["provider:sensor"]);
}

#[test]
fn test_events_reload_only_named_file() {
    let dir = TempDir::new().unwrap();
    let module = module_file(dir.path(), "libqt.so");
    let root = dir.path().join("registry");
    let mut monitor = Monitor::new(&root, Collector::default()).unwrap();

    let cfg = write_config(
        &root,
        "loader-qt.conf",
        &format!("(loader \"qt\" \"{}\")", module.display()),
        100,
    );
    let created = Event::new(EventKind::Create(CreateKind::File)).add_path(cfg.clone());
    assert_eq!(monitor.process_event(&created), 1);

    let removed = Event::new(EventKind::Remove(RemoveKind::File)).add_path(cfg);
    assert_eq!(monitor.process_event(&removed), 0);

    let other = write_config(&root, "README", "text", 100);
    assert_eq!(monitor.handle_change(&other), 0);

    assert_eq!(monitor.target().seen(), vec!["loader:qt"]);
}

#[test]
fn test_directory_change_reads_new_file_once() {
    let dir = TempDir::new().unwrap();
    let module = module_file(dir.path(), "libqt.so");
    let root = dir.path().join("registry");
    let mut monitor = Monitor::new(&root, Collector::default()).unwrap();
    write_config(
        &root,
        "loader-qt.conf",
        &format!("(loader \"qt\" \"{}\")", module.display()),
        100,
    );
    let root = monitor.root().to_path_buf();
    assert_eq!(monitor.handle_change(&root), 1);
    assert_eq!(monitor.handle_change(&root), 0);
    assert_eq!(monitor.target().seen(), vec!["loader:qt"]);
}

#[test]
fn test_one_save_forwards_only_the_new_entry() {
    let dir = TempDir::new().unwrap();
    let a_so = module_file(dir.path(), "liba.so");
    let b_so = module_file(dir.path(), "libb.so");
    let root = dir.path().join("registry");
    fs::create_dir(&root).unwrap();
    write_config(
        &root,
        "loader-a.conf",
        &format!("(loader \"a\" \"{}\")", a_so.display()),
        100,
    );
    let mut monitor = Monitor::new(&root, Collector::default()).unwrap();
    assert_eq!(monitor.target().seen(), vec!["loader:a"]);

    let host = StaticHost::new().with_loader(&b_so, Arc::new(MemoryLoader::new("b")));
    let cfg = save(&root, &host, &b_so, LOADER_TYPE).unwrap().unwrap();

    // The notifications one save produces: the file appears, is written,
    // and the directory is touched.
    let events = [
        Event::new(EventKind::Create(CreateKind::File)).add_path(cfg.clone()),
        Event::new(EventKind::Modify(ModifyKind::Data(DataChange::Content))).add_path(cfg),
        Event::new(EventKind::Modify(ModifyKind::Metadata(MetadataKind::WriteTime)))
            .add_path(root.clone()),
    ];
    let forwarded: usize = events.iter().map(|e| monitor.process_event(e)).sum();
    assert_eq!(forwarded, 1);
    assert_eq!(monitor.target().seen(), vec!["loader:a", "loader:b"]);
}

#[test]
fn test_watch_picks_up_new_config() {
    let dir = TempDir::new().unwrap();
    let module = module_file(dir.path(), "libqt.so");
    let root = dir.path().join("registry");
    let collector = Collector::default();
    let mut monitor = Monitor::new(&root, collector.clone()).unwrap();

    let stop = Arc::new(AtomicBool::new(false));
    let watcher_stop = Arc::clone(&stop);
    let handle = std::thread::spawn(move || monitor.watch(&watcher_stop));

    // Give the watcher time to register before the write.
    std::thread::sleep(Duration::from_millis(300));
    fs::write(
        root.join("loader-qt.conf"),
        format!("(loader \"qt\" \"{}\")", module.display()),
    )
    .unwrap();

    let seen = wait_until(Duration::from_secs(5), || {
        collector.seen().iter().any(|s| s == "loader:qt")
    });
    // Let the rest of the write's notifications arrive.
    std::thread::sleep(Duration::from_millis(500));
    stop.store(true, Ordering::SeqCst);
    handle.join().unwrap().unwrap();
    assert!(seen);
    assert_eq!(collector.seen(), vec!["loader:qt"]);
}
