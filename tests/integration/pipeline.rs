//! dump / save / rm against a store with in-memory modules

use super::test_utils::{module_file, Collector};
use stateconf::model::LibraryKind;
use stateconf::module::memory::{
    MemoryLoader, MemoryNamespace, MemoryProperty, MemoryProvider, StaticHost,
};
use stateconf::module::{Attr, Variant};
use stateconf::monitor::Monitor;
use stateconf::pipeline::{dump, rm, save, LOADER_TYPE};
use stateconf::store::{ConfigName, ConfigStore};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

struct Setup {
    dir: TempDir,
    store: PathBuf,
    provider_so: PathBuf,
    loader_so: PathBuf,
    host: StaticHost,
}

fn setup() -> Setup {
    let dir = TempDir::new().unwrap();
    let store = dir.path().join("registry");
    let provider_so = module_file(dir.path(), "libsensor.so");
    let loader_so = module_file(dir.path(), "libloader-qt.so");

    let provider = MemoryProvider::new("sensor")
        .with_info("version", Variant::Str("1.2".into()))
        .with_namespace(MemoryNamespace::new(
            "battery",
            vec![
                MemoryProperty::new("level", Variant::UInt(100), Attr::READ | Attr::DISCRETE),
                MemoryProperty::new("charging", Variant::Bool(false), Attr::READ),
            ],
        ));
    let loader =
        MemoryLoader::new("qt").with_provider(&provider_so, Arc::new(provider));
    let host = StaticHost::new().with_loader(&loader_so, Arc::new(loader));
    Setup {
        dir,
        store,
        provider_so,
        loader_so,
        host,
    }
}

#[test]
fn test_save_loader_then_provider_then_rm() {
    let s = setup();

    let loader_cfg = save(&s.store, &s.host, &s.loader_so, LOADER_TYPE)
        .unwrap()
        .unwrap();
    assert!(loader_cfg.ends_with("loader-qt.conf"));

    let provider_cfg = save(&s.store, &s.host, &s.provider_so, "qt")
        .unwrap()
        .unwrap();
    assert!(provider_cfg.ends_with("provider-sensor.conf"));
    let text = fs::read_to_string(&provider_cfg).unwrap();
    assert!(text.starts_with("(provider \"sensor\""));
    assert!(text.contains(":type \"qt\""));
    assert!(text.contains(":version \"1.2\""));
    assert!(text.contains("(prop \"level\" \"100\")"));
    assert!(text.contains("(prop \"charging\" \"0\" :behavior continuous)"));

    let monitor = Monitor::new(&s.store, Collector::default()).unwrap();
    let mut seen = monitor.target().seen();
    seen.sort();
    assert_eq!(seen, vec!["loader:qt", "provider:sensor"]);

    let removed = rm(&s.store, &s.provider_so).unwrap();
    assert_eq!(removed, vec![provider_cfg.clone()]);
    assert!(!provider_cfg.exists());
    assert!(loader_cfg.exists());
}

#[test]
fn test_dump_provider_only_module_as_loader_writes_nothing() {
    let s = setup();
    let mut out = Vec::new();
    let name = dump(&s.store, &s.host, &mut out, &s.provider_so, LOADER_TYPE).unwrap();
    assert_eq!(name, None);
    assert!(out.is_empty());

    assert_eq!(save(&s.store, &s.host, &s.provider_so, LOADER_TYPE).unwrap(), None);
    let store = ConfigStore::open(&s.store).unwrap();
    assert_eq!(store.entries().count(), 0);
}

#[test]
fn test_dump_unregistered_type_is_none() {
    let s = setup();
    let mut out = Vec::new();
    let name = dump(&s.store, &s.host, &mut out, &s.provider_so, "gtk").unwrap();
    assert_eq!(name, None);
}

#[test]
fn test_save_config_file_copies_into_store() {
    let s = setup();
    let src = s.dir.path().join("provider-manual.conf");
    fs::write(
        &src,
        "(provider \"manual\" \"\" :type \"default\" (ns \"n\" (prop \"p\" \"v\")))",
    )
    .unwrap();

    let cfg = save(&s.store, &s.host, &src, LOADER_TYPE).unwrap().unwrap();
    assert_eq!(
        cfg.file_name().unwrap().to_str().unwrap(),
        ConfigName::new(LibraryKind::Provider, "manual").file_name()
    );
    let text = fs::read_to_string(&cfg).unwrap();
    assert!(text.contains("provider-manual.conf\""));
}

#[test]
fn test_rm_matches_relative_spelling() {
    let s = setup();
    save(&s.store, &s.host, &s.loader_so, LOADER_TYPE).unwrap();
    let spelled = s.dir.path().join(".").join("libloader-qt.so");
    let removed = rm(&s.store, &spelled).unwrap();
    assert_eq!(removed.len(), 1);
}
