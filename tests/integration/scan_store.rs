//! Store scanning: classification, ordering and malformed files

use super::test_utils::{module_file, write_config};
use stateconf::error::StoreError;
use stateconf::model::{Library, LibraryKind, Provider};
use stateconf::registry::LoaderRegistry;
use stateconf::store::{self, classify, ConfigName, ConfigStore};
use stateconf::value::PropertyValue;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

#[test]
fn test_scan_mixed_directory() {
    let dir = TempDir::new().unwrap();
    write_config(
        dir.path(),
        "provider-a.conf",
        "(provider \"a\" \"/lib/liba.so\" (ns \"n\" (prop \"p\" \"1\")))",
        100,
    );
    write_config(dir.path(), "loader-b.conf", "(loader \"b\" \"/lib/libb.so\")", 200);
    fs::write(dir.path().join("notes.md"), "# notes").unwrap();

    let mut names = Vec::new();
    let report = store::scan(dir.path(), |_, lib: Library| {
        names.push(ConfigName::from(&lib).to_string());
    })
    .unwrap();

    assert_eq!(names, vec!["provider-a", "loader-b"]);
    assert_eq!(report.loaded, 2);
    assert_eq!(report.skipped.len(), 1);
    assert!(report.skipped[0].0.ends_with("notes.md"));
}

#[test]
fn test_newer_file_wins_on_collision() {
    let dir = TempDir::new().unwrap();
    write_config(dir.path(), "loader-new.conf", "(loader \"dup\" \"/lib/new.so\")", 500);
    write_config(dir.path(), "loader-old.conf", "(loader \"dup\" \"/lib/old.so\")", 100);

    let registry = LoaderRegistry::from_dir(dir.path()).unwrap();
    assert_eq!(registry.len(), 1);
    assert_eq!(
        registry.get("dup").unwrap().path(),
        Path::new("/lib/new.so")
    );
}

#[test]
fn test_malformed_file_keeps_earlier_entries() {
    let dir = TempDir::new().unwrap();
    write_config(
        dir.path(),
        "loader-broken.conf",
        "(loader \"ok\" \"/lib/ok.so\")\n(loader \"cut\"",
        100,
    );

    let mut names = Vec::new();
    let report = store::scan(dir.path(), |_, lib: Library| names.push(lib.name().to_string()))
        .unwrap();
    assert_eq!(names, vec!["ok"]);
    assert_eq!(report.loaded, 0);
    assert_eq!(report.skipped.len(), 1);
}

#[test]
fn test_load_file_reports_offset() {
    let dir = TempDir::new().unwrap();
    let path = write_config(dir.path(), "provider-x.conf", "(provider \"x\" \"\" :k", 100);
    let err = store::load_file(&path, &mut |_: &Path, _: Library| {}).unwrap_err();
    match err {
        StoreError::Malformed { path: p, offset, .. } => {
            assert_eq!(p, path);
            assert!(offset > 0);
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_scan_invalid_root() {
    let err = store::scan(Path::new("/no/such/registry"), |_, _| {}).unwrap_err();
    assert!(matches!(err, StoreError::InvalidSource(_)));
}

#[test]
fn test_config_store_write_and_remove() {
    let dir = TempDir::new().unwrap();
    let module = module_file(dir.path(), "libqt.so");
    let mut store = ConfigStore::open(dir.path().join("registry")).unwrap();

    let name = ConfigName::new(LibraryKind::Loader, "qt");
    let text = format!("(loader \"qt\" \"{}\")\n", module.display());
    let cfg = store.write(&name, text.as_bytes()).unwrap();
    assert_eq!(cfg, store.root().join("loader-qt.conf"));
    assert_eq!(classify(&cfg), Some(name.clone()));
    assert_eq!(store.entries().count(), 1);

    store.remove(&cfg).unwrap();
    assert!(!cfg.exists());
    assert_eq!(store.entries().count(), 0);
}

#[test]
fn test_deeply_nested_file_is_skipped() {
    let dir = TempDir::new().unwrap();
    write_config(dir.path(), "provider-x.conf", &"(".repeat(200_000), 100);
    write_config(dir.path(), "loader-ok.conf", "(loader \"ok\" \"/lib/ok.so\")", 200);

    let mut names = Vec::new();
    let report = store::scan(dir.path(), |_, lib: Library| names.push(lib.name().to_string()))
        .unwrap();
    assert_eq!(names, vec!["ok"]);
    assert_eq!(report.loaded, 1);
    assert_eq!(report.skipped.len(), 1);
    assert!(report.skipped[0].0.ends_with("provider-x.conf"));
    assert!(report.skipped[0].1.contains("nested too deeply"));
}

#[test]
fn test_unusual_info_values_reload() {
    let dir = TempDir::new().unwrap();
    let mut cfg = ConfigStore::open(dir.path()).unwrap();
    let info = BTreeMap::from([
        ("big".to_string(), PropertyValue::UInt(u64::MAX)),
        ("gain".to_string(), PropertyValue::Real(f64::INFINITY)),
        ("scale".to_string(), PropertyValue::Real(2.0)),
    ]);
    let provider = Library::Provider(Provider::new("s", "/lib/s.so", info, Vec::new()));
    cfg.write(&ConfigName::from(&provider), provider.to_string())
        .unwrap();

    let mut loaded = Vec::new();
    let report = cfg.scan(|_, lib: Library| loaded.push(lib)).unwrap();
    assert!(report.skipped.is_empty());
    let Some(Library::Provider(back)) = loaded.pop() else {
        panic!("expected a provider");
    };
    assert_eq!(back.info()["big"], PropertyValue::UInt(u64::MAX));
    assert!(matches!(back.info()["big"], PropertyValue::UInt(_)));
    assert_eq!(back.info()["gain"], PropertyValue::Real(f64::INFINITY));
    assert!(matches!(back.info()["scale"], PropertyValue::Real(v) if v == 2.0));
}
