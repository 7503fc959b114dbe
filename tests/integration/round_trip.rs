//! Config text through the reader and back out through Display

use stateconf::expr::Expr;
use stateconf::model::{Access, Entity, Library};
use stateconf::reader::read_all;
use stateconf::store::{classify, ConfigName};
use stateconf::value::PropertyValue;
use std::path::Path;

const SENSOR: &str =
    r#"(provider "sensor" "/lib/sensor.so" :type "accel" (ns "data" (prop "x" 0 :access rw)))"#;

fn library(src: &str) -> Library {
    let mut exprs = read_all(src).unwrap();
    assert_eq!(exprs.len(), 1);
    match exprs.remove(0) {
        Expr::Entity(entity) => entity.into_library().unwrap(),
        other => panic!("not an entity: {other:?}"),
    }
}

#[test]
fn test_sensor_provider() {
    let Library::Provider(provider) = library(SENSOR) else {
        panic!("expected a provider");
    };
    assert_eq!(provider.name(), "sensor");
    assert_eq!(provider.path(), Path::new("/lib/sensor.so"));
    assert_eq!(provider.info().len(), 1);
    assert_eq!(provider.provider_type(), "accel");

    let data = provider.namespace("data").unwrap();
    assert_eq!(data.properties().len(), 1);
    let x = data.property("x").unwrap();
    assert_eq!(x.default_value(), &PropertyValue::Int(0));
    assert_eq!(x.access(), Access::READ | Access::WRITE | Access::SUBSCRIBE);

    let name = ConfigName::from(&Library::Provider(provider));
    assert_eq!(name.file_name(), "provider-sensor.conf");
    assert_eq!(classify(Path::new(&name.file_name())), Some(name));
}

#[test]
fn test_sensor_survives_serialize_and_reparse() {
    let original = library(SENSOR);
    let text = original.to_string();
    assert!(text.contains("(prop \"x\" \"0\" :access rw)"));

    let reparsed = library(&text);
    assert_eq!(reparsed, original);
    assert_eq!(reparsed.to_string(), text);
}

#[test]
fn test_continuous_write_only_property() {
    let src = r#"(provider "p" "" (ns "n" (prop "w" "v" :behavior continuous :access wonly)))"#;
    let Library::Provider(provider) = library(src) else {
        panic!("expected a provider");
    };
    let w = provider.namespace("n").unwrap().property("w").unwrap();
    assert_eq!(w.access(), Access::WRITE);
    assert!(provider
        .to_string()
        .contains("(prop \"w\" \"v\" :behavior continuous :access wonly)"));
}

#[test]
fn test_entity_record_names() {
    let exprs = read_all(r#"(loader "qt" "/lib/qt.so") (ns "lonely")"#).unwrap();
    let records: Vec<_> = exprs
        .iter()
        .map(|e| match e {
            Expr::Entity(entity) => entity.record(),
            other => panic!("not an entity: {other:?}"),
        })
        .collect();
    assert_eq!(records, vec!["loader", "ns"]);
    assert!(matches!(
        &exprs[1],
        Expr::Entity(e) if matches!(**e, Entity::Namespace(_))
    ));
}
