//! Serialized entities read back to the same entities

use proptest::prelude::*;
use stateconf::expr::Expr;
use stateconf::model::{
    Access, Library, Loader, Namespace, Property, Provider, DEFAULT_PROVIDER_TYPE, INFO_TYPE,
};
use stateconf::reader::read_all;
use stateconf::value::PropertyValue;
use std::collections::BTreeMap;

fn text() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_./ \"\\\\-]{0,12}"
}

fn access() -> impl Strategy<Value = Access> {
    (0u32..8).prop_map(Access::from_bits_truncate)
}

fn value() -> impl Strategy<Value = PropertyValue> {
    prop_oneof![
        any::<i64>().prop_map(PropertyValue::Int),
        any::<u64>().prop_map(PropertyValue::UInt),
        any::<bool>().prop_map(PropertyValue::Bool),
        text().prop_map(PropertyValue::Str),
    ]
}

/// Info values cover every tag, including reals with no literal form
fn info_value() -> impl Strategy<Value = PropertyValue> {
    prop_oneof![
        text().prop_map(PropertyValue::Str),
        any::<i64>().prop_map(PropertyValue::Int),
        any::<u64>().prop_map(PropertyValue::UInt),
        any::<f64>().prop_map(PropertyValue::Real),
        Just(PropertyValue::Real(f64::INFINITY)),
        Just(PropertyValue::Real(f64::NAN)),
    ]
}

fn property() -> impl Strategy<Value = Property> {
    (text(), value(), access()).prop_map(|(name, default, access)| {
        // Access without READ or WRITE has no textual form and reads back as READ.
        let access = if access.intersects(Access::READ | Access::WRITE) {
            access
        } else {
            access | Access::READ
        };
        Property::new(name, default, access)
    })
}

fn namespace() -> impl Strategy<Value = Namespace> {
    ("[a-z]{1,8}", prop::collection::vec(property(), 0..4)).prop_map(|(name, props)| {
        let mut seen = std::collections::HashSet::new();
        let props = props
            .into_iter()
            .filter(|p| seen.insert(p.name().to_string()))
            .collect();
        Namespace::new(name, props)
    })
}

fn library() -> impl Strategy<Value = Library> {
    let provider = (
        "[a-z][a-z0-9]{0,8}",
        "/no/such/[a-z]{1,8}\\.so",
        prop::collection::btree_map("[a-z]{1,6}", info_value(), 0..3),
        prop::collection::vec(namespace(), 0..3),
    )
        .prop_map(|(name, path, info, namespaces)| {
            let mut info: BTreeMap<String, PropertyValue> = info;
            // The reader fills in the provider type when it is not given.
            info.entry(INFO_TYPE.to_string())
                .or_insert_with(|| PropertyValue::from(DEFAULT_PROVIDER_TYPE));
            let mut seen = std::collections::HashSet::new();
            let namespaces = namespaces
                .into_iter()
                .filter(|ns| seen.insert(ns.name().to_string()))
                .collect();
            Library::Provider(Provider::new(name, path, info, namespaces))
        });
    let loader = ("[a-z][a-z0-9]{0,8}", "/no/such/[a-z]{1,8}\\.so")
        .prop_map(|(name, path)| Library::Loader(Loader::new(name, path)));
    prop_oneof![provider, loader]
}

fn reparse(src: &str) -> Library {
    let mut exprs = read_all(src).unwrap();
    assert_eq!(exprs.len(), 1);
    match exprs.remove(0) {
        Expr::Entity(entity) => entity.into_library().unwrap(),
        other => panic!("not an entity: {other:?}"),
    }
}

proptest! {
    #[test]
    fn serialized_library_reads_back(lib in library()) {
        let text = lib.to_string();
        let back = reparse(&text);
        prop_assert_eq!(&back, &lib);
        prop_assert_eq!(back.to_string(), text);
    }
}
