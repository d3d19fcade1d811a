//! Behavioural laws of the validation engine
//!
//! Covers:
//! - literal and type laws over generated values
//! - idempotence of non-transforming schemas
//! - required, default, priority, forbidden and exclusivity rules for mappings
//! - Or short-circuiting

mod common;

use common::{init_tracing, map};
use proptest::prelude::*;
use shapecheck_core::{ErrorKind, Key, Map, MapSchema, RegexSchema, Schema, Value, ValueType};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

const TYPES: [ValueType; 11] = [
    ValueType::Null,
    ValueType::Bool,
    ValueType::Int,
    ValueType::Float,
    ValueType::Number,
    ValueType::Str,
    ValueType::List,
    ValueType::Tuple,
    ValueType::Set,
    ValueType::Map,
    ValueType::Any,
];

fn scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::Int),
        any::<f64>().prop_map(Value::Float),
        "[a-z]{0,8}".prop_map(Value::Str),
    ]
}

fn value() -> impl Strategy<Value = Value> {
    scalar().prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::List),
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Tuple),
            prop::collection::btree_set(inner.clone(), 0..4).prop_map(Value::Set),
            prop::collection::btree_map(inner.clone(), inner, 0..4).prop_map(Value::Map),
        ]
    })
}

fn normalizing_schema() -> Schema {
    let host: Schema = MapSchema::new()
        .entry("host", ValueType::Str)
        .entry(Key::optional("port").with_default(80).unwrap(), ValueType::Int)
        .into();
    MapSchema::new()
        .entry("name", ValueType::Str)
        .entry(Key::optional("retries").with_default(3).unwrap(), ValueType::Int)
        .entry(Key::clean(RegexSchema::new("^_").unwrap()), ValueType::Any)
        .entry(Key::optional("hosts"), Schema::list([host]))
        .into()
}

fn service_document() -> impl Strategy<Value = Value> {
    let host = ("[a-z]{1,6}", proptest::option::of(1..65535i64)).prop_map(|(name, port)| {
        let mut map = Map::new();
        map.insert(Value::from("host"), Value::from(name));
        if let Some(port) = port {
            map.insert(Value::from("port"), Value::Int(port));
        }
        Value::Map(map)
    });
    (
        "[a-z]{1,6}",
        proptest::option::of(any::<i64>()),
        proptest::option::of("[a-z ]{0,8}"),
        proptest::option::of(prop::collection::vec(host, 0..4)),
    )
        .prop_map(|(name, retries, comment, hosts)| {
            let mut map = Map::new();
            map.insert(Value::from("name"), Value::from(name));
            if let Some(retries) = retries {
                map.insert(Value::from("retries"), Value::Int(retries));
            }
            if let Some(comment) = comment {
                map.insert(Value::from("_comment"), Value::from(comment));
            }
            if let Some(hosts) = hosts {
                map.insert(Value::from("hosts"), Value::List(hosts));
            }
            Value::Map(map)
        })
}

proptest! {
    #[test]
    fn test_normalization_is_idempotent(data in service_document()) {
        let schema = normalizing_schema();
        let once = schema.validate(&data).unwrap();
        let twice = schema.validate(&once).unwrap();
        prop_assert!(!once.as_map().unwrap().contains_key(&Value::from("_comment")));
        prop_assert!(once.as_map().unwrap().contains_key(&Value::from("retries")));
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn test_literal_accepts_itself(v in value()) {
        prop_assert_eq!(Schema::literal(v.clone()).validate(&v).unwrap(), v);
    }

    #[test]
    fn test_literal_rejects_others(v in value(), w in value()) {
        prop_assume!(v != w);
        let err = Schema::literal(v).validate(&w).unwrap_err();
        prop_assert_eq!(err.kind(), ErrorKind::ValueMismatch);
    }

    #[test]
    fn test_type_law(v in value()) {
        for ty in TYPES {
            let result = Schema::of_type(ty).validate(&v);
            if ty.matches(&v) {
                prop_assert_eq!(result.unwrap(), v.clone());
            } else {
                prop_assert_eq!(result.unwrap_err().kind(), ErrorKind::UnexpectedType);
            }
        }
    }

    #[test]
    fn test_bool_never_int(b in any::<bool>()) {
        prop_assert!(!Schema::of_type(ValueType::Int).is_valid(&Value::Bool(b)));
        prop_assert!(!Schema::of_type(ValueType::Number).is_valid(&Value::Bool(b)));
    }

    #[test]
    fn test_idempotent_without_conversions(v in value()) {
        let schema = Schema::or([
            Schema::list([ValueType::Any]),
            Schema::from(MapSchema::new().entry(ValueType::Any, ValueType::Any)),
            Schema::of_type(ValueType::Any),
        ]);
        let once = schema.validate(&v).unwrap();
        let twice = schema.validate(&once).unwrap();
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn test_empty_list_matches_any_element_schema(ty in prop::sample::select(TYPES.to_vec())) {
        let schema = Schema::list([ty]);
        prop_assert_eq!(schema.validate(&Value::List(Vec::new())).unwrap(), Value::List(Vec::new()));
    }
}

#[test]
fn test_required_key_law() {
    init_tracing();
    let schema: Schema = MapSchema::new()
        .entry("a", ValueType::Int)
        .entry(Key::optional("b"), ValueType::Int)
        .into();

    let err = schema.validate(&map([("b", Value::Int(1))])).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MissingKey);
    assert_eq!(err.message(), "Missing key: 'a'");
    assert_eq!(err.children()[0].path_string(), "$.a");

    assert!(schema.is_valid(&map([("a", Value::Int(1))])));
}

#[test]
fn test_default_law() {
    let key = Key::optional("retries").with_default(3).unwrap();
    let schema: Schema = MapSchema::new().entry(key, ValueType::Int).into();

    assert_eq!(
        schema.validate(&map([])).unwrap(),
        map([("retries", Value::Int(3))])
    );
    assert_eq!(
        schema.validate(&map([("retries", Value::Int(5))])).unwrap(),
        map([("retries", Value::Int(5))])
    );
}

#[test]
fn test_default_law_alongside_type_key() {
    let schema: Schema = MapSchema::new()
        .entry(Key::optional("color").with_default("blue").unwrap(), ValueType::Str)
        .entry(ValueType::Str, ValueType::Str)
        .into();
    assert_eq!(
        schema.validate(&map([("texture", Value::from("furry"))])).unwrap(),
        map([("color", Value::from("blue")), ("texture", Value::from("furry"))])
    );
}

#[test]
fn test_priority_law() {
    // A literal key claims its entry before the type key sees it.
    let schema: Schema = MapSchema::new()
        .entry(ValueType::Str, ValueType::Str)
        .entry("count", Schema::convert("double", |v| {
            Ok(Value::Int(v.as_i64().unwrap_or_default() * 2))
        }))
        .into();
    let out = schema
        .validate(&map([("count", Value::Int(2)), ("label", Value::from("x"))]))
        .unwrap();
    assert_eq!(out, map([("count", Value::Int(4)), ("label", Value::from("x"))]));
}

#[test]
fn test_forbidden_precedence() {
    let schema: Schema = MapSchema::new()
        .entry(Key::forbidden("legacy"), ValueType::Int)
        .entry(ValueType::Str, ValueType::Any)
        .into();

    for value in [Value::Int(1), Value::from("x"), Value::Null] {
        let err = schema.validate(&map([("legacy", value)])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ForbiddenKey);
        assert_eq!(err.path_string(), "$.legacy");
    }
}

#[test]
fn test_forbidden_reported_before_value_errors() {
    let schema: Schema = MapSchema::new()
        .entry("a", ValueType::Int)
        .entry(Key::forbidden("z"), ValueType::Any)
        .into();
    let err = schema
        .validate(&map([("a", Value::from("not an int")), ("z", Value::Null)]))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ForbiddenKey);
}

#[test]
fn test_exclusivity_law() {
    let schema: Schema = MapSchema::new()
        .entry(Key::optional(Schema::or_only_one(["json", "yaml", "toml"])), ValueType::Str)
        .into();

    assert!(schema.is_valid(&map([("yaml", Value::from("a.yaml"))])));
    let err = schema
        .validate(&map([("json", Value::from("a")), ("toml", Value::from("b"))]))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::OnlyOneAllowed);
}

#[test]
fn test_required_exclusive_group() {
    let schema: Schema = MapSchema::new()
        .entry(Schema::or_only_one(["key1", "key2"]), ValueType::Str)
        .into();

    assert!(schema.is_valid(&map([("key1", Value::from("a"))])));
    assert!(schema.is_valid(&map([("key2", Value::from("b"))])));

    let err = schema
        .validate(&map([("key1", Value::from("a")), ("key2", Value::from("b"))]))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::OnlyOneAllowed);

    let err = schema.validate(&map([])).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MissingKey);
    assert_eq!(err.message(), "Missing key: Or('key1', 'key2')");
}

#[test]
fn test_exclusivity_reported_before_missing() {
    let schema: Schema = MapSchema::new()
        .entry(Key::optional(Schema::or_only_one(["x", "y"])), ValueType::Int)
        .entry("required", ValueType::Int)
        .into();
    let err = schema
        .validate(&map([("x", Value::Int(1)), ("y", Value::Int(2))]))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::OnlyOneAllowed);
}

#[test]
fn test_missing_reported_before_unexpected() {
    let schema: Schema = MapSchema::new().entry("a", ValueType::Int).into();
    let err = schema.validate(&map([("b", Value::Int(1))])).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MissingKey);
}

#[test]
fn test_or_short_circuit() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counted = |calls: &Arc<AtomicUsize>| {
        let calls = Arc::clone(calls);
        Schema::predicate("counted", move |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            false
        })
    };
    let schema = Schema::or([
        counted(&calls),
        Schema::of_type(ValueType::Int),
        counted(&calls),
    ]);

    assert!(schema.is_valid(&Value::Int(1)));
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    let err = schema.validate(&Value::from("x")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Aggregate);
    assert_eq!(err.children().len(), 3);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}
