//! Model Stacking Tests
//!
//! Declarations with aliases, mutability, defaults, nested models,
//! inheritance and custom initializers:
//! - Nested input is coerced into a fresh record, never shared
//! - Immutable fields refuse writes; mutable writes stay on one record
//! - Name and alias address the same stored value
//! - A subtype overrides base fields by name and keeps the rest
//! - Declared fields are assigned before the initializer runs

use simple_model::model::{
    casters, Attribute, BuildOptions, CastError, Caster, ErrorKind, InitArgs, Mapping,
    Model, ModelErrorCode, NotImplemented, Record, Value,
};
use serde_json::json;

// =============================================================================
// Helper Functions
// =============================================================================

fn test_model() -> Model {
    Model::declare("TestModel")
        .attribute("foo", Attribute::new(casters::string()).help("foo is a str"))
        .attribute(
            "bar",
            Attribute::new(casters::integer()).optional().mutable(false),
        )
        .attribute("baz", Attribute::new(casters::integer()).default(12))
        .mutable(true)
        .build()
        .unwrap()
}

fn stacked_model(inner: &Model) -> Model {
    Model::declare("StackedModel")
        .attribute("foobar", Attribute::record(inner))
        .build()
        .unwrap()
}

fn nested(record: &Record, field: &str) -> Record {
    record
        .get(field)
        .unwrap()
        .as_record()
        .expect("nested record")
        .clone()
}

// =============================================================================
// Creation
// =============================================================================

#[test]
fn test_creation_applies_defaults() {
    let m = test_model().build(json!({"foo": "abc"})).unwrap();

    assert_eq!(m.get("foo").unwrap(), &Value::from("abc"));
    assert_eq!(m.get("baz").unwrap(), &Value::Int(12));
    assert!(m.get("bar").unwrap().is_null());
    assert_eq!(m["foo"], Value::from("abc"));

    let err = m.lookup("fooo").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Lookup);
}

#[test]
#[should_panic(expected = "MODEL_UNKNOWN_KEY")]
fn test_index_unknown_key_panics() {
    let m = test_model().build(json!({"foo": "abc"})).unwrap();
    let _ = &m["fooo"];
}

#[test]
fn test_memory_independence() {
    let model = test_model();
    let m1 = model.build(json!({"foo": "abc", "baz": 33})).unwrap();
    let m2 = model.build(json!({"foo": "def"})).unwrap();

    assert_eq!(m1.get("baz").unwrap(), &Value::Int(33));
    assert_eq!(m2.get("baz").unwrap(), &Value::Int(12));
    assert_eq!(m2.get("foo").unwrap(), &Value::from("def"));
}

/// Composite defaults are copied per record.
#[test]
fn test_composite_default_not_shared() {
    let model = Model::declare("Tagged")
        .attribute(
            "tags",
            Attribute::new(casters::list(casters::string())).default(Value::List(vec![])),
        )
        .mutable(true)
        .build()
        .unwrap();

    let mut first = model.build(json!({})).unwrap();
    let second = model.build(json!({})).unwrap();
    first.set("tags", json!(["x"])).unwrap();

    assert_eq!(first.get("tags").unwrap(), &Value::List(vec![Value::from("x")]));
    assert_eq!(second.get("tags").unwrap(), &Value::List(vec![]));
}

// =============================================================================
// P8: Nested coercion and independence
// =============================================================================

#[test]
fn test_nested_mapping_builds_record() {
    let inner = test_model();
    let s = stacked_model(&inner).build(json!({"foobar": {"foo": "abc"}})).unwrap();

    let foobar = nested(&s, "foobar");
    assert!(foobar.model().same_as(&inner));
    assert_eq!(foobar.get("baz").unwrap(), &Value::Int(12));
}

#[test]
fn test_nested_record_is_copied() {
    let inner = test_model();
    let outer = stacked_model(&inner);
    let mut m = inner.build(json!({"foo": "abc"})).unwrap();

    let mut input = Mapping::new();
    input.insert("foobar", m.clone());
    let s = outer.build(input).unwrap();

    let copy = s.get("foobar").unwrap().as_record().unwrap();
    assert_eq!(copy, &m);
    assert!(!std::ptr::eq(copy, &m));

    // Writing the original does not reach the copy
    m.set("foo", "changed").unwrap();
    assert_eq!(nested(&s, "foobar").get("foo").unwrap(), &Value::from("abc"));
}

#[test]
fn test_stacked_record_rebuilds_from_itself() {
    let inner = test_model();
    let outer = stacked_model(&inner);
    let s = outer.build(json!({"foobar": {"foo": "abc"}})).unwrap();

    assert_eq!(outer.build(s.clone()).unwrap(), s);
    assert_eq!(outer.from_mapping(s.to_mapping(), false, false).unwrap(), s);
}

#[test]
fn test_nested_failure_reports_path() {
    let outer = stacked_model(&test_model());
    let err = outer.build(json!({"foobar": {"foo": "abc", "baz": "many"}})).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Value);
    assert_eq!(err.field(), Some("foobar.baz"));

    let err = outer.build(json!({"foobar": {}})).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Structural);
    assert_eq!(err.field(), Some("foobar.foo"));
}

#[test]
fn test_nested_rejects_scalars() {
    let outer = stacked_model(&test_model());
    let err = outer.build(json!({"foobar": 3})).unwrap_err();
    assert_eq!(err.code(), ModelErrorCode::ModelInvalidValue);
}

#[test]
fn test_default_record_built_fresh() {
    let inner = Model::declare("Settings")
        .attribute("verbose", Attribute::new(casters::boolean()).default(false))
        .mutable(true)
        .build()
        .unwrap();
    let outer = Model::declare("App")
        .attribute("settings", Attribute::record(&inner).default_record(&inner))
        .build()
        .unwrap();

    let a = outer.build(json!({})).unwrap();
    let b = outer.build(json!({})).unwrap();
    assert_eq!(nested(&a, "settings").get("verbose").unwrap(), &Value::Bool(false));
    assert_eq!(a, b);
}

// =============================================================================
// P9: Mutability
// =============================================================================

#[test]
fn test_mutable_fields_accept_writes() {
    let mut m = test_model().build(json!({"foo": "abc"})).unwrap();
    m.set("foo", "fofo").unwrap();
    assert_eq!(m.get("foo").unwrap(), &Value::from("fofo"));
}

#[test]
fn test_immutable_field_refuses_writes() {
    let mut m = test_model().build(json!({"foo": "abc"})).unwrap();
    let err = m.set("bar", "abc").unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Access);
    assert_eq!(err.code(), ModelErrorCode::ModelImmutableAttribute);
    assert!(m.get("bar").unwrap().is_null());
}

#[test]
fn test_field_level_mutable_on_immutable_model() {
    let model = Model::declare("TestModel2")
        .attribute("foobar", Attribute::new(casters::integer()).mutable(true))
        .attribute("fixed", Attribute::new(casters::integer()).default(1))
        .build()
        .unwrap();

    let mut m2 = model.build(json!({"foobar": 12})).unwrap();
    let other = model.build(json!({"foobar": 12})).unwrap();

    m2.set("foobar", 3).unwrap();
    assert_eq!(m2.get("foobar").unwrap(), &Value::Int(3));
    assert_eq!(other.get("foobar").unwrap(), &Value::Int(12));

    assert_eq!(m2.set("fixed", 2).unwrap_err().kind(), ErrorKind::Access);
}

#[test]
fn test_writes_go_through_the_caster() {
    let mut m = test_model().build(json!({"foo": "abc"})).unwrap();
    m.set("baz", "40").unwrap();
    assert_eq!(m.get("baz").unwrap(), &Value::Int(40));

    let err = m.set("baz", "forty").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Value);
    assert_eq!(m.get("baz").unwrap(), &Value::Int(40));
}

#[test]
fn test_write_unknown_field_is_access_error() {
    let mut m = test_model().build(json!({"foo": "abc"})).unwrap();
    let err = m.set("nope", 1).unwrap_err();
    assert_eq!(err.code(), ModelErrorCode::ModelUnknownAttribute);
}

// =============================================================================
// P10: Alias dual access
// =============================================================================

fn alias_model() -> Model {
    Model::declare("AliasModel")
        .attribute("foobar", Attribute::new(casters::string()).alias("@foobar"))
        .build()
        .unwrap()
}

#[test]
fn test_alias_at_construction() {
    for key in ["@foobar", "foobar"] {
        let input: Mapping = [(key, Value::from("abc"))].into_iter().collect();
        let m = alias_model().build(input).unwrap();

        assert_eq!(m.get("foobar").unwrap(), &Value::from("abc"));
        assert_eq!(m.lookup("@foobar").unwrap(), &Value::from("abc"));
        assert!(std::ptr::eq(
            m.get("foobar").unwrap(),
            m.lookup("@foobar").unwrap()
        ));
    }
}

#[test]
fn test_alias_projection_uses_field_name() {
    let m = alias_model().build(json!({"@foobar": "abc"})).unwrap();
    assert_eq!(m.keys().collect::<Vec<_>>(), vec!["foobar"]);
}

#[test]
fn test_name_and_alias_together_is_structural() {
    let err = alias_model()
        .build(json!({"foobar": "a", "@foobar": "b"}))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Structural);
}

#[test]
fn test_colliding_alias_rejected_at_declaration() {
    let err = Model::declare("Clash")
        .attribute("a", Attribute::new(casters::string()))
        .attribute("b", Attribute::new(casters::string()).alias("a"))
        .build()
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Declaration);
}

// =============================================================================
// Custom Initializer
// =============================================================================

fn init_model() -> Model {
    Model::declare("InitModel")
        .attribute("foobar", Attribute::new(casters::string()))
        .initializer(|record: &mut Record, args: InitArgs| {
            // Declared fields are already assigned
            let seen = record.get("foobar")?.clone();
            record.set_state("seen", seen)?;
            record.set_state("arg", args.arg(0).cloned().unwrap_or_default())?;
            record.set_state("omg", args.keyword("omg").cloned().unwrap_or_default())?;
            Ok(())
        })
        .initializer_keywords(["omg"])
        .build()
        .unwrap()
}

#[test]
fn test_initializer_receives_leftovers() {
    let m = init_model()
        .construct(
            vec![Value::from(123)],
            json!({"foobar": "abcdef", "omg": 456}),
            &BuildOptions::default(),
        )
        .unwrap();

    assert_eq!(m.get("foobar").unwrap(), &Value::from("abcdef"));
    assert_eq!(m.get("arg").unwrap(), &Value::Int(123));
    assert_eq!(m.get("omg").unwrap(), &Value::Int(456));
    assert_eq!(m.state("seen"), Some(&Value::from("abcdef")));

    // Initializer state stays out of the projection
    assert_eq!(m.to_mapping().len(), 1);
}

#[test]
fn test_initializer_model_rejects_unnamed_keywords() {
    let err = init_model()
        .construct(
            vec![],
            json!({"foobar": "x", "typo": 1}),
            &BuildOptions::default(),
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Structural);
    assert_eq!(err.code(), ModelErrorCode::ModelUnexpectedField);
    assert_eq!(err.field(), Some("typo"));

    // Reported before the bad declared value is cast
    let err = init_model()
        .construct(vec![], json!({"foobar": [1], "typo": 1}), &BuildOptions::default())
        .unwrap_err();
    assert_eq!(err.code(), ModelErrorCode::ModelUnexpectedField);
}

#[test]
fn test_initializer_model_discards_unnamed_keywords_when_allowed() {
    let m = init_model()
        .construct(
            vec![Value::from(1)],
            json!({"foobar": "x", "omg": 2, "typo": 3}),
            &BuildOptions::new().allow_unknown(true),
        )
        .unwrap();
    assert_eq!(m.get("omg").unwrap(), &Value::Int(2));
    assert!(m.get("typo").is_err());
}

#[test]
fn test_initializer_still_requires_declared_fields() {
    let err = init_model()
        .construct(vec![], json!({"omg": 1}), &BuildOptions::default())
        .unwrap_err();
    assert_eq!(err.code(), ModelErrorCode::ModelMissingField);
}

#[test]
fn test_positional_without_initializer_is_structural() {
    let err = alias_model()
        .construct(vec![Value::from(1)], json!({"foobar": "x"}), &BuildOptions::default())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Structural);
}

#[test]
fn test_initializer_error_is_domain() {
    let model = Model::declare("Failing")
        .initializer(|_: &mut Record, _: InitArgs| Err(Box::new(NotImplemented) as _))
        .build()
        .unwrap();
    let err = model.build(json!({})).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Domain);
    assert!(err.domain_error::<NotImplemented>().is_some());
}

// =============================================================================
// P11: Inheritance override
// =============================================================================

fn encode() -> Caster {
    Caster::new("encode", |v| match v {
        Value::String(s) => Ok(Value::Bytes(s.as_bytes().to_vec())),
        Value::Bytes(b) => Ok(Value::Bytes(b.clone())),
        other => Err(CastError::invalid("string", other)),
    })
}

fn decode(record: &Record) -> String {
    let bytes = record.get("encode").unwrap().as_bytes().unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn super_model() -> Model {
    Model::declare("Super")
        .attribute(
            "encode",
            Attribute::new(Caster::new("not_implemented", |_| Err(CastError::not_implemented()))),
        )
        .attribute("label", Attribute::new(casters::string()).optional())
        .build()
        .unwrap()
}

#[test]
fn test_base_caster_domain_error_propagates() {
    let err = super_model().build(json!({"encode": "abcdef"})).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Domain);
    assert_eq!(err.field(), Some("encode"));
    assert!(err.domain_error::<NotImplemented>().is_some());
}

#[test]
fn test_subtype_overrides_caster() {
    let base = super_model();
    let child = Model::declare("Child")
        .attribute("encode", Attribute::new(encode()))
        .extends(&base)
        .build()
        .unwrap();

    let m = child.build(json!({"encode": "abcdef", "label": "x"})).unwrap();
    assert_eq!(m.get("encode").unwrap(), &Value::Bytes(b"abcdef".to_vec()));
    assert_eq!(decode(&m), "abcdef");
    assert_eq!(m.get("label").unwrap(), &Value::from("x"));

    assert!(child.extends(&base));
    assert_eq!(child.schema().names().collect::<Vec<_>>(), vec!["encode", "label"]);
}

#[test]
fn test_subtype_inherits_type_level_flags() {
    let base = Model::declare("Base")
        .attribute("a", Attribute::new(casters::integer()))
        .mutable(true)
        .allow_unknown(true)
        .build()
        .unwrap();
    let child = Model::declare("Sub")
        .attribute("b", Attribute::new(casters::integer()).default(0))
        .extends(&base)
        .build()
        .unwrap();

    let mut m = child.build(json!({"a": 1, "zzz": 2})).unwrap();
    m.set("a", 5).unwrap();
    assert_eq!(m.get("a").unwrap(), &Value::Int(5));
    assert!(m.get("zzz").is_err());
}
