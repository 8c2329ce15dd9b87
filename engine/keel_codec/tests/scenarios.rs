//! End-to-end behavior through the public API: JSON in and out, keys,
//! enums, sparse optional fields and unknown discriminators.

#![allow(clippy::unwrap_used, clippy::expect_used, reason = "Tests can panic")]

use keel_codec::{from_json, to_json, Codec};
use keel_ir::{CodecError, DeclaredType, EnumValue, ErrorCode, RecordValue, TypeDescriptor, Value};
use keel_registry::TypeRegistry;
use pretty_assertions::assert_eq;

fn parse(text: &str) -> keel_ir::TaggedValue {
    from_json(&serde_json::from_str(text).unwrap()).unwrap()
}

#[test]
fn data_record_to_json() {
    keel_codec::init_tracing();
    let registry = TypeRegistry::new();
    registry
        .register(
            TypeDescriptor::data("Foo")
                .field("str_field", DeclaredType::STR)
                .field("int_field", DeclaredType::INT)
                .build(),
        )
        .unwrap();
    let codec = Codec::new(&registry);

    let foo = RecordValue::new("Foo")
        .with("str_field", "abc")
        .with("int_field", 0);
    let tagged = codec.serialize(&foo.clone().into()).unwrap();
    let json = to_json(&tagged).to_string();
    assert_eq!(json, r#"{"str_field":"abc","int_field":0,"_type":"Foo"}"#);

    assert_eq!(codec.deserialize(&parse(&json)).unwrap(), Value::Record(foo));
}

#[test]
fn composite_key_round_trip() {
    let registry = TypeRegistry::new();
    registry
        .register_all([
            TypeDescriptor::key("Bar")
                .field("str_field", DeclaredType::STR)
                .field("int_field", DeclaredType::INT)
                .build(),
            TypeDescriptor::key("Foo")
                .field("primitive", DeclaredType::STR)
                .field("embedded", DeclaredType::record("Bar"))
                .build(),
        ])
        .unwrap();
    registry.check_references().unwrap();
    let codec = Codec::new(&registry);

    let foo = RecordValue::new("Foo").with("primitive", "abc").with(
        "embedded",
        RecordValue::new("Bar")
            .with("str_field", "A")
            .with("int_field", 1),
    );
    let key = codec.serialize_key(&foo.clone().into()).unwrap();
    assert_eq!(key, "`Foo`;abc;`Bar`;A;1");
    assert_eq!(codec.deserialize_key(&key).unwrap(), Value::Record(foo));
}

#[test]
fn enum_to_json_and_back() {
    let registry = TypeRegistry::new();
    registry
        .register(TypeDescriptor::enumeration("Color", ["RED", "GREEN"]))
        .unwrap();
    let codec = Codec::new(&registry);

    let red = Value::Enum(EnumValue::new("Color", "RED"));
    let tagged = codec.serialize(&red).unwrap();
    assert_eq!(to_json(&tagged).to_string(), r#"{"_enum":"Color","_name":"Red"}"#);
    assert_eq!(codec.deserialize(&tagged).unwrap(), red);

    // Either spelling is accepted on input.
    assert_eq!(
        codec
            .deserialize(&parse(r#"{"_enum":"Color","_name":"RED"}"#))
            .unwrap(),
        red
    );
}

#[test]
fn empty_lists_are_omitted() {
    let registry = TypeRegistry::new();
    registry
        .register_all([
            TypeDescriptor::data("Basket")
                .field("name", DeclaredType::STR)
                .optional("items", DeclaredType::list(DeclaredType::INT))
                .build(),
            TypeDescriptor::data("StrictBasket")
                .field("name", DeclaredType::STR)
                .field("items", DeclaredType::list(DeclaredType::INT))
                .build(),
        ])
        .unwrap();
    let codec = Codec::new(&registry);

    let basket = RecordValue::new("Basket")
        .with("name", "b")
        .with("items", Value::List(vec![]));
    let tagged = codec.serialize(&basket.into()).unwrap();
    assert_eq!(to_json(&tagged).to_string(), r#"{"name":"b","_type":"Basket"}"#);
    let Value::Record(back) = codec.deserialize(&tagged).unwrap() else {
        panic!("expected a record");
    };
    assert_eq!(back.get("items"), None);

    let strict = parse(r#"{"name":"b","_type":"StrictBasket"}"#);
    assert_eq!(
        codec.deserialize(&strict),
        Err(CodecError::RequiredFieldMissing {
            type_name: "StrictBasket".into(),
            field: "items".into(),
        })
    );
}

#[test]
fn unknown_discriminator() {
    let registry = TypeRegistry::new();
    let codec = Codec::new(&registry);

    assert_eq!(
        codec.deserialize(&parse(r#"{"x":1,"_type":"Bogus"}"#)),
        Err(CodecError::UnknownType {
            name: "Bogus".into()
        })
    );
}

#[test]
fn short_names_are_unique() {
    let registry = TypeRegistry::new();
    registry
        .register(TypeDescriptor::data("Foo").field("a", DeclaredType::STR).build())
        .unwrap();
    // Identical re-registration is a no-op.
    registry
        .register(TypeDescriptor::data("Foo").field("a", DeclaredType::STR).build())
        .unwrap();

    let err = registry
        .register(TypeDescriptor::data("Foo").field("a", DeclaredType::INT).build())
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::K1001);
    assert!(err.is_registration_error());
}

#[test]
fn flat_rows_through_store_columns() {
    let registry = TypeRegistry::new();
    registry
        .register_all([
            TypeDescriptor::key("AccountKey")
                .field("number", DeclaredType::INT)
                .build(),
            TypeDescriptor::record("Account")
                .extends("AccountKey")
                .field("owner", DeclaredType::STR)
                .optional("limits", DeclaredType::map(DeclaredType::FLOAT))
                .build(),
        ])
        .unwrap();
    let codec = Codec::new(&registry);

    let account = RecordValue::new("Account")
        .with("number", 42)
        .with("owner", "ada")
        .with("limits", Value::map([("daily", 500.0), ("monthly", 2_500.5)]));
    let columns = codec.flatten(&account).unwrap().into_columns();
    assert_eq!(
        columns,
        vec![
            ("_type".to_string(), "Account".to_string()),
            ("_key".to_string(), "`AccountKey`;42".to_string()),
            ("number".to_string(), "42".to_string()),
            ("owner".to_string(), "ada".to_string()),
            (
                "limits".to_string(),
                r#"<DICT> {"daily":500.0,"monthly":2500.5}"#.to_string()
            ),
        ]
    );

    let row = keel_codec::FlatRow::from_columns(columns).unwrap();
    assert_eq!(codec.load(&row).unwrap(), Value::Record(account));
}
