use super::*;
use pretty_assertions::assert_eq;

#[test]
fn sentinels_clear_fields() {
    let mut record = RecordValue::new("Foo")
        .with("str_field", "abc")
        .with("tags", Value::list(["a", "b"]));
    assert_eq!(record.len(), 2);

    record.set("tags", Value::List(Vec::new()));
    record.set("str_field", Value::Null);
    assert!(record.is_empty());
    assert_eq!(record, RecordValue::new("Foo"));
}

#[test]
fn empty_map_is_not_a_sentinel() {
    let record = RecordValue::new("Foo").with("attrs", Value::Map(BTreeMap::new()));
    assert!(record.contains("attrs"));
}

#[test]
fn equality_ignores_initialization() {
    let mut a = RecordValue::new("Foo").with("int_field", 0);
    let b = a.clone();
    a.mark_initialized();
    assert!(a.is_initialized());
    assert!(!b.is_initialized());
    assert_eq!(a, b);
}

#[test]
fn typed_reads() {
    let record = RecordValue::new("Foo")
        .with("name", "abc")
        .with("count", 3)
        .with("ratio", 2.0)
        .with("tags", Value::list(["x", "y"]));

    assert_eq!(record.require::<String>("name"), Ok("abc".to_string()));
    assert_eq!(record.require::<i64>("count"), Ok(3));
    assert_eq!(record.require::<f64>("ratio"), Ok(2.0));
    assert_eq!(
        record.require::<Vec<String>>("tags"),
        Ok(vec!["x".to_string(), "y".to_string()])
    );
    assert_eq!(record.optional::<bool>("flag"), Ok(None));

    assert_eq!(
        record.require::<bool>("missing"),
        Err(CodecError::RequiredFieldMissing {
            type_name: TypeName::new("Foo"),
            field: "missing".to_string(),
        })
    );
    assert_eq!(
        record.require::<bool>("name"),
        Err(CodecError::FieldTypeMismatch {
            context: "Foo.name".to_string(),
            expected: "bool".to_string(),
            found: "str".to_string(),
        })
    );
    assert_eq!(
        record.require::<f64>("count"),
        Err(CodecError::FieldTypeMismatch {
            context: "Foo.count".to_string(),
            expected: "float".to_string(),
            found: "int".to_string(),
        })
    );
}

#[test]
fn enum_members_canonicalize() {
    assert_eq!(EnumValue::new("Color", "RED"), EnumValue::new("Color", "Red"));
    assert_eq!(EnumValue::new("Color", "RED").member, "Red");
}

#[test]
fn classification() {
    assert!(Value::from("x").is_primitive());
    assert!(Value::bytes(vec![1, 2]).is_primitive());
    assert!(!Value::from(EnumValue::new("Color", "Red")).is_primitive());
    assert!(!Value::list([1, 2]).is_primitive());
    assert!(Value::Null.is_sentinel());
    assert!(!Value::from(0).is_sentinel());
    assert_eq!(Value::from(None::<i64>), Value::Null);
    assert_eq!(Value::from(RecordValue::new("Bar")).type_label(), "Bar");
}
