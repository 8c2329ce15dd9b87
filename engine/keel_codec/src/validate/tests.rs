use super::*;
use crate::fixtures::{self, book, leg, trade};
use keel_ir::EnumValue;
use pretty_assertions::assert_eq;

#[test]
fn accepts_well_formed_records() {
    let registry = fixtures::registry();
    let codec = Codec::new(&registry);

    let record = trade("T-1", 10.0)
        .with("legs", Value::list([leg("USD").with("amount", 2.5)]))
        .with("tags", Value::map([("desk", "rates")]));
    assert_eq!(codec.validate(&record), Ok(()));

}

#[test]
fn ints_are_not_floats() {
    let registry = fixtures::registry();
    let codec = Codec::new(&registry);

    let record = trade("T-2", 0.0).with("notional", 7);
    let expected = Err(CodecError::FieldTypeMismatch {
        context: "Trade.notional".into(),
        expected: "float".into(),
        found: "int".into(),
    });
    assert_eq!(codec.validate(&record), expected);
    assert_eq!(
        codec.serialize(&record.into()).map_err(|e| e.code()),
        Err(keel_ir::ErrorCode::K2005)
    );
}

#[test]
fn reports_missing_and_undeclared_fields() {
    let registry = fixtures::registry();
    let codec = Codec::new(&registry);

    let mut record = trade("T-1", 10.0);
    record.remove("notional");
    assert_eq!(
        codec.validate(&record),
        Err(CodecError::RequiredFieldMissing {
            type_name: "Trade".into(),
            field: "notional".into(),
        })
    );

    assert_eq!(
        codec.validate(&leg("USD").with("colour", "red")),
        Err(CodecError::UnknownField {
            type_name: "Leg".into(),
            field: "colour".into(),
        })
    );
}

#[test]
fn checks_nested_records_deeply() {
    let registry = fixtures::registry();
    let codec = Codec::new(&registry);

    let record = trade("T-1", 10.0).with(
        "legs",
        Value::list([leg("USD"), RecordValue::new("Leg").with("amount", 1.0)]),
    );
    assert_eq!(
        codec.validate(&record),
        Err(CodecError::RequiredFieldMissing {
            type_name: "Leg".into(),
            field: "currency".into(),
        })
    );
}

#[test]
fn reports_mismatches_with_paths() {
    let registry = fixtures::registry();
    let codec = Codec::new(&registry);

    let cases = [
        (
            trade("T-1", 1.0).with("notional", "lots"),
            ("Trade.notional", "float", "str"),
        ),
        (
            trade("T-1", 1.0).with("side", 1),
            ("Trade.side", "Side", "int"),
        ),
        (
            trade("T-1", 1.0).with("side", EnumValue::new("Side", "HOLD")),
            ("Trade.side", "Side", "Side"),
        ),
        (
            trade("T-1", 1.0).with("tags", Value::map([("a", 1i64)])),
            ("Trade.tags{a}", "str", "int"),
        ),
        (
            trade("T-1", 1.0).with("legs", Value::list([book("d", "b")])),
            ("Trade.legs[0]", "Leg", "BookKey"),
        ),
        (
            trade("T-1", 1.0).with("legs", Value::from("USD")),
            ("Trade.legs", "list[Leg]", "str"),
        ),
    ];

    for (record, (context, expected, found)) in cases {
        assert_eq!(
            codec.validate(&record),
            Err(CodecError::FieldTypeMismatch {
                context: context.into(),
                expected: expected.into(),
                found: found.into(),
            }),
            "{context}"
        );
    }
}

#[test]
fn unions_accept_any_alternative() {
    let registry = fixtures::registry();
    let codec = Codec::new(&registry);
    let either = DeclaredType::union([DeclaredType::INT, DeclaredType::record("Leg")]);
    let root = Path::root("value");

    for value in [Value::from(3i64), Value::Record(leg("USD")), Value::Null] {
        assert_eq!(
            codec.check_value(&value, &either, &root, Nested::Checked, 0),
            Ok(()),
            "{value:?}"
        );
    }
    assert_eq!(
        codec
            .check_value(&Value::from("x"), &either, &root, Nested::Checked, 0)
            .map_err(|e| e.code()),
        Err(keel_ir::ErrorCode::K2005)
    );

    // A matching alternative with a bad nested record reports that record.
    let incomplete = Value::Record(RecordValue::new("Leg"));
    assert_eq!(
        codec.check_value(&incomplete, &either, &root, Nested::Checked, 0),
        Err(CodecError::RequiredFieldMissing {
            type_name: "Leg".into(),
            field: "currency".into(),
        })
    );
}

#[test]
fn trusted_mode_skips_nested_fields() {
    let registry = fixtures::registry();
    let codec = Codec::new(&registry);
    let declared = DeclaredType::record("Leg");
    let root = Path::root("value");
    let incomplete = Value::Record(RecordValue::new("Leg"));

    assert_eq!(
        codec.check_value(&incomplete, &declared, &root, Nested::Trusted, 0),
        Ok(())
    );
    assert!(codec
        .check_value(&incomplete, &declared, &root, Nested::Checked, 0)
        .is_err());
}
