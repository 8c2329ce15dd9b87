use super::*;
use crate::fixtures::{self, leg, position, trade};
use chrono::NaiveDate;
use keel_ir::{EnumValue, ErrorCode, TypeDescriptor};
use pretty_assertions::assert_eq;

fn booked() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 31).unwrap()
}

fn trade_row() -> FlatRow {
    FlatRow::new("Trade")
        .with_key("`TradeKey`;T-1")
        .with_cell("trade_id", "T-1")
        .with_cell("side", r#"<DATA> {"_enum":"Side","_name":"Buy"}"#)
        .with_cell("notional", "1500000")
}

#[test]
fn flatten_writes_bare_and_marked_cells() {
    let registry = fixtures::registry();
    let codec = Codec::new(&registry);

    let record = trade("t-1", 1.5e6)
        .with("legs", Value::list([leg("USD")]))
        .with("booked", booked());
    let row = codec.flatten(&record).unwrap();

    assert_eq!(row.type_name(), "Trade");
    assert_eq!(row.key(), Some("`TradeKey`;T-1"));
    assert_eq!(
        row.cells(),
        &[
            ("trade_id".to_string(), "T-1".to_string()),
            (
                "side".to_string(),
                r#"<DATA> {"_enum":"Side","_name":"Buy"}"#.to_string()
            ),
            ("notional".to_string(), "1500000".to_string()),
            (
                "legs".to_string(),
                r#"<LIST> [{"currency":"USD","_type":"Leg"}]"#.to_string()
            ),
            ("booked".to_string(), "2024-01-31".to_string()),
        ]
    );
}

#[test]
fn nested_records_and_keys() {
    let registry = fixtures::registry();
    let codec = Codec::new(&registry);

    let row = codec.flatten(&position("rates", "IRS", 2.0)).unwrap();
    assert_eq!(row.key(), Some("`PositionKey`;`BookKey`;rates;main;IRS"));
    assert_eq!(
        row.cell("book"),
        Some(r#"<DATA> {"desk":"rates","book":"main","_type":"BookKey"}"#)
    );
    assert_eq!(row.cell("quantity"), Some("2"));

    // Data records have no key column.
    assert_eq!(codec.flatten(&leg("USD")).unwrap().key(), None);
}

#[test]
fn load_matches_tagged_decoding() {
    let registry = fixtures::registry();
    let codec = Codec::new(&registry);

    let records = [
        trade("t-1", 1.5e6)
            .with("legs", Value::list([leg("USD").with("amount", -3.25)]))
            .with("tags", Value::map([("desk", "rates"), ("region", "emea")]))
            .with("booked", booked()),
        position("credit", "CDX", 0.5),
        RecordValue::new("Swap")
            .with("trade_id", "S-9")
            .with("side", EnumValue::new("Side", "Sell"))
            .with("notional", f64::INFINITY)
            .with("fixed_rate", 0.01),
    ];
    for record in records {
        let via_flat = codec.load(&codec.flatten(&record).unwrap()).unwrap();
        let via_tagged = codec
            .deserialize(&codec.serialize(&record.clone().into()).unwrap())
            .unwrap();
        assert_eq!(via_flat, via_tagged, "{record:?}");
    }
}

#[test]
fn strings_that_look_marked_are_rejected() {
    let registry = fixtures::registry();
    let codec = Codec::new(&registry);

    assert_eq!(
        codec.flatten(&leg("<DATA> {}")),
        Err(CodecError::MalformedFlatCell {
            column: "currency".into(),
            reason: r#"string "<DATA> {}" would read back as a marked cell"#.into(),
        })
    );

    // Not a marker: lower-case name, missing separator.
    for text in ["<data> x", "<DATA>x", "<> x", "plain"] {
        let row = codec.flatten(&leg(text)).unwrap();
        assert_eq!(row.cell("currency"), Some(text));
        assert_eq!(codec.load(&row).unwrap(), Value::Record(leg(text)));
    }
}

#[test]
fn bad_cells_are_rejected() {
    let registry = fixtures::registry();
    let codec = Codec::new(&registry);

    let cases = [
        ("side", "<BLOB> {}", "unknown marker <BLOB>"),
        ("side", "<DATA> {", "corrupt <DATA> payload"),
        ("side", r#"<LIST> {"_enum":"Side","_name":"Buy"}"#, "<LIST> marker on a enum payload"),
        ("side", r#"<DATA> {"_enum":"Side"}"#, ""),
        ("notional", "lots", "\"lots\" is not a valid `float`"),
    ];
    for (column, text, reason) in cases {
        let base = trade_row();
        let cells = base
            .cells()
            .iter()
            .filter(|(name, _)| name != column)
            .cloned()
            .chain([(column.to_string(), text.to_string())])
            .collect();
        let row = FlatRow { cells, ..base };
        let err = codec.unflatten(&row).unwrap_err();
        assert_eq!(err.code(), ErrorCode::K3001, "{text}");
        let CodecError::MalformedFlatCell { column: got, reason: why } = err else {
            unreachable!()
        };
        assert_eq!(got, column);
        assert!(why.contains(reason), "{why}");
    }
}

#[test]
fn union_scalars_keep_their_kind() {
    let registry = fixtures::registry();
    registry
        .register(
            TypeDescriptor::data("Pick")
                .optional("u", DeclaredType::union([DeclaredType::INT, DeclaredType::STR]))
                .optional("n", DeclaredType::union([DeclaredType::INT, DeclaredType::FLOAT]))
                .optional("leg", DeclaredType::union([DeclaredType::record("Leg"), DeclaredType::INT]))
                .build(),
        )
        .unwrap();
    let codec = Codec::new(&registry);

    let pick = RecordValue::new("Pick").with("u", "5").with("n", 1.0).with("leg", 7);
    let row = codec.flatten(&pick).unwrap();
    assert_eq!(row.cell("u"), Some(r#"<VALUE> "5""#));
    assert_eq!(row.cell("n"), Some("<VALUE> 1.0"));
    assert_eq!(row.cell("leg"), Some("7"));
    assert_eq!(codec.load(&row).unwrap(), Value::Record(pick.clone()));
    assert_eq!(
        codec.load(&row).unwrap(),
        codec.deserialize(&codec.serialize(&pick.into()).unwrap()).unwrap()
    );

    let pick = RecordValue::new("Pick").with("u", 5).with("n", 1);
    let row = codec.flatten(&pick).unwrap();
    assert_eq!(row.cell("u"), Some("<VALUE> 5"));
    assert_eq!(codec.load(&row).unwrap(), Value::Record(pick));

    for text in ["<VALUE> [1]", "<VALUE> {"] {
        let row = FlatRow::new("Pick").with_cell("u", text);
        assert_eq!(codec.unflatten(&row).map_err(|e| e.code()), Err(ErrorCode::K3001), "{text}");
    }
}

#[test]
fn unknown_columns_and_missing_fields() {
    let registry = fixtures::registry();
    let codec = Codec::new(&registry);

    assert_eq!(
        codec.unflatten(&trade_row().with_cell("colour", "red")),
        Err(CodecError::UnknownField {
            type_name: "Trade".into(),
            field: "colour".into(),
        })
    );

    let partial = FlatRow::new("Trade").with_cell("trade_id", "T-1");
    assert_eq!(
        codec.load(&partial),
        Err(CodecError::RequiredFieldMissing {
            type_name: "Trade".into(),
            field: "side".into(),
        })
    );

    assert_eq!(
        codec.unflatten(&FlatRow::new("Bogus")),
        Err(CodecError::UnknownType {
            name: "Bogus".into()
        })
    );
}

#[test]
fn column_names_cover_the_hierarchy() {
    let registry = fixtures::registry();
    let codec = Codec::new(&registry);

    assert_eq!(
        codec.column_names("Swap").unwrap(),
        vec![
            "_type",
            "_key",
            "trade_id",
            "side",
            "notional",
            "legs",
            "tags",
            "booked",
            "fixed_rate"
        ]
    );
    assert_eq!(
        codec.column_names("Leg").unwrap(),
        vec!["_type", "_key", "currency", "amount"]
    );
    assert_eq!(
        codec.column_names("Side").map_err(|e| e.code()),
        Err(ErrorCode::K2005)
    );
}

#[test]
fn rows_to_and_from_store_columns() {
    let columns = trade_row().into_columns();
    assert_eq!(columns[0], ("_type".to_string(), "Trade".to_string()));
    assert_eq!(columns[1], ("_key".to_string(), "`TradeKey`;T-1".to_string()));
    assert_eq!(FlatRow::from_columns(columns).unwrap(), trade_row());

    let row = FlatRow::from_columns([("currency", "USD"), ("_key", ""), ("_type", "Leg")]).unwrap();
    assert_eq!(row, FlatRow::new("Leg").with_cell("currency", "USD"));
    assert_eq!(row.into_columns().len(), 2);

    assert_eq!(
        FlatRow::from_columns([("currency", "USD")]).map_err(|e| e.code()),
        Err(ErrorCode::K2002)
    );
}
