use super::*;
use crate::fixtures::{self, leg, position, trade};
use keel_ir::ErrorCode;
use pretty_assertions::assert_eq;

#[test]
fn results_follow_input_order() {
    let registry = fixtures::registry();
    let codec = Codec::new(&registry);

    let values: Vec<Value> = (0..64)
        .map(|i| Value::Record(trade(&format!("t-{i}"), f64::from(i))))
        .collect();
    let trees: Vec<TaggedValue> = codec
        .serialize_all(&values)
        .into_iter()
        .collect::<Result<_, _>>()
        .unwrap();
    for (i, tree) in trees.iter().enumerate() {
        assert_eq!(
            tree.field("trade_id"),
            Some(&TaggedValue::Str(format!("T-{i}")))
        );
    }

    let back: Vec<Value> = codec
        .deserialize_all(&trees)
        .into_iter()
        .collect::<Result<_, _>>()
        .unwrap();
    for (i, value) in back.iter().enumerate() {
        let record = value.as_record().unwrap();
        assert_eq!(record.get("trade_id"), Some(&Value::from(format!("T-{i}"))));
    }

    let keys: Vec<String> = codec
        .serialize_keys(&values)
        .into_iter()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(keys[7], "`TradeKey`;T-7");
}

#[test]
fn failures_stay_with_their_item() {
    let registry = fixtures::registry();
    let codec = Codec::new(&registry);

    let records = vec![
        trade("a", 1.0),
        leg("USD").with("colour", "red"),
        position("d", "i", 2.0),
    ];
    let rows = codec.flatten_all(&records);
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].as_ref().map(FlatRow::key), Ok(Some("`TradeKey`;A")));
    assert_eq!(
        rows[1].as_ref().map_err(CodecError::code),
        Err(ErrorCode::K2003)
    );
    assert!(rows[2].is_ok());

    let values: Vec<Value> = records.into_iter().map(Value::Record).collect();
    let keys = codec.serialize_keys(&values);
    assert!(keys[0].is_ok());
    assert_eq!(
        keys[1].as_ref().map_err(CodecError::code),
        Err(ErrorCode::K1004)
    );
    assert_eq!(
        keys[2].as_deref(),
        Ok("`PositionKey`;`BookKey`;d;main;i")
    );
}
