//! Schema shared by the unit tests.

use keel_ir::{DeclaredType, EnumValue, RecordValue, TypeDescriptor, Value};
use keel_registry::TypeRegistry;

fn upper_trade_id(record: &mut RecordValue) -> Result<(), String> {
    if let Some(Value::Str(id)) = record.get("trade_id") {
        let upper = id.to_uppercase();
        record.set("trade_id", upper);
    }
    Ok(())
}

fn non_negative(record: &mut RecordValue) -> Result<(), String> {
    match record.get("value") {
        Some(Value::Int(n)) if *n < 0 => Err(format!("value {n} is negative")),
        _ => Ok(()),
    }
}

pub(crate) fn registry() -> TypeRegistry {
    let registry = TypeRegistry::new();
    registry
        .register_all([
            TypeDescriptor::enumeration("Side", ["BUY", "SELL"]),
            TypeDescriptor::data("Leg")
                .field("currency", DeclaredType::STR)
                .optional("amount", DeclaredType::FLOAT)
                .build(),
            TypeDescriptor::key("TradeKey")
                .field("trade_id", DeclaredType::STR)
                .init(upper_trade_id)
                .build(),
            TypeDescriptor::record("Trade")
                .extends("TradeKey")
                .field("side", DeclaredType::enumeration("Side"))
                .field("notional", DeclaredType::FLOAT)
                .optional("legs", DeclaredType::list(DeclaredType::record("Leg")))
                .optional("tags", DeclaredType::map(DeclaredType::STR))
                .optional("booked", DeclaredType::DATE)
                .build(),
            TypeDescriptor::record("Swap")
                .extends("Trade")
                .optional("fixed_rate", DeclaredType::FLOAT)
                .build(),
            TypeDescriptor::key("BookKey")
                .field("desk", DeclaredType::STR)
                .field("book", DeclaredType::STR)
                .build(),
            TypeDescriptor::key("PositionKey")
                .field("book", DeclaredType::record("BookKey"))
                .field("instrument", DeclaredType::STR)
                .build(),
            TypeDescriptor::record("Position")
                .extends("PositionKey")
                .field("quantity", DeclaredType::FLOAT)
                .build(),
            TypeDescriptor::data("Checked")
                .field("value", DeclaredType::INT)
                .init(non_negative)
                .build(),
            TypeDescriptor::data("Node")
                .optional("next", DeclaredType::record("Node"))
                .build(),
        ])
        .expect("fixture schema registers");
    registry
}

pub(crate) fn buy() -> EnumValue {
    EnumValue::new("Side", "BUY")
}

pub(crate) fn trade(id: &str, notional: f64) -> RecordValue {
    RecordValue::new("Trade")
        .with("trade_id", id)
        .with("side", buy())
        .with("notional", notional)
}

pub(crate) fn leg(currency: &str) -> RecordValue {
    RecordValue::new("Leg").with("currency", currency)
}

pub(crate) fn book(desk: &str, book: &str) -> RecordValue {
    RecordValue::new("BookKey")
        .with("desk", desk)
        .with("book", book)
}

pub(crate) fn position(desk: &str, instrument: &str, quantity: f64) -> RecordValue {
    RecordValue::new("Position")
        .with("book", book(desk, "main"))
        .with("instrument", instrument)
        .with("quantity", quantity)
}

/// `Node` chain `depth` records deep.
pub(crate) fn chain(depth: usize) -> RecordValue {
    let mut node = RecordValue::new("Node");
    for _ in 1..depth {
        node = RecordValue::new("Node").with("next", node);
    }
    node
}
