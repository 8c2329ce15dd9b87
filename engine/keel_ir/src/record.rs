//! Bridge between Rust structs and [`RecordValue`].

use crate::{CodecError, RecordValue, TypeDescriptor};

/// A Rust type stored through the keel codecs.
///
/// Implemented by hand (or by generated code) for each storable struct.
/// The descriptor is the single source of truth for field order, key role
/// and init hook; `to_record`/`from_record` only move field values.
///
/// ```text
/// impl Record for TradeKey {
///     fn descriptor() -> TypeDescriptor {
///         TypeDescriptor::key("TradeKey").field("trade_id", DeclaredType::STR).build()
///     }
///
///     fn to_record(&self) -> RecordValue {
///         RecordValue::new("TradeKey").with("trade_id", self.trade_id.as_str())
///     }
///
///     fn from_record(record: &RecordValue) -> Result<Self, CodecError> {
///         Ok(TradeKey { trade_id: record.require("trade_id")? })
///     }
/// }
/// ```
pub trait Record: Sized {
    fn descriptor() -> TypeDescriptor;

    fn to_record(&self) -> RecordValue;

    fn from_record(record: &RecordValue) -> Result<Self, CodecError>;
}
