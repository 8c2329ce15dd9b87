//! Runtime values.
//!
//! `Value` is the in-memory object graph the codecs read and produce. Records
//! carry their *runtime* type name, which may be a subtype of the type a
//! field declares; that name is what the tagged codec writes as the
//! discriminator.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use uuid::Uuid;

use crate::{canonical_member_name, CodecError, TypeName};

#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// Not set.
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(DateTime<Utc>),
    Uuid(Uuid),
    Bytes(Vec<u8>),
    Enum(EnumValue),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
    Record(RecordValue),
}

impl Value {
    pub fn list(items: impl IntoIterator<Item = impl Into<Value>>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }

    pub fn map<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        Value::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Value::Bytes(bytes.into())
    }

    /// `Null` and the empty list both mean "not set".
    pub fn is_sentinel(&self) -> bool {
        match self {
            Value::Null => true,
            Value::List(items) => items.is_empty(),
            _ => false,
        }
    }

    /// Scalars that serialize to a bare primitive (enums do not).
    pub fn is_primitive(&self) -> bool {
        matches!(
            self,
            Value::Bool(_)
                | Value::Int(_)
                | Value::Float(_)
                | Value::Str(_)
                | Value::Date(_)
                | Value::Time(_)
                | Value::DateTime(_)
                | Value::Uuid(_)
                | Value::Bytes(_)
        )
    }

    /// Short description of the value's runtime type, for error messages.
    pub fn type_label(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Bool(_) => "bool".to_string(),
            Value::Int(_) => "int".to_string(),
            Value::Float(_) => "float".to_string(),
            Value::Str(_) => "str".to_string(),
            Value::Date(_) => "date".to_string(),
            Value::Time(_) => "time".to_string(),
            Value::DateTime(_) => "datetime".to_string(),
            Value::Uuid(_) => "uuid".to_string(),
            Value::Bytes(_) => "bytes".to_string(),
            Value::Enum(e) => e.type_name.to_string(),
            Value::List(_) => "list".to_string(),
            Value::Map(_) => "dict".to_string(),
            Value::Record(r) => r.type_name().to_string(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&RecordValue> {
        match self {
            Value::Record(r) => Some(r),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(i64::from(n))
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Value::Date(d)
    }
}

impl From<NaiveTime> for Value {
    fn from(t: NaiveTime) -> Self {
        Value::Time(t)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(dt: DateTime<Utc>) -> Self {
        Value::DateTime(dt)
    }
}

impl From<Uuid> for Value {
    fn from(id: Uuid) -> Self {
        Value::Uuid(id)
    }
}

impl From<EnumValue> for Value {
    fn from(e: EnumValue) -> Self {
        Value::Enum(e)
    }
}

impl From<RecordValue> for Value {
    fn from(r: RecordValue) -> Self {
        Value::Record(r)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Value::Null, Into::into)
    }
}

/// A member of a registered enum, e.g. `Color.Red`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct EnumValue {
    pub type_name: TypeName,
    /// Canonical member name.
    pub member: String,
}

impl EnumValue {
    /// `member` may be given in either spelling (`RED` or `Red`).
    pub fn new(type_name: impl Into<TypeName>, member: &str) -> Self {
        EnumValue {
            type_name: type_name.into(),
            member: canonical_member_name(member),
        }
    }
}

/// Instance of a record-kind type.
///
/// Only set fields are stored: assigning `Null` or an empty list removes the
/// field, so an unset field and an empty one are indistinguishable.
#[derive(Clone, Debug)]
pub struct RecordValue {
    type_name: TypeName,
    fields: BTreeMap<String, Value>,
    initialized: bool,
}

impl RecordValue {
    pub fn new(type_name: impl Into<TypeName>) -> Self {
        RecordValue {
            type_name: type_name.into(),
            fields: BTreeMap::new(),
            initialized: false,
        }
    }

    /// Builder-style [`set`](Self::set).
    #[must_use]
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(field, value);
        self
    }

    /// Set a field; sentinel values clear it.
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        let field = field.into();
        let value = value.into();
        if value.is_sentinel() {
            self.fields.remove(&field);
        } else {
            self.fields.insert(field, value);
        }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.fields.remove(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    #[inline]
    pub fn type_name(&self) -> &TypeName {
        &self.type_name
    }

    /// Set fields in name order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Whether the init hook chain has run on this instance.
    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Record that the init hook chain has run. Called by the codecs.
    pub fn mark_initialized(&mut self) {
        self.initialized = true;
    }

    /// Typed read of a required field.
    pub fn require<T: FromValue>(&self, field: &str) -> Result<T, CodecError> {
        match self.fields.get(field) {
            None => Err(CodecError::RequiredFieldMissing {
                type_name: self.type_name.clone(),
                field: field.to_string(),
            }),
            Some(value) => T::from_value(value).ok_or_else(|| CodecError::FieldTypeMismatch {
                context: format!("{}.{field}", self.type_name),
                expected: T::LABEL.to_string(),
                found: value.type_label(),
            }),
        }
    }

    /// Typed read of an optional field.
    pub fn optional<T: FromValue>(&self, field: &str) -> Result<Option<T>, CodecError> {
        if self.fields.contains_key(field) {
            self.require(field).map(Some)
        } else {
            Ok(None)
        }
    }
}

/// Initialization state is bookkeeping, not data.
impl PartialEq for RecordValue {
    fn eq(&self, other: &Self) -> bool {
        self.type_name == other.type_name && self.fields == other.fields
    }
}

/// Typed extraction from a [`Value`], used by hand-written `Record` impls.
pub trait FromValue: Sized {
    /// Name of the expected type in mismatch errors.
    const LABEL: &'static str;

    fn from_value(value: &Value) -> Option<Self>;
}

macro_rules! impl_from_value {
    ($ty:ty, $label:literal, $pat:pat => $out:expr) => {
        impl FromValue for $ty {
            const LABEL: &'static str = $label;

            fn from_value(value: &Value) -> Option<Self> {
                match value {
                    $pat => Some($out),
                    _ => None,
                }
            }
        }
    };
}

impl_from_value!(bool, "bool", Value::Bool(b) => *b);
impl_from_value!(i64, "int", Value::Int(n) => *n);
impl_from_value!(String, "str", Value::Str(s) => s.clone());
impl_from_value!(NaiveDate, "date", Value::Date(d) => *d);
impl_from_value!(NaiveTime, "time", Value::Time(t) => *t);
impl_from_value!(DateTime<Utc>, "datetime", Value::DateTime(dt) => *dt);
impl_from_value!(Uuid, "uuid", Value::Uuid(id) => *id);
impl_from_value!(EnumValue, "enum", Value::Enum(e) => e.clone());
impl_from_value!(RecordValue, "record", Value::Record(r) => r.clone());

impl FromValue for f64 {
    const LABEL: &'static str = "float";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Float(x) => Some(*x),
            _ => None,
        }
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    const LABEL: &'static str = "list";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::List(items) => items.iter().map(T::from_value).collect(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests;
