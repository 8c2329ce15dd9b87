//! The tagged tree: a JSON-shaped intermediate form with type discriminators.

use std::fmt;

use crate::TypeName;

/// Discriminator field on record nodes.
pub const TYPE_FIELD: &str = "_type";
/// Enum type field on enum nodes.
pub const ENUM_FIELD: &str = "_enum";
/// Canonical member field on enum nodes.
pub const MEMBER_FIELD: &str = "_name";
/// Identity column of a flat row.
pub const KEY_COLUMN: &str = "_key";

/// Serialized form of a [`Value`](crate::Value).
///
/// Record and enum nodes carry their type name explicitly; in JSON they
/// become objects with a `_type` (respectively `_enum`/`_name`) entry.
/// Maps and record fields keep insertion order.
#[derive(Clone, Debug, PartialEq)]
pub enum TaggedValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<TaggedValue>),
    Map(Vec<(String, TaggedValue)>),
    Record {
        type_name: TypeName,
        fields: Vec<(String, TaggedValue)>,
    },
    Enum {
        type_name: TypeName,
        member: String,
    },
}

impl TaggedValue {
    /// Bare scalar (stored as-is in a flat cell).
    pub fn is_primitive(&self) -> bool {
        matches!(
            self,
            TaggedValue::Null
                | TaggedValue::Bool(_)
                | TaggedValue::Int(_)
                | TaggedValue::Float(_)
                | TaggedValue::Str(_)
        )
    }

    /// Shape marker for composite nodes; `None` for primitives.
    pub fn shape(&self) -> Option<Shape> {
        match self {
            TaggedValue::Record { .. } | TaggedValue::Enum { .. } => Some(Shape::Data),
            TaggedValue::Map(_) => Some(Shape::Dict),
            TaggedValue::List(_) => Some(Shape::List),
            _ => None,
        }
    }

    /// Runtime type named by a record or enum node.
    pub fn discriminator(&self) -> Option<&TypeName> {
        match self {
            TaggedValue::Record { type_name, .. } | TaggedValue::Enum { type_name, .. } => {
                Some(type_name)
            }
            _ => None,
        }
    }

    /// Field of a record node.
    pub fn field(&self, name: &str) -> Option<&TaggedValue> {
        match self {
            TaggedValue::Record { fields, .. } => {
                fields.iter().find(|(k, _)| k == name).map(|(_, v)| v)
            }
            _ => None,
        }
    }

    pub fn kind_label(&self) -> &'static str {
        match self {
            TaggedValue::Null => "null",
            TaggedValue::Bool(_) => "bool",
            TaggedValue::Int(_) => "int",
            TaggedValue::Float(_) => "float",
            TaggedValue::Str(_) => "str",
            TaggedValue::List(_) => "list",
            TaggedValue::Map(_) => "dict",
            TaggedValue::Record { .. } => "record",
            TaggedValue::Enum { .. } => "enum",
        }
    }
}

/// Shape of a composite flat cell.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Shape {
    /// Nested record or enum.
    Data,
    Dict,
    List,
}

impl Shape {
    pub const ALL: [Shape; 3] = [Shape::Data, Shape::Dict, Shape::List];

    pub fn name(self) -> &'static str {
        match self {
            Shape::Data => "DATA",
            Shape::Dict => "DICT",
            Shape::List => "LIST",
        }
    }

    pub fn from_name(name: &str) -> Option<Shape> {
        Shape::ALL.into_iter().find(|s| s.name() == name)
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.name())
    }
}
