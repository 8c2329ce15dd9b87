//! Statically declared field types.

use std::fmt;

use crate::TypeName;

/// Scalar types with a canonical text form.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Str,
    Bool,
    Int,
    Float,
    Date,
    Time,
    DateTime,
    Uuid,
    Bytes,
}

impl PrimitiveKind {
    pub fn name(self) -> &'static str {
        match self {
            PrimitiveKind::Str => "str",
            PrimitiveKind::Bool => "bool",
            PrimitiveKind::Int => "int",
            PrimitiveKind::Float => "float",
            PrimitiveKind::Date => "date",
            PrimitiveKind::Time => "time",
            PrimitiveKind::DateTime => "datetime",
            PrimitiveKind::Uuid => "uuid",
            PrimitiveKind::Bytes => "bytes",
        }
    }
}

/// The declared type of a field.
///
/// `Record(name)` accepts the named type or any registered subtype of it,
/// which is how polymorphic fields are expressed. Nullability is carried by
/// [`FieldDescriptor::optional`](crate::FieldDescriptor), not by the type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum DeclaredType {
    Primitive(PrimitiveKind),
    Enum(TypeName),
    Record(TypeName),
    List(Box<DeclaredType>),
    /// Dictionary with string keys.
    Map(Box<DeclaredType>),
    /// First matching alternative wins.
    Union(Vec<DeclaredType>),
}

impl DeclaredType {
    pub const STR: DeclaredType = DeclaredType::Primitive(PrimitiveKind::Str);
    pub const BOOL: DeclaredType = DeclaredType::Primitive(PrimitiveKind::Bool);
    pub const INT: DeclaredType = DeclaredType::Primitive(PrimitiveKind::Int);
    pub const FLOAT: DeclaredType = DeclaredType::Primitive(PrimitiveKind::Float);
    pub const DATE: DeclaredType = DeclaredType::Primitive(PrimitiveKind::Date);
    pub const TIME: DeclaredType = DeclaredType::Primitive(PrimitiveKind::Time);
    pub const DATETIME: DeclaredType = DeclaredType::Primitive(PrimitiveKind::DateTime);
    pub const UUID: DeclaredType = DeclaredType::Primitive(PrimitiveKind::Uuid);
    pub const BYTES: DeclaredType = DeclaredType::Primitive(PrimitiveKind::Bytes);

    pub fn record(name: impl Into<TypeName>) -> Self {
        DeclaredType::Record(name.into())
    }

    pub fn enumeration(name: impl Into<TypeName>) -> Self {
        DeclaredType::Enum(name.into())
    }

    pub fn list(element: DeclaredType) -> Self {
        DeclaredType::List(Box::new(element))
    }

    pub fn map(value: DeclaredType) -> Self {
        DeclaredType::Map(Box::new(value))
    }

    pub fn union(alternatives: impl IntoIterator<Item = DeclaredType>) -> Self {
        DeclaredType::Union(alternatives.into_iter().collect())
    }

    /// Whether values of this type are lists or maps.
    pub fn is_collection(&self) -> bool {
        matches!(self, DeclaredType::List(_) | DeclaredType::Map(_))
    }

    /// Named types referenced anywhere inside this type.
    pub fn referenced_names(&self) -> Vec<&TypeName> {
        let mut names = Vec::new();
        self.collect_names(&mut names);
        names
    }

    fn collect_names<'a>(&'a self, out: &mut Vec<&'a TypeName>) {
        match self {
            DeclaredType::Primitive(_) => {}
            DeclaredType::Enum(name) | DeclaredType::Record(name) => out.push(name),
            DeclaredType::List(inner) | DeclaredType::Map(inner) => inner.collect_names(out),
            DeclaredType::Union(alternatives) => {
                for alt in alternatives {
                    alt.collect_names(out);
                }
            }
        }
    }
}

impl fmt::Display for DeclaredType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeclaredType::Primitive(kind) => f.write_str(kind.name()),
            DeclaredType::Enum(name) | DeclaredType::Record(name) => write!(f, "{name}"),
            DeclaredType::List(inner) => write!(f, "list[{inner}]"),
            DeclaredType::Map(inner) => write!(f, "dict[str, {inner}]"),
            DeclaredType::Union(alternatives) => {
                for (i, alt) in alternatives.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" | ")?;
                    }
                    write!(f, "{alt}")?;
                }
                Ok(())
            }
        }
    }
}
