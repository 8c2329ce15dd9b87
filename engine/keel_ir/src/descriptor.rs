//! Type descriptors and the builder used to declare them.
//!
//! A descriptor records only what its own level declares: its short name,
//! its direct base, and its own fields. Whole-hierarchy views (field order,
//! key chain) are derived by the registry.

use std::fmt;

use crate::{canonical_member_name, DeclaredType, RecordValue, TypeName};

/// Per-level initialization hook.
///
/// Runs after construction and before serialization, base level first.
/// A returned message aborts the codec call with `InitHookFailed`.
pub type InitHook = fn(&mut RecordValue) -> Result<(), String>;

/// One declared field.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FieldDescriptor {
    pub name: String,
    pub ty: DeclaredType,
    pub optional: bool,
}

impl FieldDescriptor {
    pub fn required(name: impl Into<String>, ty: DeclaredType) -> Self {
        FieldDescriptor {
            name: name.into(),
            ty,
            optional: false,
        }
    }

    pub fn optional(name: impl Into<String>, ty: DeclaredType) -> Self {
        FieldDescriptor {
            name: name.into(),
            ty,
            optional: true,
        }
    }
}

/// What a record-kind type is used for.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum RecordRole {
    /// Plain nested data; never stored on its own.
    Data,
    /// Identity of stored records; may appear inside other keys.
    Key,
    /// Stored record; its hierarchy contains exactly one key type.
    Record,
}

/// Closed classification of a registered type, fixed at registration.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeClass {
    Key,
    Record,
    Data,
    Enum,
}

impl TypeClass {
    /// Types whose hierarchy carries a key type (keys and stored records).
    pub fn has_key_chain(self) -> bool {
        matches!(self, TypeClass::Key | TypeClass::Record)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordDef {
    pub role: RecordRole,
    pub base: Option<TypeName>,
    pub fields: Vec<FieldDescriptor>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnumDef {
    /// Canonical member names, in declaration order.
    pub members: Vec<String>,
}

impl EnumDef {
    /// Canonical spelling of `member`, accepting either spelling.
    pub fn resolve_member(&self, member: &str) -> Option<&str> {
        if let Some(found) = self.members.iter().find(|m| *m == member) {
            return Some(found.as_str());
        }
        let canonical = canonical_member_name(member);
        self.members
            .iter()
            .find(|m| **m == canonical)
            .map(String::as_str)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TypeKind {
    Record(RecordDef),
    Enum(EnumDef),
}

/// Schema of one type.
#[derive(Clone)]
pub struct TypeDescriptor {
    name: TypeName,
    kind: TypeKind,
    init: Option<InitHook>,
}

impl TypeDescriptor {
    /// Start declaring a nested data type.
    pub fn data(name: impl Into<TypeName>) -> RecordBuilder {
        RecordBuilder::new(name.into(), RecordRole::Data)
    }

    /// Start declaring a key type.
    pub fn key(name: impl Into<TypeName>) -> RecordBuilder {
        RecordBuilder::new(name.into(), RecordRole::Key)
    }

    /// Start declaring a stored record type.
    pub fn record(name: impl Into<TypeName>) -> RecordBuilder {
        RecordBuilder::new(name.into(), RecordRole::Record)
    }

    /// Declare an enum; member identifiers are stored in canonical form.
    pub fn enumeration<I, S>(name: impl Into<TypeName>, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        TypeDescriptor {
            name: name.into(),
            kind: TypeKind::Enum(EnumDef {
                members: members
                    .into_iter()
                    .map(|m| canonical_member_name(m.as_ref()))
                    .collect(),
            }),
            init: None,
        }
    }

    #[inline]
    pub fn name(&self) -> &TypeName {
        &self.name
    }

    #[inline]
    pub fn kind(&self) -> &TypeKind {
        &self.kind
    }

    #[inline]
    pub fn init_hook(&self) -> Option<InitHook> {
        self.init
    }

    pub fn class(&self) -> TypeClass {
        match &self.kind {
            TypeKind::Enum(_) => TypeClass::Enum,
            TypeKind::Record(def) => match def.role {
                RecordRole::Data => TypeClass::Data,
                RecordRole::Key => TypeClass::Key,
                RecordRole::Record => TypeClass::Record,
            },
        }
    }

    pub fn as_record(&self) -> Option<&RecordDef> {
        match &self.kind {
            TypeKind::Record(def) => Some(def),
            TypeKind::Enum(_) => None,
        }
    }

    pub fn as_enum(&self) -> Option<&EnumDef> {
        match &self.kind {
            TypeKind::Enum(def) => Some(def),
            TypeKind::Record(_) => None,
        }
    }

    pub fn base(&self) -> Option<&TypeName> {
        self.as_record().and_then(|def| def.base.as_ref())
    }

    /// Fields declared at this level only.
    pub fn own_fields(&self) -> &[FieldDescriptor] {
        match &self.kind {
            TypeKind::Record(def) => &def.fields,
            TypeKind::Enum(_) => &[],
        }
    }

    /// Structural equality, including whether an init hook is attached.
    ///
    /// Used to make re-registration of an identical type a no-op. Hooks are
    /// compared by presence only; function addresses are not stable enough
    /// to tell two hooks apart.
    pub fn same_schema(&self, other: &TypeDescriptor) -> bool {
        self.name == other.name
            && self.kind == other.kind
            && self.init.is_some() == other.init.is_some()
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("init", &self.init.is_some())
            .finish()
    }
}

/// Builder for record-kind descriptors.
///
/// ```text
/// let trade = TypeDescriptor::record("Trade")
///     .extends("TradeKey")
///     .field("notional", DeclaredType::FLOAT)
///     .optional("legs", DeclaredType::list(DeclaredType::record("Leg")))
///     .build();
/// ```
#[derive(Clone)]
pub struct RecordBuilder {
    name: TypeName,
    def: RecordDef,
    init: Option<InitHook>,
}

impl RecordBuilder {
    fn new(name: TypeName, role: RecordRole) -> Self {
        RecordBuilder {
            name,
            def: RecordDef {
                role,
                base: None,
                fields: Vec::new(),
            },
            init: None,
        }
    }

    #[must_use]
    pub fn extends(mut self, base: impl Into<TypeName>) -> Self {
        self.def.base = Some(base.into());
        self
    }

    #[must_use]
    pub fn field(mut self, name: impl Into<String>, ty: DeclaredType) -> Self {
        self.def.fields.push(FieldDescriptor::required(name, ty));
        self
    }

    #[must_use]
    pub fn optional(mut self, name: impl Into<String>, ty: DeclaredType) -> Self {
        self.def.fields.push(FieldDescriptor::optional(name, ty));
        self
    }

    #[must_use]
    pub fn init(mut self, hook: InitHook) -> Self {
        self.init = Some(hook);
        self
    }

    pub fn build(self) -> TypeDescriptor {
        TypeDescriptor {
            name: self.name,
            kind: TypeKind::Record(self.def),
            init: self.init,
        }
    }
}
