//! Tagged tree encoding.
//!
//! # Serialization
//!
//! - Records: fields in `field_order`, unset fields omitted, runtime type
//!   name as discriminator. The init hook chain runs first (on a copy) if
//!   the instance has not been initialized.
//! - Enums: type name plus canonical member.
//! - Lists: an empty list is `Null`. The first non-null element decides
//!   whether the list holds primitives or composites; lists must be
//!   homogeneous in that respect.
//! - Maps: keys untagged, `_type` and `_enum` reserved.
//!
//! # Deserialization
//!
//! Driven by the declared type: a record node must name the declared type
//! or a subtype of it. Unions try the alternative naming the node's own
//! scalar kind first, then the rest in order; only a type mismatch moves on
//! to the next alternative. A `Null` list element or map value declared as
//! a list is the empty list. Each record is rebuilt, initialized, then
//! validated.
//!
//! Serialization checks each field against its declared type, and rejects
//! a scalar under a union that would decode as a different value.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::sync::Arc;

use keel_ir::{
    CodecError, DeclaredType, EnumValue, FieldDescriptor, PrimitiveKind, Record, RecordValue,
    TaggedValue, TypeName, Value, ENUM_FIELD, TYPE_FIELD,
};
use keel_stack::ensure_sufficient_stack;

use crate::path::Path;
use crate::primitive::{primitive_to_tagged, tagged_to_primitive};
use crate::validate::Nested;
use crate::Codec;

impl Codec<'_> {
    #[tracing::instrument(level = "debug", skip_all, fields(ty = %value.type_label()))]
    pub fn serialize(&self, value: &Value) -> Result<TaggedValue, CodecError> {
        let root = value.type_label();
        self.encode(value, &Path::root(&root), 0)
    }

    pub fn serialize_record<T: Record>(&self, record: &T) -> Result<TaggedValue, CodecError> {
        self.serialize(&Value::Record(record.to_record()))
    }

    /// Decode a tagged tree whose root names its own type.
    #[tracing::instrument(level = "debug", skip_all, fields(ty = tagged.discriminator().map(TypeName::as_str)))]
    pub fn deserialize(&self, tagged: &TaggedValue) -> Result<Value, CodecError> {
        let declared = match tagged {
            TaggedValue::Record { type_name, .. } => DeclaredType::Record(type_name.clone()),
            TaggedValue::Enum { type_name, .. } => DeclaredType::Enum(type_name.clone()),
            other => {
                return Err(CodecError::MissingDiscriminator {
                    found: other.kind_label().to_string(),
                })
            }
        };
        self.deserialize_as(tagged, &declared)
    }

    /// Decode a tagged tree against an explicit declared type.
    pub fn deserialize_as(
        &self,
        tagged: &TaggedValue,
        declared: &DeclaredType,
    ) -> Result<Value, CodecError> {
        let root = declared.to_string();
        self.decode(tagged, declared, &Path::root(&root), 0)
    }

    pub fn deserialize_record<T: Record>(&self, tagged: &TaggedValue) -> Result<T, CodecError> {
        let declared = DeclaredType::Record(T::descriptor().name().clone());
        match self.deserialize_as(tagged, &declared)? {
            Value::Record(record) => T::from_record(&record),
            other => Err(CodecError::mismatch(
                declared.to_string(),
                &declared,
                other.type_label(),
            )),
        }
    }

    /// `record` with its init hook chain applied, copying only if needed.
    pub(crate) fn initialized<'v>(
        &self,
        record: &'v RecordValue,
    ) -> Result<Cow<'v, RecordValue>, CodecError> {
        if record.is_initialized() {
            return Ok(Cow::Borrowed(record));
        }
        let mut owned = record.clone();
        self.run_init_chain(&mut owned)?;
        Ok(Cow::Owned(owned))
    }

    /// Call each level's init hook, base first, then mark the record.
    pub(crate) fn run_init_chain(&self, record: &mut RecordValue) -> Result<(), CodecError> {
        let hierarchy = self.registry.hierarchy(record.type_name())?;
        for level in hierarchy.iter() {
            if let Some(hook) = level.init_hook() {
                hook(record).map_err(|message| CodecError::InitHookFailed {
                    type_name: level.name().clone(),
                    message,
                })?;
            }
        }
        record.mark_initialized();
        Ok(())
    }

    /// Field order of a record-kind type.
    pub(crate) fn record_fields(
        &self,
        type_name: &str,
    ) -> Result<Arc<[FieldDescriptor]>, CodecError> {
        let descriptor = self.registry.resolve(type_name)?;
        if descriptor.as_record().is_none() {
            return Err(CodecError::mismatch(type_name, "record type", "enum"));
        }
        self.registry.field_order(type_name)
    }

    fn encode(
        &self,
        value: &Value,
        path: &Path<'_>,
        depth: usize,
    ) -> Result<TaggedValue, CodecError> {
        let depth = self.descend(depth)?;
        ensure_sufficient_stack(|| match value {
            Value::Null => Ok(TaggedValue::Null),
            Value::Record(record) => self.encode_record(record, path, depth),
            Value::Enum(member) => self.encode_enum(member, path),
            Value::List(items) => self.encode_list(items, path, depth),
            Value::Map(entries) => self.encode_map(entries, path, depth),
            scalar => primitive_to_tagged(scalar).ok_or_else(|| {
                CodecError::mismatch(path.to_string(), "primitive", scalar.type_label())
            }),
        })
    }

    pub(crate) fn encode_record(
        &self,
        record: &RecordValue,
        path: &Path<'_>,
        depth: usize,
    ) -> Result<TaggedValue, CodecError> {
        let record = self.initialized(record)?;
        let order = self.record_fields(record.type_name())?;
        Self::check_declared(&record, &order)?;

        let mut fields = Vec::with_capacity(record.len());
        for field in order.iter() {
            let Some(value) = record.get(&field.name) else {
                continue;
            };
            if value.is_sentinel() {
                continue;
            }
            let field_path = path.field(&field.name);
            self.check_value(value, &field.ty, &field_path, Nested::Trusted, depth)?;
            self.check_unambiguous(value, &field.ty, &field_path, depth)?;
            let tagged = self.encode(value, &field_path, depth)?;
            fields.push((field.name.clone(), tagged));
        }

        Ok(TaggedValue::Record {
            type_name: record.type_name().clone(),
            fields,
        })
    }

    /// Scalars under a union must decode back to the same value.
    ///
    /// Catches values such as the string `"2024-01-31"` in a `date | str`
    /// field, which would otherwise come back as a date.
    fn check_unambiguous(
        &self,
        value: &Value,
        declared: &DeclaredType,
        path: &Path<'_>,
        depth: usize,
    ) -> Result<(), CodecError> {
        let depth = self.descend(depth)?;
        match (declared, value) {
            (DeclaredType::Union(_), scalar) => {
                let Some(tagged) = primitive_to_tagged(scalar) else {
                    return Ok(());
                };
                let back = self.decode(&tagged, declared, path, depth)?;
                let same = std::mem::discriminant(&back) == std::mem::discriminant(scalar)
                    && primitive_to_tagged(&back).as_ref() == Some(&tagged);
                if same {
                    Ok(())
                } else {
                    Err(CodecError::mismatch(
                        path.to_string(),
                        format!("unambiguous {} for {declared}", scalar.type_label()),
                        back.type_label(),
                    ))
                }
            }
            (DeclaredType::List(inner), Value::List(items)) => {
                items.iter().enumerate().try_for_each(|(i, item)| {
                    self.check_unambiguous(item, inner, &path.index(i), depth)
                })
            }
            (DeclaredType::Map(inner), Value::Map(entries)) => {
                entries.iter().try_for_each(|(key, item)| {
                    self.check_unambiguous(item, inner, &path.entry(key), depth)
                })
            }
            _ => Ok(()),
        }
    }

    fn encode_enum(&self, value: &EnumValue, path: &Path<'_>) -> Result<TaggedValue, CodecError> {
        let descriptor = self.registry.resolve(&value.type_name)?;
        let def = descriptor.as_enum().ok_or_else(|| {
            CodecError::mismatch(path.to_string(), "enum type", value.type_name.as_str())
        })?;
        let member = def.resolve_member(&value.member).ok_or_else(|| {
            CodecError::mismatch(
                path.to_string(),
                format!("member of {}", value.type_name),
                value.member.as_str(),
            )
        })?;
        Ok(TaggedValue::Enum {
            type_name: value.type_name.clone(),
            member: member.to_string(),
        })
    }

    fn encode_list(
        &self,
        items: &[Value],
        path: &Path<'_>,
        depth: usize,
    ) -> Result<TaggedValue, CodecError> {
        if items.is_empty() {
            return Ok(TaggedValue::Null);
        }

        let primitive = items
            .iter()
            .find(|item| !matches!(item, Value::Null))
            .map(Value::is_primitive);

        let mut out = Vec::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            let item_path = path.index(i);
            if !matches!(item, Value::Null) && Some(item.is_primitive()) != primitive {
                let expected = if item.is_primitive() {
                    "composite element (lists must be homogeneous)"
                } else {
                    "primitive element (lists must be homogeneous)"
                };
                return Err(CodecError::mismatch(
                    item_path.to_string(),
                    expected,
                    item.type_label(),
                ));
            }
            out.push(self.encode(item, &item_path, depth)?);
        }
        Ok(TaggedValue::List(out))
    }

    fn encode_map(
        &self,
        entries: &BTreeMap<String, Value>,
        path: &Path<'_>,
        depth: usize,
    ) -> Result<TaggedValue, CodecError> {
        let mut out = Vec::with_capacity(entries.len());
        for (key, value) in entries {
            let entry_path = path.entry(key);
            if key == TYPE_FIELD || key == ENUM_FIELD {
                return Err(CodecError::mismatch(
                    entry_path.to_string(),
                    "unreserved map key",
                    key.as_str(),
                ));
            }
            out.push((key.clone(), self.encode(value, &entry_path, depth)?));
        }
        Ok(TaggedValue::Map(out))
    }

    fn decode(
        &self,
        tagged: &TaggedValue,
        declared: &DeclaredType,
        path: &Path<'_>,
        depth: usize,
    ) -> Result<Value, CodecError> {
        let depth = self.descend(depth)?;
        if let TaggedValue::Null = tagged {
            return Ok(Value::Null);
        }

        ensure_sufficient_stack(|| match (declared, tagged) {
            (DeclaredType::Primitive(kind), _) => tagged_to_primitive(*kind, tagged)
                .ok_or_else(|| mismatch(path, declared, tagged)),
            (DeclaredType::Enum(name), TaggedValue::Enum { type_name, member }) => {
                self.decode_enum(name, type_name, member, path)
            }
            (DeclaredType::Record(name), TaggedValue::Record { type_name, fields }) => {
                self.registry.resolve(type_name)?;
                if !self.registry.is_subtype(type_name, name) {
                    return Err(mismatch(path, declared, tagged));
                }
                self.decode_record(type_name, fields, path, depth)
                    .map(Value::Record)
            }
            (DeclaredType::List(inner), TaggedValue::List(items)) => items
                .iter()
                .enumerate()
                .map(|(i, item)| self.decode_element(item, inner, &path.index(i), depth))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::List),
            (DeclaredType::Map(inner), TaggedValue::Map(entries)) => entries
                .iter()
                .map(|(key, value)| {
                    let value = self.decode_element(value, inner, &path.entry(key), depth)?;
                    Ok((key.clone(), value))
                })
                .collect::<Result<BTreeMap<_, _>, _>>()
                .map(Value::Map),
            (DeclaredType::Union(alternatives), _) => {
                for alt in union_order(alternatives, tagged) {
                    match self.decode(tagged, alt, path, depth) {
                        Err(CodecError::FieldTypeMismatch { .. }) => {}
                        result => return result,
                    }
                }
                Err(mismatch(path, declared, tagged))
            }
            _ => Err(mismatch(path, declared, tagged)),
        })
    }

    /// List element or map value. Nested empty lists were written as `Null`.
    fn decode_element(
        &self,
        tagged: &TaggedValue,
        declared: &DeclaredType,
        path: &Path<'_>,
        depth: usize,
    ) -> Result<Value, CodecError> {
        match (declared, tagged) {
            (DeclaredType::List(_), TaggedValue::Null) => Ok(Value::List(Vec::new())),
            _ => self.decode(tagged, declared, path, depth),
        }
    }

    fn decode_enum(
        &self,
        declared: &TypeName,
        type_name: &TypeName,
        member: &str,
        path: &Path<'_>,
    ) -> Result<Value, CodecError> {
        let descriptor = self.registry.resolve(type_name)?;
        if type_name != declared {
            return Err(CodecError::mismatch(
                path.to_string(),
                declared,
                type_name.as_str(),
            ));
        }
        let canonical = descriptor
            .as_enum()
            .and_then(|def| def.resolve_member(member))
            .ok_or_else(|| {
                CodecError::mismatch(path.to_string(), format!("member of {declared}"), member)
            })?;
        Ok(Value::Enum(EnumValue {
            type_name: type_name.clone(),
            member: canonical.to_string(),
        }))
    }

    pub(crate) fn decode_record(
        &self,
        type_name: &TypeName,
        fields: &[(String, TaggedValue)],
        path: &Path<'_>,
        depth: usize,
    ) -> Result<RecordValue, CodecError> {
        let order = self.record_fields(type_name)?;
        let mut record = RecordValue::new(type_name.clone());

        for (name, value) in fields {
            let field = order
                .iter()
                .find(|f| f.name == *name)
                .ok_or_else(|| CodecError::UnknownField {
                    type_name: type_name.clone(),
                    field: name.clone(),
                })?;
            let decoded = self.decode(value, &field.ty, &path.field(name), depth)?;
            record.set(name.clone(), decoded);
        }

        self.run_init_chain(&mut record)?;
        self.check_fields(&record, &order, path, Nested::Trusted, depth)?;
        Ok(record)
    }

    /// Every set field of `record` must be declared by its type.
    pub(crate) fn check_declared(
        record: &RecordValue,
        order: &[FieldDescriptor],
    ) -> Result<(), CodecError> {
        match record
            .fields()
            .find(|(name, _)| !order.iter().any(|f| f.name == *name))
        {
            Some((name, _)) => Err(CodecError::UnknownField {
                type_name: record.type_name().clone(),
                field: name.to_string(),
            }),
            None => Ok(()),
        }
    }
}

/// Union alternatives in decode order: the one naming the node's own scalar
/// kind first, then the rest as declared.
fn union_order<'d>(
    alternatives: &'d [DeclaredType],
    tagged: &TaggedValue,
) -> impl Iterator<Item = &'d DeclaredType> {
    let kind = match tagged {
        TaggedValue::Bool(_) => Some(PrimitiveKind::Bool),
        TaggedValue::Int(_) => Some(PrimitiveKind::Int),
        TaggedValue::Float(_) => Some(PrimitiveKind::Float),
        _ => None,
    };
    let exact = kind.and_then(|kind| {
        alternatives
            .iter()
            .find(|alt| **alt == DeclaredType::Primitive(kind))
    });
    exact
        .into_iter()
        .chain(alternatives.iter().filter(move |alt| Some(*alt) != exact))
}

fn mismatch(path: &Path<'_>, declared: &DeclaredType, tagged: &TaggedValue) -> CodecError {
    let found = match tagged.discriminator() {
        Some(name) => name.to_string(),
        None => tagged.kind_label().to_string(),
    };
    CodecError::mismatch(path.to_string(), declared, found)
}
