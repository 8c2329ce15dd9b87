//! Schema checks on runtime records.

use keel_ir::{CodecError, DeclaredType, FieldDescriptor, PrimitiveKind, RecordValue, Value};
use keel_stack::ensure_sufficient_stack;

use crate::path::Path;
use crate::Codec;

/// How nested records are treated while checking a field.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Nested {
    /// Already validated when decoded; only the subtype relation is checked.
    Trusted,
    /// Checked field by field as well.
    Checked,
}

impl Codec<'_> {
    /// Check `record` and every record nested in it against the registry.
    ///
    /// Required fields must be set, no undeclared field may be set, and
    /// every value must be assignable to its declared type (element-wise
    /// for lists and maps, any alternative for unions). An int is not a
    /// float.
    pub fn validate(&self, record: &RecordValue) -> Result<(), CodecError> {
        let order = self.record_fields(record.type_name())?;
        let root = record.type_name().to_string();
        self.check_fields(record, &order, &Path::root(&root), Nested::Checked, 0)
    }

    pub(crate) fn check_fields(
        &self,
        record: &RecordValue,
        order: &[FieldDescriptor],
        path: &Path<'_>,
        nested: Nested,
        depth: usize,
    ) -> Result<(), CodecError> {
        Self::check_declared(record, order)?;
        for field in order {
            match record.get(&field.name) {
                Some(value) => {
                    self.check_value(value, &field.ty, &path.field(&field.name), nested, depth)?;
                }
                None if field.optional => {}
                None => {
                    return Err(CodecError::RequiredFieldMissing {
                        type_name: record.type_name().clone(),
                        field: field.name.clone(),
                    })
                }
            }
        }
        Ok(())
    }

    pub(crate) fn check_value(
        &self,
        value: &Value,
        declared: &DeclaredType,
        path: &Path<'_>,
        nested: Nested,
        depth: usize,
    ) -> Result<(), CodecError> {
        let depth = self.descend(depth)?;
        let assignable = ensure_sufficient_stack(|| -> Result<bool, CodecError> {
            let ok = match (declared, value) {
                (_, Value::Null) => true,
                (DeclaredType::Primitive(kind), _) => primitive_matches(*kind, value),
                (DeclaredType::Enum(name), Value::Enum(member)) => {
                    member.type_name == *name
                        && self
                            .registry
                            .resolve(name)?
                            .as_enum()
                            .is_some_and(|def| def.resolve_member(&member.member).is_some())
                }
                (DeclaredType::Record(name), Value::Record(record)) => {
                    if !self.registry.is_subtype(record.type_name(), name) {
                        return Ok(false);
                    }
                    if nested == Nested::Checked {
                        let order = self.record_fields(record.type_name())?;
                        self.check_fields(record, &order, path, nested, depth)?;
                    }
                    true
                }
                (DeclaredType::List(inner), Value::List(items)) => {
                    for (i, item) in items.iter().enumerate() {
                        self.check_value(item, inner, &path.index(i), nested, depth)?;
                    }
                    true
                }
                (DeclaredType::Map(inner), Value::Map(entries)) => {
                    for (key, item) in entries {
                        self.check_value(item, inner, &path.entry(key), nested, depth)?;
                    }
                    true
                }
                (DeclaredType::Union(alternatives), _) => {
                    for alt in alternatives {
                        match self.check_value(value, alt, path, nested, depth) {
                            Ok(()) => return Ok(true),
                            Err(CodecError::FieldTypeMismatch { .. }) => {}
                            Err(err) => return Err(err),
                        }
                    }
                    false
                }
                _ => false,
            };
            Ok(ok)
        })?;

        if assignable {
            Ok(())
        } else {
            Err(CodecError::mismatch(
                path.to_string(),
                declared,
                value.type_label(),
            ))
        }
    }
}

fn primitive_matches(kind: PrimitiveKind, value: &Value) -> bool {
    matches!(
        (kind, value),
        (PrimitiveKind::Str, Value::Str(_))
            | (PrimitiveKind::Bool, Value::Bool(_))
            | (PrimitiveKind::Int, Value::Int(_))
            | (PrimitiveKind::Float, Value::Float(_))
            | (PrimitiveKind::Date, Value::Date(_))
            | (PrimitiveKind::Time, Value::Time(_))
            | (PrimitiveKind::DateTime, Value::DateTime(_))
            | (PrimitiveKind::Uuid, Value::Uuid(_))
            | (PrimitiveKind::Bytes, Value::Bytes(_))
    )
}

#[cfg(test)]
mod tests;
