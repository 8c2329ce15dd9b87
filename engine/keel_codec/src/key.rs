//! Key strings.
//!
//! A key is written as its key type's marker followed by one token per key
//! field, in `field_order` of the key type, joined with `;`:
//!
//! ```text
//! `Foo`;abc;`Bar`;A;1
//! ```
//!
//! Here `Foo` has fields `primitive: str` and `embedded: Bar`, and the
//! nested key `Bar` contributes its own marker run. Records are written
//! through their key type, so every record sharing a key type shares one
//! key shape. The empty string is the absent key.

use keel_ir::{
    CodecError, DeclaredType, EnumValue, RecordValue, TypeClass, TypeName, Value,
};
use keel_stack::ensure_sufficient_stack;
use smallvec::SmallVec;

use crate::path::Path;
use crate::primitive::{
    decode_key_token, encode_key_token, mark_key_token, needs_kind_mark, parse_type_marker,
    split_kind_mark, type_marker, KEY_DELIMITER,
};
use crate::validate::Nested;
use crate::Codec;

type Tokens = SmallVec<[String; 8]>;

impl Codec<'_> {
    /// Key string of a key or record value; `Null` is the empty key.
    #[tracing::instrument(level = "debug", skip_all, fields(ty = %value.type_label()))]
    pub fn serialize_key(&self, value: &Value) -> Result<String, CodecError> {
        match value {
            Value::Null => Ok(String::new()),
            Value::Record(record) => self.record_key(record),
            other => Err(CodecError::mismatch(
                "key",
                "key or record",
                other.type_label(),
            )),
        }
    }

    /// Key value of a key string; the empty string is `Null`.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn deserialize_key(&self, key: &str) -> Result<Value, CodecError> {
        if key.is_empty() {
            return Ok(Value::Null);
        }

        let mut reader = KeyReader {
            key,
            tokens: key.split(KEY_DELIMITER).collect(),
            pos: 0,
        };
        let record = self.read_key(&mut reader, None, 0)?;
        let trailing = reader.tokens.len() - reader.pos;
        if trailing > 0 {
            return Err(reader.malformed(format!("{trailing} tokens after the last key field")));
        }
        Ok(Value::Record(record))
    }

    /// Project `record` onto its key type.
    pub fn key_of(&self, record: &RecordValue) -> Result<RecordValue, CodecError> {
        let record = self.initialized(record)?;
        let key_type = self.registry.key_type(record.type_name())?;
        let order = self.registry.field_order(key_type.name())?;

        let mut key = RecordValue::new(key_type.name().clone());
        for field in order.iter() {
            let value = record
                .get(&field.name)
                .ok_or_else(|| CodecError::RequiredFieldMissing {
                    type_name: record.type_name().clone(),
                    field: field.name.clone(),
                })?;
            key.set(field.name.clone(), value.clone());
        }
        key.mark_initialized();
        Ok(key)
    }

    pub(crate) fn record_key(&self, record: &RecordValue) -> Result<String, CodecError> {
        let mut tokens = Tokens::new();
        self.write_key(record, &mut tokens, 0)?;
        Ok(tokens.join(";"))
    }

    fn write_key(
        &self,
        record: &RecordValue,
        out: &mut Tokens,
        depth: usize,
    ) -> Result<(), CodecError> {
        let depth = self.descend(depth)?;
        let record = self.initialized(record)?;
        let key_type = self.registry.key_type(record.type_name())?;
        let order = self.registry.field_order(key_type.name())?;
        let root = Path::root(key_type.name());

        out.push(type_marker(key_type.name()));
        for field in order.iter() {
            let path = root.field(&field.name);
            let value = record
                .get(&field.name)
                .ok_or_else(|| CodecError::RequiredFieldMissing {
                    type_name: record.type_name().clone(),
                    field: field.name.clone(),
                })?;
            self.check_value(value, &field.ty, &path, Nested::Trusted, depth)?;

            match value {
                Value::Record(nested) => {
                    if !self.registry.classify(nested.type_name())?.has_key_chain() {
                        return Err(CodecError::mismatch(
                            path.to_string(),
                            "key-capable type",
                            nested.type_name().as_str(),
                        ));
                    }
                    ensure_sufficient_stack(|| self.write_key(nested, out, depth))?;
                }
                Value::List(_) | Value::Map(_) => {
                    return Err(CodecError::mismatch(
                        path.to_string(),
                        "key-capable type",
                        value.type_label(),
                    ));
                }
                Value::Enum(member) => out.push(self.enum_token(member)?),
                scalar => {
                    let token =
                        encode_key_token(scalar).map_err(|reason| CodecError::MalformedKeyString {
                            key: out.join(";"),
                            reason: format!("{path}: {reason}"),
                        })?;
                    if needs_kind_mark(&field.ty) {
                        out.push(mark_key_token(&scalar.type_label(), &token));
                    } else {
                        out.push(token);
                    }
                }
            }
        }
        Ok(())
    }

    fn enum_token(&self, member: &EnumValue) -> Result<String, CodecError> {
        let descriptor = self.registry.resolve(&member.type_name)?;
        let canonical = descriptor
            .as_enum()
            .and_then(|def| def.resolve_member(&member.member))
            .ok_or_else(|| {
                CodecError::mismatch(
                    member.type_name.as_str(),
                    format!("member of {}", member.type_name),
                    member.member.as_str(),
                )
            })?;
        encode_key_token(&Value::Enum(EnumValue {
            type_name: member.type_name.clone(),
            member: canonical.to_string(),
        }))
        .map_err(|reason| CodecError::MalformedKeyString {
            key: String::new(),
            reason,
        })
    }

    /// Read one marker run. `expected` is the key type the enclosing field requires.
    fn read_key(
        &self,
        reader: &mut KeyReader<'_>,
        expected: Option<&TypeName>,
        depth: usize,
    ) -> Result<RecordValue, CodecError> {
        let depth = self.descend(depth)?;
        let token = reader.next()?;
        let name = parse_type_marker(token)
            .ok_or_else(|| reader.malformed(format!("expected a type marker, found {token:?}")))?;
        let descriptor = self
            .registry
            .resolve(name)
            .map_err(|_| reader.malformed(format!("unknown type `{name}`")))?;
        if descriptor.class() != TypeClass::Key {
            return Err(reader.malformed(format!("`{name}` is not a key type")));
        }
        if let Some(expected) = expected {
            if descriptor.name() != expected {
                return Err(reader.malformed(format!(
                    "expected a `{expected}` key, found `{name}`"
                )));
            }
        }

        let order = self.registry.field_order(name)?;
        let mut record = RecordValue::new(descriptor.name().clone());
        for field in order.iter() {
            let value = self.read_key_field(reader, &field.ty, depth)?;
            record.set(field.name.clone(), value);
        }

        self.run_init_chain(&mut record)?;
        self.check_fields(&record, &order, &Path::root(name), Nested::Trusted, depth)?;
        Ok(record)
    }

    fn read_key_field(
        &self,
        reader: &mut KeyReader<'_>,
        declared: &DeclaredType,
        depth: usize,
    ) -> Result<Value, CodecError> {
        match declared {
            DeclaredType::Primitive(kind) => {
                let token = reader.next()?;
                decode_key_token(*kind, token).ok_or_else(|| {
                    reader.malformed(format!("{token:?} is not a valid `{}`", kind.name()))
                })
            }
            DeclaredType::Enum(name) => {
                let token = reader.next()?;
                self.read_enum_token(name, token).ok_or_else(|| {
                    reader.malformed(format!("{token:?} is not a member of `{name}`"))
                })
            }
            DeclaredType::Record(name) => {
                let key_type = self.registry.key_type(name).map_err(|err| {
                    reader.malformed(format!("`{name}` cannot appear in a key: {err}"))
                })?;
                ensure_sufficient_stack(|| self.read_key(reader, Some(key_type.name()), depth))
                    .map(Value::Record)
            }
            DeclaredType::Union(alternatives) if needs_kind_mark(declared) => {
                let start = reader.pos;
                let token = reader.next()?;
                let Some((label, text)) = split_kind_mark(token) else {
                    reader.pos = start;
                    let unmarked = alternatives
                        .iter()
                        .filter(|alt| !matches!(alt, DeclaredType::Primitive(_)));
                    return self.read_union(reader, unmarked, declared, depth);
                };
                let kind = alternatives
                    .iter()
                    .find_map(|alt| match alt {
                        DeclaredType::Primitive(kind) if kind.name() == label => Some(*kind),
                        _ => None,
                    })
                    .ok_or_else(|| {
                        reader.malformed(format!("`{label}` is not an alternative of `{declared}`"))
                    })?;
                decode_key_token(kind, text).ok_or_else(|| {
                    reader.malformed(format!("{text:?} is not a valid `{label}`"))
                })
            }
            DeclaredType::Union(alternatives) => {
                self.read_union(reader, alternatives.iter(), declared, depth)
            }
            DeclaredType::List(_) | DeclaredType::Map(_) => Err(reader.malformed(format!(
                "`{declared}` fields cannot be part of a key"
            ))),
        }
    }

    /// First alternative that reads, rewinding the cursor between attempts.
    fn read_union<'t>(
        &self,
        reader: &mut KeyReader<'_>,
        alternatives: impl Iterator<Item = &'t DeclaredType>,
        declared: &DeclaredType,
        depth: usize,
    ) -> Result<Value, CodecError> {
        let start = reader.pos;
        for alt in alternatives {
            match self.read_key_field(reader, alt, depth) {
                Ok(value) => return Ok(value),
                Err(CodecError::MalformedKeyString { .. }) => reader.pos = start,
                Err(err) => return Err(err),
            }
        }
        Err(reader.malformed(format!(
            "no alternative of `{declared}` matches at token {start}"
        )))
    }

    fn read_enum_token(&self, name: &TypeName, token: &str) -> Option<Value> {
        let (type_name, member) = token.split_once('.')?;
        if type_name != name.as_str() {
            return None;
        }
        let descriptor = self.registry.resolve(name).ok()?;
        let canonical = descriptor.as_enum()?.resolve_member(member)?;
        Some(Value::Enum(EnumValue {
            type_name: name.clone(),
            member: canonical.to_string(),
        }))
    }
}

/// Cursor over the tokens of one key string.
struct KeyReader<'k> {
    key: &'k str,
    tokens: SmallVec<[&'k str; 8]>,
    pos: usize,
}

impl<'k> KeyReader<'k> {
    fn next(&mut self) -> Result<&'k str, CodecError> {
        let token = self
            .tokens
            .get(self.pos)
            .copied()
            .ok_or_else(|| self.malformed("key ends before its last field"))?;
        self.pos += 1;
        Ok(token)
    }

    fn malformed(&self, reason: impl Into<String>) -> CodecError {
        CodecError::MalformedKeyString {
            key: self.key.to_string(),
            reason: reason.into(),
        }
    }
}
