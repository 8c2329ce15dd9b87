//! Bridge between tagged trees and `serde_json` documents.
//!
//! Record nodes become objects whose `_type` entry follows the fields;
//! enum nodes become `{"_enum": ..., "_name": ...}`. Any other object is a
//! plain map. Object key order is preserved in both directions.

use keel_ir::{CodecError, TaggedValue, TypeName, ENUM_FIELD, MEMBER_FIELD, TYPE_FIELD};
use keel_stack::ensure_sufficient_stack;
use serde_json::{Map, Number, Value as Json};

/// JSON document for a tagged tree.
pub fn to_json(tagged: &TaggedValue) -> Json {
    ensure_sufficient_stack(|| match tagged {
        TaggedValue::Null => Json::Null,
        TaggedValue::Bool(b) => Json::Bool(*b),
        TaggedValue::Int(n) => Json::Number((*n).into()),
        TaggedValue::Float(x) => {
            Number::from_f64(*x).map_or_else(|| Json::String(x.to_string()), Json::Number)
        }
        TaggedValue::Str(s) => Json::String(s.clone()),
        TaggedValue::List(items) => Json::Array(items.iter().map(to_json).collect()),
        TaggedValue::Map(entries) => Json::Object(object(entries)),
        TaggedValue::Record { type_name, fields } => {
            let mut map = object(fields);
            map.insert(TYPE_FIELD.to_string(), Json::String(type_name.to_string()));
            Json::Object(map)
        }
        TaggedValue::Enum { type_name, member } => {
            let mut map = Map::with_capacity(2);
            map.insert(ENUM_FIELD.to_string(), Json::String(type_name.to_string()));
            map.insert(MEMBER_FIELD.to_string(), Json::String(member.clone()));
            Json::Object(map)
        }
    })
}

fn object(entries: &[(String, TaggedValue)]) -> Map<String, Json> {
    entries
        .iter()
        .map(|(key, value)| (key.clone(), to_json(value)))
        .collect()
}

/// Tagged tree for a JSON document.
///
/// Integers that fit in `i64` become ints; every other number is a float.
pub fn from_json(json: &Json) -> Result<TaggedValue, CodecError> {
    ensure_sufficient_stack(|| {
        let tagged = match json {
            Json::Null => TaggedValue::Null,
            Json::Bool(b) => TaggedValue::Bool(*b),
            Json::Number(n) => match (n.as_i64(), n.as_f64()) {
                (Some(i), _) => TaggedValue::Int(i),
                (None, Some(x)) => TaggedValue::Float(x),
                (None, None) => {
                    return Err(CodecError::mismatch("json number", "f64", n.to_string()))
                }
            },
            Json::String(s) => TaggedValue::Str(s.clone()),
            Json::Array(items) => {
                TaggedValue::List(items.iter().map(from_json).collect::<Result<_, _>>()?)
            }
            Json::Object(map) if map.contains_key(ENUM_FIELD) => enum_node(map)?,
            Json::Object(map) => match map.get(TYPE_FIELD) {
                Some(Json::String(name)) => TaggedValue::Record {
                    type_name: TypeName::new(name),
                    fields: entries(map.iter().filter(|(key, _)| *key != TYPE_FIELD))?,
                },
                Some(other) => {
                    return Err(CodecError::mismatch(
                        "`_type` discriminator",
                        "string",
                        json_label(other),
                    ))
                }
                None => TaggedValue::Map(entries(map.iter())?),
            },
        };
        Ok(tagged)
    })
}

fn entries<'a>(
    iter: impl Iterator<Item = (&'a String, &'a Json)>,
) -> Result<Vec<(String, TaggedValue)>, CodecError> {
    iter.map(|(key, value)| Ok((key.clone(), from_json(value)?)))
        .collect()
}

fn enum_node(map: &Map<String, Json>) -> Result<TaggedValue, CodecError> {
    let text = |field: &str| match map.get(field) {
        Some(Json::String(s)) => Ok(s.clone()),
        other => Err(CodecError::mismatch(
            format!("enum `{field}`"),
            "string",
            other.map_or("nothing", json_label),
        )),
    };
    let type_name = text(ENUM_FIELD)?;
    let member = text(MEMBER_FIELD)?;
    if map.len() != 2 {
        let extra: Vec<&str> = map
            .keys()
            .map(String::as_str)
            .filter(|key| *key != ENUM_FIELD && *key != MEMBER_FIELD)
            .collect();
        return Err(CodecError::mismatch(
            format!("enum `{type_name}`"),
            "only `_enum` and `_name`",
            extra.join(", "),
        ));
    }
    Ok(TaggedValue::Enum {
        type_name: TypeName::new(type_name),
        member,
    })
}

fn json_label(json: &Json) -> &'static str {
    match json {
        Json::Null => "null",
        Json::Bool(_) => "bool",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
    }
}
