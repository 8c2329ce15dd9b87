//! Canonical text forms of scalar values.
//!
//! Three encodings share one set of rules:
//!
//! - **tagged**: JSON-compatible scalars. Date/time/uuid/bytes travel as
//!   strings (uuid hyphenated, bytes standard base64); non-finite floats as
//!   `"NaN"`, `"inf"`, `"-inf"`.
//! - **cell**: bare text in a flat row, typed back by the declared field type.
//! - **key token**: one `;`-separated token of a key string. Binary values
//!   use URL-safe base64 without padding, and a type marker is a whole token
//!   of the form `` `ShortName` ``. Scalars of a field whose union admits
//!   more than one scalar alternative carry their kind: `!int:5`, `!str:5`.

use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine;
use chrono::{DateTime, NaiveDate, NaiveTime, SecondsFormat, Utc};
use keel_ir::{DeclaredType, PrimitiveKind, TaggedValue, Value};
use uuid::Uuid;

/// Token separator in key strings.
pub(crate) const KEY_DELIMITER: char = ';';

/// Opening and closing character of a type marker token.
const MARKER_QUOTE: char = '`';

/// Opening character of a kind-marked key token such as `!int:5`.
const KIND_MARK: char = '!';

/// Marker token naming `type_name`.
pub fn type_marker(type_name: &str) -> String {
    format!("{MARKER_QUOTE}{type_name}{MARKER_QUOTE}")
}

/// Type name inside a marker token, if `token` is one.
pub fn parse_type_marker(token: &str) -> Option<&str> {
    token
        .strip_prefix(MARKER_QUOTE)?
        .strip_suffix(MARKER_QUOTE)
        .filter(|name| !name.is_empty())
}

/// Tagged form of a scalar value; `None` for non-scalars.
pub fn primitive_to_tagged(value: &Value) -> Option<TaggedValue> {
    let tagged = match value {
        Value::Str(s) => TaggedValue::Str(s.clone()),
        Value::Bool(b) => TaggedValue::Bool(*b),
        Value::Int(n) => TaggedValue::Int(*n),
        Value::Float(x) => float_to_tagged(*x),
        Value::Date(d) => TaggedValue::Str(d.to_string()),
        Value::Time(t) => TaggedValue::Str(t.to_string()),
        Value::DateTime(dt) => TaggedValue::Str(datetime_text(dt)),
        Value::Uuid(id) => TaggedValue::Str(id.hyphenated().to_string()),
        Value::Bytes(b) => TaggedValue::Str(STANDARD.encode(b)),
        _ => return None,
    };
    Some(tagged)
}

/// Scalar value of declared kind `kind` from its tagged form.
///
/// Accepts an int where a float is declared. Everything else must match
/// the canonical tagged form exactly.
pub fn tagged_to_primitive(kind: PrimitiveKind, tagged: &TaggedValue) -> Option<Value> {
    match (kind, tagged) {
        (PrimitiveKind::Str, TaggedValue::Str(s)) => Some(Value::Str(s.clone())),
        (PrimitiveKind::Bool, TaggedValue::Bool(b)) => Some(Value::Bool(*b)),
        (PrimitiveKind::Int, TaggedValue::Int(n)) => Some(Value::Int(*n)),
        (PrimitiveKind::Float, TaggedValue::Float(x)) => Some(Value::Float(*x)),
        (PrimitiveKind::Float, TaggedValue::Int(n)) => Some(Value::Float(int_to_float(*n))),
        (PrimitiveKind::Float, TaggedValue::Str(s)) => non_finite(s).map(Value::Float),
        (
            PrimitiveKind::Date
            | PrimitiveKind::Time
            | PrimitiveKind::DateTime
            | PrimitiveKind::Uuid
            | PrimitiveKind::Bytes,
            TaggedValue::Str(s),
        ) => parse_text(kind, s),
        _ => None,
    }
}

/// Bare cell text of a primitive tagged node.
pub fn cell_text(tagged: &TaggedValue) -> Option<String> {
    match tagged {
        TaggedValue::Str(s) => Some(s.clone()),
        TaggedValue::Bool(b) => Some(b.to_string()),
        TaggedValue::Int(n) => Some(n.to_string()),
        TaggedValue::Float(x) => Some(x.to_string()),
        _ => None,
    }
}

/// Tagged node for the bare cell `text` of a field declared as `declared`.
///
/// Unions take the first alternative the text parses as.
pub fn parse_cell(text: &str, declared: &DeclaredType) -> Option<TaggedValue> {
    match declared {
        DeclaredType::Primitive(kind) => parse_cell_kind(*kind, text),
        DeclaredType::Union(alternatives) => alternatives
            .iter()
            .find_map(|alt| parse_cell(text, alt)),
        _ => None,
    }
}

fn parse_cell_kind(kind: PrimitiveKind, text: &str) -> Option<TaggedValue> {
    match kind {
        PrimitiveKind::Str => Some(TaggedValue::Str(text.to_string())),
        PrimitiveKind::Bool => parse_bool(text).map(TaggedValue::Bool),
        PrimitiveKind::Int => text.parse().ok().map(TaggedValue::Int),
        PrimitiveKind::Float => text.parse().ok().map(float_to_tagged),
        _ => parse_text(kind, text).map(|_| TaggedValue::Str(text.to_string())),
    }
}

/// Key token of a scalar value.
///
/// Strings containing the delimiter, or starting like a type marker, have no
/// unambiguous token and are rejected with the reason.
pub fn encode_key_token(value: &Value) -> Result<String, String> {
    let token = match value {
        Value::Str(s) => {
            if s.contains(KEY_DELIMITER) {
                return Err(format!("string {s:?} contains the key delimiter `;`"));
            }
            if s.starts_with(MARKER_QUOTE) {
                return Err(format!("string {s:?} starts with the type marker quote"));
            }
            s.clone()
        }
        Value::Bool(b) => b.to_string(),
        Value::Int(n) => n.to_string(),
        Value::Float(x) => x.to_string(),
        Value::Date(d) => d.to_string(),
        Value::Time(t) => t.to_string(),
        Value::DateTime(dt) => datetime_text(dt),
        Value::Uuid(id) => URL_SAFE_NO_PAD.encode(id.as_bytes()),
        Value::Bytes(b) => URL_SAFE_NO_PAD.encode(b),
        Value::Enum(e) => format!("{}.{}", e.type_name, e.member),
        other => return Err(format!("{} values have no key token", other.type_label())),
    };
    Ok(token)
}

/// Whether scalar key tokens of a field declared as `declared` carry a kind mark.
pub(crate) fn needs_kind_mark(declared: &DeclaredType) -> bool {
    match declared {
        DeclaredType::Union(alternatives) => {
            alternatives
                .iter()
                .filter(|alt| matches!(alt, DeclaredType::Primitive(_) | DeclaredType::Enum(_)))
                .count()
                > 1
        }
        _ => false,
    }
}

/// `token` prefixed with the kind of the value it encodes.
pub(crate) fn mark_key_token(kind: &str, token: &str) -> String {
    format!("{KIND_MARK}{kind}:{token}")
}

/// Kind name and token of a kind-marked key token.
pub(crate) fn split_kind_mark(token: &str) -> Option<(&str, &str)> {
    token.strip_prefix(KIND_MARK)?.split_once(':')
}

/// Scalar value of kind `kind` from its key token.
pub fn decode_key_token(kind: PrimitiveKind, token: &str) -> Option<Value> {
    match kind {
        PrimitiveKind::Str if token.starts_with(MARKER_QUOTE) => None,
        PrimitiveKind::Str => Some(Value::Str(token.to_string())),
        PrimitiveKind::Uuid => URL_SAFE_NO_PAD
            .decode(token)
            .ok()
            .and_then(|bytes| Uuid::from_slice(&bytes).ok())
            .map(Value::Uuid),
        PrimitiveKind::Bytes => URL_SAFE_NO_PAD.decode(token).ok().map(Value::Bytes),
        _ => parse_text(kind, token),
    }
}

/// Shared text parser for kinds whose tagged, cell and key forms agree.
fn parse_text(kind: PrimitiveKind, text: &str) -> Option<Value> {
    match kind {
        PrimitiveKind::Str => Some(Value::Str(text.to_string())),
        PrimitiveKind::Bool => parse_bool(text).map(Value::Bool),
        PrimitiveKind::Int => text.parse().ok().map(Value::Int),
        PrimitiveKind::Float => text.parse().ok().map(Value::Float),
        PrimitiveKind::Date => text.parse::<NaiveDate>().ok().map(Value::Date),
        PrimitiveKind::Time => text.parse::<NaiveTime>().ok().map(Value::Time),
        PrimitiveKind::DateTime => DateTime::parse_from_rfc3339(text)
            .ok()
            .map(|dt| Value::DateTime(dt.with_timezone(&Utc))),
        PrimitiveKind::Uuid => Uuid::parse_str(text).ok().map(Value::Uuid),
        PrimitiveKind::Bytes => STANDARD.decode(text).ok().map(Value::Bytes),
    }
}

fn parse_bool(text: &str) -> Option<bool> {
    match text {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

fn float_to_tagged(x: f64) -> TaggedValue {
    if x.is_finite() {
        TaggedValue::Float(x)
    } else {
        TaggedValue::Str(x.to_string())
    }
}

fn non_finite(text: &str) -> Option<f64> {
    match text {
        "NaN" => Some(f64::NAN),
        "inf" => Some(f64::INFINITY),
        "-inf" => Some(f64::NEG_INFINITY),
        _ => None,
    }
}

#[expect(
    clippy::cast_precision_loss,
    reason = "JSON does not distinguish 1 from 1.0"
)]
fn int_to_float(n: i64) -> f64 {
    n as f64
}

fn datetime_text(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}
