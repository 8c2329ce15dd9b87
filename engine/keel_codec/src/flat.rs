//! Flat rows for tabular stores.
//!
//! A row has one cell per set field plus the reserved `_type` and `_key`
//! columns. Primitive fields are stored as bare canonical text; composite
//! fields as a shape marker followed by compact JSON:
//!
//! ```text
//! _type     = Trade
//! _key      = `TradeKey`;T-1
//! notional  = 1500000
//! side      = <DATA> {"_enum":"Side","_name":"Buy"}
//! legs      = <LIST> [{"currency":"USD","_type":"Leg"}]
//! ```
//!
//! A scalar in a field whose union admits more than one scalar alternative
//! is written as `<VALUE>` followed by its JSON form, so `"5"` and `5` stay
//! apart. Any other scalar must read back as itself from its bare text.
//!
//! Any cell that starts with `<NAME> ` (upper-case letters) is read as
//! marked, so string fields that look like that are rejected when flattening.

use keel_ir::{
    CodecError, DeclaredType, RecordValue, Shape, TaggedValue, TypeName, Value, KEY_COLUMN,
    TYPE_FIELD,
};

use crate::json::{from_json, to_json};
use crate::path::Path;
use crate::primitive::{cell_text, needs_kind_mark, parse_cell};
use crate::Codec;

/// Marker name of a scalar cell carrying its JSON form.
const VALUE_MARKER: &str = "VALUE";

/// One record in flat form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FlatRow {
    type_name: TypeName,
    key: Option<String>,
    cells: Vec<(String, String)>,
}

impl FlatRow {
    pub fn new(type_name: impl Into<TypeName>) -> Self {
        FlatRow {
            type_name: type_name.into(),
            key: None,
            cells: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    #[must_use]
    pub fn with_cell(mut self, column: impl Into<String>, text: impl Into<String>) -> Self {
        self.cells.push((column.into(), text.into()));
        self
    }

    /// Value of the `_type` column.
    #[inline]
    pub fn type_name(&self) -> &TypeName {
        &self.type_name
    }

    /// Value of the `_key` column, for types with a key.
    #[inline]
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    /// Field cells in field order.
    pub fn cells(&self) -> &[(String, String)] {
        &self.cells
    }

    pub fn cell(&self, column: &str) -> Option<&str> {
        self.cells
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, text)| text.as_str())
    }

    /// Rebuild a row from the columns a store returned.
    ///
    /// `_type` is required; an empty `_key` counts as absent.
    pub fn from_columns<K, V>(columns: impl IntoIterator<Item = (K, V)>) -> Result<Self, CodecError>
    where
        K: Into<String>,
        V: Into<String>,
    {
        let mut type_name = None;
        let mut key = None;
        let mut cells = Vec::new();
        for (column, text) in columns {
            let column = column.into();
            let text = text.into();
            match column.as_str() {
                TYPE_FIELD => type_name = Some(TypeName::from(text)),
                KEY_COLUMN => key = Some(text).filter(|k| !k.is_empty()),
                _ => cells.push((column, text)),
            }
        }
        let type_name = type_name.ok_or_else(|| CodecError::MissingDiscriminator {
            found: "flat row without `_type` column".to_string(),
        })?;
        Ok(FlatRow {
            type_name,
            key,
            cells,
        })
    }

    /// `_type`, then `_key` if present, then the field cells.
    pub fn into_columns(self) -> Vec<(String, String)> {
        let mut columns = Vec::with_capacity(self.cells.len() + 2);
        columns.push((TYPE_FIELD.to_string(), self.type_name.to_string()));
        if let Some(key) = self.key {
            columns.push((KEY_COLUMN.to_string(), key));
        }
        columns.extend(self.cells);
        columns
    }
}

impl Codec<'_> {
    #[tracing::instrument(level = "debug", skip_all, fields(ty = %record.type_name()))]
    pub fn flatten(&self, record: &RecordValue) -> Result<FlatRow, CodecError> {
        let record = self.initialized(record)?;
        let root = record.type_name().to_string();
        let tagged = self.encode_record(&record, &Path::root(&root), 0)?;
        let TaggedValue::Record { type_name, fields } = tagged else {
            return Err(CodecError::mismatch(root, "record", "non-record"));
        };

        let key = if self.registry.classify(&type_name)?.has_key_chain() {
            Some(self.record_key(&record)?)
        } else {
            None
        };

        let order = self.record_fields(&type_name)?;
        let cells = fields
            .into_iter()
            .map(|(column, tagged)| {
                let declared = order
                    .iter()
                    .find(|f| f.name == column)
                    .map(|f| &f.ty)
                    .ok_or_else(|| CodecError::UnknownField {
                        type_name: type_name.clone(),
                        field: column.clone(),
                    })?;
                let text = flat_cell(&column, &tagged, declared)?;
                Ok((column, text))
            })
            .collect::<Result<Vec<_>, CodecError>>()?;

        Ok(FlatRow {
            type_name,
            key,
            cells,
        })
    }

    /// Tagged tree of a flat row, cells typed by their declared fields.
    #[tracing::instrument(level = "debug", skip_all, fields(ty = %row.type_name()))]
    pub fn unflatten(&self, row: &FlatRow) -> Result<TaggedValue, CodecError> {
        let order = self.record_fields(row.type_name())?;
        let mut fields = Vec::with_capacity(row.cells.len());
        for field in order.iter() {
            if let Some(text) = row.cell(&field.name) {
                fields.push((field.name.clone(), read_cell(&field.name, text, &field.ty)?));
            }
        }
        if let Some((column, _)) = row
            .cells
            .iter()
            .find(|(column, _)| !order.iter().any(|f| f.name == *column))
        {
            return Err(CodecError::UnknownField {
                type_name: row.type_name.clone(),
                field: column.clone(),
            });
        }
        Ok(TaggedValue::Record {
            type_name: row.type_name.clone(),
            fields,
        })
    }

    /// `deserialize(unflatten(row))`.
    pub fn load(&self, row: &FlatRow) -> Result<Value, CodecError> {
        let tagged = self.unflatten(row)?;
        self.deserialize(&tagged)
    }

    /// Every column a row of `type_name` can have: `_type`, `_key`, then
    /// each field across the hierarchy.
    pub fn column_names(&self, type_name: &str) -> Result<Vec<String>, CodecError> {
        let order = self.record_fields(type_name)?;
        let mut names = Vec::with_capacity(order.len() + 2);
        names.push(TYPE_FIELD.to_string());
        names.push(KEY_COLUMN.to_string());
        names.extend(order.iter().map(|f| f.name.clone()));
        Ok(names)
    }
}

/// Cell text for one serialized field.
fn flat_cell(column: &str, tagged: &TaggedValue, declared: &DeclaredType) -> Result<String, CodecError> {
    let malformed = |reason: String| CodecError::MalformedFlatCell {
        column: column.to_string(),
        reason,
    };

    if let Some(text) = cell_text(tagged) {
        if needs_kind_mark(declared) {
            return Ok(format!("<{VALUE_MARKER}> {}", to_json(tagged)));
        }
        if let TaggedValue::Str(s) = tagged {
            if split_marker(s).is_some() {
                return Err(malformed(format!("string {s:?} would read back as a marked cell")));
            }
        }
        if parse_cell(&text, declared).as_ref() != Some(tagged) {
            return Err(malformed(format!(
                "{text:?} would read back as a different `{declared}`"
            )));
        }
        return Ok(text);
    }
    match tagged.shape() {
        Some(shape) => Ok(format!("{shape} {}", to_json(tagged))),
        None => Err(malformed(format!("{} has no cell form", tagged.kind_label()))),
    }
}

/// Tagged node for one cell.
fn read_cell(column: &str, text: &str, declared: &DeclaredType) -> Result<TaggedValue, CodecError> {
    let malformed = |reason: String| CodecError::MalformedFlatCell {
        column: column.to_string(),
        reason,
    };

    let Some((name, payload)) = split_marker(text) else {
        return parse_cell(text, declared)
            .ok_or_else(|| malformed(format!("{text:?} is not a valid `{declared}`")));
    };

    if name == VALUE_MARKER {
        let json: serde_json::Value = serde_json::from_str(payload)
            .map_err(|err| malformed(format!("corrupt <{VALUE_MARKER}> payload: {err}")))?;
        let tagged = from_json(&json).map_err(|err| malformed(err.to_string()))?;
        if cell_text(&tagged).is_none() {
            return Err(malformed(format!(
                "<{VALUE_MARKER}> marker on a {} payload",
                tagged.kind_label()
            )));
        }
        return Ok(tagged);
    }

    let shape = Shape::from_name(name).ok_or_else(|| malformed(format!("unknown marker <{name}>")))?;
    let json: serde_json::Value = serde_json::from_str(payload)
        .map_err(|err| malformed(format!("corrupt {shape} payload: {err}")))?;
    let tagged = from_json(&json).map_err(|err| malformed(err.to_string()))?;
    if tagged.shape() != Some(shape) {
        return Err(malformed(format!(
            "{shape} marker on a {} payload",
            tagged.kind_label()
        )));
    }
    Ok(tagged)
}

/// Split `<NAME> payload` into its marker name and payload.
fn split_marker(text: &str) -> Option<(&str, &str)> {
    let rest = text.strip_prefix('<')?;
    let (name, payload) = rest.split_once("> ")?;
    let is_marker = !name.is_empty() && name.bytes().all(|b| b.is_ascii_uppercase());
    is_marker.then_some((name, payload))
}

#[cfg(test)]
mod tests;
