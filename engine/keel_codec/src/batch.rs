//! Bulk helpers for backends saving or loading many records at once.
//!
//! Each record is handled by the same per-record entry point, in parallel
//! on the `rayon` pool. Results come back in input order, one per input, so
//! a failing record does not hide the others.

use keel_ir::{CodecError, RecordValue, TaggedValue, Value};
use rayon::prelude::*;

use crate::{Codec, FlatRow};

impl Codec<'_> {
    pub fn serialize_all(&self, values: &[Value]) -> Vec<Result<TaggedValue, CodecError>> {
        tracing::debug!(count = values.len(), "serializing batch");
        values.par_iter().map(|value| self.serialize(value)).collect()
    }

    pub fn deserialize_all(&self, trees: &[TaggedValue]) -> Vec<Result<Value, CodecError>> {
        tracing::debug!(count = trees.len(), "deserializing batch");
        trees.par_iter().map(|tagged| self.deserialize(tagged)).collect()
    }

    pub fn flatten_all(&self, records: &[RecordValue]) -> Vec<Result<FlatRow, CodecError>> {
        tracing::debug!(count = records.len(), "flattening batch");
        records.par_iter().map(|record| self.flatten(record)).collect()
    }

    pub fn serialize_keys(&self, values: &[Value]) -> Vec<Result<String, CodecError>> {
        values.par_iter().map(|value| self.serialize_key(value)).collect()
    }
}

#[cfg(test)]
mod tests;
