//! Stack growth for deeply nested object graphs.
//!
//! The tagged, flat and key codecs all walk records recursively. A record
//! whose fields nest other records (or lists of lists of records) can be
//! arbitrarily deep, so every recursive step goes through
//! [`ensure_sufficient_stack`] and grows the stack on demand instead of
//! overflowing it.
//!
//! On `wasm32` the guard is a passthrough.

/// Remaining stack below which a new segment is allocated (128KB).
const RED_ZONE: usize = 128 * 1024;

/// Size of each newly allocated stack segment (1MB).
const SEGMENT_SIZE: usize = 1024 * 1024;

/// Run `f`, growing the stack first if less than [`RED_ZONE`] bytes remain.
///
/// ```text
/// fn encode(&self, value: &Value, depth: usize) -> Result<TaggedValue, CodecError> {
///     ensure_sufficient_stack(|| match value {
///         Value::List(items) => items.iter().map(|v| self.encode(v, depth + 1)).collect(),
///         other => self.encode_scalar(other),
///     })
/// }
/// ```
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, SEGMENT_SIZE, f)
}

#[inline]
#[cfg(target_arch = "wasm32")]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}
