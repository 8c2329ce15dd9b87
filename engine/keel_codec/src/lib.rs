//! Codecs between runtime [`Value`]s and their stored forms.
//!
//! Every entry point is a method on [`Codec`], which borrows the
//! application's [`TypeRegistry`]:
//!
//! | Form | Encode | Decode |
//! |------|--------|--------|
//! | tagged tree | [`Codec::serialize`] | [`Codec::deserialize`] |
//! | flat row | [`Codec::flatten`] | [`Codec::unflatten`] / [`Codec::load`] |
//! | key string | [`Codec::serialize_key`] | [`Codec::deserialize_key`] |
//!
//! Tagged trees cross into JSON through [`to_json`] and [`from_json`].
//! All calls are synchronous and independent; a `Codec` can be shared
//! across threads, and [`batch`](Codec::serialize_all) helpers fan work
//! out over `rayon`.
//!
//! [`Value`]: keel_ir::Value

use std::sync::Once;

use keel_ir::CodecError;
use keel_registry::TypeRegistry;

mod batch;
mod flat;
mod json;
mod key;
mod options;
mod path;
mod primitive;
mod tagged;
mod validate;

#[cfg(test)]
mod fixtures;

pub use flat::FlatRow;
pub use json::{from_json, to_json};
pub use options::{CodecOptions, OptionsError, MAX_DEPTH_VAR};
pub use primitive::{
    cell_text, decode_key_token, encode_key_token, parse_cell, parse_type_marker, primitive_to_tagged,
    tagged_to_primitive, type_marker,
};

/// Borrowed view of a registry plus per-call options.
#[derive(Clone, Copy, Debug)]
pub struct Codec<'r> {
    registry: &'r TypeRegistry,
    options: CodecOptions,
}

impl<'r> Codec<'r> {
    pub fn new(registry: &'r TypeRegistry) -> Self {
        Codec {
            registry,
            options: CodecOptions::default(),
        }
    }

    pub fn with_options(registry: &'r TypeRegistry, options: CodecOptions) -> Self {
        Codec { registry, options }
    }

    #[inline]
    pub fn registry(&self) -> &'r TypeRegistry {
        self.registry
    }

    #[inline]
    pub fn options(&self) -> &CodecOptions {
        &self.options
    }

    /// Depth after entering one more level of nesting.
    pub(crate) fn descend(&self, depth: usize) -> Result<usize, CodecError> {
        if depth >= self.options.max_depth {
            return Err(CodecError::DepthLimitExceeded {
                limit: self.options.max_depth,
            });
        }
        Ok(depth + 1)
    }
}

static TRACING_INIT: Once = Once::new();

/// Install a `tracing` subscriber honoring `RUST_LOG`.
///
/// Does nothing unless `RUST_LOG` is set, and nothing after the first call.
/// Applications with their own subscriber should not call this.
///
/// ```bash
/// RUST_LOG=keel_registry=debug,keel_codec=trace my-app
/// ```
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .init();
        }
    });
}
