//! Type registry for the keel codecs.
//!
//! The registry maps short type names to [`TypeDescriptor`]s and derives,
//! once per type, the views the codecs need:
//!
//! - **hierarchy**: the base-to-derived inheritance chain
//! - **key chain**: leaf up to its unique key type, inclusive
//! - **field order**: every level's own fields, base first
//!
//! It is populated during warm-up and read concurrently afterwards. A single
//! instance is owned by the application and lent to every codec call.
//!
//! [`TypeDescriptor`]: keel_ir::TypeDescriptor

mod hierarchy;
mod registry;
mod source;

pub use hierarchy::{key_chain_of, merge_fields};
pub use registry::{Chain, TypeRegistry};
pub use source::TypeSource;
