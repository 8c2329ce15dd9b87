//! Data model shared by the keel registry and codecs.
//!
//! - [`TypeName`]: validated short type names used as discriminators and key markers
//! - [`DeclaredType`] / [`FieldDescriptor`] / [`TypeDescriptor`]: the schema of a type
//! - [`Value`] / [`RecordValue`] / [`EnumValue`]: the runtime object graph
//! - [`TaggedValue`]: the discriminator-carrying tree produced by serialization
//! - [`CodecError`]: every failure the registry and codecs can report
//!
//! Nothing in this crate performs I/O or holds shared state; resolution of
//! names to descriptors lives in `keel_registry`.

mod declared;
mod descriptor;
mod error;
mod name;
mod record;
mod tagged;
mod value;

pub use declared::{DeclaredType, PrimitiveKind};
pub use descriptor::{
    EnumDef, FieldDescriptor, InitHook, RecordBuilder, RecordDef, RecordRole, TypeClass,
    TypeDescriptor, TypeKind,
};
pub use error::{CodecError, ErrorCode};
pub use name::{canonical_member_name, is_identifier, TypeName};
pub use record::Record;
pub use tagged::{Shape, TaggedValue, ENUM_FIELD, KEY_COLUMN, MEMBER_FIELD, TYPE_FIELD};
pub use value::{EnumValue, FromValue, RecordValue, Value};

// Scalar types carried by `Value`, re-exported so downstream crates agree on versions.
pub use chrono;
pub use uuid;
