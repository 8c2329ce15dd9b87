//! Errors reported by the registry and the codecs.
//!
//! Registration errors (`K1xxx`) are fatal to warm-up: no record of the
//! offending type can be serialized afterwards. Everything else is a
//! per-call error returned to the immediate caller.

use std::fmt;

use crate::TypeName;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    #[error("unknown type `{name}`")]
    UnknownType { name: String },

    #[error("type name `{name}` is already registered with a different definition")]
    DuplicateTypeName { name: TypeName },

    #[error("`{name}` is not a valid type or member name")]
    InvalidTypeName { name: String },

    #[error("invalid definition of `{type_name}`: {reason}")]
    InvalidSchema { type_name: TypeName, reason: String },

    #[error("`{type_name}` has no key type in its hierarchy")]
    MissingKeyAncestor { type_name: TypeName },

    #[error("`{type_name}` has more than one key type in its hierarchy: {}", .candidates.join(", "))]
    AmbiguousKeyAncestor {
        type_name: TypeName,
        candidates: Vec<String>,
    },

    #[error("field `{field}` of `{type_name}` is declared as both `{first}` and `{second}`")]
    DuplicateFieldName {
        type_name: TypeName,
        field: String,
        first: String,
        second: String,
    },

    #[error("`{type_name}` has no field `{field}`")]
    UnknownField { type_name: TypeName, field: String },

    #[error("required field `{field}` of `{type_name}` is not set")]
    RequiredFieldMissing { type_name: TypeName, field: String },

    #[error("{context}: expected `{expected}`, found `{found}`")]
    FieldTypeMismatch {
        context: String,
        expected: String,
        found: String,
    },

    #[error("tagged value has no `_type` discriminator (found {found})")]
    MissingDiscriminator { found: String },

    #[error("init hook of `{type_name}` failed: {message}")]
    InitHookFailed { type_name: TypeName, message: String },

    #[error("malformed key string `{key}`: {reason}")]
    MalformedKeyString { key: String, reason: String },

    #[error("malformed flat cell in column `{column}`: {reason}")]
    MalformedFlatCell { column: String, reason: String },

    #[error("object graph is nested deeper than {limit} levels")]
    DepthLimitExceeded { limit: usize },
}

impl CodecError {
    pub fn code(&self) -> ErrorCode {
        match self {
            CodecError::DuplicateTypeName { .. } => ErrorCode::K1001,
            CodecError::InvalidTypeName { .. } => ErrorCode::K1002,
            CodecError::InvalidSchema { .. } => ErrorCode::K1003,
            CodecError::MissingKeyAncestor { .. } => ErrorCode::K1004,
            CodecError::AmbiguousKeyAncestor { .. } => ErrorCode::K1005,
            CodecError::DuplicateFieldName { .. } => ErrorCode::K1006,
            CodecError::UnknownType { .. } => ErrorCode::K2001,
            CodecError::MissingDiscriminator { .. } => ErrorCode::K2002,
            CodecError::UnknownField { .. } => ErrorCode::K2003,
            CodecError::RequiredFieldMissing { .. } => ErrorCode::K2004,
            CodecError::FieldTypeMismatch { .. } => ErrorCode::K2005,
            CodecError::InitHookFailed { .. } => ErrorCode::K2006,
            CodecError::DepthLimitExceeded { .. } => ErrorCode::K2007,
            CodecError::MalformedFlatCell { .. } => ErrorCode::K3001,
            CodecError::MalformedKeyString { .. } => ErrorCode::K4001,
        }
    }

    /// Errors that can only come out of type registration.
    pub fn is_registration_error(&self) -> bool {
        self.code().is_registration()
    }

    /// Shorthand for [`CodecError::FieldTypeMismatch`].
    pub fn mismatch(
        context: impl Into<String>,
        expected: impl fmt::Display,
        found: impl Into<String>,
    ) -> Self {
        CodecError::FieldTypeMismatch {
            context: context.into(),
            expected: expected.to_string(),
            found: found.into(),
        }
    }
}

/// Stable codes for every [`CodecError`] variant.
///
/// Format: K#### where the first digit names the stage:
/// - K1xxx: type registration
/// - K2xxx: tagged serialization and validation
/// - K3xxx: flat cells
/// - K4xxx: key strings
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ErrorCode {
    /// Short name owned by another type
    K1001,
    /// Type or member name is not an identifier
    K1002,
    /// Inconsistent type definition
    K1003,
    /// No key type in a stored type's hierarchy
    K1004,
    /// Several key types in one hierarchy
    K1005,
    /// Field redeclared with a different type
    K1006,
    /// Discriminator names no registered type
    K2001,
    /// Top-level tagged value without discriminator
    K2002,
    /// Field not declared by the type
    K2003,
    /// Required field not set
    K2004,
    /// Value not assignable to the declared type
    K2005,
    /// Init hook reported failure
    K2006,
    /// Nesting deeper than the configured limit
    K2007,
    /// Bad shape marker or payload
    K3001,
    /// Bad key string
    K4001,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::K1001 => "K1001",
            ErrorCode::K1002 => "K1002",
            ErrorCode::K1003 => "K1003",
            ErrorCode::K1004 => "K1004",
            ErrorCode::K1005 => "K1005",
            ErrorCode::K1006 => "K1006",
            ErrorCode::K2001 => "K2001",
            ErrorCode::K2002 => "K2002",
            ErrorCode::K2003 => "K2003",
            ErrorCode::K2004 => "K2004",
            ErrorCode::K2005 => "K2005",
            ErrorCode::K2006 => "K2006",
            ErrorCode::K2007 => "K2007",
            ErrorCode::K3001 => "K3001",
            ErrorCode::K4001 => "K4001",
        }
    }

    pub fn is_registration(self) -> bool {
        self.as_str().starts_with("K1")
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests;
