//! Codec configuration.

use serde::Deserialize;

/// Environment variable overriding [`CodecOptions::max_depth`].
pub const MAX_DEPTH_VAR: &str = "KEEL_MAX_DEPTH";

/// Limits applied to every codec call.
///
/// Deserializable from JSON with missing fields taking their defaults:
///
/// ```json
/// { "max_depth": 64 }
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CodecOptions {
    /// Deepest nesting of records, lists and maps a value may have.
    pub max_depth: usize,
}

impl CodecOptions {
    pub const DEFAULT_MAX_DEPTH: usize = 128;

    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn from_json(text: &str) -> Result<Self, OptionsError> {
        let options: CodecOptions = serde_json::from_str(text)?;
        options.validated()
    }

    /// Defaults, overridden by `KEEL_MAX_DEPTH` when set.
    pub fn from_env() -> Result<Self, OptionsError> {
        match std::env::var(MAX_DEPTH_VAR) {
            Ok(raw) => Self::default().with_env_depth(&raw),
            Err(std::env::VarError::NotPresent) => Ok(Self::default()),
            Err(std::env::VarError::NotUnicode(raw)) => Err(OptionsError::InvalidEnv {
                var: MAX_DEPTH_VAR,
                value: raw.to_string_lossy().into_owned(),
            }),
        }
    }

    fn with_env_depth(self, raw: &str) -> Result<Self, OptionsError> {
        let depth = raw
            .trim()
            .parse::<usize>()
            .map_err(|_| OptionsError::InvalidEnv {
                var: MAX_DEPTH_VAR,
                value: raw.to_string(),
            })?;
        self.with_max_depth(depth).validated()
    }

    fn validated(self) -> Result<Self, OptionsError> {
        if self.max_depth == 0 {
            return Err(OptionsError::ZeroDepth);
        }
        Ok(self)
    }
}

impl Default for CodecOptions {
    fn default() -> Self {
        CodecOptions {
            max_depth: Self::DEFAULT_MAX_DEPTH,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum OptionsError {
    #[error("invalid codec options: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("{var}={value:?} is not a non-negative integer")]
    InvalidEnv { var: &'static str, value: String },

    #[error("max_depth must be at least 1")]
    ZeroDepth,
}

#[cfg(test)]
mod tests;
