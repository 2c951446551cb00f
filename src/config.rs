use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Capacity given to an array parameter when no explicit length is registered.
pub const DEFAULT_ARRAY_LEN: usize = 32;

/// Marker character introducing a named parameter unless configured otherwise.
pub const DEFAULT_MARKER: char = ':';

/// Per-compiler settings.
///
/// There is no process-wide configuration: every [`TemplateBuilder`](crate::TemplateBuilder)
/// carries its own copy, and the cache keys on it.
///
/// ```
/// use sqlx_named_template::CompilerConfig;
///
/// let config = CompilerConfig::default().with_marker('@').with_default_array_len(8);
/// assert_eq!(config.marker, '@');
/// assert_eq!(config.default_array_len, 8);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Character that introduces a parameter name.
    pub marker: char,
    /// Capacity of array parameters without an explicit override.
    pub default_array_len: usize,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            marker: DEFAULT_MARKER,
            default_array_len: DEFAULT_ARRAY_LEN,
        }
    }
}

impl CompilerConfig {
    /// Sets the character that introduces a parameter name.
    #[must_use]
    pub fn with_marker(mut self, marker: char) -> Self {
        self.marker = marker;
        self
    }

    /// Sets the capacity used for arrays without an explicit length.
    #[must_use]
    pub fn with_default_array_len(mut self, len: usize) -> Self {
        self.default_array_len = len;
        self
    }

    /// Checks that the marker can be told apart from identifiers and `?`,
    /// and that the default array length is usable.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidMarker`] or [`Error::InvalidArrayLength`].
    pub fn validate(&self) -> Result<()> {
        let m = self.marker;
        if m.is_alphanumeric() || m == '_' || m.is_whitespace() || m == '?' {
            return Err(Error::InvalidMarker(m));
        }
        if self.default_array_len == 0 {
            return Err(Error::InvalidArrayLength {
                name: "<default>".to_owned(),
                len: 0,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CompilerConfig::default();
        assert_eq!(config.marker, ':');
        assert_eq!(config.default_array_len, 32);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_identifier_markers() {
        for marker in ['a', '7', '_', ' ', '?'] {
            let err = CompilerConfig::default().with_marker(marker).validate().unwrap_err();
            assert!(matches!(err, Error::InvalidMarker(c) if c == marker));
        }
    }

    #[test]
    fn test_rejects_zero_default_len() {
        let err = CompilerConfig::default()
            .with_default_array_len(0)
            .validate()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArrayLength { len: 0, .. }));
    }

    #[test]
    fn test_deserialize_partial_config() {
        let config: CompilerConfig = serde_json::from_str(r#"{"marker": "@"}"#).unwrap();
        assert_eq!(config.marker, '@');
        assert_eq!(config.default_array_len, DEFAULT_ARRAY_LEN);

        let config: CompilerConfig = serde_json::from_str(r#"{"default_array_len": 4}"#).unwrap();
        assert_eq!(config, CompilerConfig::default().with_default_array_len(4));
    }
}
