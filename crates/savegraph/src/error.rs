// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error taxonomy shared by the registry, the descriptors and the formats.

use std::fmt;

/// Errors produced while classifying types or walking a value graph.
#[derive(Debug)]
pub enum CodecError {
    // ========================================================================
    // Type coverage
    // ========================================================================
    /// Classification failed for a declared field/element type.
    UnsupportedType { type_name: String, reason: String },
    /// A polymorphism tag in the payload does not resolve to a known type.
    UnknownTypeTag(String),

    // ========================================================================
    // Read-into contracts
    // ========================================================================
    /// An existing instance was to be populated but the payload holds null.
    NullPayload { type_name: String },
    /// The payload ran out of items before the target was filled.
    TooFewElements { expected: usize, found: usize },
    /// The payload holds more items than the target can take.
    TooManyElements { expected: usize },
    /// Dictionary read-into met a key the target does not contain.
    KeyNotFound(String),

    // ========================================================================
    // Stream and value shape
    // ========================================================================
    /// Framing calls out of order, duplicated properties, truncated input.
    MalformedStream(String),
    /// The operation has no meaning for this descriptor (e.g. read-into a leaf).
    NotImplemented(String),
    /// A value does not have the shape its declared type requires.
    TypeMismatch { expected: String, found: String },
    /// Nesting exceeded the configured depth limit.
    DepthLimitExceeded { limit: usize },

    // ========================================================================
    // Archive / environment
    // ========================================================================
    /// Archive key was never saved.
    MissingKey(String),
    /// Registry consistency violation (e.g. an unseeded primitive).
    Internal(String),
    /// I/O error with underlying cause.
    Io(std::io::Error),
    /// Settings could not be loaded.
    Config(String),
}

impl CodecError {
    pub(crate) fn unsupported(type_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::UnsupportedType {
            type_name: type_name.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedStream(msg.into())
    }

    pub(crate) fn mismatch(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::TypeMismatch {
            expected: expected.into(),
            found: found.into(),
        }
    }
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedType { type_name, reason } => {
                write!(f, "type {} is not supported: {}", type_name, reason)
            }
            Self::UnknownTypeTag(tag) => write!(f, "unknown type tag: {}", tag),
            Self::NullPayload { type_name } => write!(
                f,
                "cannot populate an existing {} from a null payload",
                type_name
            ),
            Self::TooFewElements { expected, found } => write!(
                f,
                "too few elements: target holds {}, payload holds {}",
                expected, found
            ),
            Self::TooManyElements { expected } => write!(
                f,
                "too many elements: payload holds more than the {} the target holds",
                expected
            ),
            Self::KeyNotFound(key) => write!(f, "key not found in target dictionary: {}", key),
            Self::MalformedStream(msg) => write!(f, "malformed stream: {}", msg),
            Self::NotImplemented(msg) => write!(f, "not implemented: {}", msg),
            Self::TypeMismatch { expected, found } => {
                write!(f, "type mismatch: expected {}, found {}", expected, found)
            }
            Self::DepthLimitExceeded { limit } => write!(
                f,
                "serialization depth limit of {} exceeded (circular structure?)",
                limit
            ),
            Self::MissingKey(key) => write!(f, "key \"{}\" was not found in the archive", key),
            Self::Internal(msg) => write!(f, "internal registry error: {}", msg),
            Self::Io(e) => write!(f, "I/O error: {}", e),
            Self::Config(msg) => write!(f, "configuration error: {}", msg),
        }
    }
}

impl std::error::Error for CodecError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for CodecError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

pub type Result<T> = std::result::Result<T, CodecError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_variants() {
        let err = CodecError::TooFewElements {
            expected: 5,
            found: 4,
        };
        assert_eq!(
            err.to_string(),
            "too few elements: target holds 5, payload holds 4"
        );

        let err = CodecError::unsupported("Door", "no parameterless constructor");
        assert_eq!(
            err.to_string(),
            "type Door is not supported: no parameterless constructor"
        );

        let err = CodecError::UnknownTypeTag("Game.Removed".into());
        assert_eq!(err.to_string(), "unknown type tag: Game.Removed");
    }

    #[test]
    fn test_io_error_keeps_source() {
        let err: CodecError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert!(matches!(err, CodecError::Io(_)));
        assert!(std::error::Error::source(&err).is_some());
    }
}
