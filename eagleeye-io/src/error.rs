//! Error types for format decoding

use thiserror::Error;

/// Reasons a PLY header or body cannot be turned into a point set.
///
/// These are whole-file failures. Individual malformed records inside an
/// otherwise valid file are skipped by the parser and never reach this type.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("Invalid PLY header: {message}")]
    InvalidHeader { message: String },

    #[error("PLY header declares no vertex element")]
    MissingVertexElement,

    #[error("PLY vertex element has no '{property}' property")]
    MissingPositionProperty { property: String },

    #[error("PLY vertex property '{property}' is a list, which is not supported")]
    ListProperty { property: String },

    #[error("Binary PLY encoding is not supported: {encoding}")]
    BinaryEncoding { encoding: String },

    #[error("PLY body ended after {found} of {expected} '{element}' records")]
    TruncatedBody {
        element: String,
        expected: usize,
        found: usize,
    },
}

impl From<FormatError> for eagleeye_core::Error {
    fn from(e: FormatError) -> Self {
        eagleeye_core::Error::Parse(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_converts_to_parse_error() {
        let err: eagleeye_core::Error = FormatError::MissingVertexElement.into();
        assert!(matches!(err, eagleeye_core::Error::Parse(_)));
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_truncated_message() {
        let err = FormatError::TruncatedBody {
            element: "vertex".into(),
            expected: 10,
            found: 3,
        };
        assert_eq!(err.to_string(), "PLY body ended after 3 of 10 'vertex' records");
    }
}
