//! Error types for populator operations.

use thiserror::Error;

use crate::format::Format;

/// Errors that can occur while encoding, writing, or validating a file.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("{format} cannot encode character {ch:?}")]
    EncodingRange { format: Format, ch: char },

    #[error("Structural invariant violated: {0}")]
    Invariant(String),

    #[error("Malformed {format}: {reason}")]
    Malformed { format: Format, reason: String },
}

/// Coarse failure classes, one per way a single file can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// No encoder exists for the requested extension.
    Unsupported,
    /// Content fell outside the byte range an encoder can represent.
    EncodingRange,
    /// The destination could not be written.
    Sink,
    /// A length, offset, or reference computed by the encoder was inconsistent.
    Invariant,
    /// A validator rejected the bytes.
    Malformed,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Io(_) | Error::Zip(_) => ErrorKind::Sink,
            Error::UnsupportedFormat(_) => ErrorKind::Unsupported,
            Error::EncodingRange { .. } => ErrorKind::EncodingRange,
            Error::Invariant(_) | Error::Xml(_) => ErrorKind::Invariant,
            Error::Malformed { .. } => ErrorKind::Malformed,
        }
    }

    pub(crate) fn malformed(format: Format, reason: impl Into<String>) -> Self {
        Error::Malformed {
            format,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        let io = Error::from(std::io::Error::other("disk full"));
        assert_eq!(io.kind(), ErrorKind::Sink);
        assert_eq!(
            Error::UnsupportedFormat("exe".into()).kind(),
            ErrorKind::Unsupported
        );
        assert_eq!(
            Error::EncodingRange {
                format: Format::Pdf,
                ch: '\u{4e16}'
            }
            .kind(),
            ErrorKind::EncodingRange
        );
        assert_eq!(Error::Invariant("x".into()).kind(), ErrorKind::Invariant);
    }

    #[test]
    fn test_encoding_range_message() {
        let err = Error::EncodingRange {
            format: Format::Pdf,
            ch: '\u{20ac}',
        };
        assert_eq!(err.to_string(), "PDF cannot encode character '€'");
    }
}
