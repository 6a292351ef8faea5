//! Supported output formats.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::error::Error;

/// Every file type the encoders can produce.
///
/// Dispatch is an exhaustive match over this enum, so an unknown extension is
/// rejected once by [`Format::from_extension`] and never reaches an encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cli", derive(serde::Deserialize), serde(try_from = "String"))]
pub enum Format {
    Text,
    Docx,
    Xlsx,
    Pptx,
    Pdf,
    Jpeg,
    Png,
    Mp3,
    Zip,
}

impl Format {
    pub const ALL: [Format; 9] = [
        Format::Text,
        Format::Docx,
        Format::Xlsx,
        Format::Pptx,
        Format::Pdf,
        Format::Jpeg,
        Format::Png,
        Format::Mp3,
        Format::Zip,
    ];

    /// Look up a format by file extension.
    ///
    /// Matching is case-insensitive and tolerates a leading dot; `jpg` and
    /// `jpeg` both map to [`Format::Jpeg`].
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.strip_prefix('.').unwrap_or(ext).to_ascii_lowercase();
        match ext.as_str() {
            "txt" => Some(Format::Text),
            "docx" => Some(Format::Docx),
            "xlsx" => Some(Format::Xlsx),
            "pptx" => Some(Format::Pptx),
            "pdf" => Some(Format::Pdf),
            "jpg" | "jpeg" => Some(Format::Jpeg),
            "png" => Some(Format::Png),
            "mp3" => Some(Format::Mp3),
            "zip" => Some(Format::Zip),
            _ => None,
        }
    }

    /// Look up a format from a path's extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    /// Canonical extension, without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            Format::Text => "txt",
            Format::Docx => "docx",
            Format::Xlsx => "xlsx",
            Format::Pptx => "pptx",
            Format::Pdf => "pdf",
            Format::Jpeg => "jpg",
            Format::Png => "png",
            Format::Mp3 => "mp3",
            Format::Zip => "zip",
        }
    }

    pub fn media_type(self) -> &'static str {
        match self {
            Format::Text => "text/plain",
            Format::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            Format::Xlsx => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            Format::Pptx => {
                "application/vnd.openxmlformats-officedocument.presentationml.presentation"
            }
            Format::Pdf => "application/pdf",
            Format::Jpeg => "image/jpeg",
            Format::Png => "image/png",
            Format::Mp3 => "audio/mpeg",
            Format::Zip => "application/zip",
        }
    }

    /// True for formats packaged as Open Packaging Conventions ZIP archives.
    pub fn is_opc(self) -> bool {
        matches!(self, Format::Docx | Format::Xlsx | Format::Pptx)
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Format::Text => "text",
            Format::Docx => "DOCX",
            Format::Xlsx => "XLSX",
            Format::Pptx => "PPTX",
            Format::Pdf => "PDF",
            Format::Jpeg => "JPEG",
            Format::Png => "PNG",
            Format::Mp3 => "MP3",
            Format::Zip => "ZIP",
        };
        f.write_str(name)
    }
}

impl FromStr for Format {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Format::from_extension(s).ok_or_else(|| Error::UnsupportedFormat(s.to_string()))
    }
}

impl TryFrom<String> for Format {
    type Error = Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_extension_case_insensitive() {
        assert_eq!(Format::from_extension("DOCX"), Some(Format::Docx));
        assert_eq!(Format::from_extension(".Pdf"), Some(Format::Pdf));
        assert_eq!(Format::from_extension("txt"), Some(Format::Text));
    }

    #[test]
    fn test_jpeg_aliases() {
        assert_eq!(Format::from_extension(".jpg"), Some(Format::Jpeg));
        assert_eq!(Format::from_extension(".JPEG"), Some(Format::Jpeg));
    }

    #[test]
    fn test_unknown_extension() {
        assert_eq!(Format::from_extension(".xslx"), None);
        assert_eq!(Format::from_extension(""), None);
        assert!(matches!(
            "exe".parse::<Format>(),
            Err(Error::UnsupportedFormat(ext)) if ext == "exe"
        ));
    }

    #[test]
    fn test_extension_round_trips() {
        for format in Format::ALL {
            assert_eq!(Format::from_extension(format.extension()), Some(format));
        }
    }

    #[test]
    fn test_from_path() {
        assert_eq!(
            Format::from_path(Path::new("Desktop/lorem ipsum.PNG")),
            Some(Format::Png)
        );
        assert_eq!(Format::from_path(Path::new("README")), None);
    }
}
