//! Format dispatch.
//!
//! [`FileFactory`] picks the randomised parameters for one file (image
//! dimensions, row and entry counts), hands the matching encoder its text
//! source, and writes the result to a sink.

use std::fs::OpenOptions;
use std::io::{BufWriter, Seek, Write};
use std::path::Path;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::encode::{
    DocxEncoder, Encoder, JpegConfig, JpegEncoder, Mp3Encoder, PdfEncoder, PngConfig, PngEncoder,
    PptxEncoder, TextEncoder, XlsxConfig, XlsxEncoder, ZipConfig, ZipEncoder,
};
use crate::error::{Error, Result};
use crate::format::Format;
use crate::lorem::{LoremIpsum, TextSource};

/// Inclusive range for randomised image sides, in pixels.
pub const IMAGE_SIDE: (u32, u32) = (100, 400);

/// Inclusive range for ZIP entry counts.
pub const ZIP_ENTRIES: (usize, usize) = (2, 5);

/// Inclusive range for spreadsheet data rows.
pub const SHEET_ROWS: (usize, usize) = (5, 20);

/// Columns in every generated spreadsheet.
pub const SHEET_COLUMNS: usize = 5;

/// Creates synthetic files of any [`Format`].
pub struct FileFactory<T: TextSource = LoremIpsum, R: Rng = StdRng> {
    text: T,
    rng: R,
}

impl FileFactory {
    /// Factory with independent, deterministic text and parameter streams.
    pub fn seeded(seed: u64) -> Self {
        Self::new(
            LoremIpsum::seeded(seed),
            StdRng::seed_from_u64(seed.rotate_left(32) ^ 0x9E37_79B9_7F4A_7C15),
        )
    }

    /// Factory seeded from the operating system.
    pub fn from_entropy() -> Self {
        Self::new(
            LoremIpsum::new(StdRng::from_os_rng()),
            StdRng::from_os_rng(),
        )
    }
}

impl<T: TextSource, R: Rng> FileFactory<T, R> {
    pub fn new(text: T, rng: R) -> Self {
        Self { text, rng }
    }

    pub fn text(&mut self) -> &mut T {
        &mut self.text
    }

    pub fn rng(&mut self) -> &mut R {
        &mut self.rng
    }

    /// Encode one file of `format` into `writer`.
    pub fn encode<W: Write + Seek>(&mut self, format: Format, writer: &mut W) -> Result<()> {
        let text = &mut self.text;
        match format {
            Format::Text => TextEncoder::new().encode(text, writer),
            Format::Docx => DocxEncoder::new().encode(text, writer),
            Format::Xlsx => {
                let rows = self.rng.random_range(SHEET_ROWS.0..=SHEET_ROWS.1);
                XlsxEncoder::new()
                    .with_config(XlsxConfig {
                        rows,
                        columns: SHEET_COLUMNS,
                        ..Default::default()
                    })
                    .encode(text, writer)
            }
            Format::Pptx => PptxEncoder::new().encode(text, writer),
            Format::Pdf => PdfEncoder::new().encode(text, writer),
            Format::Jpeg => {
                let (width, height) = random_dimensions(&mut self.rng);
                let config = JpegConfig {
                    width: width as u16,
                    height: height as u16,
                    luminance: self.rng.random(),
                };
                log::debug!("JPEG {}x{} luminance {}", width, height, config.luminance);
                JpegEncoder::new().with_config(config).encode(text, writer)
            }
            Format::Png => {
                let (width, height) = random_dimensions(&mut self.rng);
                let config = PngConfig {
                    width,
                    height,
                    color: self.rng.random(),
                    ..Default::default()
                };
                log::debug!("PNG {}x{} color {:?}", width, height, config.color);
                PngEncoder::new().with_config(config).encode(text, writer)
            }
            Format::Mp3 => Mp3Encoder::new().encode(text, writer),
            Format::Zip => {
                let entries = self.rng.random_range(ZIP_ENTRIES.0..=ZIP_ENTRIES.1);
                ZipEncoder::new()
                    .with_config(ZipConfig {
                        entries,
                        ..Default::default()
                    })
                    .encode(text, writer)
            }
        }
    }

    /// Encode `format` into a fresh in-memory buffer.
    pub fn encode_to_vec(&mut self, format: Format) -> Result<Vec<u8>> {
        let mut cursor = std::io::Cursor::new(Vec::new());
        self.encode(format, &mut cursor)?;
        Ok(cursor.into_inner())
    }

    /// Create `path` holding a file of the format named by `extension`.
    ///
    /// Unknown extensions fail with [`Error::UnsupportedFormat`] before the
    /// file is created. An existing `path` is never opened; it fails with an
    /// [`Error::Io`] of kind `AlreadyExists`. On any later failure the
    /// partially written file is left for the caller to remove.
    pub fn create_file(&mut self, path: &Path, extension: &str) -> Result<Format> {
        let format = Format::from_extension(extension)
            .ok_or_else(|| Error::UnsupportedFormat(extension.to_string()))?;
        let file = OpenOptions::new().write(true).create_new(true).open(path)?;
        let mut writer = BufWriter::new(file);
        self.encode(format, &mut writer)?;
        writer.flush()?;
        Ok(format)
    }
}

fn random_dimensions<R: Rng>(rng: &mut R) -> (u32, u32) {
    (
        rng.random_range(IMAGE_SIDE.0..=IMAGE_SIDE.1),
        rng.random_range(IMAGE_SIDE.0..=IMAGE_SIDE.1),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_every_format_encodes() {
        let mut factory = FileFactory::seeded(11);
        for format in Format::ALL {
            let bytes = factory.encode_to_vec(format).unwrap();
            assert!(!bytes.is_empty(), "{format} produced no bytes");
        }
    }

    #[test]
    fn test_seeded_factories_agree() {
        let a = FileFactory::seeded(5).encode_to_vec(Format::Xlsx).unwrap();
        let b = FileFactory::seeded(5).encode_to_vec(Format::Xlsx).unwrap();
        assert_eq!(a.len(), b.len());
    }

    #[test]
    fn test_unsupported_extension_creates_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lorem.exe");
        let err = FileFactory::seeded(1)
            .create_file(&path, ".exe")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unsupported);
        assert!(!path.exists());
    }

    #[test]
    fn test_missing_directory_is_sink_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("lorem.pdf");
        let err = FileFactory::seeded(1).create_file(&path, "pdf").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Sink);
    }

    #[test]
    fn test_existing_file_is_left_alone() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "keep me").unwrap();

        let err = FileFactory::seeded(1).create_file(&path, "txt").unwrap_err();
        assert!(matches!(&err, Error::Io(e) if e.kind() == std::io::ErrorKind::AlreadyExists));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "keep me");
    }
}
