//! Independent structural validators.
//!
//! Each validator re-parses a finished byte stream the way a reader for that
//! format would and reports the first structural problem it finds. Apart from
//! OPC part-name arithmetic they share no code with the encoders.

use crate::error::Result;
use crate::format::Format;

mod archive;
mod jpeg;
mod mp3;
mod pdf;
mod png;

pub use archive::{opc, zip};
pub use jpeg::{JpegInfo, jpeg};
pub use mp3::{Id3Info, mp3};
pub use pdf::{PdfInfo, pdf};
pub use png::{PngInfo, png};

/// Validate `bytes` as `format`.
pub fn check(format: Format, bytes: &[u8]) -> Result<()> {
    match format {
        Format::Text => text(bytes),
        Format::Docx | Format::Xlsx | Format::Pptx => opc(bytes).map(drop),
        Format::Pdf => pdf(bytes).map(drop),
        Format::Jpeg => jpeg(bytes).map(drop),
        Format::Png => png(bytes).map(drop),
        Format::Mp3 => mp3(bytes).map(drop),
        Format::Zip => zip(bytes).map(drop),
    }
}

fn text(bytes: &[u8]) -> Result<()> {
    std::str::from_utf8(bytes)
        .map(drop)
        .map_err(|e| crate::error::Error::malformed(Format::Text, e.to_string()))
}

/// Big-endian u16 at `at`, if in bounds.
fn be_u16(bytes: &[u8], at: usize) -> Option<u16> {
    bytes
        .get(at..at + 2)
        .map(|b| u16::from_be_bytes([b[0], b[1]]))
}

/// Big-endian u32 at `at`, if in bounds.
fn be_u32(bytes: &[u8], at: usize) -> Option<u32> {
    bytes
        .get(at..at + 4)
        .map(|b| u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
}
