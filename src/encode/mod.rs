//! Format encoders.
//!
//! Provides the `Encoder` trait and one implementation per [`Format`].
//!
//! # Architecture
//!
//! Every encoder follows the same builder pattern:
//! - `new()` creates an encoder with default configuration
//! - `with_config()` allows customization (dimensions, row counts, ...)
//! - `encode()` pulls strings from a [`TextSource`] and writes one complete
//!   file to any `Write + Seek` destination
//!
//! Encoders are independent of each other. Randomised parameters live in the
//! config structs; the only other input is the text source.
//!
//! # Example
//!
//! ```
//! use std::io::Cursor;
//! use populator::LoremIpsum;
//! use populator::encode::{Encoder, PngConfig, PngEncoder};
//!
//! let mut text = LoremIpsum::seeded(42);
//! let mut out = Cursor::new(Vec::new());
//! PngEncoder::new()
//!     .with_config(PngConfig { width: 200, height: 150, ..Default::default() })
//!     .encode(&mut text, &mut out)?;
//! assert!(out.get_ref().starts_with(b"\x89PNG\r\n\x1a\n"));
//! # Ok::<(), populator::Error>(())
//! ```
//!
//! [`Format`]: crate::Format

use std::io::{Seek, Write};

use crate::error::Result;
use crate::lorem::TextSource;

mod archive;
mod jpeg;
mod mp3;
pub mod opc;
mod pdf;
mod png;
mod text;

pub use archive::{ZipConfig, ZipEncoder};
pub use jpeg::{JpegConfig, JpegEncoder};
pub use mp3::{Mp3Config, Mp3Encoder, decode_synchsafe, encode_synchsafe};
pub use opc::{DocxConfig, DocxEncoder, PptxConfig, PptxEncoder, XlsxConfig, XlsxEncoder};
pub use pdf::{PdfConfig, PdfEncoder, escape_pdf_string, wrap_lines};
pub use png::{PngConfig, PngEncoder};
pub use text::{TextConfig, TextEncoder};

/// Trait for encoding one synthetic file.
///
/// The writer can be:
/// - `std::fs::File` (or a `BufWriter` around one) for disk output
/// - `std::io::Cursor<Vec<u8>>` for in-memory output
/// - Any other type implementing `Write + Seek`
pub trait Encoder {
    fn encode<W: Write + Seek>(&self, text: &mut dyn TextSource, writer: &mut W) -> Result<()>;
}
