//! PDF encoder.
//!
//! Writes a one-page PDF 1.4 file directly: five indirect objects
//! (catalog, page tree, page, content stream, Helvetica font), a
//! cross-reference table, and a trailer. Object offsets are taken from the
//! output buffer length at the moment each object header is written.

use std::io::{Seek, Write};

use crate::error::{Error, Result};
use crate::format::Format;
use crate::lorem::TextSource;

use super::Encoder;

const CATALOG: u32 = 1;
const PAGES: u32 = 2;
const PAGE: u32 = 3;
const CONTENTS: u32 = 4;
const FONT: u32 = 5;
const OBJECT_COUNT: u32 = 5;

/// Configuration for PDF output.
#[derive(Debug, Clone)]
pub struct PdfConfig {
    /// Soft limit for the greedy word wrap, in characters.
    pub wrap_width: usize,
    /// Body lines kept after wrapping; the rest is dropped.
    pub max_lines: usize,
    /// Number of body paragraphs requested from the text source.
    pub paragraphs: Option<usize>,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            wrap_width: 70,
            max_lines: 30,
            paragraphs: None,
        }
    }
}

/// Single-page PDF encoder.
pub struct PdfEncoder {
    config: PdfConfig,
}

impl PdfEncoder {
    pub fn new() -> Self {
        Self {
            config: PdfConfig::default(),
        }
    }

    pub fn with_config(mut self, config: PdfConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the complete PDF for a title and body text.
    pub fn to_bytes(&self, title: &str, body: &str) -> Result<Vec<u8>> {
        let content = self.content_stream(title, body)?;

        let mut pdf = PdfWriter::new();
        pdf.object(CATALOG, format!("<< /Type /Catalog /Pages {PAGES} 0 R >>").as_bytes())?;
        pdf.object(
            PAGES,
            format!("<< /Type /Pages /Kids [{PAGE} 0 R] /Count 1 >>").as_bytes(),
        )?;
        pdf.object(
            PAGE,
            format!(
                "<< /Type /Page /Parent {PAGES} 0 R /MediaBox [0 0 612 792] \
                 /Contents {CONTENTS} 0 R /Resources << /Font << /F1 {FONT} 0 R >> >> >>"
            )
            .as_bytes(),
        )?;

        let mut stream = format!("<< /Length {} >>\nstream\n", content.len()).into_bytes();
        stream.extend_from_slice(&content);
        stream.extend_from_slice(b"\nendstream");
        pdf.object(CONTENTS, &stream)?;

        pdf.object(
            FONT,
            b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>",
        )?;
        pdf.finish(CATALOG)
    }

    /// Text drawing operators, Latin-1 encoded.
    fn content_stream(&self, title: &str, body: &str) -> Result<Vec<u8>> {
        let mut ops = String::new();
        ops.push_str("BT\n/F1 24 Tf\n50 750 Td\n");
        ops.push_str(&format!("({}) Tj\nET\n", escape_pdf_string(title)));

        ops.push_str("BT\n/F1 12 Tf\n14 TL\n50 715 Td\n");
        for line in wrap_lines(body, self.config.wrap_width)
            .iter()
            .take(self.config.max_lines)
        {
            ops.push_str(&format!("({}) Tj\nT*\n", escape_pdf_string(line)));
        }
        ops.push_str("ET");

        latin1(&ops)
    }
}

impl Default for PdfEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Encoder for PdfEncoder {
    fn encode<W: Write + Seek>(&self, text: &mut dyn TextSource, writer: &mut W) -> Result<()> {
        let title = text.title();
        let body = text.body(self.config.paragraphs);
        writer.write_all(&self.to_bytes(&title, &body)?)?;
        Ok(())
    }
}

/// Byte buffer that records where each object header lands.
struct PdfWriter {
    buf: Vec<u8>,
    offsets: Vec<usize>,
}

impl PdfWriter {
    fn new() -> Self {
        let mut buf = Vec::with_capacity(4096);
        // Binary comment marks the file as containing 8-bit data
        buf.extend_from_slice(b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n");
        Self {
            buf,
            offsets: Vec::with_capacity(OBJECT_COUNT as usize),
        }
    }

    /// Objects must be written in number order starting from 1.
    fn object(&mut self, number: u32, body: &[u8]) -> Result<()> {
        let expected = self.offsets.len() as u32 + 1;
        if number != expected {
            return Err(Error::Invariant(format!(
                "PDF object {number} written out of order, expected {expected}"
            )));
        }
        self.offsets.push(self.buf.len());
        self.buf
            .extend_from_slice(format!("{number} 0 obj\n").as_bytes());
        self.buf.extend_from_slice(body);
        self.buf.extend_from_slice(b"\nendobj\n");
        Ok(())
    }

    fn finish(mut self, root: u32) -> Result<Vec<u8>> {
        if root == 0 || root as usize > self.offsets.len() {
            return Err(Error::Invariant(format!("PDF root {root} was never written")));
        }
        let size = self.offsets.len() + 1;
        let xref_offset = self.buf.len();

        self.buf
            .extend_from_slice(format!("xref\n0 {size}\n").as_bytes());
        // Each entry is exactly 20 bytes including its two-byte line ending
        self.buf.extend_from_slice(b"0000000000 65535 f \n");
        for offset in &self.offsets {
            self.buf
                .extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes());
        }
        self.buf.extend_from_slice(
            format!("trailer\n<< /Size {size} /Root {root} 0 R >>\nstartxref\n{xref_offset}\n%%EOF\n")
                .as_bytes(),
        );
        Ok(self.buf)
    }
}

/// Greedy word wrap.
///
/// Words are appended to the current line; when that would push it past
/// `width` characters the line is flushed and the word starts the next one.
/// A single word longer than `width` gets a line of its own.
pub fn wrap_lines(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();
    let mut line_chars = 0;

    for word in text.split_whitespace() {
        let word_chars = word.chars().count();
        if line.is_empty() {
            line.push_str(word);
            line_chars = word_chars;
        } else if line_chars + 1 + word_chars > width {
            lines.push(std::mem::take(&mut line));
            line.push_str(word);
            line_chars = word_chars;
        } else {
            line.push(' ');
            line.push_str(word);
            line_chars += 1 + word_chars;
        }
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

/// Escape the string-literal metacharacters `\`, `(` and `)`.
pub fn escape_pdf_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '\\' | '(' | ')') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Encode as ISO-8859-1, one byte per character.
///
/// C1 controls (U+0080..U+009F) are rejected too: WinAnsiEncoding assigns
/// other glyphs (`€`, `‚`, ...) to those bytes.
fn latin1(s: &str) -> Result<Vec<u8>> {
    s.chars()
        .map(|ch| match u8::try_from(u32::from(ch)) {
            Ok(byte) if !(0x80..=0x9F).contains(&byte) => Ok(byte),
            _ => Err(Error::EncodingRange {
                format: Format::Pdf,
                ch,
            }),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_exactly_seventy_stays_on_one_line() {
        let text = format!("{} abcdefghi", ["abcdef"; 8].join(" "));
        assert_eq!(text.len(), 65);
        let text = format!("{text} abcd");
        assert_eq!(text.len(), 70);
        assert_eq!(wrap_lines(&text, 70), vec![text.clone()]);
    }

    #[test]
    fn test_wrap_seventy_one_breaks() {
        let text = format!("{} abcdefghi abcde", ["abcdef"; 8].join(" "));
        assert_eq!(text.len(), 71);
        let lines = wrap_lines(&text, 70);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1], "abcde");
    }

    #[test]
    fn test_wrap_long_word() {
        let word = "x".repeat(80);
        assert_eq!(wrap_lines(&format!("a {word} b"), 70), vec!["a", word.as_str(), "b"]);
    }

    #[test]
    fn test_wrap_empty() {
        assert!(wrap_lines("   ", 70).is_empty());
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape_pdf_string(r"a\b(c)"), r"a\\b\(c\)");
    }

    #[test]
    fn test_c1_controls_rejected() {
        for ch in ['\u{80}', '\u{9F}'] {
            let err = latin1(&format!("a{ch}b")).unwrap_err();
            assert!(matches!(err, Error::EncodingRange { ch: c, .. } if c == ch));
        }
        assert_eq!(latin1("\u{7F}\u{A0}").unwrap(), b"\x7F\xA0");
        let err = PdfEncoder::new().to_bytes("Title", "price \u{80}5").unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::EncodingRange);
    }

    #[test]
    fn test_latin1_range() {
        assert_eq!(latin1("café").unwrap(), b"caf\xE9");
        assert!(matches!(
            latin1("日本"),
            Err(Error::EncodingRange { ch: '日', .. })
        ));
    }

    #[test]
    fn test_truncates_to_max_lines() {
        let body = "lorem ".repeat(2000);
        let pdf = PdfEncoder::new().to_bytes("Title", &body).unwrap();
        let text = String::from_utf8_lossy(&pdf);
        assert_eq!(text.matches(") Tj\nT*").count(), 30);
    }

    #[test]
    fn test_xref_offsets() {
        let pdf = PdfEncoder::new().to_bytes("Lorem (ipsum)", "dolor sit").unwrap();
        let xref_at = memchr::memmem::find(&pdf, b"xref\n").unwrap();
        let tail = format!("startxref\n{xref_at}\n%%EOF\n");
        assert!(pdf.ends_with(tail.as_bytes()));
        for n in 1..=5 {
            let entry_start = xref_at + "xref\n0 6\n".len() + 20 * n;
            let digits = std::str::from_utf8(&pdf[entry_start..entry_start + 10]).unwrap();
            let offset: usize = digits.parse().unwrap();
            assert!(pdf[offset..].starts_with(format!("{n} 0 obj").as_bytes()));
        }
    }

    #[test]
    fn test_out_of_order_object_is_invariant_error() {
        let mut pdf = PdfWriter::new();
        assert!(matches!(pdf.object(2, b"<< >>"), Err(Error::Invariant(_))));
    }
}
