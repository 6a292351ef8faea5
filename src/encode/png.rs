//! PNG encoder.
//!
//! Emits the signature followed by exactly three chunks: IHDR, one IDAT
//! holding the zlib stream of every scanline, and an empty IEND. The image is
//! a single RGB colour tiled across the whole raster.

use std::io::{Seek, Write};

use flate2::Compression;
use flate2::Crc;
use flate2::write::ZlibEncoder;

use crate::error::Result;
use crate::lorem::TextSource;

use super::Encoder;

pub(crate) const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1A, b'\n'];

const BIT_DEPTH: u8 = 8;
const COLOR_TYPE_RGB: u8 = 2;
const FILTER_NONE: u8 = 0;

/// Configuration for PNG output.
#[derive(Debug, Clone)]
pub struct PngConfig {
    pub width: u32,
    pub height: u32,
    /// RGB triplet repeated across every pixel.
    pub color: [u8; 3],
    /// Zlib compression level (0-9, default 9).
    pub compression_level: u32,
}

impl Default for PngConfig {
    fn default() -> Self {
        Self {
            width: 200,
            height: 150,
            color: [0x80, 0x80, 0x80],
            compression_level: 9,
        }
    }
}

/// Truecolor 8-bit PNG encoder.
pub struct PngEncoder {
    config: PngConfig,
}

impl PngEncoder {
    pub fn new() -> Self {
        Self {
            config: PngConfig::default(),
        }
    }

    pub fn with_config(mut self, config: PngConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the complete PNG byte stream in memory.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let PngConfig {
            width,
            height,
            color,
            compression_level,
        } = self.config;

        let mut ihdr = Vec::with_capacity(13);
        ihdr.extend_from_slice(&width.to_be_bytes());
        ihdr.extend_from_slice(&height.to_be_bytes());
        // Compression method, filter method, interlace method
        ihdr.extend_from_slice(&[BIT_DEPTH, COLOR_TYPE_RGB, 0, 0, 0]);

        let mut scanline = Vec::with_capacity(1 + 3 * width as usize);
        scanline.push(FILTER_NONE);
        for _ in 0..width {
            scanline.extend_from_slice(&color);
        }

        let mut zlib = ZlibEncoder::new(Vec::new(), Compression::new(compression_level.min(9)));
        for _ in 0..height {
            zlib.write_all(&scanline)?;
        }
        let idat = zlib.finish()?;

        let mut png = Vec::with_capacity(PNG_SIGNATURE.len() + idat.len() + 3 * 12 + 13);
        png.extend_from_slice(&PNG_SIGNATURE);
        write_chunk(&mut png, b"IHDR", &ihdr);
        write_chunk(&mut png, b"IDAT", &idat);
        write_chunk(&mut png, b"IEND", &[]);
        Ok(png)
    }
}

impl Default for PngEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Encoder for PngEncoder {
    fn encode<W: Write + Seek>(&self, _text: &mut dyn TextSource, writer: &mut W) -> Result<()> {
        writer.write_all(&self.to_bytes()?)?;
        Ok(())
    }
}

/// Append one chunk: length of `data`, type, data, CRC32 over type and data.
fn write_chunk(out: &mut Vec<u8>, kind: &[u8; 4], data: &[u8]) {
    out.extend_from_slice(&(data.len() as u32).to_be_bytes());
    out.extend_from_slice(kind);
    out.extend_from_slice(data);
    out.extend_from_slice(&chunk_crc(kind, data).to_be_bytes());
}

pub(crate) fn chunk_crc(kind: &[u8], data: &[u8]) -> u32 {
    let mut crc = Crc::new();
    crc.update(kind);
    crc.update(data);
    crc.sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_crc_of_empty_iend() {
        // Every PNG ends with the same IEND CRC.
        assert_eq!(chunk_crc(b"IEND", &[]), 0xAE42_6082);
    }

    #[test]
    fn test_ihdr_layout() {
        let png = PngEncoder::new()
            .with_config(PngConfig {
                width: 200,
                height: 150,
                ..Default::default()
            })
            .to_bytes()
            .unwrap();

        assert_eq!(&png[..8], &PNG_SIGNATURE);
        assert_eq!(&png[8..12], &13u32.to_be_bytes());
        assert_eq!(&png[12..16], b"IHDR");
        assert_eq!(&png[16..24], &[0, 0, 0, 0xC8, 0, 0, 0, 0x96]);
        assert_eq!(png[24], 8);
        assert_eq!(png[25], 2);
        assert_eq!(&png[26..29], &[0, 0, 0]);
    }

    #[test]
    fn test_ends_with_empty_iend() {
        let png = PngEncoder::new().to_bytes().unwrap();
        let tail = &png[png.len() - 12..];
        assert_eq!(&tail[..4], &[0, 0, 0, 0]);
        assert_eq!(&tail[4..8], b"IEND");
        assert_eq!(&tail[8..], &[0xAE, 0x42, 0x60, 0x82]);
    }
}
