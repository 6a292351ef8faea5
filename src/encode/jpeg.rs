//! Baseline JPEG encoder.
//!
//! Produces a single-component (greyscale) baseline stream: SOI, APP0/JFIF,
//! one DQT, SOF0, the standard luminance DC and AC Huffman tables, one SOS
//! and EOI. Every 8x8 block carries the same quantized DC value and no AC
//! energy, so the picture is one flat shade and the scan is only a few bits
//! per block.

use std::io::{Seek, Write};

use crate::error::{Error, Result};
use crate::lorem::TextSource;

use super::Encoder;

const SOI: u8 = 0xD8;
const APP0: u8 = 0xE0;
const DQT: u8 = 0xDB;
const SOF0: u8 = 0xC0;
const DHT: u8 = 0xC4;
const SOS: u8 = 0xDA;
const EOI: u8 = 0xD9;

/// Luminance quantization table from ITU-T T.81 Annex K.1, in zig-zag order.
const LUMA_QUANT_ZIGZAG: [u8; 64] = [
    16, 11, 12, 14, 12, 10, 16, 14, 13, 14, 18, 17, 16, 19, 24, 40, 26, 24, 22, 22, 24, 49, 35,
    37, 29, 40, 58, 51, 61, 60, 57, 51, 56, 55, 64, 72, 92, 78, 64, 68, 87, 69, 55, 56, 80, 109,
    81, 87, 95, 98, 103, 104, 103, 62, 77, 113, 121, 112, 100, 120, 92, 101, 103, 99,
];

/// Standard luminance DC table (Annex K.3.1): code counts per length, then symbols.
const DC_LUMA_BITS: [u8; 16] = [0, 1, 5, 1, 1, 1, 1, 1, 1, 0, 0, 0, 0, 0, 0, 0];
const DC_LUMA_VALUES: [u8; 12] = [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11];

/// Standard luminance AC table (Annex K.3.2).
const AC_LUMA_BITS: [u8; 16] = [0, 2, 1, 3, 3, 2, 4, 3, 5, 5, 4, 4, 0, 0, 1, 0x7D];
const AC_LUMA_VALUES: [u8; 162] = [
    0x01, 0x02, 0x03, 0x00, 0x04, 0x11, 0x05, 0x12, 0x21, 0x31, 0x41, 0x06, 0x13, 0x51, 0x61,
    0x07, 0x22, 0x71, 0x14, 0x32, 0x81, 0x91, 0xA1, 0x08, 0x23, 0x42, 0xB1, 0xC1, 0x15, 0x52,
    0xD1, 0xF0, 0x24, 0x33, 0x62, 0x72, 0x82, 0x09, 0x0A, 0x16, 0x17, 0x18, 0x19, 0x1A, 0x25,
    0x26, 0x27, 0x28, 0x29, 0x2A, 0x34, 0x35, 0x36, 0x37, 0x38, 0x39, 0x3A, 0x43, 0x44, 0x45,
    0x46, 0x47, 0x48, 0x49, 0x4A, 0x53, 0x54, 0x55, 0x56, 0x57, 0x58, 0x59, 0x5A, 0x63, 0x64,
    0x65, 0x66, 0x67, 0x68, 0x69, 0x6A, 0x73, 0x74, 0x75, 0x76, 0x77, 0x78, 0x79, 0x7A, 0x83,
    0x84, 0x85, 0x86, 0x87, 0x88, 0x89, 0x8A, 0x92, 0x93, 0x94, 0x95, 0x96, 0x97, 0x98, 0x99,
    0x9A, 0xA2, 0xA3, 0xA4, 0xA5, 0xA6, 0xA7, 0xA8, 0xA9, 0xAA, 0xB2, 0xB3, 0xB4, 0xB5, 0xB6,
    0xB7, 0xB8, 0xB9, 0xBA, 0xC2, 0xC3, 0xC4, 0xC5, 0xC6, 0xC7, 0xC8, 0xC9, 0xCA, 0xD2, 0xD3,
    0xD4, 0xD5, 0xD6, 0xD7, 0xD8, 0xD9, 0xDA, 0xE1, 0xE2, 0xE3, 0xE4, 0xE5, 0xE6, 0xE7, 0xE8,
    0xE9, 0xEA, 0xF1, 0xF2, 0xF3, 0xF4, 0xF5, 0xF6, 0xF7, 0xF8, 0xF9, 0xFA,
];

/// AC symbol for end-of-block.
const EOB: u8 = 0x00;

/// Configuration for JPEG output.
#[derive(Debug, Clone)]
pub struct JpegConfig {
    pub width: u16,
    pub height: u16,
    /// Grey level shared by every block.
    pub luminance: u8,
}

impl Default for JpegConfig {
    fn default() -> Self {
        Self {
            width: 200,
            height: 150,
            luminance: 128,
        }
    }
}

/// Baseline greyscale JPEG encoder.
pub struct JpegEncoder {
    config: JpegConfig,
}

impl JpegEncoder {
    pub fn new() -> Self {
        Self {
            config: JpegConfig::default(),
        }
    }

    pub fn with_config(mut self, config: JpegConfig) -> Self {
        self.config = config;
        self
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let JpegConfig {
            width,
            height,
            luminance,
        } = self.config;
        if width == 0 || height == 0 {
            return Err(Error::Invariant(format!(
                "JPEG dimensions must be non-zero, got {width}x{height}"
            )));
        }

        let mut jpeg = Vec::with_capacity(1024);
        jpeg.extend_from_slice(&[0xFF, SOI]);

        // JFIF 1.1, no density units, 1:1 aspect, no thumbnail
        write_segment(
            &mut jpeg,
            APP0,
            &[b'J', b'F', b'I', b'F', 0, 1, 1, 0, 0, 1, 0, 1, 0, 0],
        );

        let mut dqt = Vec::with_capacity(65);
        dqt.push(0x00); // 8-bit precision, table 0
        dqt.extend_from_slice(&LUMA_QUANT_ZIGZAG);
        write_segment(&mut jpeg, DQT, &dqt);

        let mut sof = Vec::with_capacity(9);
        sof.push(8); // sample precision
        sof.extend_from_slice(&height.to_be_bytes());
        sof.extend_from_slice(&width.to_be_bytes());
        sof.extend_from_slice(&[1, 1, 0x11, 0]); // one component, id 1, 1x1 sampling, table 0
        write_segment(&mut jpeg, SOF0, &sof);

        write_segment(&mut jpeg, DHT, &huffman_segment(0x00, &DC_LUMA_BITS, &DC_LUMA_VALUES));
        write_segment(&mut jpeg, DHT, &huffman_segment(0x10, &AC_LUMA_BITS, &AC_LUMA_VALUES));

        // One component, DC/AC tables 0, full spectral range, no approximation
        write_segment(&mut jpeg, SOS, &[1, 1, 0x00, 0, 63, 0]);

        let blocks = usize::from(width.div_ceil(8)) * usize::from(height.div_ceil(8));
        jpeg.extend_from_slice(&scan_data(blocks, luminance)?);

        jpeg.extend_from_slice(&[0xFF, EOI]);
        Ok(jpeg)
    }
}

impl Default for JpegEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Encoder for JpegEncoder {
    fn encode<W: Write + Seek>(&self, _text: &mut dyn TextSource, writer: &mut W) -> Result<()> {
        writer.write_all(&self.to_bytes()?)?;
        Ok(())
    }
}

/// Write a marker segment. The length field counts itself but not the marker.
fn write_segment(out: &mut Vec<u8>, marker: u8, payload: &[u8]) {
    out.extend_from_slice(&[0xFF, marker]);
    out.extend_from_slice(&((payload.len() + 2) as u16).to_be_bytes());
    out.extend_from_slice(payload);
}

fn huffman_segment(class_and_id: u8, bits: &[u8; 16], values: &[u8]) -> Vec<u8> {
    let mut seg = Vec::with_capacity(17 + values.len());
    seg.push(class_and_id);
    seg.extend_from_slice(bits);
    seg.extend_from_slice(values);
    seg
}

/// Canonical Huffman code for `symbol`, as (code, length in bits).
fn huffman_code(bits: &[u8; 16], values: &[u8], symbol: u8) -> Option<(u16, u8)> {
    let mut code: u16 = 0;
    let mut k = 0;
    for (i, &count) in bits.iter().enumerate() {
        for _ in 0..count {
            if values[k] == symbol {
                return Some((code, i as u8 + 1));
            }
            code += 1;
            k += 1;
        }
        code <<= 1;
    }
    None
}

/// Magnitude category of a DC difference and its extra bits.
fn dc_category(diff: i16) -> (u8, u16) {
    if diff == 0 {
        return (0, 0);
    }
    let magnitude = diff.unsigned_abs();
    let category = (16 - magnitude.leading_zeros()) as u8;
    let extra = if diff < 0 {
        (diff - 1) as u16 & ((1 << category) - 1)
    } else {
        diff as u16
    };
    (category, extra)
}

/// Entropy-coded segment for `blocks` identical flat blocks.
///
/// The first block carries the DC difference from zero; the rest repeat it
/// with a zero difference. Each block ends with EOB.
fn scan_data(blocks: usize, luminance: u8) -> Result<Vec<u8>> {
    let missing = |what: &str| Error::Invariant(format!("standard JPEG table lacks {what}"));

    // DC of a flat block is 8 * (sample - 128), quantized by table entry 0.
    let level = (i32::from(luminance) - 128) * 8;
    let q = i32::from(LUMA_QUANT_ZIGZAG[0]);
    let dc = ((level as f64) / (q as f64)).round() as i16;

    let (eob_code, eob_len) =
        huffman_code(&AC_LUMA_BITS, &AC_LUMA_VALUES, EOB).ok_or_else(|| missing("EOB"))?;
    let (zero_code, zero_len) =
        huffman_code(&DC_LUMA_BITS, &DC_LUMA_VALUES, 0).ok_or_else(|| missing("DC category 0"))?;

    let mut bits = BitWriter::default();
    for block in 0..blocks {
        if block == 0 && dc != 0 {
            let (category, extra) = dc_category(dc);
            let (code, len) = huffman_code(&DC_LUMA_BITS, &DC_LUMA_VALUES, category)
                .ok_or_else(|| missing("DC category"))?;
            bits.put(code, len);
            bits.put(extra, category);
        } else {
            bits.put(zero_code, zero_len);
        }
        bits.put(eob_code, eob_len);
    }
    Ok(bits.finish())
}

/// MSB-first bit packer with 0xFF byte stuffing.
#[derive(Default)]
struct BitWriter {
    out: Vec<u8>,
    acc: u32,
    len: u8,
}

impl BitWriter {
    fn put(&mut self, code: u16, len: u8) {
        for i in (0..len).rev() {
            self.acc = (self.acc << 1) | u32::from((code >> i) & 1);
            self.len += 1;
            if self.len == 8 {
                self.push_byte(self.acc as u8);
                self.acc = 0;
                self.len = 0;
            }
        }
    }

    fn push_byte(&mut self, byte: u8) {
        self.out.push(byte);
        if byte == 0xFF {
            self.out.push(0x00);
        }
    }

    /// Pad the final byte with 1-bits.
    fn finish(mut self) -> Vec<u8> {
        if self.len > 0 {
            let pad = 8 - self.len;
            let byte = ((self.acc << pad) | ((1 << pad) - 1)) as u8;
            self.push_byte(byte);
        }
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_codes() {
        assert_eq!(huffman_code(&DC_LUMA_BITS, &DC_LUMA_VALUES, 0), Some((0b00, 2)));
        assert_eq!(huffman_code(&DC_LUMA_BITS, &DC_LUMA_VALUES, 5), Some((0b110, 3)));
        assert_eq!(huffman_code(&DC_LUMA_BITS, &DC_LUMA_VALUES, 6), Some((0b1110, 4)));
        assert_eq!(huffman_code(&AC_LUMA_BITS, &AC_LUMA_VALUES, EOB), Some((0b1010, 4)));
    }

    #[test]
    fn test_dc_category() {
        assert_eq!(dc_category(0), (0, 0));
        assert_eq!(dc_category(1), (1, 1));
        assert_eq!(dc_category(-1), (1, 0));
        assert_eq!(dc_category(5), (3, 5));
        assert_eq!(dc_category(-5), (3, 2));
    }

    #[test]
    fn test_bit_writer_pads_with_ones() {
        let mut bits = BitWriter::default();
        bits.put(0b001010, 6);
        assert_eq!(bits.finish(), vec![0b0010_1011]);
    }

    #[test]
    fn test_bit_writer_stuffs_ff() {
        let mut bits = BitWriter::default();
        bits.put(0xFF, 8);
        assert_eq!(bits.finish(), vec![0xFF, 0x00]);
    }

    #[test]
    fn test_mid_grey_single_block() {
        // DC category 0 (00) then EOB (1010), padded: 0010_1011
        assert_eq!(scan_data(1, 128).unwrap(), vec![0x2B]);
    }

    #[test]
    fn test_marker_sequence() {
        let jpeg = JpegEncoder::new().to_bytes().unwrap();
        assert_eq!(&jpeg[..4], &[0xFF, SOI, 0xFF, APP0]);
        assert_eq!(&jpeg[jpeg.len() - 2..], &[0xFF, EOI]);
    }

    #[test]
    fn test_zero_dimension_rejected() {
        let err = JpegEncoder::new()
            .with_config(JpegConfig {
                width: 0,
                ..Default::default()
            })
            .to_bytes()
            .unwrap_err();
        assert!(matches!(err, Error::Invariant(_)));
    }
}
