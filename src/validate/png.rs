use std::io::Read;

use flate2::Crc;
use flate2::read::ZlibDecoder;

use crate::error::{Error, Result};
use crate::format::Format;

use super::be_u32;

const SIGNATURE: &[u8; 8] = b"\x89PNG\r\n\x1a\n";

/// Header fields of a validated PNG.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PngInfo {
    pub width: u32,
    pub height: u32,
    pub bit_depth: u8,
    pub color_type: u8,
    /// Chunk types in file order.
    pub chunks: Vec<[u8; 4]>,
}

/// Walk every chunk, check CRCs, and inflate the image data.
///
/// Only 8-bit truecolor images are fully decoded; every scanline must use
/// filter type 0.
pub fn png(bytes: &[u8]) -> Result<PngInfo> {
    let bad = |reason: String| Error::malformed(Format::Png, reason);

    if !bytes.starts_with(SIGNATURE) {
        return Err(bad("missing signature".into()));
    }

    let mut pos = SIGNATURE.len();
    let mut chunks = Vec::new();
    let mut ihdr: Option<&[u8]> = None;
    let mut idat = Vec::new();

    while pos < bytes.len() {
        let len = be_u32(bytes, pos).ok_or_else(|| bad(format!("truncated chunk at {pos}")))?
            as usize;
        let kind_at = pos + 4;
        let data_at = kind_at + 4;
        let crc_at = data_at + len;
        let stored_crc =
            be_u32(bytes, crc_at).ok_or_else(|| bad(format!("truncated chunk at {pos}")))?;

        let kind = &bytes[kind_at..data_at];
        let data = &bytes[data_at..crc_at];
        let mut crc = Crc::new();
        crc.update(kind);
        crc.update(data);
        if crc.sum() != stored_crc {
            return Err(bad(format!(
                "CRC mismatch in {} chunk",
                String::from_utf8_lossy(kind)
            )));
        }

        match kind {
            b"IHDR" => ihdr = Some(data),
            b"IDAT" => idat.extend_from_slice(data),
            b"IEND" if !data.is_empty() => return Err(bad("IEND carries data".into())),
            _ => {}
        }
        chunks.push([kind[0], kind[1], kind[2], kind[3]]);
        pos = crc_at + 4;
    }

    if chunks.first() != Some(b"IHDR") {
        return Err(bad("first chunk is not IHDR".into()));
    }
    if chunks.last() != Some(b"IEND") {
        return Err(bad("last chunk is not IEND".into()));
    }

    let ihdr = ihdr.filter(|h| h.len() == 13).ok_or_else(|| bad("IHDR must be 13 bytes".into()))?;
    let width = u32::from_be_bytes([ihdr[0], ihdr[1], ihdr[2], ihdr[3]]);
    let height = u32::from_be_bytes([ihdr[4], ihdr[5], ihdr[6], ihdr[7]]);
    let (bit_depth, color_type) = (ihdr[8], ihdr[9]);
    if width == 0 || height == 0 {
        return Err(bad("zero image dimension".into()));
    }

    if bit_depth == 8 && color_type == 2 {
        let mut raw = Vec::new();
        ZlibDecoder::new(idat.as_slice())
            .read_to_end(&mut raw)
            .map_err(|e| bad(format!("IDAT does not inflate: {e}")))?;
        let stride = 1 + 3 * width as usize;
        if raw.len() != stride * height as usize {
            return Err(bad(format!(
                "image data is {} bytes, expected {}",
                raw.len(),
                stride * height as usize
            )));
        }
        if raw.chunks(stride).any(|row| row[0] != 0) {
            return Err(bad("scanline uses a filter other than None".into()));
        }
    }

    Ok(PngInfo {
        width,
        height,
        bit_depth,
        color_type,
        chunks,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::{PngConfig, PngEncoder};

    fn sample() -> Vec<u8> {
        PngEncoder::new()
            .with_config(PngConfig {
                width: 120,
                height: 101,
                color: [1, 2, 3],
                ..Default::default()
            })
            .to_bytes()
            .unwrap()
    }

    #[test]
    fn test_accepts_encoder_output() {
        let info = png(&sample()).unwrap();
        assert_eq!((info.width, info.height), (120, 101));
        assert_eq!(info.chunks, vec![*b"IHDR", *b"IDAT", *b"IEND"]);
    }

    #[test]
    fn test_detects_corrupted_crc() {
        let mut bytes = sample();
        bytes[20] ^= 0x01; // inside IHDR width
        assert!(matches!(png(&bytes), Err(Error::Malformed { .. })));
    }

    #[test]
    fn test_detects_truncation() {
        let bytes = sample();
        assert!(png(&bytes[..bytes.len() - 3]).is_err());
    }
}
