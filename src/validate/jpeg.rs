use crate::error::{Error, Result};
use crate::format::Format;

use super::be_u16;

/// Frame header fields and marker order of a validated JPEG.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JpegInfo {
    pub width: u16,
    pub height: u16,
    pub components: u8,
    /// Marker codes (the byte after 0xFF) in file order, SOI through EOI.
    pub markers: Vec<u8>,
}

/// Walk the marker segments to EOI.
///
/// Entropy-coded data after SOS is skipped over stuffed `FF 00` pairs and
/// restart markers. Anything after EOI is an error.
pub fn jpeg(bytes: &[u8]) -> Result<JpegInfo> {
    let bad = |reason: String| Error::malformed(Format::Jpeg, reason);

    if !bytes.starts_with(&[0xFF, 0xD8]) {
        return Err(bad("missing SOI".into()));
    }

    let mut markers = vec![0xD8];
    let mut frame: Option<(u16, u16, u8)> = None;
    let mut pos = 2;

    loop {
        if bytes.get(pos) != Some(&0xFF) {
            return Err(bad(format!("expected marker at {pos}")));
        }
        // Fill bytes
        while bytes.get(pos + 1) == Some(&0xFF) {
            pos += 1;
        }
        let marker = *bytes
            .get(pos + 1)
            .ok_or_else(|| bad("truncated before EOI".into()))?;
        markers.push(marker);
        pos += 2;

        match marker {
            0xD9 => {
                if pos != bytes.len() {
                    return Err(bad(format!("{} bytes after EOI", bytes.len() - pos)));
                }
                break;
            }
            0xD8 | 0x01 | 0xD0..=0xD7 => {
                return Err(bad(format!("unexpected standalone marker FF{marker:02X}")));
            }
            _ => {}
        }

        let len = be_u16(bytes, pos)
            .ok_or_else(|| bad(format!("truncated FF{marker:02X} segment")))?
            as usize;
        if len < 2 || pos + len > bytes.len() {
            return Err(bad(format!("bad length {len} for FF{marker:02X}")));
        }
        let payload = &bytes[pos + 2..pos + len];

        match marker {
            0xC0..=0xC3 => {
                if payload.len() < 6 {
                    return Err(bad("short SOF segment".into()));
                }
                let height = u16::from_be_bytes([payload[1], payload[2]]);
                let width = u16::from_be_bytes([payload[3], payload[4]]);
                frame = Some((width, height, payload[5]));
            }
            0xDA => {
                if frame.is_none() {
                    return Err(bad("SOS before SOF".into()));
                }
                pos = skip_entropy_data(bytes, pos + len);
                continue;
            }
            _ => {}
        }
        pos += len;
    }

    let (width, height, components) = frame.ok_or_else(|| bad("no SOF segment".into()))?;
    if width == 0 || height == 0 {
        return Err(bad("zero image dimension".into()));
    }
    Ok(JpegInfo {
        width,
        height,
        components,
        markers,
    })
}

/// Position of the first real marker after entropy-coded data at `pos`.
fn skip_entropy_data(bytes: &[u8], mut pos: usize) -> usize {
    while pos + 1 < bytes.len() {
        if bytes[pos] == 0xFF {
            match bytes[pos + 1] {
                0x00 | 0xD0..=0xD7 => pos += 2,
                _ => return pos,
            }
        } else {
            pos += 1;
        }
    }
    bytes.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::{JpegConfig, JpegEncoder};

    fn sample(width: u16, height: u16) -> Vec<u8> {
        JpegEncoder::new()
            .with_config(JpegConfig {
                width,
                height,
                luminance: 200,
            })
            .to_bytes()
            .unwrap()
    }

    #[test]
    fn test_accepts_encoder_output() {
        let info = jpeg(&sample(321, 123)).unwrap();
        assert_eq!((info.width, info.height, info.components), (321, 123, 1));
        assert_eq!(
            info.markers,
            vec![0xD8, 0xE0, 0xDB, 0xC0, 0xC4, 0xC4, 0xDA, 0xD9]
        );
    }

    #[test]
    fn test_rejects_trailing_bytes() {
        let mut bytes = sample(100, 100);
        bytes.push(0);
        assert!(jpeg(&bytes).is_err());
    }

    #[test]
    fn test_rejects_missing_eoi() {
        let bytes = sample(100, 100);
        assert!(jpeg(&bytes[..bytes.len() - 2]).is_err());
    }
}
