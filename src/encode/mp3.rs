//! MP3 encoder.
//!
//! An ID3v2.4.0 tag carrying a single `TIT2` title frame, followed by a run
//! of silent MPEG-1 Layer III frames (128 kbit/s, 44.1 kHz).

use std::io::{Seek, Write};

use crate::error::{Error, Result};
use crate::lorem::TextSource;

use super::Encoder;

const ID3_HEADER_LEN: usize = 10;
const ID3_FRAME_HEADER_LEN: usize = 10;
const TEXT_ENCODING_UTF8: u8 = 0x03;

/// Largest value a 4-byte synchsafe integer can hold (28 bits).
const SYNCHSAFE_MAX: u32 = 0x0FFF_FFFF;

/// MPEG-1 Layer III, no CRC, 128 kbit/s, 44.1 kHz, joint stereo.
pub(crate) const MPEG_FRAME_HEADER: [u8; 4] = [0xFF, 0xFB, 0x90, 0x64];

/// 144 * 128000 / 44100, minus the 4 header bytes.
const MPEG_FRAME_BODY_LEN: usize = 413;

/// Configuration for MP3 output.
#[derive(Debug, Clone)]
pub struct Mp3Config {
    /// Number of silent MPEG frames after the tag.
    pub frames: usize,
    /// Title override. `None` asks the text source.
    pub title: Option<String>,
}

impl Default for Mp3Config {
    fn default() -> Self {
        Self {
            frames: 50,
            title: None,
        }
    }
}

/// ID3-tagged silent MP3 encoder.
pub struct Mp3Encoder {
    config: Mp3Config,
}

impl Mp3Encoder {
    pub fn new() -> Self {
        Self {
            config: Mp3Config::default(),
        }
    }

    pub fn with_config(mut self, config: Mp3Config) -> Self {
        self.config = config;
        self
    }

    pub fn to_bytes(&self, title: &str) -> Result<Vec<u8>> {
        let frame_len = MPEG_FRAME_HEADER.len() + MPEG_FRAME_BODY_LEN;
        let mut mp3 = Vec::with_capacity(
            ID3_HEADER_LEN + ID3_FRAME_HEADER_LEN + 1 + title.len() + frame_len * self.config.frames,
        );

        // "ID3", v2.4.0, no flags, size back-patched below
        mp3.extend_from_slice(b"ID3");
        mp3.extend_from_slice(&[0x04, 0x00, 0x00]);
        mp3.extend_from_slice(&[0, 0, 0, 0]);

        let mut text = Vec::with_capacity(1 + title.len());
        text.push(TEXT_ENCODING_UTF8);
        text.extend_from_slice(title.as_bytes());
        write_text_frame(&mut mp3, b"TIT2", &text)?;

        let tag_size = mp3.len() - ID3_HEADER_LEN;
        mp3[6..10].copy_from_slice(&encode_synchsafe(tag_size)?);
        if decode_synchsafe(&[mp3[6], mp3[7], mp3[8], mp3[9]]) as usize != tag_size {
            return Err(Error::Invariant(format!(
                "ID3 size field does not round-trip {tag_size}"
            )));
        }

        for _ in 0..self.config.frames {
            mp3.extend_from_slice(&MPEG_FRAME_HEADER);
            mp3.resize(mp3.len() + MPEG_FRAME_BODY_LEN, 0);
        }
        Ok(mp3)
    }
}

impl Default for Mp3Encoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Encoder for Mp3Encoder {
    fn encode<W: Write + Seek>(&self, text: &mut dyn TextSource, writer: &mut W) -> Result<()> {
        let title = match &self.config.title {
            Some(title) => title.clone(),
            None => text.title(),
        };
        writer.write_all(&self.to_bytes(&title)?)?;
        Ok(())
    }
}

/// ID3v2.4 frame: id, synchsafe data size, two flag bytes, data.
fn write_text_frame(out: &mut Vec<u8>, id: &[u8; 4], data: &[u8]) -> Result<()> {
    out.extend_from_slice(id);
    out.extend_from_slice(&encode_synchsafe(data.len())?);
    out.extend_from_slice(&[0, 0]);
    out.extend_from_slice(data);
    Ok(())
}

/// Encode a value as four 7-bit bytes, most significant first.
pub fn encode_synchsafe(value: usize) -> Result<[u8; 4]> {
    let value = u32::try_from(value)
        .ok()
        .filter(|v| *v <= SYNCHSAFE_MAX)
        .ok_or_else(|| Error::Invariant(format!("{value} does not fit in 28 bits")))?;
    Ok([
        ((value >> 21) & 0x7F) as u8,
        ((value >> 14) & 0x7F) as u8,
        ((value >> 7) & 0x7F) as u8,
        (value & 0x7F) as u8,
    ])
}

/// Decode four synchsafe bytes, ignoring each byte's high bit.
pub fn decode_synchsafe(bytes: &[u8; 4]) -> u32 {
    (u32::from(bytes[0] & 0x7F) << 21)
        | (u32::from(bytes[1] & 0x7F) << 14)
        | (u32::from(bytes[2] & 0x7F) << 7)
        | u32::from(bytes[3] & 0x7F)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synchsafe_known_values() {
        assert_eq!(encode_synchsafe(0).unwrap(), [0, 0, 0, 0]);
        assert_eq!(encode_synchsafe(127).unwrap(), [0, 0, 0, 0x7F]);
        assert_eq!(encode_synchsafe(128).unwrap(), [0, 0, 1, 0]);
        assert_eq!(encode_synchsafe(SYNCHSAFE_MAX as usize).unwrap(), [0x7F; 4]);
    }

    #[test]
    fn test_synchsafe_overflow() {
        assert!(matches!(
            encode_synchsafe(SYNCHSAFE_MAX as usize + 1),
            Err(Error::Invariant(_))
        ));
    }

    #[test]
    fn test_tag_size_matches_frames() {
        for len in [0usize, 1, 300] {
            let title = "a".repeat(len);
            let mp3 = Mp3Encoder::new().to_bytes(&title).unwrap();
            let size = decode_synchsafe(&[mp3[6], mp3[7], mp3[8], mp3[9]]) as usize;
            // TIT2 header + encoding byte + title
            assert_eq!(size, ID3_FRAME_HEADER_LEN + 1 + len);
            assert_eq!(&mp3[ID3_HEADER_LEN + size..][..4], &MPEG_FRAME_HEADER);
            assert!(mp3[6..10].iter().all(|b| b & 0x80 == 0));
        }
    }

    #[test]
    fn test_frame_count_and_length() {
        let mp3 = Mp3Encoder::new().to_bytes("Lorem").unwrap();
        let tag_len = ID3_HEADER_LEN + ID3_FRAME_HEADER_LEN + 1 + 5;
        assert_eq!(mp3.len(), tag_len + 50 * 417);
    }
}
