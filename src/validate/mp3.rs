use crate::encode::decode_synchsafe;
use crate::error::{Error, Result};
use crate::format::Format;

/// Tag summary of a validated MP3.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Id3Info {
    /// Major and revision version bytes.
    pub version: (u8, u8),
    /// Declared tag size, excluding the 10-byte header.
    pub tag_size: u32,
    pub title: Option<String>,
    /// Number of MPEG frame sync words after the tag, stepping by frame length.
    pub audio_frames: usize,
}

/// Check the ID3v2 header size against the frames it covers.
///
/// The declared size must end exactly where the first MPEG frame sync word
/// begins, and the frames inside must tile the tag with no overrun.
pub fn mp3(bytes: &[u8]) -> Result<Id3Info> {
    let bad = |reason: String| Error::malformed(Format::Mp3, reason);

    if bytes.len() < 10 || &bytes[..3] != b"ID3" {
        return Err(bad("missing ID3 header".into()));
    }
    let version = (bytes[3], bytes[4]);
    if bytes[6..10].iter().any(|b| b & 0x80 != 0) {
        return Err(bad("size field is not synchsafe".into()));
    }
    let tag_size = decode_synchsafe(&[bytes[6], bytes[7], bytes[8], bytes[9]]);
    let tag_end = 10 + tag_size as usize;
    if tag_end > bytes.len() {
        return Err(bad(format!("tag size {tag_size} runs past end of file")));
    }

    let mut title = None;
    let mut pos = 10;
    while pos + 10 <= tag_end && bytes[pos] != 0 {
        let id = &bytes[pos..pos + 4];
        let size_bytes = [bytes[pos + 4], bytes[pos + 5], bytes[pos + 6], bytes[pos + 7]];
        let size = (if version.0 >= 4 {
            decode_synchsafe(&size_bytes)
        } else {
            u32::from_be_bytes(size_bytes)
        }) as usize;
        let data_at = pos + 10;
        if data_at + size > tag_end {
            return Err(bad(format!(
                "frame {} overruns the tag",
                String::from_utf8_lossy(id)
            )));
        }
        if id == b"TIT2" && size > 0 {
            let data = &bytes[data_at..data_at + size];
            title = Some(String::from_utf8_lossy(&data[1..]).into_owned());
        }
        pos = data_at + size;
    }
    if pos != tag_end {
        return Err(bad(format!(
            "frames end at {pos} but the header declares {tag_end}"
        )));
    }

    let mut audio_frames = 0;
    let mut at = tag_end;
    while at + 4 <= bytes.len() {
        let header = [bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]];
        let len = mpeg_frame_len(header).ok_or_else(|| bad(format!("no frame sync at {at}")))?;
        audio_frames += 1;
        at += len;
    }
    if at != bytes.len() {
        return Err(bad("truncated final audio frame".into()));
    }

    Ok(Id3Info {
        version,
        tag_size,
        title,
        audio_frames,
    })
}

/// Length in bytes of an MPEG-1 Layer III frame from its header.
fn mpeg_frame_len(header: [u8; 4]) -> Option<usize> {
    const BITRATES: [u32; 15] = [
        0, 32, 40, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320,
    ];
    const SAMPLE_RATES: [u32; 3] = [44_100, 48_000, 32_000];

    // Sync, MPEG-1, Layer III
    if header[0] != 0xFF || header[1] & 0xFE != 0xFA {
        return None;
    }
    let bitrate = *BITRATES.get(usize::from(header[2] >> 4))?;
    let sample_rate = *SAMPLE_RATES.get(usize::from((header[2] >> 2) & 0x03))?;
    let padding = u32::from((header[2] >> 1) & 0x01);
    if bitrate == 0 {
        return None;
    }
    Some((144 * bitrate * 1000 / sample_rate + padding) as usize)
}
