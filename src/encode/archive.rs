//! Generic ZIP encoder: a handful of deflated `.txt` entries.

use std::collections::HashSet;
use std::io::{Seek, Write};

use zip::CompressionMethod;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::error::Result;
use crate::lorem::TextSource;

use super::Encoder;

/// Configuration for ZIP output.
#[derive(Debug, Clone)]
pub struct ZipConfig {
    /// Number of text entries.
    pub entries: usize,
    /// Compression level for deflate (0-9, default 6).
    pub compression_level: u32,
}

impl Default for ZipConfig {
    fn default() -> Self {
        Self {
            entries: 3,
            compression_level: 6,
        }
    }
}

/// Archive of independent text files.
pub struct ZipEncoder {
    config: ZipConfig,
}

impl ZipEncoder {
    pub fn new() -> Self {
        Self {
            config: ZipConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ZipConfig) -> Self {
        self.config = config;
        self
    }
}

impl Default for ZipEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Encoder for ZipEncoder {
    fn encode<W: Write + Seek>(&self, text: &mut dyn TextSource, writer: &mut W) -> Result<()> {
        let mut zip = ZipWriter::new(writer);
        let deflated = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .compression_level(Some(i64::from(self.config.compression_level.min(9))));

        let mut used = HashSet::new();
        for _ in 0..self.config.entries {
            let name = unique_name(&mut used, &text.name(), "txt");
            let body = text.body(None);
            zip.start_file(name.as_str(), deflated)?;
            zip.write_all(body.as_bytes())?;
        }

        zip.finish()?;
        Ok(())
    }
}

/// `stem.ext`, or `stem-2.ext`, `stem-3.ext`, ... if already taken.
fn unique_name(used: &mut HashSet<String>, stem: &str, ext: &str) -> String {
    let mut name = format!("{stem}.{ext}");
    let mut n = 2;
    while used.contains(&name) {
        name = format!("{stem}-{n}.{ext}");
        n += 1;
    }
    used.insert(name.clone());
    name
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Read};

    use zip::ZipArchive;

    use super::*;
    use crate::lorem::FixedText;

    #[test]
    fn test_unique_name() {
        let mut used = HashSet::new();
        assert_eq!(unique_name(&mut used, "lorem", "txt"), "lorem.txt");
        assert_eq!(unique_name(&mut used, "lorem", "txt"), "lorem-2.txt");
        assert_eq!(unique_name(&mut used, "lorem", "txt"), "lorem-3.txt");
    }

    #[test]
    fn test_repeated_names_still_encode() {
        // FixedText returns the same name every time
        let mut text = FixedText::new("Title", "Body text.");
        let mut out = Cursor::new(Vec::new());
        ZipEncoder::new()
            .with_config(ZipConfig {
                entries: 4,
                ..Default::default()
            })
            .encode(&mut text, &mut out)
            .unwrap();

        let mut archive = ZipArchive::new(Cursor::new(out.into_inner())).unwrap();
        assert_eq!(archive.len(), 4);
        let mut body = String::new();
        archive
            .by_name("lorem-4.txt")
            .unwrap()
            .read_to_string(&mut body)
            .unwrap();
        assert_eq!(body, "Body text.");
    }
}
