//! Plain text encoder.

use std::io::{Seek, Write};

use crate::error::Result;
use crate::lorem::TextSource;

use super::Encoder;

/// Configuration for plain text output.
#[derive(Debug, Clone, Default)]
pub struct TextConfig {
    /// Number of body paragraphs. `None` lets the text source decide.
    pub paragraphs: Option<usize>,
}

/// Writes a title line, a blank line, and a multi-paragraph body.
pub struct TextEncoder {
    config: TextConfig,
}

impl TextEncoder {
    pub fn new() -> Self {
        Self {
            config: TextConfig::default(),
        }
    }

    pub fn with_config(mut self, config: TextConfig) -> Self {
        self.config = config;
        self
    }
}

impl Default for TextEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Encoder for TextEncoder {
    fn encode<W: Write + Seek>(&self, text: &mut dyn TextSource, writer: &mut W) -> Result<()> {
        let title = text.title();
        let body = text.body(self.config.paragraphs);
        writeln!(writer, "{title}")?;
        writeln!(writer)?;
        writeln!(writer, "{body}")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::lorem::FixedText;

    #[test]
    fn test_layout() {
        let mut text = FixedText::new("Lorem ipsum", "Dolor sit amet.");
        let mut out = Cursor::new(Vec::new());
        TextEncoder::new().encode(&mut text, &mut out).unwrap();
        assert_eq!(out.into_inner(), b"Lorem ipsum\n\nDolor sit amet.\n");
    }
}
